//! Daily Return Series

use crate::error::{AnalysisError, Result};
use crate::model::{PriceSeries, ReturnPoint, ReturnSeries};

/// Minimum number of valid prices needed for one return
pub const MIN_PRICES: usize = 2;

/// Derive daily fractional returns `(p[t] - p[t-1]) / p[t-1]` from closes.
///
/// A return is produced only where a valid close directly follows another
/// valid close; a missing or non-positive price breaks the chain instead of
/// being bridged.
pub fn build_return_series(prices: &PriceSeries) -> Result<ReturnSeries> {
    let valid = prices.valid_len();
    if valid < MIN_PRICES {
        return Err(AnalysisError::InsufficientData {
            required: MIN_PRICES,
            found: valid,
        });
    }

    let points: Vec<ReturnPoint> = prices
        .points()
        .windows(2)
        .filter_map(|pair| {
            let previous = pair[0].valid_close()?;
            let current = pair[1].valid_close()?;
            Some(ReturnPoint {
                timestamp: pair[1].timestamp,
                value: (current - previous) / previous,
            })
        })
        .collect();

    if points.is_empty() {
        // Valid prices exist but none are adjacent
        return Err(AnalysisError::InsufficientData {
            required: MIN_PRICES,
            found: 0,
        });
    }

    tracing::debug!(
        symbol = prices.symbol(),
        prices = prices.len(),
        returns = points.len(),
        "built return series"
    );

    Ok(ReturnSeries {
        symbol: prices.symbol().to_string(),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = closes
            .iter()
            .zip(0_u64..)
            .map(|(&c, i)| PricePoint::on(start + chrono::Days::new(i), c))
            .collect();
        PriceSeries::new("TEST", points)
    }

    #[test]
    fn test_returns_length_and_values() {
        let returns = build_return_series(&series(&[100.0, 110.0, 99.0])).unwrap();

        assert_eq!(returns.len(), 2);
        let values: Vec<f64> = returns.values().collect();
        assert!((values[0] - 0.10).abs() < 1e-12);
        assert!((values[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_constant_prices_give_zero_returns() {
        let returns = build_return_series(&series(&[42.0; 30])).unwrap();

        assert_eq!(returns.len(), 29);
        assert!(returns.values().all(|r| r == 0.0));
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let err = build_return_series(&series(&[100.0])).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData { required: 2, found: 1 }
        ));
    }

    #[test]
    fn test_gap_breaks_the_chain() {
        // 100 -> 0 (invalid) -> 120 -> 132: only 120 -> 132 is a return
        let returns = build_return_series(&series(&[100.0, 0.0, 120.0, 132.0])).unwrap();

        assert_eq!(returns.len(), 1);
        assert!((returns.points[0].value - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_no_adjacent_valid_prices() {
        let err = build_return_series(&series(&[100.0, -1.0, 105.0])).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData { found: 0, .. }
        ));
    }
}
