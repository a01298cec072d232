//! Return Distribution & Tail Risk
//!
//! Moments are population moments (divide by n) so that standard deviation,
//! skewness and kurtosis are mutually consistent.
//!
//! Value-at-risk is **parametric**: `mean + z(1 - c) * std_dev` with `z` the
//! standard-normal quantile. It assumes normally distributed returns and
//! therefore understates tail risk for skewed or fat-tailed assets.
//! Expected shortfall is empirical: the mean of observed returns at or
//! below that threshold.

use crate::error::{AnalysisError, Result};
use crate::model::{ReturnSeries, RiskSummary};

/// Confidence used by the probability command unless overridden
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Standard deviation below this is treated as no dispersion
const ZERO_DISPERSION: f64 = 1e-12;

/// Compute distribution and tail-risk statistics for a return series.
pub fn compute_risk_statistics(returns: &ReturnSeries, confidence: f64) -> Result<RiskSummary> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "confidence must be strictly between 0 and 1, got {confidence}"
        )));
    }

    let values: Vec<f64> = returns.values().collect();
    if values.is_empty() {
        return Err(AnalysisError::InsufficientData {
            required: 1,
            found: 0,
        });
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), r| {
        let d = r - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
    let std_dev = m2.sqrt();

    let (skewness, kurtosis, value_at_risk, expected_shortfall) = if std_dev < ZERO_DISPERSION {
        // Constant series: the whole distribution sits at the mean
        (None, None, mean, Some(mean))
    } else {
        let var = mean + inverse_normal_cdf(1.0 - confidence) * std_dev;
        let (tail_sum, tail_count) = values
            .iter()
            .filter(|r| **r <= var)
            .fold((0.0, 0_usize), |(sum, count), r| (sum + r, count + 1));

        (
            Some(m3 / m2.powf(1.5)),
            Some(m4 / (m2 * m2) - 3.0),
            var,
            (tail_count > 0).then(|| tail_sum / tail_count as f64),
        )
    };

    let wins = values.iter().filter(|r| **r > 0.0).count();

    if expected_shortfall.is_none() {
        tracing::debug!(
            symbol = %returns.symbol,
            observations = values.len(),
            "no return at or below VaR, expected shortfall undefined"
        );
    }

    Ok(RiskSummary {
        observations: values.len(),
        mean,
        std_dev,
        skewness,
        kurtosis,
        confidence,
        value_at_risk,
        expected_shortfall,
        win_rate: wins as f64 / n,
    })
}

/// Standard-normal quantile function (probit).
///
/// Acklam's rational approximation, relative error below 1.15e-9 over (0, 1).
/// Returns `-inf`/`+inf` at 0 and 1 and NaN outside [0, 1].
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}
