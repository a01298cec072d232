//! Dollar-Cost Averaging Simulation
//!
//! Replays a fixed-amount contribution plan against historical closes.
//! Contributions are matched forward onto the next available trading day;
//! dates beyond the end of the price history are skipped rather than
//! priced with fabricated data.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{AnalysisError, Result};
use crate::model::{DcaSimulation, DcaSummary, Frequency, InvestmentEvent, PriceSeries};
use crate::strategy::schedule::{next_trading_day, schedule_dates};

/// Decimal places kept when converting provider closes
const PRICE_SCALE: u32 = 6;

/// Simulate investing `amount` at every `frequency` date in `[start, end]`.
pub fn simulate_dca(
    prices: &PriceSeries,
    amount: Decimal,
    frequency: Frequency,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DcaSimulation> {
    if amount <= Decimal::ZERO {
        return Err(AnalysisError::InvalidParameter(format!(
            "contribution amount must be positive, got {amount}"
        )));
    }
    if start > end {
        return Err(AnalysisError::InvalidParameter(format!(
            "start date {start} is after end date {end}"
        )));
    }

    let (dates, closes) = trading_calendar(prices);
    let Some((&final_date, &final_price)) = dates.last().zip(closes.last()) else {
        return Err(AnalysisError::NoData {
            symbol: prices.symbol().to_string(),
        });
    };

    let mut events = Vec::new();
    let mut skipped = 0_usize;
    let mut total_shares = Decimal::ZERO;
    let mut total_invested = Decimal::ZERO;

    for scheduled_date in schedule_dates(frequency, start, end) {
        let Some(idx) = next_trading_day(&dates, scheduled_date) else {
            skipped += 1;
            continue;
        };

        let price = closes[idx];
        let shares = amount / price;
        total_shares += shares;
        total_invested += amount;

        events.push(InvestmentEvent {
            scheduled_date,
            trade_date: dates[idx],
            price,
            amount,
            shares,
            cumulative_shares: total_shares,
            cumulative_cost: total_invested,
            portfolio_value: total_shares * price,
        });
    }

    if events.is_empty() {
        return Err(AnalysisError::NoContributionsMatched {
            symbol: prices.symbol().to_string(),
            last_trading_day: final_date,
        });
    }

    let final_value = total_shares * final_price;
    let profit_loss = final_value - total_invested;

    let summary = DcaSummary {
        contributions: events.len(),
        total_invested,
        total_shares,
        final_price,
        final_date,
        final_value,
        profit_loss,
        roi_percent: (!total_invested.is_zero()).then(|| profit_loss / total_invested * dec!(100)),
        avg_cost_per_share: (!total_shares.is_zero()).then(|| total_invested / total_shares),
    };

    tracing::debug!(
        symbol = prices.symbol(),
        %frequency,
        contributions = summary.contributions,
        skipped,
        "DCA simulation complete"
    );

    Ok(DcaSimulation {
        symbol: prices.symbol().to_string(),
        frequency,
        amount,
        start,
        end,
        skipped,
        events,
        summary,
    })
}

/// Valid trading dates with their closes as decimals, ascending
fn trading_calendar(prices: &PriceSeries) -> (Vec<NaiveDate>, Vec<Decimal>) {
    prices
        .valid_points()
        .filter_map(|(point, close)| {
            Decimal::from_f64_retain(close)
                .map(|d| d.round_dp(PRICE_SCALE))
                .filter(|d| *d > Decimal::ZERO)
                .map(|d| (point.date(), d))
        })
        .unzip()
}
