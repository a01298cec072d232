//! DCA Simulator Command
//!
//! Replays a fixed contribution plan over recent history for one symbol.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;

use command_core::{
    Command, CommandCall, CommandReply, CommandSchema, ParameterSchema,
    Result as CoreResult,
};

use super::reply_for_error;
use crate::error::{AnalysisError, Result};
use crate::market::MarketDataSource;
use crate::model::{DcaSimulation, Frequency, PriceSeries};
use crate::report::dca_report;
use crate::strategy::simulate_dca;

const NAME: &str = "dca";

/// Longest look-back accepted, in months
pub const MAX_PERIOD_MONTHS: u32 = 120;

/// `/dca symbol amount frequency period`
pub struct DcaCommand {
    source: Arc<dyn MarketDataSource>,
}

impl DcaCommand {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    async fn run(
        &self,
        symbol: &str,
        amount: f64,
        frequency: &str,
        months: i64,
        end: NaiveDate,
    ) -> Result<(DcaSimulation, PriceSeries)> {
        let frequency: Frequency = frequency.parse()?;
        let amount = Decimal::from_f64_retain(amount)
            .map(|d| d.round_dp(2))
            .filter(|d| *d > Decimal::ZERO)
            .ok_or_else(|| {
                AnalysisError::InvalidParameter(format!("amount must be positive, got {amount}"))
            })?;
        let months = u32::try_from(months)
            .ok()
            .filter(|m| (1..=MAX_PERIOD_MONTHS).contains(m))
            .ok_or_else(|| {
                AnalysisError::InvalidParameter(format!(
                    "period must be between 1 and {MAX_PERIOD_MONTHS} months"
                ))
            })?;
        let start = end
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| AnalysisError::InvalidParameter("period out of range".into()))?;

        let prices = self.source.daily_history(symbol, start, end).await?;
        let simulation = simulate_dca(&prices, amount, frequency, start, end)?;
        Ok((simulation, prices))
    }
}

#[async_trait]
impl Command for DcaCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: NAME.into(),
            description: "Simulate a dollar-cost averaging plan over recent history".into(),
            parameters: vec![
                ParameterSchema::new("symbol", "string", "Stock symbol (e.g. AAPL)").required(),
                ParameterSchema::new("amount", "number", "USD invested per contribution")
                    .required()
                    .with_range(0.01, 1_000_000_000.0),
                ParameterSchema::new(
                    "frequency",
                    "string",
                    "Contribution cadence: daily, weekly or monthly",
                )
                .required(),
                ParameterSchema::new("period", "integer", "Look-back window in months")
                    .required()
                    .with_range(1.0, f64::from(MAX_PERIOD_MONTHS)),
            ],
            category: Some("analysis".into()),
        }
    }

    async fn execute(&self, call: &CommandCall) -> CoreResult<CommandReply> {
        let symbol = call.required_str("symbol")?;
        let amount = call.required_f64("amount")?;
        let frequency = call.required_str("frequency")?;
        let months = call.required_i64("period")?;

        tracing::info!(symbol, amount, frequency, months, "DCA simulation requested");

        let end = Utc::now().date_naive();
        let (simulation, prices) = match self.run(symbol, amount, frequency, months, end).await {
            Ok(result) => result,
            Err(e) => return Ok(reply_for_error(NAME, &e)),
        };

        let period_months = u32::try_from(months).unwrap_or_default();
        let report = dca_report(&simulation, &prices, period_months);
        let data = serde_json::json!({
            "report": report,
            "simulation": simulation,
        });

        tracing::info!(
            symbol = %simulation.symbol,
            contributions = simulation.summary.contributions,
            roi = ?simulation.summary.roi_percent,
            "DCA analysis sent"
        );

        Ok(CommandReply::success(NAME, report.to_text()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;

    fn command() -> DcaCommand {
        DcaCommand::new(Arc::new(MockMarketData::new()))
    }

    #[tokio::test]
    async fn test_dca_monthly_plan() {
        let call = CommandCall::new("dca")
            .with_arg("symbol", "aapl")
            .with_arg("amount", 100.0)
            .with_arg("frequency", "monthly")
            .with_arg("period", 12);

        let reply = command().execute(&call).await.unwrap();

        assert!(reply.success, "{}", reply.output);
        assert!(reply.output.contains("DCA Analysis: AAPL"));

        let data = reply.data.unwrap();
        let contributions = data["simulation"]["summary"]["contributions"].as_u64().unwrap();
        assert!((11..=13).contains(&contributions));
        assert_eq!(data["report"]["chart"]["kind"], "lines");
    }

    #[tokio::test]
    async fn test_thai_frequency_label() {
        let call = CommandCall::new("dca")
            .with_arg("symbol", "MSFT")
            .with_arg("amount", "250")
            .with_arg("frequency", "รายสัปดาห์")
            .with_arg("period", 3);

        let reply = command().execute(&call).await.unwrap();
        assert!(reply.success, "{}", reply.output);
        assert!(reply.output.contains("weekly"));
    }

    #[tokio::test]
    async fn test_unknown_symbol_reports_no_data() {
        let call = CommandCall::new("dca")
            .with_arg("symbol", "NOTREAL")
            .with_arg("amount", 100)
            .with_arg("frequency", "monthly")
            .with_arg("period", 6);

        let reply = command().execute(&call).await.unwrap();

        assert!(!reply.success);
        assert!(reply.output.contains("No price history found for 'NOTREAL'"));
    }

    #[tokio::test]
    async fn test_bad_frequency() {
        let call = CommandCall::new("dca")
            .with_arg("symbol", "AAPL")
            .with_arg("amount", 100)
            .with_arg("frequency", "hourly")
            .with_arg("period", 6);

        let reply = command().execute(&call).await.unwrap();
        assert!(!reply.success);
        assert!(reply.output.starts_with("Invalid input"));
    }

    #[test]
    fn test_schema_rejects_long_period() {
        let call = CommandCall::new("dca")
            .with_arg("symbol", "AAPL")
            .with_arg("amount", 100)
            .with_arg("frequency", "monthly")
            .with_arg("period", 600);

        assert!(command().validate(&call).is_err());
    }
}
