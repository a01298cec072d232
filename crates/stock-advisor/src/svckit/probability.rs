//! Probability Command
//!
//! Daily return distribution and tail risk for one symbol.

use std::sync::Arc;

use async_trait::async_trait;

use command_core::{
    Command, CommandCall, CommandReply, CommandSchema, ParameterSchema,
    Result as CoreResult,
};

use super::reply_for_error;
use crate::analysis::{build_return_series, compute_risk_statistics, DEFAULT_CONFIDENCE};
use crate::error::Result;
use crate::market::MarketDataSource;
use crate::model::HistoryPeriod;
use crate::report::{risk_report, RenderPayload};

const NAME: &str = "probability";

/// `/probability symbol [period] [confidence]`
pub struct ProbabilityCommand {
    source: Arc<dyn MarketDataSource>,
}

impl ProbabilityCommand {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    async fn run(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        confidence: f64,
    ) -> Result<(RenderPayload, serde_json::Value)> {
        let prices = self.source.daily_history_for(symbol, period).await?;
        let returns = build_return_series(&prices)?;
        let risk = compute_risk_statistics(&returns, confidence)?;

        if risk.observations < 20 {
            tracing::warn!(
                symbol = prices.symbol(),
                observations = risk.observations,
                "short return series, statistics are unreliable"
            );
        }

        let report = risk_report(prices.symbol(), period, &prices, &returns, &risk);
        let data = serde_json::json!({
            "report": report,
            "risk": risk,
        });
        Ok((report, data))
    }
}

#[async_trait]
impl Command for ProbabilityCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: NAME.into(),
            description: "Analyze the daily return distribution and downside risk".into(),
            parameters: vec![
                ParameterSchema::new("symbol", "string", "Stock symbol (e.g. NVDA)").required(),
                ParameterSchema::new("period", "string", "History window")
                    .with_default(serde_json::json!("1y"))
                    .with_choices(HistoryPeriod::ALL.map(HistoryPeriod::code)),
                ParameterSchema::new("confidence", "number", "VaR confidence level")
                    .with_default(serde_json::json!(DEFAULT_CONFIDENCE))
                    .with_range(0.5, 0.999),
            ],
            category: Some("analysis".into()),
        }
    }

    async fn execute(&self, call: &CommandCall) -> CoreResult<CommandReply> {
        let symbol = call.required_str("symbol")?;
        let confidence = call.f64_arg("confidence")?.unwrap_or(DEFAULT_CONFIDENCE);
        let period = match call.str_arg("period").map(str::parse::<HistoryPeriod>) {
            None => HistoryPeriod::OneYear,
            Some(Ok(period)) => period,
            Some(Err(e)) => return Ok(reply_for_error(NAME, &e)),
        };

        tracing::info!(symbol, %period, confidence, "probability analysis requested");

        match self.run(symbol, period, confidence).await {
            Ok((report, data)) => {
                tracing::info!(symbol, "probability analysis sent");
                Ok(CommandReply::success(NAME, report.to_text()).with_data(data))
            }
            Err(e) => Ok(reply_for_error(NAME, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;

    fn command(source: MockMarketData) -> ProbabilityCommand {
        ProbabilityCommand::new(Arc::new(source))
    }

    #[tokio::test]
    async fn test_probability_defaults() {
        let call = CommandCall::new("probability").with_arg("symbol", "NVDA");
        let reply = command(MockMarketData::new()).execute(&call).await.unwrap();

        assert!(reply.success, "{}", reply.output);
        assert!(reply.output.contains("Probability Analysis: NVDA"));
        assert!(reply.output.contains("1 year"));

        let data = reply.data.unwrap();
        assert_eq!(data["risk"]["confidence"], 0.95);
        let observations = data["risk"]["observations"].as_u64().unwrap();
        assert!(observations > 200);
    }

    #[tokio::test]
    async fn test_custom_period_and_confidence() {
        let call = CommandCall::new("probability")
            .with_arg("symbol", "KO")
            .with_arg("period", "6mo")
            .with_arg("confidence", 0.99);
        let reply = command(MockMarketData::new()).execute(&call).await.unwrap();

        assert!(reply.success);
        assert!(reply.output.contains("Risk Measures (99%)"));
    }

    #[tokio::test]
    async fn test_invalid_period() {
        let call = CommandCall::new("probability")
            .with_arg("symbol", "KO")
            .with_arg("period", "3y");
        let reply = command(MockMarketData::new()).execute(&call).await.unwrap();

        assert!(!reply.success);
        assert!(reply.output.contains("unknown period"));
    }

    #[tokio::test]
    async fn test_provider_outage_is_user_message() {
        let call = CommandCall::new("probability").with_arg("symbol", "AAPL");
        let reply = command(MockMarketData::unavailable())
            .execute(&call)
            .await
            .unwrap();

        assert!(!reply.success);
        assert!(reply.output.contains("No price history found for 'AAPL'"));
        assert!(!reply.output.contains("offline"));
    }
}
