//! Stock Quote Command
//!
//! Current price snapshot for one symbol.

use std::sync::Arc;

use async_trait::async_trait;

use command_core::{
    Command, CommandCall, CommandReply, CommandSchema, ParameterSchema,
    Result as CoreResult,
};

use super::reply_for_error;
use crate::error::AnalysisError;
use crate::market::MarketDataSource;
use crate::report::quote_report;

const NAME: &str = "stock";

/// `/stock symbol`
pub struct StockCommand {
    source: Arc<dyn MarketDataSource>,
}

impl StockCommand {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Command for StockCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: NAME.into(),
            description: "Show the current quote for a stock".into(),
            parameters: vec![ParameterSchema::new(
                "symbol",
                "string",
                "Stock symbol (e.g. AAPL, NVDA)",
            )
            .required()],
            category: Some("market_data".into()),
        }
    }

    async fn execute(&self, call: &CommandCall) -> CoreResult<CommandReply> {
        let symbol = call.required_str("symbol")?;
        tracing::info!(symbol, "quote requested");

        let quote = match self.source.quote(symbol).await {
            // A quote without a price means the provider does not know the symbol
            Ok(quote) if quote.price.is_none() => {
                let err = AnalysisError::UnsupportedSymbol(symbol.to_uppercase());
                return Ok(reply_for_error(NAME, &err));
            }
            Ok(quote) => quote,
            Err(e) => return Ok(reply_for_error(NAME, &e)),
        };

        let report = quote_report(&quote);
        let data = serde_json::json!({
            "report": report,
            "quote": quote,
        });

        Ok(CommandReply::success(NAME, report.to_text()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;

    #[tokio::test]
    async fn test_stock_quote() {
        let command = StockCommand::new(Arc::new(MockMarketData::new()));
        let reply = command
            .execute(&CommandCall::new("stock").with_arg("symbol", "nvda"))
            .await
            .unwrap();

        assert!(reply.success);
        assert!(reply.output.contains("NVIDIA Corporation (NVDA)"));
        assert!(reply.output.contains("Market Cap"));
        assert_eq!(reply.data.unwrap()["quote"]["symbol"], "NVDA");
    }

    #[tokio::test]
    async fn test_missing_symbol_is_validation_error() {
        let command = StockCommand::new(Arc::new(MockMarketData::new()));
        let err = command.execute(&CommandCall::new("stock")).await.unwrap_err();

        assert!(err.user_message().contains("symbol"));
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let command = StockCommand::new(Arc::new(MockMarketData::new()));
        let reply = command
            .execute(&CommandCall::new("stock").with_arg("symbol", "$$$"))
            .await
            .unwrap();

        assert!(!reply.success);
        assert!(reply.output.contains("No data found for symbol '$$$'"));
    }
}
