//! News Command
//!
//! Latest headlines for a symbol, optionally translated.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use command_core::{
    Command, CommandCall, CommandReply, CommandSchema, ParameterSchema,
    Result as CoreResult,
};

use super::reply_for_error;
use crate::market::{normalize_symbol, MarketDataSource};
use crate::model::NewsItem;
use crate::report::news_report;
use crate::translate::{Passthrough, Translator};

const NAME: &str = "news";

pub const DEFAULT_NEWS_ITEMS: usize = 5;
pub const MAX_NEWS_ITEMS: usize = 10;

/// `/news symbol [limit]`
pub struct NewsCommand {
    source: Arc<dyn MarketDataSource>,
    translator: Arc<dyn Translator>,
    max_items: usize,
}

impl NewsCommand {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            translator: Arc::new(Passthrough),
            max_items: MAX_NEWS_ITEMS,
        }
    }

    #[must_use]
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    async fn translate_item(&self, mut item: NewsItem) -> NewsItem {
        item.title = self.translator.translate(&item.title).await;
        if let Some(summary) = item.summary.take() {
            item.summary = Some(self.translator.translate(&summary).await);
        }
        item
    }
}

#[async_trait]
impl Command for NewsCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: NAME.into(),
            description: "Fetch the latest headlines for a stock".into(),
            parameters: vec![
                ParameterSchema::new("symbol", "string", "Stock symbol (e.g. AAPL)").required(),
                ParameterSchema::new("limit", "integer", "Number of headlines")
                    .with_default(serde_json::json!(DEFAULT_NEWS_ITEMS))
                    .with_range(1.0, self.max_items as f64),
            ],
            category: Some("market_data".into()),
        }
    }

    async fn execute(&self, call: &CommandCall) -> CoreResult<CommandReply> {
        let symbol = call.required_str("symbol")?;
        let limit = call
            .i64_arg("limit")?
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(DEFAULT_NEWS_ITEMS)
            .clamp(1, self.max_items);

        tracing::info!(symbol, limit, translate_to = ?self.translator.target(), "news requested");

        let items = match self.source.news(symbol, limit).await {
            Ok(items) => items,
            Err(e) => return Ok(reply_for_error(NAME, &e)),
        };

        let display_symbol = normalize_symbol(symbol).unwrap_or_else(|_| symbol.to_uppercase());
        if items.is_empty() {
            tracing::warn!(symbol = %display_symbol, "no headlines returned");
            return Ok(CommandReply::failure(
                NAME,
                format!("❌ No news found for '{display_symbol}'."),
            ));
        }

        let items = join_all(items.into_iter().map(|item| self.translate_item(item))).await;
        let report = news_report(&display_symbol, &items);
        let data = serde_json::json!({
            "report": report,
            "items": items,
        });

        tracing::info!(symbol = %display_symbol, count = items.len(), "news sent");
        Ok(CommandReply::success(NAME, report.to_text()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;

    struct Shouting;

    #[async_trait]
    impl Translator for Shouting {
        async fn translate(&self, text: &str) -> String {
            text.to_uppercase()
        }

        fn target(&self) -> Option<&str> {
            Some("shout")
        }
    }

    #[tokio::test]
    async fn test_news_default_limit() {
        let command = NewsCommand::new(Arc::new(MockMarketData::new()));
        let reply = command
            .execute(&CommandCall::new("news").with_arg("symbol", "AAPL"))
            .await
            .unwrap();

        assert!(reply.success);
        let data = reply.data.unwrap();
        assert_eq!(data["items"].as_array().unwrap().len(), DEFAULT_NEWS_ITEMS);
        assert!(reply.output.contains("Latest news for AAPL"));
    }

    #[tokio::test]
    async fn test_limit_is_capped() {
        let command = NewsCommand::new(Arc::new(MockMarketData::new())).with_max_items(3);
        let reply = command
            .execute(&CommandCall::new("news").with_arg("symbol", "AAPL").with_arg("limit", 50))
            .await
            .unwrap();

        assert_eq!(reply.data.unwrap()["items"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_headlines_are_translated() {
        let command = NewsCommand::new(Arc::new(MockMarketData::new()))
            .with_translator(Arc::new(Shouting));
        let reply = command
            .execute(&CommandCall::new("news").with_arg("symbol", "tsla").with_arg("limit", 1))
            .await
            .unwrap();

        assert!(reply.output.contains("TESLA, INC. (TSLA) MARKET UPDATE #1"));
        assert!(reply.output.contains("SYNTHETIC HEADLINE 1"));
    }
}
