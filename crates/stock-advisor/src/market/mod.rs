//! Market Data Integration
//!
//! Abstractions and implementations for finance data providers.

mod mock;
mod symbols;
mod yahoo;

pub use mock::MockMarketData;
pub use symbols::{StaticSymbols, SymbolSource, WikipediaSp500, DEFAULT_UNIVERSE, SP500_URL};
pub use yahoo::{YahooConfig, YahooFinance};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::error::{AnalysisError, Result};
use crate::model::{HistoryPeriod, NewsItem, PriceSeries, QuoteSnapshot};

/// Market data provider trait (Strategy pattern)
///
/// Implement this for each provider: Yahoo Finance, a mock, etc.
/// Provider faults surface as [`AnalysisError::Fetch`].
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily closes for `[start, end]`
    async fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;

    /// Daily closes for a named look-back window ending today
    async fn daily_history_for(&self, symbol: &str, period: HistoryPeriod) -> Result<PriceSeries> {
        let end = Utc::now().date_naive();
        self.daily_history(symbol, period.start_from(end), end).await
    }

    /// Current quote
    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot>;

    /// Latest headlines, newest first
    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}

/// Normalize a ticker for provider lookups.
///
/// Provider symbols use hyphens for share classes (`BRK-B`, not `BRK.B`).
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let normalized = symbol.trim().to_uppercase().replace('.', "-");

    let valid = !normalized.is_empty()
        && normalized.len() <= 16
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '^' | '='));

    if valid {
        Ok(normalized)
    } else {
        Err(AnalysisError::UnsupportedSymbol(symbol.trim().to_string()))
    }
}
