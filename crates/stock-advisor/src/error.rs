//! Error Types for Stock Advisor

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: need at least {required} valid prices, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Expected shortfall undefined: no return at or below VaR ({confidence} confidence)")]
    EmptyTail { confidence: f64 },

    #[error("No price data for {symbol}")]
    NoData { symbol: String },

    #[error("No scheduled contribution for {symbol} matched a trading day (last trading day {last_trading_day})")]
    NoContributionsMatched {
        symbol: String,
        last_trading_day: NaiveDate,
    },

    #[error("Market data fetch failed for {symbol}: {reason}")]
    Fetch { symbol: String, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Symbol not supported: {0}")]
    UnsupportedSymbol(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AnalysisError {
    pub fn fetch(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors caused by the upstream provider rather than the request itself
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Network(_))
    }

    /// Translate into the message shown in chat.
    ///
    /// Upstream faults collapse into a "no data" message; raw transport
    /// errors never reach the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientData { .. } => {
                "Not enough price history to compute returns for this period.".into()
            }
            Self::EmptyTail { .. } => {
                "Expected shortfall is undefined for this sample: no daily return fell below VaR."
                    .into()
            }
            Self::NoData { symbol } | Self::Fetch { symbol, .. } => {
                format!("❌ No price history found for '{symbol}'.")
            }
            Self::NoContributionsMatched { symbol, .. } => {
                format!("❌ Could not simulate any investment for '{symbol}' in this period.")
            }
            Self::InvalidParameter(msg) => format!("Invalid input: {msg}"),
            Self::UnsupportedSymbol(symbol) => format!("❌ No data found for symbol '{symbol}'."),
            Self::Network(_) => {
                "❌ Market data is unavailable right now. Please try again later.".into()
            }
        }
    }
}
