//! # stock-advisor
//!
//! Stock analysis for the chat bot: dollar-cost averaging replays, return
//! distributions and tail risk, quotes, headlines and market breadth.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   PriceSeries   ┌──────────────────────┐
//! │ MarketData   │────────────────▶│ simulate_dca         │──▶ DcaSimulation ─┐
//! │ Source       │                 └──────────────────────┘                   │
//! │ (Yahoo/Mock) │                 ┌──────────────────────┐                   ▼
//! │              │────────────────▶│ build_return_series  │              ┌─────────┐
//! └──────────────┘                 │ compute_risk_stats   │──▶ Risk ────▶│ report  │
//!                                  └──────────────────────┘   Summary    └─────────┘
//! ```
//!
//! The analysis functions are pure and synchronous; only the market data
//! adapters perform I/O.
//!
//! ## Example: $100 monthly into AAPL for a year
//!
//! ```text
//! DCA Analysis: AAPL
//!   Total invested:  $1,200.00   Contributions: 12
//!   Portfolio value: $1,318.40   ROI: 9.87%
//!   Average cost:    $181.22     Shares held: 6.6218
//! ```

pub mod analysis;
pub mod error;
pub mod market;
pub mod model;
pub mod report;
pub mod strategy;
pub mod svckit;
pub mod translate;

pub use analysis::{build_return_series, compute_risk_statistics};
pub use error::{AnalysisError, Result};
pub use market::{
    MarketDataSource, MockMarketData, StaticSymbols, SymbolSource, WikipediaSp500, YahooFinance,
};
pub use model::{
    DcaSimulation, DcaSummary, Frequency, HistoryPeriod, InvestmentEvent, PricePoint,
    PriceSeries, ReturnSeries, RiskSummary,
};
pub use report::RenderPayload;
pub use strategy::simulate_dca;

/// Re-export commands for easy registration
pub mod commands {
    pub use crate::svckit::{
        DcaCommand, MarketOverviewCommand, NewsCommand, PingCommand, ProbabilityCommand,
        StockCommand,
    };
}
