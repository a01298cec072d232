//! Market Overview Command
//!
//! Scans the configured universe for the latest session's breadth,
//! biggest movers and most active names.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use futures::stream::{self, StreamExt};

use command_core::{
    Command, CommandCall, CommandReply, CommandSchema, ParameterSchema,
    Result as CoreResult,
};

use crate::market::{MarketDataSource, SymbolSource};
use crate::model::{MarketMover, MarketOverview, PriceSeries};
use crate::report::market_overview_report;

const NAME: &str = "marketdata";

pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

const DEFAULT_TOP_N: i64 = 5;
const MIN_TOP_N: i64 = 3;
const MAX_TOP_N: i64 = 10;

/// Calendar days fetched to be sure of two sessions across long weekends
const LOOKBACK_DAYS: u64 = 10;

/// `/marketdata [top_n]`
pub struct MarketOverviewCommand {
    source: Arc<dyn MarketDataSource>,
    universe: Arc<dyn SymbolSource>,
    concurrency: usize,
}

impl MarketOverviewCommand {
    pub fn new(source: Arc<dyn MarketDataSource>, universe: Arc<dyn SymbolSource>) -> Self {
        Self {
            source,
            universe,
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch the latest move of every symbol; failures are counted, not fatal
    async fn scan(&self, symbols: Vec<String>, end: NaiveDate) -> (Vec<MarketMover>, usize) {
        let start = end - Days::new(LOOKBACK_DAYS);
        let total = symbols.len();

        let movers: Vec<MarketMover> = stream::iter(symbols)
            .map(|symbol| {
                let source = Arc::clone(&self.source);
                async move {
                    match source.daily_history(&symbol, start, end).await {
                        Ok(series) => latest_move(&series),
                        Err(e) => {
                            tracing::debug!(symbol = %symbol, error = %e, "skipping symbol");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|m| async move { m })
            .collect()
            .await;

        let failed = total - movers.len();
        (movers, failed)
    }
}

/// Move between the last two valid sessions
fn latest_move(series: &PriceSeries) -> Option<MarketMover> {
    let mut recent = series.points().iter().rev().filter(|p| p.is_valid());
    let last = recent.next()?;
    let previous = recent.next()?;

    let price = last.valid_close()?;
    let prior = previous.valid_close()?;

    Some(MarketMover {
        symbol: series.symbol().to_string(),
        price,
        change_percent: (price - prior) / prior * 100.0,
        volume: last.volume.unwrap_or(0),
    })
}

#[async_trait]
impl Command for MarketOverviewCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: NAME.into(),
            description: "Summarize today's market: breadth, top movers, most active".into(),
            parameters: vec![ParameterSchema::new("top_n", "integer", "Entries per list")
                .with_default(serde_json::json!(DEFAULT_TOP_N))
                .with_range(MIN_TOP_N as f64, MAX_TOP_N as f64)],
            category: Some("market_data".into()),
        }
    }

    async fn execute(&self, call: &CommandCall) -> CoreResult<CommandReply> {
        let top_n = call
            .i64_arg("top_n")?
            .unwrap_or(DEFAULT_TOP_N)
            .clamp(MIN_TOP_N, MAX_TOP_N);
        let top_n = usize::try_from(top_n).unwrap_or(5);

        let symbols = match self.universe.symbols().await {
            Ok(symbols) if !symbols.is_empty() => symbols,
            Ok(_) => {
                tracing::error!("market universe is empty");
                return Ok(CommandReply::failure(
                    NAME,
                    "❌ Could not load the market symbol list.",
                ));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load market universe");
                return Ok(CommandReply::failure(
                    NAME,
                    "❌ Could not load the market symbol list.",
                ));
            }
        };

        tracing::info!(symbols = symbols.len(), top_n, "market overview requested");

        let today = Utc::now().date_naive();
        let (movers, failed) = self.scan(symbols, today).await;

        if movers.is_empty() {
            tracing::warn!(failed, "no closing prices available");
            return Ok(CommandReply::failure(
                NAME,
                "❌ Could not fetch closing prices right now.",
            ));
        }

        let overview = MarketOverview::from_movers(movers, top_n, failed, today);
        let report = market_overview_report(&overview, top_n);
        let data = serde_json::json!({
            "report": report,
            "overview": overview,
        });

        tracing::info!(scanned = overview.scanned, failed, "market overview sent");
        Ok(CommandReply::success(NAME, report.to_text()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MockMarketData, StaticSymbols};
    use crate::model::PricePoint;

    fn command(symbols: &[&str]) -> MarketOverviewCommand {
        MarketOverviewCommand::new(
            Arc::new(MockMarketData::new()),
            Arc::new(StaticSymbols::new(symbols.iter().copied(), 100)),
        )
        .with_concurrency(2)
    }

    #[test]
    fn test_latest_move_skips_holes() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let series = PriceSeries::new(
            "X",
            vec![
                PricePoint::on(day(2), 100.0),
                PricePoint::on(day(3), f64::NAN),
                PricePoint::on(day(4), 110.0).with_volume(42),
            ],
        );
        let mover = latest_move(&series).unwrap();

        assert!((mover.change_percent - 10.0).abs() < 1e-9);
        assert_eq!(mover.volume, 42);
        assert!(latest_move(&PriceSeries::new("Y", vec![PricePoint::on(day(2), 1.0)])).is_none());
    }

    #[tokio::test]
    async fn test_overview_counts_failures() {
        let reply = command(&["AAPL", "MSFT", "KO", "NOPE", "ZZZZ"])
            .execute(&CommandCall::new("marketdata").with_arg("top_n", 3))
            .await
            .unwrap();

        assert!(reply.success, "{}", reply.output);
        let overview = &reply.data.unwrap()["overview"];
        assert_eq!(overview["scanned"], 3);
        assert_eq!(overview["failed"], 2);
        assert_eq!(overview["top_gainers"].as_array().unwrap().len(), 3);
        assert!(reply.output.contains("2 symbol(s) unavailable"));
    }

    #[tokio::test]
    async fn test_all_failures_is_error_reply() {
        let reply = command(&["NOPE"])
            .execute(&CommandCall::new("marketdata"))
            .await
            .unwrap();

        assert!(!reply.success);
        assert!(reply.output.contains("closing prices"));
    }

    #[tokio::test]
    async fn test_empty_universe() {
        let reply = command(&[])
            .execute(&CommandCall::new("marketdata"))
            .await
            .unwrap();

        assert!(!reply.success);
        assert!(reply.output.contains("symbol list"));
    }
}
