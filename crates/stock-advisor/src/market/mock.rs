//! Mock Market Data
//!
//! For testing and demo purposes. Produces deterministic synthetic daily
//! closes for a fixed set of tickers: the same symbol and date always
//! yield the same price, so simulations are reproducible.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};

use super::{normalize_symbol, MarketDataSource};
use crate::error::{AnalysisError, Result};
use crate::model::{NewsItem, PricePoint, PriceSeries, QuoteSnapshot};
use crate::strategy::schedule::is_business_day;

struct Listing {
    symbol: &'static str,
    name: &'static str,
    /// Approximate close around the start of 2024
    base: f64,
    volume: u64,
    shares_outstanding: f64,
    /// Zero for funds without earnings
    trailing_pe: f64,
}

const fn listing(
    symbol: &'static str,
    name: &'static str,
    base: f64,
    volume: u64,
    shares_outstanding: f64,
    trailing_pe: f64,
) -> Listing {
    Listing {
        symbol,
        name,
        base,
        volume,
        shares_outstanding,
        trailing_pe,
    }
}

const LISTINGS: &[Listing] = &[
    listing("AAPL", "Apple Inc.", 185.0, 55_000_000, 15.4e9, 29.5),
    listing("MSFT", "Microsoft Corporation", 370.0, 22_000_000, 7.4e9, 35.1),
    listing("NVDA", "NVIDIA Corporation", 480.0, 45_000_000, 2.5e9, 64.0),
    listing("AMZN", "Amazon.com, Inc.", 150.0, 40_000_000, 10.4e9, 60.2),
    listing("GOOGL", "Alphabet Inc.", 140.0, 25_000_000, 12.4e9, 26.8),
    listing("META", "Meta Platforms, Inc.", 350.0, 15_000_000, 2.6e9, 31.0),
    listing("TSLA", "Tesla, Inc.", 245.0, 110_000_000, 3.2e9, 70.5),
    listing("BRK-B", "Berkshire Hathaway Inc.", 360.0, 3_500_000, 2.2e9, 9.8),
    listing("JPM", "JPMorgan Chase & Co.", 170.0, 9_000_000, 2.9e9, 11.2),
    listing("V", "Visa Inc.", 260.0, 6_000_000, 2.0e9, 31.4),
    listing("KO", "The Coca-Cola Company", 59.0, 12_000_000, 4.3e9, 24.1),
    listing("SPY", "SPDR S&P 500 ETF Trust", 475.0, 80_000_000, 0.9e9, 0.0),
];

/// Mock market data source with synthetic prices
pub struct MockMarketData {
    available: bool,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketData {
    pub const fn new() -> Self {
        Self { available: true }
    }

    /// Source whose every request fails, for exercising error paths
    pub const fn unavailable() -> Self {
        Self { available: false }
    }

    /// Tickers this source can serve
    pub fn symbols() -> Vec<String> {
        LISTINGS.iter().map(|l| l.symbol.to_string()).collect()
    }

    fn lookup(&self, symbol: &str) -> Result<(String, &'static Listing)> {
        let symbol = normalize_symbol(symbol)?;
        if !self.available {
            return Err(AnalysisError::fetch(&symbol, "mock source offline"));
        }

        LISTINGS
            .iter()
            .find(|l| l.symbol == symbol)
            .map(|l| (symbol.clone(), l))
            .ok_or_else(|| AnalysisError::fetch(&symbol, "symbol not listed"))
    }
}

/// Deterministic close for a listing on a date
fn synthetic_close(symbol: &str, base: f64, date: NaiveDate) -> f64 {
    let seed = symbol_seed(symbol);
    let phase = (seed % 1_000) as f64 / 100.0;
    let t = f64::from(date.num_days_from_ce() - 730_120); // days since 2000-01-01

    // Slow drift, two cycles and a small hashed jitter
    let noise = (mix(seed ^ date.num_days_from_ce() as u64) % 2_001) as f64 / 100_000.0 - 0.01;
    let log_return = 0.000_25 * t
        + 0.06 * (t / 9.0 + phase).sin()
        + 0.12 * (t / 53.0 + phase * 0.7).sin()
        + noise;

    // Anchor so that 2024-01-01 sits near the listed base price
    let anchor = 0.000_25 * 8_766.0;
    (base * (log_return - anchor).exp() * 100.0).round() / 100.0
}

fn symbol_seed(symbol: &str) -> u64 {
    // FNV-1a
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn mix(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x
}

fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut day = date;
    while let Some(prev) = day.pred_opt() {
        day = prev;
        if is_business_day(day) {
            break;
        }
    }
    day
}

#[async_trait]
impl MarketDataSource for MockMarketData {
    async fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let (symbol, listing) = self.lookup(symbol)?;

        let points = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| is_business_day(*d))
            .map(|d| {
                PricePoint::on(d, synthetic_close(&symbol, listing.base, d))
                    .with_volume(listing.volume)
            })
            .collect();

        Ok(PriceSeries::new(symbol, points))
    }

    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot> {
        let (symbol, listing) = self.lookup(symbol)?;

        let today = Utc::now().date_naive();
        let session = if is_business_day(today) {
            today
        } else {
            previous_business_day(today)
        };
        let price = synthetic_close(&symbol, listing.base, session);
        let previous = synthetic_close(&symbol, listing.base, previous_business_day(session));

        Ok(QuoteSnapshot {
            symbol,
            short_name: Some(listing.name.to_string()),
            currency: Some("USD".to_string()),
            price: Some(price),
            previous_close: Some(previous),
            open: Some(previous),
            day_low: Some(price.min(previous) * 0.995),
            day_high: Some(price.max(previous) * 1.005),
            volume: Some(listing.volume),
            market_cap: Some(price * listing.shares_outstanding),
            trailing_pe: (listing.trailing_pe > 0.0).then_some(listing.trailing_pe),
        })
    }

    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let (symbol, listing) = self.lookup(symbol)?;
        let now = Utc::now();

        Ok((0..limit)
            .map(|i| NewsItem {
                title: format!("{} ({symbol}) market update #{}", listing.name, i + 1),
                summary: Some(format!("Synthetic headline {} for {symbol}.", i + 1)),
                publisher: Some("Mock Wire".to_string()),
                link: Some(format!("https://example.com/news/{symbol}/{}", i + 1)),
                published_at: Some(now - Duration::hours(i as i64)),
                thumbnail_url: None,
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        self.available
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HistoryPeriod;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_history_is_deterministic() {
        let source = MockMarketData::new();
        let a = source
            .daily_history("aapl", date(2024, 1, 1), date(2024, 3, 31))
            .await
            .unwrap();
        let b = source
            .daily_history("AAPL", date(2024, 1, 1), date(2024, 3, 31))
            .await
            .unwrap();

        assert_eq!(a.symbol(), "AAPL");
        assert_eq!(a.points(), b.points());
        assert_eq!(a.valid_len(), a.len());
        assert!(a.points().iter().all(|p| is_business_day(p.date())));
    }

    #[tokio::test]
    async fn test_prices_stay_near_base() {
        let source = MockMarketData::new();
        let series = source
            .daily_history_for("KO", HistoryPeriod::FiveYears)
            .await
            .unwrap();

        assert!(series.len() > 1_000);
        assert!(series
            .valid_points()
            .all(|(_, close)| close > 59.0 * 0.3 && close < 59.0 * 3.0));
    }

    #[tokio::test]
    async fn test_quote_and_news() {
        let source = MockMarketData::new();

        let quote = source.quote("brk.b").await.unwrap();
        assert_eq!(quote.symbol, "BRK-B");
        assert!(quote.change().is_some());
        assert!(quote.market_cap.unwrap() > 0.0);

        let news = source.news("MSFT", 3).await.unwrap();
        assert_eq!(news.len(), 3);
        assert!(news[0].title.contains("MSFT"));
    }

    #[tokio::test]
    async fn test_unknown_and_offline() {
        let source = MockMarketData::new();
        assert!(matches!(
            source.quote("NOTREAL").await,
            Err(AnalysisError::Fetch { .. })
        ));

        let offline = MockMarketData::unavailable();
        assert!(!offline.health_check().await);
        assert!(offline
            .daily_history("AAPL", date(2024, 1, 1), date(2024, 1, 31))
            .await
            .is_err());
    }
}
