//! Domain Models
//!
//! Request-scoped data types for price history, returns and analysis results.
//! Uses `rust_decimal` for all monetary values in the DCA ledger; return
//! statistics are dimensionless and stay in `f64`.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// One daily sample from the market data provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Session timestamp (UTC)
    pub timestamp: DateTime<Utc>,

    /// Closing price; providers leave holes on halted or partial sessions
    pub close: Option<f64>,

    /// Traded volume
    pub volume: Option<u64>,
}

impl PricePoint {
    pub const fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            close: Some(close),
            volume: None,
        }
    }

    /// Point at midnight UTC of a trading date
    pub fn on(date: NaiveDate, close: f64) -> Self {
        Self::new(date.and_time(NaiveTime::MIN).and_utc(), close)
    }

    /// Point without a usable close
    pub const fn missing(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            close: None,
            volume: None,
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Trading date of this sample. Adapters stamp daily bars at midnight
    /// UTC of the exchange-local session date.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Close if present, finite and strictly positive
    pub fn valid_close(&self) -> Option<f64> {
        self.close.filter(|c| c.is_finite() && *c > 0.0)
    }

    pub fn is_valid(&self) -> bool {
        self.valid_close().is_some()
    }
}

/// Ordered daily price history for one symbol
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series; points are sorted by timestamp and duplicate
    /// timestamps collapse to the later sample.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            symbol: symbol.into().to_uppercase(),
            points: deduped,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All points, including invalid ones
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Valid points paired with their close
    pub fn valid_points(&self) -> impl Iterator<Item = (&PricePoint, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.valid_close().map(|close| (p, close)))
    }

    pub fn valid_len(&self) -> usize {
        self.valid_points().count()
    }

    /// Most recent valid point
    pub fn last_valid(&self) -> Option<(&PricePoint, f64)> {
        self.points
            .iter()
            .rev()
            .find_map(|p| p.valid_close().map(|close| (p, close)))
    }

    /// Average of valid closes
    pub fn mean_close(&self) -> Option<f64> {
        let (sum, count) = self
            .valid_points()
            .fold((0.0, 0_usize), |(sum, count), (_, close)| (sum + close, count + 1));

        (count > 0).then(|| sum / count as f64)
    }
}

/// One daily fractional return
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Daily return sequence derived from a [`PriceSeries`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub symbol: String,
    pub points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    /// Series from bare values, stamped one day apart from the Unix epoch
    pub fn from_values(symbol: impl Into<String>, values: &[f64]) -> Self {
        let points = values
            .iter()
            .zip(0_i64..)
            .map(|(&value, day)| ReturnPoint {
                timestamp: DateTime::from_timestamp(day * 86_400, 0).unwrap_or_default(),
                value,
            })
            .collect();

        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Contribution cadence for a DCA plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every business day
    Daily,
    /// Every Monday
    Weekly,
    /// First business day of each month
    Monthly,
}

impl Frequency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Thai labels are the choices the chat command historically offered
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" | "รายวัน" => Ok(Self::Daily),
            "weekly" | "w" | "รายสัปดาห์" => Ok(Self::Weekly),
            "monthly" | "m" | "รายเดือน" => Ok(Self::Monthly),
            other => Err(AnalysisError::InvalidParameter(format!(
                "unknown frequency '{other}' (expected daily, weekly or monthly)"
            ))),
        }
    }
}

/// Named look-back window for history requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl HistoryPeriod {
    pub const ALL: [Self; 4] = [
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
    ];

    /// Provider range code
    pub const fn code(self) -> &'static str {
        match self {
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SixMonths => "6 months",
            Self::OneYear => "1 year",
            Self::TwoYears => "2 years",
            Self::FiveYears => "5 years",
        }
    }

    pub const fn months(self) -> u32 {
        match self {
            Self::SixMonths => 6,
            Self::OneYear => 12,
            Self::TwoYears => 24,
            Self::FiveYears => 60,
        }
    }

    /// First calendar day of the window ending at `end`
    pub fn start_from(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HistoryPeriod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.code() == normalized || p.label() == normalized)
            .ok_or_else(|| {
                AnalysisError::InvalidParameter(format!(
                    "unknown period '{s}' (expected 6mo, 1y, 2y or 5y)"
                ))
            })
    }
}

/// One executed contribution in a DCA replay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentEvent {
    /// Date the plan called for a contribution
    pub scheduled_date: NaiveDate,

    /// First trading day on or after the scheduled date
    pub trade_date: NaiveDate,

    /// Closing price on the trade date
    pub price: Decimal,

    /// Cash contributed
    pub amount: Decimal,

    /// Shares bought with this contribution
    pub shares: Decimal,

    /// Running share count
    pub cumulative_shares: Decimal,

    /// Running cash invested
    pub cumulative_cost: Decimal,

    /// Holding value at the trade-date close
    pub portfolio_value: Decimal,
}

/// End-of-period results of a DCA replay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcaSummary {
    /// Number of contributions executed
    pub contributions: usize,

    pub total_invested: Decimal,

    pub total_shares: Decimal,

    /// Last known closing price
    pub final_price: Decimal,

    /// Date of the last known close
    pub final_date: NaiveDate,

    pub final_value: Decimal,

    pub profit_loss: Decimal,

    /// `None` when nothing was invested
    pub roi_percent: Option<Decimal>,

    /// `None` when no shares were bought
    pub avg_cost_per_share: Option<Decimal>,
}

impl DcaSummary {
    pub fn is_profitable(&self) -> bool {
        self.profit_loss >= Decimal::ZERO
    }
}

/// Full DCA replay: inputs, ledger and summary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DcaSimulation {
    pub symbol: String,
    pub frequency: Frequency,
    pub amount: Decimal,
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// Scheduled dates with no trading day on or after them
    pub skipped: usize,

    pub events: Vec<InvestmentEvent>,
    pub summary: DcaSummary,
}

/// Distribution and tail-risk snapshot of a return series
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Number of returns analysed
    pub observations: usize,

    pub mean: f64,

    /// Population standard deviation
    pub std_dev: f64,

    /// Population skewness; `None` when the series has no dispersion
    pub skewness: Option<f64>,

    /// Excess kurtosis; `None` when the series has no dispersion
    pub kurtosis: Option<f64>,

    /// Confidence level in (0, 1), e.g. 0.95
    pub confidence: f64,

    /// Parametric (Gaussian) value-at-risk as a return
    pub value_at_risk: f64,

    /// Mean of returns at or below VaR; `None` when the tail is empty
    pub expected_shortfall: Option<f64>,

    /// Fraction of strictly positive returns
    pub win_rate: f64,
}

impl RiskSummary {
    /// Expected shortfall, or [`AnalysisError::EmptyTail`] when undefined
    pub fn expected_shortfall(&self) -> crate::Result<f64> {
        self.expected_shortfall.ok_or(AnalysisError::EmptyTail {
            confidence: self.confidence,
        })
    }
}

/// Current quote snapshot
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub short_name: Option<String>,
    pub currency: Option<String>,
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub day_low: Option<f64>,
    pub day_high: Option<f64>,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
}

impl QuoteSnapshot {
    /// Absolute and percent change versus previous close
    pub fn change(&self) -> Option<(f64, f64)> {
        let price = self.price?;
        let previous = self.previous_close.filter(|p| *p > 0.0)?;
        let change = price - previous;
        Some((change, change / previous * 100.0))
    }
}

/// Headline for a symbol
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
}

/// One symbol's latest session move
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketMover {
    pub symbol: String,
    pub price: f64,
    /// Percent change versus the prior session
    pub change_percent: f64,
    pub volume: u64,
}

/// Breadth summary of a scanned universe
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketOverview {
    pub as_of: NaiveDate,
    /// Symbols with a usable move
    pub scanned: usize,
    /// Symbols that could not be fetched
    pub failed: usize,
    pub gainers: usize,
    pub losers: usize,
    pub average_change: Option<f64>,
    pub top_gainers: Vec<MarketMover>,
    pub top_losers: Vec<MarketMover>,
    pub most_active: Vec<MarketMover>,
}

impl MarketOverview {
    /// Rank movers; non-finite changes are dropped first.
    pub fn from_movers(
        mut movers: Vec<MarketMover>,
        top_n: usize,
        failed: usize,
        as_of: NaiveDate,
    ) -> Self {
        movers.retain(|m| m.change_percent.is_finite() && m.price.is_finite());

        let gainers = movers.iter().filter(|m| m.change_percent > 0.0).count();
        let losers = movers.iter().filter(|m| m.change_percent < 0.0).count();
        let average_change = (!movers.is_empty())
            .then(|| movers.iter().map(|m| m.change_percent).sum::<f64>() / movers.len() as f64);

        movers.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
        let top_gainers = movers.iter().take(top_n).cloned().collect();
        let top_losers = movers.iter().rev().take(top_n).cloned().collect();

        let mut by_volume = movers.clone();
        by_volume.sort_by(|a, b| b.volume.cmp(&a.volume));
        by_volume.truncate(top_n);

        Self {
            as_of,
            scanned: movers.len(),
            failed,
            gainers,
            losers,
            average_change,
            top_gainers,
            top_losers,
            most_active: by_volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "aapl",
            vec![
                PricePoint::on(day(5), 102.0),
                PricePoint::on(day(4), 101.0),
                PricePoint::on(day(5), 103.0),
            ],
        );

        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date(), day(4));
        assert_eq!(series.points()[1].close, Some(103.0));
    }

    #[test]
    fn test_invalid_points_excluded() {
        let series = PriceSeries::new(
            "MSFT",
            vec![
                PricePoint::on(day(4), 100.0),
                PricePoint::on(day(5), 0.0),
                PricePoint::on(day(6), f64::NAN),
                PricePoint::missing(day(7).and_time(NaiveTime::MIN).and_utc()),
                PricePoint::on(day(8), 110.0),
            ],
        );

        assert_eq!(series.len(), 5);
        assert_eq!(series.valid_len(), 2);
        assert_eq!(series.last_valid().map(|(_, c)| c), Some(110.0));
        assert_eq!(series.mean_close(), Some(105.0));
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("รายสัปดาห์".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_history_period() {
        let period: HistoryPeriod = "2y".parse().unwrap();
        assert_eq!(period, HistoryPeriod::TwoYears);
        assert_eq!(period.start_from(day(31)), NaiveDate::from_ymd_opt(2022, 3, 31).unwrap());
        assert_eq!("1 year".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::OneYear);
        assert!("3y".parse::<HistoryPeriod>().is_err());
    }

    #[test]
    fn test_quote_change() {
        let quote = QuoteSnapshot {
            symbol: "NVDA".into(),
            price: Some(110.0),
            previous_close: Some(100.0),
            ..Default::default()
        };
        let (change, pct) = quote.change().unwrap();
        assert!((change - 10.0).abs() < 1e-9);
        assert!((pct - 10.0).abs() < 1e-9);

        let no_prev = QuoteSnapshot {
            previous_close: None,
            ..quote
        };
        assert!(no_prev.change().is_none());
    }

    fn mover(symbol: &str, change_percent: f64, volume: u64) -> MarketMover {
        MarketMover {
            symbol: symbol.into(),
            price: 100.0,
            change_percent,
            volume,
        }
    }

    #[test]
    fn test_market_overview_ranking() {
        let movers = vec![
            mover("A", 2.0, 10),
            mover("B", -3.0, 50),
            mover("C", 0.0, 30),
            mover("D", 5.0, 20),
            mover("E", f64::NAN, 99),
        ];
        let overview = MarketOverview::from_movers(movers, 2, 1, day(8));

        assert_eq!(overview.scanned, 4);
        assert_eq!(overview.failed, 1);
        assert_eq!((overview.gainers, overview.losers), (2, 1));
        assert!((overview.average_change.unwrap() - 1.0).abs() < 1e-12);

        let symbols = |list: &[MarketMover]| list.iter().map(|m| m.symbol.clone()).collect::<Vec<_>>();
        assert_eq!(symbols(&overview.top_gainers), ["D", "A"]);
        assert_eq!(symbols(&overview.top_losers), ["B", "C"]);
        assert_eq!(symbols(&overview.most_active), ["B", "C"]);
    }

    #[test]
    fn test_empty_market_overview() {
        let overview = MarketOverview::from_movers(Vec::new(), 5, 3, day(8));
        assert!(overview.average_change.is_none());
        assert!(overview.top_gainers.is_empty());
    }
}
