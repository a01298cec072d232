//! Yahoo Finance Client
//!
//! Daily history and quote snapshots come from the v8 chart endpoint,
//! headlines from the v1 search endpoint. Response payloads are loosely
//! shaped, so every provider field is an `Option` here and defaulting
//! happens once, in the conversion functions below.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{normalize_symbol, MarketDataSource};
use crate::error::{AnalysisError, Result};
use crate::model::{NewsItem, PricePoint, PriceSeries, QuoteSnapshot};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Symbol probed by the health check
const HEALTH_SYMBOL: &str = "SPY";

/// Yahoo client configuration
#[derive(Clone, Debug)]
pub struct YahooConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Yahoo Finance market data source
pub struct YahooFinance {
    client: Client,
    base_url: String,
}

impl YahooFinance {
    pub fn new(config: YahooConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        symbol: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(%url, symbol, "Yahoo request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AnalysisError::fetch(symbol, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::fetch(symbol, format!("status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::fetch(symbol, e))?;
        decode(symbol, &body)
    }

    async fn chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResult> {
        let path = format!("v8/finance/chart/{symbol}");
        let response: ChartResponse = self.get_json(symbol, &path, query).await?;
        first_chart_result(symbol, response)
    }
}

#[async_trait]
impl MarketDataSource for YahooFinance {
    async fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let symbol = normalize_symbol(symbol)?;
        let query = [
            ("period1", unix_midnight(start).to_string()),
            // period2 is exclusive
            ("period2", unix_midnight(end + Days::new(1)).to_string()),
            ("interval", "1d".to_string()),
            ("includePrePost", "false".to_string()),
        ];

        let result = self.chart(&symbol, &query).await?;
        let series = chart_to_series(&symbol, &result)?;

        tracing::debug!(
            symbol = %symbol,
            points = series.len(),
            %start,
            %end,
            "fetched daily history"
        );
        Ok(series)
    }

    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot> {
        let symbol = normalize_symbol(symbol)?;
        let query = [("range", "5d".to_string()), ("interval", "1d".to_string())];

        let result = self.chart(&symbol, &query).await?;
        Ok(chart_to_quote(&symbol, &result))
    }

    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let symbol = normalize_symbol(symbol)?;
        let query = [
            ("q", symbol.clone()),
            ("quotesCount", "0".to_string()),
            ("newsCount", limit.to_string()),
        ];

        let response: SearchResponse = self.get_json(&symbol, "v1/finance/search", &query).await?;
        Ok(search_to_news(response, limit))
    }

    async fn health_check(&self) -> bool {
        let query = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        self.chart(HEALTH_SYMBOL, &query).await.is_ok()
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<u64>,
    /// Exchange offset from UTC in seconds
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    title: Option<String>,
    publisher: Option<String>,
    link: Option<String>,
    provider_publish_time: Option<i64>,
    summary: Option<String>,
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    resolutions: Vec<Resolution>,
}

#[derive(Debug, Deserialize)]
struct Resolution {
    url: Option<String>,
    width: Option<u32>,
}

/// Malformed payloads are provider faults, reported like any failed fetch
fn decode<T: DeserializeOwned>(symbol: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| AnalysisError::fetch(symbol, format!("parse error: {e}")))
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Exchange-local calendar date of a bar timestamp. Sessions east of UTC
/// open before midnight UTC, so the UTC date would be a day early.
fn session_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts.checked_add(gmtoffset)?, 0).map(|dt| dt.date_naive())
}

fn first_chart_result(symbol: &str, response: ChartResponse) -> Result<ChartResult> {
    if let Some(error) = response.chart.error {
        return Err(AnalysisError::fetch(
            symbol,
            format!(
                "{}: {}",
                error.code.as_deref().unwrap_or("error"),
                error.description.as_deref().unwrap_or("no description")
            ),
        ));
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| AnalysisError::fetch(symbol, "empty chart result"))
}

fn quote_columns(result: &ChartResult) -> Option<&QuoteColumns> {
    result.indicators.as_ref().and_then(|i| i.quote.first())
}

fn chart_to_series(symbol: &str, result: &ChartResult) -> Result<PriceSeries> {
    let timestamps = result.timestamp.as_deref().unwrap_or_default();
    if timestamps.is_empty() {
        return Err(AnalysisError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let empty = QuoteColumns::default();
    let columns = quote_columns(result).unwrap_or(&empty);
    let offset = result.meta.gmtoffset.unwrap_or(0);

    let points = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let timestamp = session_date(ts, offset)?.and_time(NaiveTime::MIN).and_utc();
            let close = columns.close.get(i).copied().flatten();
            let volume = columns.volume.get(i).copied().flatten();
            Some(PricePoint {
                timestamp,
                close,
                volume,
            })
        })
        .collect();

    Ok(PriceSeries::new(symbol, points))
}

fn chart_to_quote(symbol: &str, result: &ChartResult) -> QuoteSnapshot {
    let meta = &result.meta;
    let columns = quote_columns(result);

    let closes: Vec<f64> = columns
        .map(|c| c.close.iter().flatten().copied().collect())
        .unwrap_or_default();

    // Second-to-last session close; meta.previousClose is not always present
    let previous_close = closes
        .len()
        .checked_sub(2)
        .map(|i| closes[i])
        .or(meta.previous_close);

    QuoteSnapshot {
        symbol: meta.symbol.clone().unwrap_or_else(|| symbol.to_string()),
        short_name: meta.short_name.clone().or_else(|| meta.long_name.clone()),
        currency: meta.currency.clone(),
        price: meta.regular_market_price.or_else(|| closes.last().copied()),
        previous_close,
        open: columns.and_then(|c| c.open.iter().rev().find_map(|o| *o)),
        day_low: meta.regular_market_day_low,
        day_high: meta.regular_market_day_high,
        volume: meta.regular_market_volume,
        market_cap: None,
        trailing_pe: None,
    }
}

fn search_to_news(response: SearchResponse, limit: usize) -> Vec<NewsItem> {
    response
        .news
        .into_iter()
        .filter_map(|item| {
            let title = item.title.filter(|t| !t.trim().is_empty())?;
            let thumbnail_url = item.thumbnail.and_then(|t| {
                t.resolutions
                    .into_iter()
                    .max_by_key(|r| r.width.unwrap_or(0))
                    .and_then(|r| r.url)
            });

            Some(NewsItem {
                title,
                summary: item.summary,
                publisher: item.publisher,
                link: item.link,
                published_at: item
                    .provider_publish_time
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
                thumbnail_url,
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "AAPL",
                    "currency": "USD",
                    "longName": "Apple Inc.",
                    "regularMarketPrice": 190.5,
                    "regularMarketDayHigh": 191.0,
                    "regularMarketDayLow": 187.25,
                    "regularMarketVolume": 51000000
                },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, 184.22, null],
                        "close": [185.64, null, 190.5],
                        "volume": [82488700, 58414500, 71983600]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    fn parse_chart(json: &str) -> Result<ChartResult> {
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        first_chart_result("AAPL", response)
    }

    #[test]
    fn test_chart_to_series_keeps_holes() {
        let result = parse_chart(CHART).unwrap();
        let series = chart_to_series("AAPL", &result).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.valid_len(), 2);
        assert_eq!(series.points()[1].close, None);
        assert_eq!(series.points()[0].volume, Some(82_488_700));
        assert_eq!(series.points()[0].date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_series_dated_in_exchange_time() {
        // ASX bar opening 10:00 AEDT on 2024-01-04, i.e. 23:00 UTC the day before
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "BHP.AX", "gmtoffset": 39600},
                    "timestamp": [1704322800],
                    "indicators": {"quote": [{"close": [45.1], "volume": [100]}]}
                }],
                "error": null
            }
        }"#;
        let result = parse_chart(json).unwrap();
        let series = chart_to_series("BHP-AX", &result).unwrap();

        assert_eq!(series.points()[0].date(), NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(session_date(1_704_322_800, 0), NaiveDate::from_ymd_opt(2024, 1, 3));
    }

    #[test]
    fn test_chart_to_quote() {
        let result = parse_chart(CHART).unwrap();
        let quote = chart_to_quote("AAPL", &result);

        assert_eq!(quote.short_name.as_deref(), Some("Apple Inc."));
        assert_eq!(quote.price, Some(190.5));
        // Null close skipped when locating the prior session
        assert_eq!(quote.previous_close, Some(185.64));
        assert_eq!(quote.open, Some(184.22));
        assert_eq!(quote.market_cap, None);
    }

    #[test]
    fn test_chart_error_is_fetch_failure() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;
        let err = parse_chart(json).unwrap_err();

        assert!(matches!(err, AnalysisError::Fetch { .. }));
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_chart_without_timestamps_is_no_data() {
        let json = r#"{"chart": {"result": [{"meta": {"symbol": "DEAD"}}], "error": null}}"#;
        let result = parse_chart(json).unwrap();

        assert!(matches!(
            chart_to_series("DEAD", &result),
            Err(AnalysisError::NoData { .. })
        ));
    }

    #[test]
    fn test_search_to_news() {
        let json = r#"{
            "news": [
                {
                    "title": "Apple unveils new product",
                    "publisher": "Reuters",
                    "link": "https://example.com/a",
                    "providerPublishTime": 1704205800,
                    "thumbnail": {"resolutions": [
                        {"url": "https://img/small.jpg", "width": 140},
                        {"url": "https://img/large.jpg", "width": 1200}
                    ]}
                },
                {"title": "  ", "publisher": "Blank"},
                {"title": "Second story"},
                {"title": "Third story"}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let news = search_to_news(response, 2);

        assert_eq!(news.len(), 2);
        assert_eq!(news[0].publisher.as_deref(), Some("Reuters"));
        assert_eq!(news[0].thumbnail_url.as_deref(), Some("https://img/large.jpg"));
        assert!(news[0].published_at.is_some());
        assert_eq!(news[1].title, "Second story");
        assert!(news[1].link.is_none());
    }

    #[test]
    fn test_malformed_payload_is_fetch_failure() {
        let err = decode::<ChartResponse>("AAPL", "<html>rate limited</html>").unwrap_err();

        assert!(matches!(err, AnalysisError::Fetch { ref symbol, .. } if symbol == "AAPL"));
        assert!(err.is_upstream());
        assert!(err.user_message().contains("No price history found for 'AAPL'"));

        let wrong_shape = decode::<ChartResponse>("AAPL", r#"{"chart": 42}"#);
        assert!(matches!(wrong_shape, Err(AnalysisError::Fetch { .. })));
    }

    #[test]
    fn test_unix_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(unix_midnight(date), 1_704_153_600);
    }
}
