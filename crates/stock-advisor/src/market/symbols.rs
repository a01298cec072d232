//! Market Universe
//!
//! Symbol lists scanned by the market overview: a fixed list, or the live
//! S&P 500 constituents table from Wikipedia.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use super::normalize_symbol;
use crate::error::{AnalysisError, Result};

pub const SP500_URL: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";

const SP500_LABEL: &str = "S&P 500";

/// Large-cap S&P 500 constituents used when no list is configured
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "GOOG", "META", "BRK.B", "TSLA", "AVGO",
    "LLY", "JPM", "V", "UNH", "XOM", "MA", "JNJ", "PG", "HD", "COST", "MRK", "ABBV",
    "CVX", "CRM", "KO", "PEP", "BAC", "ADBE", "WMT", "NFLX", "AMD", "TMO", "MCD",
    "CSCO", "ACN", "ABT", "LIN", "ORCL", "DHR", "INTC", "DIS", "WFC", "CMCSA", "VZ",
    "TXN", "PFE", "NKE", "INTU", "AMGN", "QCOM", "PM", "IBM", "UNP", "CAT", "GE",
    "HON", "LOW", "SPGI", "BA", "GS",
];

/// Source of the symbols to scan
#[async_trait]
pub trait SymbolSource: Send + Sync {
    async fn symbols(&self) -> Result<Vec<String>>;
}

/// Fixed symbol list
#[derive(Clone, Debug)]
pub struct StaticSymbols {
    symbols: Vec<String>,
}

impl StaticSymbols {
    /// Normalized, de-duplicated list truncated to `cap`. Entries that are
    /// not valid tickers are dropped.
    pub fn new<I, S>(symbols: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for symbol in symbols {
            if list.len() >= cap {
                break;
            }
            match normalize_symbol(symbol.as_ref()) {
                Ok(s) if !list.contains(&s) => list.push(s),
                Ok(_) => {}
                Err(_) => tracing::warn!(symbol = symbol.as_ref(), "skipping invalid symbol"),
            }
        }

        Self { symbols: list }
    }

    /// Built-in large-cap list
    pub fn default_universe(cap: usize) -> Self {
        Self::new(DEFAULT_UNIVERSE.iter().copied(), cap)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[async_trait]
impl SymbolSource for StaticSymbols {
    async fn symbols(&self) -> Result<Vec<String>> {
        Ok(self.symbols.clone())
    }
}

/// Live S&P 500 list; falls back to the built-in universe when the page
/// cannot be fetched or parsed
pub struct WikipediaSp500 {
    client: Client,
    url: String,
    cap: usize,
    fallback: StaticSymbols,
}

impl WikipediaSp500 {
    pub fn new(url: impl Into<String>, cap: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            cap,
            fallback: StaticSymbols::default_universe(cap),
        })
    }

    async fn fetch(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AnalysisError::fetch(SP500_LABEL, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::fetch(SP500_LABEL, format!("status {status}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AnalysisError::fetch(SP500_LABEL, e))?;

        let symbols = parse_constituents(&html);
        if symbols.is_empty() {
            return Err(AnalysisError::fetch(
                SP500_LABEL,
                "constituents table not found",
            ));
        }
        Ok(symbols)
    }
}

#[async_trait]
impl SymbolSource for WikipediaSp500 {
    async fn symbols(&self) -> Result<Vec<String>> {
        match self.fetch().await {
            Ok(raw) => {
                let list = StaticSymbols::new(raw, self.cap);
                tracing::info!(count = list.len(), "fetched S&P 500 symbols");
                Ok(list.symbols)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = self.fallback.len(),
                    "S&P 500 list unavailable, using built-in universe"
                );
                self.fallback.symbols().await
            }
        }
    }
}

/// Ticker column of the `constituents` table
fn parse_constituents(html: &str) -> Vec<String> {
    let (Ok(rows), Ok(cells)) = (
        Selector::parse("table#constituents tr"),
        Selector::parse("td"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&rows)
        .filter_map(|row| {
            let cell = row.select(&cells).next()?;
            let ticker = cell.text().collect::<String>().trim().to_string();
            (!ticker.is_empty()).then_some(ticker)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIKI_PAGE: &str = r#"
        <html><body>
        <table class="wikitable" id="constituents">
            <tbody>
                <tr><th>Symbol</th><th>Security</th><th>GICS Sector</th></tr>
                <tr><td><a href="/nyse/mmm">MMM</a></td><td>3M</td><td>Industrials</td></tr>
                <tr><td><a href="/nasdaq/aapl">AAPL</a>
                    </td><td>Apple Inc.</td><td>Information Technology</td></tr>
                <tr><td>BRK.B</td><td>Berkshire Hathaway</td><td>Financials</td></tr>
                <tr><td>BF.B</td><td>Brown-Forman</td><td>Consumer Staples</td></tr>
            </tbody>
        </table>
        <table id="changes">
            <tr><td>XYZ</td><td>Removed</td></tr>
        </table>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_static_symbols_normalized() {
        let source = StaticSymbols::new(["brk.b", "AAPL", "aapl", "", "BF.B"], 10);
        let symbols = source.symbols().await.unwrap();

        assert_eq!(symbols, vec!["BRK-B", "AAPL", "BF-B"]);
    }

    #[test]
    fn test_parse_constituents_table() {
        let symbols = parse_constituents(WIKI_PAGE);

        assert_eq!(symbols, vec!["MMM", "AAPL", "BRK.B", "BF.B"]);
        assert!(parse_constituents("<html><p>maintenance</p></html>").is_empty());
    }

    #[test]
    fn test_constituents_normalized_for_provider() {
        let list = StaticSymbols::new(parse_constituents(WIKI_PAGE), 3);
        assert_eq!(list.symbols, vec!["MMM", "AAPL", "BRK-B"]);
    }

    #[tokio::test]
    async fn test_unreachable_page_falls_back() {
        let source =
            WikipediaSp500::new("http://127.0.0.1:9/sp500", 7, Duration::from_secs(2)).unwrap();
        let symbols = source.symbols().await.unwrap();

        assert_eq!(symbols.len(), 7);
        assert_eq!(symbols[0], "AAPL");
    }

    #[test]
    fn test_cap_applies() {
        assert_eq!(StaticSymbols::default_universe(5).len(), 5);
        assert_eq!(
            StaticSymbols::default_universe(10_000).len(),
            DEFAULT_UNIVERSE.len()
        );
        assert!(StaticSymbols::new(["AAPL"], 0).is_empty());
    }
}
