//! Server configuration from environment variables

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use stock_advisor::market::{DEFAULT_UNIVERSE, SP500_URL};
use stock_advisor::svckit::DEFAULT_FETCH_CONCURRENCY;
use stock_advisor::translate::DEFAULT_MAX_LENGTH;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:10000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_NEWS_ITEMS: usize = 10;
const DEFAULT_MAX_MARKET_SYMBOLS: usize = 503;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// Where prices, quotes and news come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Yahoo,
    Mock,
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "mock" => Ok(Self::Mock),
            other => Err(format!("expected 'yahoo' or 'mock', got '{other}'")),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yahoo => write!(f, "yahoo"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub data_source: DataSource,
    pub yahoo_base_url: Option<String>,
    pub http_timeout: Duration,
    pub max_news_items: usize,
    pub max_market_symbols: usize,
    /// Explicit market universe; the live S&P 500 list when `None`
    pub market_symbols: Option<Vec<String>>,
    pub sp500_url: String,
    pub fetch_concurrency: usize,
    /// Enables headline translation when set
    pub translate_target: Option<String>,
    pub translation_max_length: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 10000)),
            log_level: "info".into(),
            data_source: DataSource::Yahoo,
            yahoo_base_url: None,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_news_items: DEFAULT_MAX_NEWS_ITEMS,
            max_market_symbols: DEFAULT_MAX_MARKET_SYMBOLS,
            market_symbols: None,
            sp500_url: SP500_URL.into(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            translate_target: None,
            translation_max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl BotConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = match (get("BIND_ADDR"), get("PORT")) {
            (Some(addr), _) => parse("BIND_ADDR", &addr)?,
            (None, Some(port)) => {
                let port: u16 = parse("PORT", &port)?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => parse("BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };

        let config = Self {
            bind_addr,
            log_level: get("LOG_LEVEL").map_or_else(|| "info".into(), |l| l.to_lowercase()),
            data_source: get("DATA_SOURCE")
                .map(|s| parse("DATA_SOURCE", &s))
                .transpose()?
                .unwrap_or(DataSource::Yahoo),
            yahoo_base_url: get("YAHOO_BASE_URL"),
            http_timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_news_items: parse_or(
                get("MAX_NEWS_ITEMS"),
                "MAX_NEWS_ITEMS",
                DEFAULT_MAX_NEWS_ITEMS,
            )?,
            max_market_symbols: parse_or(
                get("MAX_MARKET_SYMBOLS"),
                "MAX_MARKET_SYMBOLS",
                DEFAULT_MAX_MARKET_SYMBOLS,
            )?,
            market_symbols: get("MARKET_SYMBOLS").map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }),
            sp500_url: get("SP500_URL").unwrap_or_else(|| SP500_URL.into()),
            fetch_concurrency: parse_or(
                get("MARKET_FETCH_CONCURRENCY"),
                "MARKET_FETCH_CONCURRENCY",
                DEFAULT_FETCH_CONCURRENCY,
            )?,
            translate_target: get("TRANSLATE_TARGET"),
            translation_max_length: parse_or(
                get("TRANSLATION_MAX_LENGTH"),
                "TRANSLATION_MAX_LENGTH",
                DEFAULT_MAX_LENGTH,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the commands cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("HTTP_TIMEOUT_SECS", self.http_timeout.as_secs(), 1, 300)?;
        check_range("MAX_NEWS_ITEMS", as_u64(self.max_news_items), 1, 10)?;
        check_range("MAX_MARKET_SYMBOLS", as_u64(self.max_market_symbols), 1, 5000)?;
        check_range("MARKET_FETCH_CONCURRENCY", as_u64(self.fetch_concurrency), 1, 64)?;
        check_range(
            "TRANSLATION_MAX_LENGTH",
            as_u64(self.translation_max_length),
            1,
            5000,
        )?;

        if let Some(symbols) = &self.market_symbols {
            if symbols.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "MARKET_SYMBOLS",
                    value: String::new(),
                    reason: "no symbols listed".into(),
                });
            }
        }
        if let Some(url) = &self.yahoo_base_url {
            check_url("YAHOO_BASE_URL", url)?;
        }
        check_url("SP500_URL", &self.sp500_url)
    }

    /// Whether the market overview scans the live S&P 500 list
    pub fn uses_live_universe(&self) -> bool {
        self.market_symbols.is_none() && self.data_source == DataSource::Yahoo
    }

    /// Upper bound on the symbols the market overview will scan
    pub fn universe_size(&self) -> usize {
        self.market_symbols
            .as_ref()
            .map_or_else(
                || {
                    if self.uses_live_universe() {
                        self.max_market_symbols
                    } else {
                        DEFAULT_UNIVERSE.len()
                    }
                },
                Vec::len,
            )
            .min(self.max_market_symbols)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.map_or(Ok(default), |v| parse(key, &v))
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            min,
            max,
        })
    }
}

fn check_url(key: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            value: url.to_string(),
            reason: "must be an http(s) URL".into(),
        })
    }
}

fn as_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:10000");
        assert_eq!(config.data_source, DataSource::Yahoo);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.max_news_items, 10);
        assert_eq!(config.max_market_symbols, 503);
        assert!(config.translate_target.is_none());
        assert_eq!(config.sp500_url, SP500_URL);
        assert!(config.uses_live_universe());
        assert_eq!(config.universe_size(), 503);
    }

    #[test]
    fn test_universe_selection() {
        let mock = load(&[("DATA_SOURCE", "mock")]).unwrap();
        assert!(!mock.uses_live_universe());
        assert_eq!(mock.universe_size(), DEFAULT_UNIVERSE.len());

        let listed = load(&[("MARKET_SYMBOLS", "AAPL,KO")]).unwrap();
        assert!(!listed.uses_live_universe());
        assert_eq!(listed.universe_size(), 2);

        assert!(load(&[("SP500_URL", "file:///tmp/sp500.html")]).is_err());
    }

    #[test]
    fn test_port_fallback() {
        let config = load(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);

        let config = load(&[("PORT", "8080"), ("BIND_ADDR", "127.0.0.1:9000")]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATA_SOURCE", "Mock"),
            ("LOG_LEVEL", "DEBUG"),
            ("MARKET_SYMBOLS", "aapl, msft,,ko"),
            ("MAX_MARKET_SYMBOLS", "2"),
            ("TRANSLATE_TARGET", "th"),
            ("TRANSLATION_MAX_LENGTH", ""),
        ])
        .unwrap();

        assert_eq!(config.data_source, DataSource::Mock);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.market_symbols.as_deref().unwrap().len(), 3);
        assert_eq!(config.universe_size(), 2);
        assert_eq!(config.translate_target.as_deref(), Some("th"));
        assert_eq!(config.translation_max_length, DEFAULT_MAX_LENGTH);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("DATA_SOURCE", "bloomberg")]),
            Err(ConfigError::Invalid { key: "DATA_SOURCE", .. })
        ));
        assert!(matches!(
            load(&[("HTTP_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[("MAX_NEWS_ITEMS", "25")]),
            Err(ConfigError::OutOfRange { key: "MAX_NEWS_ITEMS", .. })
        ));
        assert!(load(&[("MARKET_FETCH_CONCURRENCY", "0")]).is_err());
        assert!(load(&[("YAHOO_BASE_URL", "ftp://example.com")]).is_err());
        assert!(load(&[("MARKET_SYMBOLS", " , ,")]).is_err());
    }
}
