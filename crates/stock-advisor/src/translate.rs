//! Headline Translation
//!
//! Translation is best-effort: a failed or empty translation yields the
//! input text unchanged, so callers never branch on errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::Result;

pub const DEFAULT_MAX_LENGTH: usize = 5_000;

const GTX_URL: &str = "https://translate.googleapis.com/translate_a/single";

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`, returning it unchanged on failure
    async fn translate(&self, text: &str) -> String;

    /// Target language code, `None` when no translation happens
    fn target(&self) -> Option<&str>;
}

/// Identity translator
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

#[async_trait]
impl Translator for Passthrough {
    async fn translate(&self, text: &str) -> String {
        text.to_string()
    }

    fn target(&self) -> Option<&str> {
        None
    }
}

/// Google Translate public endpoint (client=gtx)
pub struct GoogleTranslator {
    client: Client,
    source: String,
    target: String,
    max_length: usize,
}

impl GoogleTranslator {
    pub fn new(target: impl Into<String>, max_length: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            source: "auto".to_string(),
            target: target.into(),
            max_length,
        })
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    async fn request(&self, text: &str) -> Result<Option<String>> {
        let query = [
            ("client", "gtx"),
            ("sl", self.source.as_str()),
            ("tl", self.target.as_str()),
            ("dt", "t"),
            ("q", text),
        ];

        let body: Value = self
            .client
            .get(GTX_URL)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_gtx(&body))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let input = truncate_chars(text, self.max_length);
        if input.len() < text.len() {
            tracing::warn!(
                chars = text.chars().count(),
                max = self.max_length,
                "text too long, truncating before translation"
            );
        }

        match self.request(input).await {
            Ok(Some(translated)) => translated,
            Ok(None) => {
                tracing::warn!(target_lang = %self.target, "empty translation response");
                text.to_string()
            }
            Err(e) => {
                tracing::error!(error = %e, "translation failed");
                text.to_string()
            }
        }
    }

    fn target(&self) -> Option<&str> {
        Some(&self.target)
    }
}

/// Join the translated segments of a gtx response:
/// `[[["translated", "source", ...], ...], ...]`
fn parse_gtx(body: &Value) -> Option<String> {
    let translated: String = body
        .get(0)?
        .as_array()?
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    (!translated.trim().is_empty()).then_some(translated)
}

/// Prefix of at most `max` characters, cut on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_gtx_joins_segments() {
        let body = json!([
            [["สวัสดี ", "Hello ", null, null, 10], ["โลก", "world", null, null, 10]],
            null,
            "en"
        ]);
        assert_eq!(parse_gtx(&body).as_deref(), Some("สวัสดี โลก"));
    }

    #[test]
    fn test_parse_gtx_rejects_unexpected_shape() {
        assert!(parse_gtx(&json!({"error": "bad request"})).is_none());
        assert!(parse_gtx(&json!([[]])).is_none());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("สวัสดี", 2), "สว");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[tokio::test]
    async fn test_passthrough() {
        assert_eq!(Passthrough.translate("Apple beats estimates").await, "Apple beats estimates");
        assert!(Passthrough.target().is_none());
    }
}
