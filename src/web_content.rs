use dom_smoothie::{Config as ReadabilityConfig, Readability, TextMode};
use futures::future::BoxFuture;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::WebContentConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("URL request timed out")]
    Timeout,
    #[error("failed to access URL: HTTP {0}")]
    HttpStatus(u16),
    #[error("page content too short: {length} characters (minimum {minimum})")]
    TooShort { length: usize, minimum: usize },
    #[error("failed to fetch content from URL: {0}")]
    Other(String),
}

impl ExtractionError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            ExtractionError::Timeout => "timeout",
            ExtractionError::HttpStatus(_) => "http_error",
            ExtractionError::TooShort { .. } => "too_short",
            ExtractionError::Other(_) => "other",
        }
    }
}

/// Reduces a web page to plain analyzable text.
pub trait ContentExtractor: Send + Sync {
    fn extract<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ExtractionError>>;
}

pub struct WebContentFetcher {
    client: Client,
    config: WebContentConfig,
}

impl WebContentFetcher {
    pub fn new(client: Client, config: WebContentConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch(&self, raw_url: &str) -> Result<String, ExtractionError> {
        let url = match Url::parse(raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return Err(ExtractionError::Other(format!(
                    "unsupported scheme {}",
                    url.scheme()
                )))
            }
            Err(err) => return Err(ExtractionError::Other(format!("invalid url: {err}"))),
        };

        info!(target: "web", url = %url, "fetching page");
        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.fetch_timeout)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "web", url = %url, status = status.as_u16(), "page request rejected");
            return Err(ExtractionError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| transport_error(&url, err))?;

        let text = self.reduce(&body, &url)?;
        let length = text.chars().count();
        if length < self.config.min_content_length {
            warn!(target: "web", url = %url, length, "page content too short");
            return Err(ExtractionError::TooShort {
                length,
                minimum: self.config.min_content_length,
            });
        }

        info!(target: "web", url = %url, length, "page content extracted");
        Ok(text)
    }

    fn reduce(&self, body: &str, url: &Url) -> Result<String, ExtractionError> {
        let smoothie_cfg = ReadabilityConfig {
            text_mode: TextMode::Formatted,
            ..Default::default()
        };

        let mut readability = Readability::new(body, Some(url.as_str()), Some(smoothie_cfg))
            .map_err(|err| {
                warn!(target: "web", error = %err, url = %url, "Readability init failed");
                ExtractionError::Other(format!("unreadable page: {err}"))
            })?;

        let article = match readability.parse() {
            Ok(article) => article,
            Err(err) => {
                warn!(target: "web", error = %err, url = %url, "no readable content found");
                return Err(ExtractionError::TooShort {
                    length: 0,
                    minimum: self.config.min_content_length,
                });
            }
        };

        let raw_text = article.text_content.to_string();
        let text = collapse_whitespace(&raw_text);
        Ok(truncate_chars(text, self.config.content_max_length))
    }
}

impl ContentExtractor for WebContentFetcher {
    fn extract<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ExtractionError>> {
        Box::pin(self.fetch(url))
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> ExtractionError {
    if err.is_timeout() {
        warn!(target: "web", url = %url, "page request timed out");
        ExtractionError::Timeout
    } else {
        warn!(target: "web", url = %url, error = %err, "page request failed");
        ExtractionError::Other(err.to_string())
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(index);
    }
    text
}
