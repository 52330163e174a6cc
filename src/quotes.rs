use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::QuotesConfig;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to fetch quote: {status} - {message}")]
    Upstream { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct RandomQuote {
    value: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: Option<String>,
}

pub struct QuoteClient {
    client: Client,
    api_url: String,
}

impl QuoteClient {
    pub fn new(config: &QuotesConfig) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    pub async fn random_quote(&self) -> Result<String, QuoteError> {
        debug!("fetching quote from {}", self.api_url);

        let response = self.client.get(&self.api_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = upstream_error(status, &body);
            warn!("quote upstream rejected request: {}", err);
            return Err(err);
        }

        let quote: RandomQuote = response.json().await?;
        Ok(quote.value)
    }
}

/// Prefers the upstream's own `message`, then the status reason phrase.
fn upstream_error(status: StatusCode, body: &str) -> QuoteError {
    let message = serde_json::from_str::<UpstreamError>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

    QuoteError::Upstream {
        status: status.as_u16(),
        message,
    }
}
