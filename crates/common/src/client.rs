use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config;

pub const POSITIONS_ENDPOINT: &str = "positions";
pub const POOLS_ENDPOINT: &str = "pools";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("{endpoint} returned invalid JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} reported an error: {message}")]
    Upstream {
        endpoint: &'static str,
        message: String,
    },
}

impl FetchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { source, .. } if source.is_timeout() => "timeout",
            Self::Transport { .. } => "transport",
            Self::Status { status: 429, .. } => "rate_limited",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::Upstream { .. } => "upstream",
        }
    }
}

/// HTTP client for the positions API and the yield aggregator.
///
/// Returns raw JSON; decoding into typed rows is the normalizer's job.
pub struct FeedClient {
    positions_api_url: String,
    yields_api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(api: &config::Api, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            positions_api_url: api.positions_api_url.trim_end_matches('/').to_string(),
            yields_api_url: api.yields_api_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn positions_url(&self, wallet: &str) -> String {
        let sep = if self.positions_api_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{sep}wallet={}",
            self.positions_api_url,
            urlencoding::encode(wallet.trim())
        )
    }

    pub fn pools_url(&self) -> &str {
        &self.yields_api_url
    }

    /// Raw protocol entries held by `wallet`.
    pub async fn fetch_positions(&self, wallet: &str) -> Result<Value, FetchError> {
        let url = self.positions_url(wallet);
        let mut req = self.client.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        self.get_json(POSITIONS_ENDPOINT, &url, req).await
    }

    /// Raw yield aggregator payload (`{"data": [...]}`).
    pub async fn fetch_pools(&self) -> Result<Value, FetchError> {
        let url = self.pools_url().to_string();
        let req = self.client.get(&url);
        self.get_json(POOLS_ENDPOINT, &url, req).await
    }

    async fn get_json(
        &self,
        endpoint: &'static str,
        url: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<Value, FetchError> {
        debug!(endpoint, url = %url, "fetching feed");

        let resp = req
            .send()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        let value = parse_body(endpoint, &body)?;
        debug!(endpoint, bytes = body.len(), "fetched feed");
        Ok(value)
    }
}

/// Decode a feed body, turning an `{"error": ...}` object into a [`FetchError`].
pub fn parse_body(endpoint: &'static str, body: &str) -> Result<Value, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|source| FetchError::Decode { endpoint, source })?;
    if let Some(err) = value.as_object().and_then(|m| m.get("error")) {
        if !err.is_null() {
            let message = err
                .as_str()
                .map_or_else(|| err.to_string(), str::to_string);
            return Err(FetchError::Upstream { endpoint, message });
        }
    }
    Ok(value)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
