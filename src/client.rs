//! HTTP client for the SolarEdge monitoring API
//!
//! Every call is one authenticated GET whose JSON body wraps the payload in
//! a single-key envelope. No retries, no backoff: failures go straight back
//! to the caller.

use crate::error::{Result, SolarEdgeError};
use crate::logging::{StructuredLogger, get_logger};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Public monitoring API origin
pub const DEFAULT_BASE_URL: &str = "https://monitoringapi.solaredge.com";

/// Applied to every request unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// Longest body excerpt carried in an HTTP error
const ERROR_BODY_LIMIT: usize = 200;

/// Account-level client: API key, base URL and the connection pool
#[derive(Clone)]
pub struct SolarEdgeClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
    logger: StructuredLogger,
}

impl std::fmt::Debug for SolarEdgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolarEdgeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SolarEdgeClient {
    /// Client against the public API with the default timeout
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> SolarEdgeClientBuilder {
        SolarEdgeClientBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scope this client to one site
    pub fn site(&self, site_id: impl Into<String>) -> crate::site::SiteClient {
        crate::site::SiteClient::new(self.clone(), site_id.into())
    }

    /// GET `{base}{path}` with `api_key` appended and unwrap `envelope`
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        envelope: &str,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut query: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        query.push(("api_key", self.api_key.as_str()));

        self.logger.debug(&format!("GET {url}"));
        let resp = self.http.get(&url).query(&query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            self.logger
                .warn(&format!("GET {url} answered with status {status}"));
            return Err(SolarEdgeError::http(status.as_u16(), excerpt(&body)));
        }

        unwrap_envelope(&body, envelope)
    }
}

/// Builder for [`SolarEdgeClient`]
#[derive(Debug, Clone)]
pub struct SolarEdgeClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl SolarEdgeClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SolarEdgeClient> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SolarEdgeError::config("base URL cannot be empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("solaredge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(SolarEdgeClient {
            api_key: self.api_key,
            base_url,
            http,
            logger: get_logger("client"),
        })
    }
}

/// Decode `body` as `{"<key>": payload}` and return the payload
pub fn unwrap_envelope<T: DeserializeOwned>(body: &str, key: &str) -> Result<T> {
    let mut outer: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)?;
    let inner = outer.remove(key).ok_or_else(|| {
        let found: Vec<&str> = outer.keys().map(String::as_str).collect();
        SolarEdgeError::decode(format!(
            "missing envelope key {key:?} (found {found:?})"
        ))
    })?;
    serde_json::from_value(inner)
        .map_err(|e| SolarEdgeError::decode(format!("cannot decode {key:?}: {e}")))
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_LIMIT {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
    cut.push('…');
    cut
}
