//! Client for the Known Agents HTTP API.
//!
//! The middleware only talks to the API through [`AgentsApi`], so tests can
//! swap in a capturing double for the real [`HttpAgentsApi`].

use std::time::Duration;

use bytes::Bytes;

use crate::error::ApiError;
use crate::settings::RobotsPolicy;
use crate::visit::VisitEvent;

/// Base address of the Known Agents API.
pub const DEFAULT_API_BASE: &str = "https://api.knownagents.com";

/// Path of the agent analytics endpoint, relative to the API base.
pub const VISITS_PATH: &str = "/visits";

/// Path of the robots.txt generation endpoint, relative to the API base.
pub const ROBOTS_TXTS_PATH: &str = "/robots-txts";

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REPORT_TIMEOUT_MS: u64 = 5_000;

/// Outbound operations the middleware needs.
#[async_trait::async_trait]
pub trait AgentsApi: Send + Sync {
    /// Ask the API for a robots.txt blocking `policy`. Returns the raw body.
    async fn generate_robots_txt(&self, policy: &RobotsPolicy) -> Result<Bytes, ApiError>;

    /// Record one visit event. Returns the response status on delivery.
    async fn record_visit(&self, event: &VisitEvent) -> Result<u16, ApiError>;
}

#[derive(Clone, Debug)]
pub struct ApiOptions {
    pub base_url: String,
    pub fetch_timeout: Duration,
    pub report_timeout: Duration,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            report_timeout: Duration::from_millis(DEFAULT_REPORT_TIMEOUT_MS),
        }
    }
}

/// `reqwest` implementation authenticating with a bearer token.
pub struct HttpAgentsApi {
    client: reqwest::Client,
    access_token: String,
    visits_url: String,
    robots_txts_url: String,
    options: ApiOptions,
}

impl HttpAgentsApi {
    pub fn new(access_token: impl Into<String>, options: ApiOptions) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build()?;
        let base = options.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            access_token: access_token.into(),
            visits_url: format!("{}{}", base, VISITS_PATH),
            robots_txts_url: format!("{}{}", base, ROBOTS_TXTS_PATH),
            options,
        })
    }

    pub fn visits_url(&self) -> &str {
        &self.visits_url
    }

    pub fn robots_txts_url(&self) -> &str {
        &self.robots_txts_url
    }

    fn post(&self, url: &str, timeout: Duration) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .timeout(timeout)
            .bearer_auth(&self.access_token)
            .header("content-type", "application/json")
    }
}

#[async_trait::async_trait]
impl AgentsApi for HttpAgentsApi {
    async fn generate_robots_txt(&self, policy: &RobotsPolicy) -> Result<Bytes, ApiError> {
        let query = serde_json::to_vec(policy)?;
        tracing::debug!(payload = %String::from_utf8_lossy(&query), "robots.txt query payload constructed");

        let resp = self
            .post(&self.robots_txts_url, self.options.fetch_timeout)
            .body(query)
            .send()
            .await?;
        let status = resp.status();
        tracing::debug!(status = status.as_u16(), "robots.txt query sent");
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: self.robots_txts_url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes().await?)
    }

    async fn record_visit(&self, event: &VisitEvent) -> Result<u16, ApiError> {
        let body = serde_json::to_vec(event)?;
        tracing::trace!(payload = %String::from_utf8_lossy(&body), "visit event payload constructed");

        let resp = self
            .post(&self.visits_url, self.options.report_timeout)
            .body(body)
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }
}
