//! HTTP transport for the customer API
//!
//! The client talks to the API through the [`Transport`] trait. The default
//! implementation uses reqwest with a fixed timeout and retries transient
//! statuses with exponential backoff.

use crate::config::ApiConfig;
use crate::error::{EloverblikError, Result};
use crate::logging::get_logger;
use crate::models::RawResponse;
use std::time::Duration;

/// Upper bound for a single backoff sleep
const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// HTTP method used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Bearer credential for the `Authorization` header
    pub bearer: Option<String>,
    /// JSON body; sent with `Content-Type: application/json`
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get<S: Into<String>>(url: S) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn post<S: Into<String>>(url: S, body: String) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            bearer: None,
            body: Some(body),
        }
    }

    pub fn with_bearer<S: Into<String>>(mut self, token: S) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Sends requests and returns the raw status and body.
///
/// Non-2xx statuses are not errors at this level; only failures to get any
/// response at all are.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse>;
}

/// When and how long to wait before retrying a request
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_config(cfg: &ApiConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            backoff_factor: Duration::try_from_secs_f64(cfg.backoff_factor_secs.max(0.0))
                .unwrap_or(BACKOFF_MAX),
            retry_statuses: cfg.retry_statuses.clone(),
        }
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Sleep before retry number `attempt` (1-based): `factor * 2^(attempt-1)`,
    /// capped at two minutes
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.backoff_factor
            .checked_mul(1u32 << exp)
            .unwrap_or(BACKOFF_MAX)
            .min(BACKOFF_MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

/// reqwest-backed transport with timeout and retry
pub struct ReqwestTransport {
    client: reqwest::Client,
    policy: RetryPolicy,
    logger: crate::logging::StructuredLogger,
}

impl ReqwestTransport {
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("eloverblik/", env!("APP_VERSION")))
            .build()?;
        Ok(Self {
            client,
            policy: RetryPolicy::from_config(cfg),
            logger: get_logger("transport"),
        })
    }

    async fn send_once(&self, request: &HttpRequest) -> std::result::Result<RawResponse, reqwest::Error> {
        use reqwest::header::{ACCEPT, CONTENT_TYPE};

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        builder = builder.header(ACCEPT, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse> {
        let mut attempt = 0u32;
        loop {
            let outcome = self.send_once(&request).await;
            let reason = match &outcome {
                Ok(resp) if self.policy.is_retryable_status(resp.status) => {
                    Some(format!("status {}", resp.status))
                }
                Ok(_) => None,
                Err(e) if is_transient(e) => Some(e.to_string()),
                Err(_) => None,
            };

            if reason.is_none() || attempt >= self.policy.max_retries {
                return outcome.map_err(EloverblikError::from);
            }

            attempt += 1;
            let delay = self.policy.backoff(attempt);
            self.logger.warn(&format!(
                "{:?} {} failed ({}), retry {}/{} in {:?}",
                request.method,
                request.url,
                reason.unwrap_or_default(),
                attempt,
                self.policy.max_retries,
                delay
            ));
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_factor: Duration::from_secs(10),
            retry_statuses: vec![503],
        };
        assert_eq!(policy.backoff(1), Duration::from_secs(10));
        assert_eq!(policy.backoff(2), Duration::from_secs(20));
        assert_eq!(policy.backoff(3), Duration::from_secs(40));
        assert_eq!(policy.backoff(5), Duration::from_secs(120));
        assert_eq!(policy.backoff(40), Duration::from_secs(120));
    }

    #[test]
    fn default_policy_matches_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff(1), Duration::from_secs(60));
        assert!(policy.is_retryable_status(429));
        assert!(policy.is_retryable_status(400));
        assert!(!policy.is_retryable_status(401));
        assert!(!policy.is_retryable_status(200));
    }

    #[test]
    fn request_builders() {
        let req = HttpRequest::post("https://example.com/x", "{}".to_string()).with_bearer("t");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.bearer.as_deref(), Some("t"));
        assert_eq!(req.body.as_deref(), Some("{}"));

        let req = HttpRequest::get("https://example.com/token");
        assert_eq!(req.method, Method::Get);
        assert!(req.body.is_none());
    }

    #[test]
    fn transport_builds_from_default_config() {
        assert!(ReqwestTransport::new(&ApiConfig::default()).is_ok());
    }
}
