//! Short-lived access token handling
//!
//! The API hands out access tokens in exchange for the long-lived refresh
//! token. A token is reused for 12 hours after it was obtained.

use crate::clock::Clock;
use crate::error::{EloverblikError, Result};
use crate::logging::get_logger;
use crate::transport::{HttpRequest, Transport};
use chrono::{DateTime, Duration, Local};

/// How long an access token is trusted after it was obtained
pub const TOKEN_VALIDITY_HOURS: i64 = 12;

/// An access token and the moment it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub acquired_at: DateTime<Local>,
}

impl AccessToken {
    pub fn is_valid_at(&self, now: DateTime<Local>, validity: Duration) -> bool {
        now - self.acquired_at < validity
    }
}

/// Holds at most one access token; renewal replaces it wholesale
#[derive(Debug)]
pub struct TokenCache {
    token: Option<AccessToken>,
    validity: Duration,
    logger: crate::logging::StructuredLogger,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Duration::hours(TOKEN_VALIDITY_HOURS))
    }
}

impl TokenCache {
    pub fn new(validity: Duration) -> Self {
        Self {
            token: None,
            validity,
            logger: get_logger("token"),
        }
    }

    /// Cached token, if still valid at `now`
    pub fn cached(&self, now: DateTime<Local>) -> Option<&AccessToken> {
        self.token
            .as_ref()
            .filter(|t| t.is_valid_at(now, self.validity))
    }

    pub fn store(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    pub fn clear(&mut self) {
        self.token = None;
    }

    /// Return a valid access token, exchanging the refresh token at
    /// `token_url` when the cached one is missing or expired.
    ///
    /// A non-2xx answer from the token endpoint is fatal.
    pub async fn get_access_token(
        &mut self,
        transport: &dyn Transport,
        clock: &dyn Clock,
        token_url: &str,
        refresh_token: &str,
    ) -> Result<String> {
        let now = clock.now();
        if let Some(token) = self.cached(now) {
            self.logger.debug("Found valid token in cache.");
            return Ok(token.value.clone());
        }

        let resp = transport
            .send(HttpRequest::get(token_url).with_bearer(refresh_token))
            .await?;
        if !resp.is_success() {
            self.clear();
            self.logger
                .error(&format!("Token exchange failed with status {}", resp.status));
            return Err(EloverblikError::auth(format!(
                "token endpoint returned {}: {}",
                resp.status, resp.body
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&resp.body)?;
        let value = body
            .get("result")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EloverblikError::api("token response has no 'result' field"))?
            .to_string();

        self.logger
            .debug(&format!("Got short lived token: {}", redact(&value)));
        self.store(AccessToken {
            value: value.clone(),
            acquired_at: clock.now(),
        });
        Ok(value)
    }
}

/// First few characters of a secret, for logs
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{}…", prefix)
}
