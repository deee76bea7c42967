//! The grant broker protocol client.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{GrantError, GrantResult};
use crate::grant::{Grant, NewGrantRequest, select_reusable};

/// Protocol client to the external authorization broker.
///
/// Implementations talk to the broker over whatever transport they like;
/// the orchestrator only depends on this trait, which keeps the approval
/// flow testable with in-memory fakes.
#[async_trait]
pub trait GrantBroker: Send + Sync {
    /// Create a pending grant on the broker.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::BrokerUnavailable`] on any transport failure or
    /// non-success response.
    async fn request_grant(&self, request: &NewGrantRequest) -> GrantResult<Grant>;

    /// Fetch the current snapshot of a grant by id.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::BrokerUnavailable`] on any transport failure or
    /// non-success response.
    async fn fetch_grant(&self, grant_id: &str) -> GrantResult<Grant>;

    /// Search the requester's approved grants for one that covers this
    /// request under the strict reuse rules (not `once`, unexpired, exact
    /// target, full permission coverage).
    ///
    /// Broker errors degrade to `None`: an unreachable broker must force a
    /// fresh approval, never silently authorize.
    async fn find_reusable_grant(
        &self,
        requester: &str,
        target: &str,
        permissions: &[String],
    ) -> Option<Grant>;

    /// Poll a grant at a fixed interval until its status is terminal or the
    /// deadline passes. One fetch per tick; a fetch error aborts the wait.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::Timeout`] once `timeout` elapses with the grant
    /// still pending, or the underlying [`GrantError::BrokerUnavailable`]
    /// from a failed fetch.
    async fn poll_until_terminal(
        &self,
        grant_id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> GrantResult<Grant> {
        let wait = async {
            loop {
                let grant = self.fetch_grant(grant_id).await?;
                if grant.status.is_terminal() {
                    return Ok(grant);
                }
                debug!(grant_id, "grant still pending");
                tokio::time::sleep(interval).await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_elapsed) => Err(GrantError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// [`GrantBroker`] over the broker's HTTP API.
///
/// Endpoints, relative to the configured broker base URL:
/// `POST /api/grants`, `GET /api/grants/{id}`, and
/// `GET /api/grants?requester=&status=approved`. An optional bearer token,
/// set once at startup, authenticates every call.
pub struct HttpGrantBroker {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpGrantBroker {
    /// Create a client for the broker at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attach a bearer token sent on every broker call.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn grants_url(&self) -> String {
        format!("{}/api/grants", self.base_url)
    }
}

impl std::fmt::Debug for HttpGrantBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGrantBroker")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GrantBroker for HttpGrantBroker {
    async fn request_grant(&self, request: &NewGrantRequest) -> GrantResult<Grant> {
        let response = self
            .authorize(self.client.post(self.grants_url()))
            .json(request)
            .send()
            .await
            .map_err(|e| GrantError::BrokerUnavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GrantError::BrokerUnavailable {
                reason: format!("grant request failed: {status} {body}"),
            });
        }

        response
            .json::<Grant>()
            .await
            .map_err(|e| GrantError::BrokerUnavailable {
                reason: format!("malformed grant response: {e}"),
            })
    }

    async fn fetch_grant(&self, grant_id: &str) -> GrantResult<Grant> {
        let url = format!("{}/{grant_id}", self.grants_url());
        let response =
            self.authorize(self.client.get(url))
                .send()
                .await
                .map_err(|e| GrantError::BrokerUnavailable {
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GrantError::BrokerUnavailable {
                reason: format!("grant poll failed: {status}"),
            });
        }

        response
            .json::<Grant>()
            .await
            .map_err(|e| GrantError::BrokerUnavailable {
                reason: format!("malformed grant response: {e}"),
            })
    }

    async fn find_reusable_grant(
        &self,
        requester: &str,
        target: &str,
        permissions: &[String],
    ) -> Option<Grant> {
        let response = match self
            .authorize(self.client.get(self.grants_url()))
            .query(&[("requester", requester), ("status", "approved")])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "grant lookup failed; requiring fresh approval");
                return None;
            },
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "grant lookup rejected; requiring fresh approval");
            return None;
        }

        let grants: Vec<Grant> = match response.json().await {
            Ok(grants) => grants,
            Err(e) => {
                warn!(error = %e, "malformed grant list; requiring fresh approval");
                return None;
            },
        };

        // Filter locally: the broker query narrows by requester and status,
        // everything security-relevant is re-checked here.
        select_reusable(&grants, target, permissions, Utc::now().timestamp()).cloned()
    }
}
