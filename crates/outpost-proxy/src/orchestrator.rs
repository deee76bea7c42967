//! The per-request authorization state machine.

use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use bytes::Bytes;
use outpost_audit::{AuditAction, AuditEntry, AuditSink};
use outpost_core::{AgentIdentity, DefaultAction, GrantStatus};
use outpost_grants::{GrantBroker, NewGrantRequest, RequestFingerprint};
use outpost_policy::{CompiledGrantRule, Decision, PolicySet};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ProxyError, ProxyResult};
use crate::forward::{ForwardRequest, Forwarder};
use crate::identity::{IdentityVerifier, bearer_token};

/// Default wait budget for a blocking grant decision.
const DEFAULT_GRANT_WAIT: Duration = Duration::from_secs(300);

/// Default interval between grant status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Guidance returned for requests whose path is not a valid target URL.
const INVALID_TARGET_HELP: &str =
    "Invalid target URL. Send requests as: http://proxy:port/https://target.com/path";

/// One inbound request, decoded from the transport layer.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// HTTP method.
    pub method: Method,
    /// Inbound path without its leading `/`, plus the query string. This is
    /// the full target URL, possibly percent-encoded.
    pub target: String,
    /// Inbound headers.
    pub headers: HeaderMap,
    /// Fully buffered request body.
    pub body: Bytes,
}

/// The gateway's answer to one request.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

/// Everything one request's handling needs, resolved up front.
struct RequestContext {
    agent: AgentIdentity,
    domain: String,
    method: Method,
    path: String,
    target: Url,
    headers: HeaderMap,
    body: Bytes,
    started: Instant,
}

/// The authorization orchestrator.
///
/// Holds the read-only policy plus handles to every collaborator: the grant
/// broker, the forwarder, the identity verifier, and the audit sink. All
/// handles are injected at construction; requests share nothing mutable.
pub struct ProxyState {
    agent: AgentIdentity,
    policy: PolicySet,
    broker: Arc<dyn GrantBroker>,
    forwarder: Arc<dyn Forwarder>,
    verifier: Arc<dyn IdentityVerifier>,
    audit: Arc<dyn AuditSink>,
    grant_wait: Duration,
    poll_interval: Duration,
}

impl ProxyState {
    /// Assemble the orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        agent: AgentIdentity,
        policy: PolicySet,
        broker: Arc<dyn GrantBroker>,
        forwarder: Arc<dyn Forwarder>,
        verifier: Arc<dyn IdentityVerifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            agent,
            policy,
            broker,
            forwarder,
            verifier,
            audit,
            grant_wait: DEFAULT_GRANT_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the wait budget for blocking grant decisions.
    #[must_use]
    pub fn with_grant_wait(mut self, grant_wait: Duration) -> Self {
        self.grant_wait = grant_wait;
        self
    }

    /// Set the interval between grant status polls.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The gateway's default identity.
    #[must_use]
    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }

    /// Run one request through the decision state machine.
    ///
    /// Always produces exactly one response; every outcome except a
    /// malformed target also records exactly one audit entry.
    pub async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        let started = Instant::now();

        let target = match parse_target(&request.target) {
            Ok(target) => target,
            Err(e) => {
                debug!(raw_target = %request.target, error = %e, "rejecting unparseable target");
                return plain_response(StatusCode::BAD_REQUEST, INVALID_TARGET_HELP);
            },
        };
        // parse_target only admits http(s) URLs, which always carry a host.
        let domain = target.host_str().unwrap_or_default().to_string();
        let path = target.path().to_string();

        let agent = self.resolve_identity(&request.headers).await;
        let decision = self
            .policy
            .evaluate(&domain, request.method.as_str(), &path);

        let ctx = RequestContext {
            agent,
            domain,
            method: request.method,
            path,
            target,
            headers: request.headers,
            body: request.body,
            started,
        };

        match decision {
            Decision::Deny { reason } => {
                self.record(self.entry(&ctx, AuditAction::Deny, "deny-list"));
                plain_response(StatusCode::FORBIDDEN, format!("Blocked: {reason}"))
            },
            Decision::Allow => {
                let entry = self.entry(&ctx, AuditAction::Allow, "allow-list");
                self.forward_and_audit(ctx, entry).await
            },
            Decision::GrantRequired { rule } => self.run_grant_workflow(ctx, &rule).await,
        }
    }

    /// The grant branch: reuse, defer, or block on a fresh approval.
    async fn run_grant_workflow(
        &self,
        ctx: RequestContext,
        rule: &Arc<CompiledGrantRule>,
    ) -> ProxyResponse {
        let permissions = rule.effective_permissions(ctx.method.as_str(), &ctx.domain);
        let fingerprint =
            RequestFingerprint::compute(ctx.method.as_str(), ctx.target.as_str(), &ctx.body);

        if let Some(existing) = self
            .broker
            .find_reusable_grant(&ctx.agent.email, &ctx.domain, &permissions)
            .await
        {
            debug!(grant_id = %existing.id, domain = %ctx.domain, "reusing standing grant");
            let entry = self
                .entry(&ctx, AuditAction::GrantApproved, "standing-grant")
                .with_grant_id(&existing.id)
                .with_request_hash(fingerprint.as_str());
            return self.forward_and_audit(ctx, entry).await;
        }

        let mut request = NewGrantRequest::new(&ctx.agent.email, &ctx.domain, rule.kind())
            .with_permissions(permissions)
            .with_reason(format!("{} {}", ctx.method, ctx.target))
            .with_request_hash(fingerprint.as_str());
        if let Some(duration) = rule.duration_secs() {
            request = request.with_duration(duration);
        }

        if self.policy.default_action() == DefaultAction::RequestAsync {
            self.defer_async(&ctx, &request, &fingerprint).await
        } else {
            self.wait_for_decision(ctx, &request, &fingerprint).await
        }
    }

    /// Async-defer mode: create the grant, answer 407 with a retry token.
    async fn defer_async(
        &self,
        ctx: &RequestContext,
        request: &NewGrantRequest,
        fingerprint: &RequestFingerprint,
    ) -> ProxyResponse {
        let grant_id = match self.broker.request_grant(request).await {
            Ok(grant) => Some(grant.id),
            Err(e) => {
                warn!(error = %e, "failed to create deferred grant request");
                None
            },
        };

        let mut entry = self
            .entry(ctx, AuditAction::GrantDenied, "grant_required (async)")
            .with_request_hash(fingerprint.as_str());
        if let Some(id) = &grant_id {
            entry = entry.with_grant_id(id);
        }
        self.record(entry);

        json_response(
            StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            &serde_json::json!({
                "error": "Grant required",
                "grant_id": grant_id,
                "message": "Grant request created. Retry after approval.",
            }),
        )
    }

    /// Blocking mode: create the grant and poll until decided or deadline.
    async fn wait_for_decision(
        &self,
        ctx: RequestContext,
        request: &NewGrantRequest,
        fingerprint: &RequestFingerprint,
    ) -> ProxyResponse {
        info!(
            method = %ctx.method,
            domain = %ctx.domain,
            path = %ctx.path,
            "requesting grant; waiting for approval"
        );

        let grant = match self.broker.request_grant(request).await {
            Ok(grant) => grant,
            Err(e) => {
                let entry = self
                    .entry(&ctx, AuditAction::GrantTimeout, "grant_required")
                    .with_request_hash(fingerprint.as_str())
                    .with_error(e.to_string());
                self.record(entry);
                return plain_response(
                    StatusCode::GATEWAY_TIMEOUT,
                    format!("Grant request failed: {e}"),
                );
            },
        };

        let decided = self
            .broker
            .poll_until_terminal(&grant.id, self.grant_wait, self.poll_interval)
            .await;
        let waited_ms = elapsed_ms(ctx.started);

        match decided {
            Ok(decided) if decided.status == GrantStatus::Approved => {
                let entry = self
                    .entry(&ctx, AuditAction::GrantApproved, "grant_required")
                    .with_grant_id(&decided.id)
                    .with_request_hash(fingerprint.as_str())
                    .with_waited_ms(waited_ms);
                self.forward_and_audit(ctx, entry).await
            },
            Ok(decided) => {
                let decider = decided
                    .decided_by
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                let entry = self
                    .entry(&ctx, AuditAction::GrantDenied, "grant_required")
                    .with_grant_id(&decided.id)
                    .with_request_hash(fingerprint.as_str())
                    .with_waited_ms(waited_ms);
                self.record(entry);
                plain_response(StatusCode::FORBIDDEN, format!("Grant denied by {decider}"))
            },
            Err(e) => {
                let entry = self
                    .entry(&ctx, AuditAction::GrantTimeout, "grant_required")
                    .with_grant_id(&grant.id)
                    .with_request_hash(fingerprint.as_str())
                    .with_waited_ms(waited_ms)
                    .with_error(e.to_string());
                self.record(entry);
                plain_response(
                    StatusCode::GATEWAY_TIMEOUT,
                    format!("Grant request failed: {e}"),
                )
            },
        }
    }

    /// Relay the authorized request upstream, then record the one audit
    /// entry for this request: the success entry on a relayed response, or
    /// an `error` entry when the upstream is unreachable.
    async fn forward_and_audit(&self, ctx: RequestContext, success: AuditEntry) -> ProxyResponse {
        let request = ForwardRequest {
            method: ctx.method,
            url: ctx.target,
            headers: ctx.headers,
            body: ctx.body,
        };

        match self.forwarder.forward(request).await {
            Ok(response) => {
                self.record(success);
                ProxyResponse {
                    status: response.status,
                    headers: response.headers,
                    body: response.body,
                }
            },
            Err(e) => {
                let mut entry = success;
                entry.action = AuditAction::Error;
                entry.error = Some(e.to_string());
                self.record(entry);
                plain_response(StatusCode::BAD_GATEWAY, format!("Proxy error: {e}"))
            },
        }
    }

    /// Resolve the caller's identity, degrading to the default on any
    /// verification failure.
    async fn resolve_identity(&self, headers: &HeaderMap) -> AgentIdentity {
        let token = headers
            .get(header::PROXY_AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token);

        if let Some(token) = token {
            if let Some(identity) = self.verifier.verify(token).await {
                return identity;
            }
            debug!("agent credential not verified; using default identity");
        }
        self.agent.clone()
    }

    fn entry(&self, ctx: &RequestContext, action: AuditAction, rule: &str) -> AuditEntry {
        AuditEntry::new(
            &ctx.agent,
            action,
            rule,
            &ctx.domain,
            ctx.method.as_str(),
            &ctx.path,
        )
    }

    fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(&entry) {
            warn!(error = %e, "failed to record audit entry");
        }
    }
}

impl std::fmt::Debug for ProxyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyState")
            .field("agent", &self.agent)
            .field("grant_wait", &self.grant_wait)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Decode the raw path-and-query into an absolute http(s) target URL.
///
/// Accepts the target both raw (`https://api.github.com/x`) and
/// percent-encoded (`https%3A%2F%2Fapi.github.com%2Fx`).
fn parse_target(raw: &str) -> ProxyResult<Url> {
    if raw.is_empty() {
        return Err(ProxyError::InvalidTarget {
            reason: "empty target".to_string(),
        });
    }

    if let Some(url) = try_parse_absolute(raw) {
        return Ok(url);
    }

    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|e| ProxyError::InvalidTarget {
            reason: format!("target is not valid UTF-8: {e}"),
        })?;
    try_parse_absolute(&decoded).ok_or_else(|| ProxyError::InvalidTarget {
        reason: format!("{raw:?} is not an absolute http(s) URL"),
    })
}

fn try_parse_absolute(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate).ok()?;
    if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
        Some(url)
    } else {
        None
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn plain_response(status: StatusCode, body: impl Into<String>) -> ProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    ProxyResponse {
        status,
        headers,
        body: Bytes::from(body.into()),
    }
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> ProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    ProxyResponse {
        status,
        headers,
        body: Bytes::from(serde_json::to_vec(value).unwrap_or_default()),
    }
}

#[cfg(test)]
mod target_tests {
    use super::parse_target;

    #[test]
    fn test_raw_target_accepted() {
        let url = parse_target("https://api.github.com/repos/x?state=open").unwrap();
        assert_eq!(url.host_str(), Some("api.github.com"));
        assert_eq!(url.path(), "/repos/x");
        assert_eq!(url.query(), Some("state=open"));
    }

    #[test]
    fn test_percent_encoded_target_accepted() {
        let url = parse_target("https%3A%2F%2Fapi.github.com%2Frepos%2Fx").unwrap();
        assert_eq!(url.host_str(), Some("api.github.com"));
        assert_eq!(url.path(), "/repos/x");
    }

    #[test]
    fn test_relative_target_rejected() {
        assert!(parse_target("healthz").is_err());
        assert!(parse_target("api.github.com/repos").is_err());
        assert!(parse_target("").is_err());
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        assert!(parse_target("ftp://files.example.com/x").is_err());
        assert!(parse_target("mailto:someone@example.com").is_err());
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
