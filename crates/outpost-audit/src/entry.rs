//! Audit entry type.

use chrono::{DateTime, Utc};
use outpost_core::AgentIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a request was concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Forwarded under an allow rule, no grant involved.
    Allow,
    /// Refused by a deny rule or the default block action.
    Deny,
    /// Forwarded under an approved grant (fresh or standing).
    GrantApproved,
    /// A grant was denied, or created and deferred in async mode.
    GrantDenied,
    /// The grant workflow failed: broker unreachable or deadline passed.
    GrantTimeout,
    /// The request was authorized but the upstream call failed.
    Error,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
            Self::GrantApproved => write!(f, "grant_approved"),
            Self::GrantDenied => write!(f, "grant_denied"),
            Self::GrantTimeout => write!(f, "grant_timeout"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One immutable record per completed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the record was created.
    pub ts: DateTime<Utc>,
    /// Identity the request was attributed to.
    pub agent: String,
    /// Outcome tag.
    pub action: AuditAction,
    /// Target domain.
    pub domain: String,
    /// HTTP method.
    pub method: String,
    /// Target path.
    pub path: String,
    /// Grant involved in the decision, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_id: Option<String>,
    /// Label of the rule or workflow branch that decided the request.
    pub rule: String,
    /// Fingerprint binding the decision to the exact request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_hash: Option<String>,
    /// Time spent waiting on the grant workflow, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waited_ms: Option<u64>,
    /// Error text for failed outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(
        agent: &AgentIdentity,
        action: AuditAction,
        rule: impl Into<String>,
        domain: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            ts: Utc::now(),
            agent: agent.email.clone(),
            action,
            domain: domain.into(),
            method: method.into(),
            path: path.into(),
            grant_id: None,
            rule: rule.into(),
            request_hash: None,
            waited_ms: None,
            error: None,
        }
    }

    /// Attach the involved grant id.
    #[must_use]
    pub fn with_grant_id(mut self, grant_id: impl Into<String>) -> Self {
        self.grant_id = Some(grant_id.into());
        self
    }

    /// Attach the request fingerprint.
    #[must_use]
    pub fn with_request_hash(mut self, hash: impl Into<String>) -> Self {
        self.request_hash = Some(hash.into());
        self
    }

    /// Record how long the grant workflow was awaited.
    #[must_use]
    pub fn with_waited_ms(mut self, waited_ms: u64) -> Self {
        self.waited_ms = Some(waited_ms);
        self
    }

    /// Attach error text.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// One-line summary for the diagnostic stream.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} {} {}{}",
            self.action, self.method, self.domain, self.path
        );
        if let Some(grant_id) = &self.grant_id {
            line.push_str(" grant=");
            line.push_str(grant_id);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> AgentIdentity {
        AgentIdentity::new("agent@example.com")
    }

    #[test]
    fn test_entry_serializes_with_snake_case_action() {
        let entry = AuditEntry::new(
            &agent(),
            AuditAction::GrantApproved,
            "grant_required",
            "api.stripe.com",
            "POST",
            "/v1/charges",
        )
        .with_grant_id("g1")
        .with_waited_ms(1500);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["action"], "grant_approved");
        assert_eq!(value["agent"], "agent@example.com");
        assert_eq!(value["grant_id"], "g1");
        assert_eq!(value["waited_ms"], 1500);
    }

    #[test]
    fn test_entry_omits_absent_optionals() {
        let entry = AuditEntry::new(
            &agent(),
            AuditAction::Deny,
            "deny-list",
            "evil.com",
            "GET",
            "/",
        );

        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("grant_id").is_none());
        assert!(value.get("waited_ms").is_none());
        assert!(value.get("error").is_none());
        assert!(value.get("request_hash").is_none());
    }

    #[test]
    fn test_summary_line() {
        let entry = AuditEntry::new(
            &agent(),
            AuditAction::Allow,
            "allow-list",
            "api.github.com",
            "GET",
            "/repos/x",
        );
        assert_eq!(entry.summary(), "allow GET api.github.com/repos/x");

        let with_grant = entry.with_grant_id("g42");
        assert_eq!(
            with_grant.summary(),
            "allow GET api.github.com/repos/x grant=g42"
        );
    }
}
