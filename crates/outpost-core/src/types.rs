//! Core vocabulary types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity an outbound request is attributed to.
///
/// Resolved from the agent's bearer credential when verification succeeds,
/// otherwise degraded to the gateway's configured default identity. Identity
/// affects audit attribution and grant matching only; it never changes
/// whether deny rules apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Email address identifying the agent.
    pub email: String,
}

impl AgentIdentity {
    /// Create an identity from an email address.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.email)
    }
}

/// How long an approved grant remains usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    /// Single use. Never reused for a later request.
    Once,
    /// Valid until an expiry timestamp set by the broker.
    Timed,
    /// Standing approval with no expiry unless revoked.
    Always,
}

impl GrantKind {
    /// Whether an approved grant of this kind may satisfy later requests.
    ///
    /// `once` grants are single-use; silently reusing one would defeat its
    /// purpose, so only `timed` and `always` grants are reuse candidates.
    #[must_use]
    pub fn is_reusable(self) -> bool {
        !matches!(self, Self::Once)
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => write!(f, "once"),
            Self::Timed => write!(f, "timed"),
            Self::Always => write!(f, "always"),
        }
    }
}

/// Lifecycle state of a grant, owned and mutated by the external broker.
///
/// The gateway only ever observes snapshots of this state via polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    /// Awaiting a human decision.
    Pending,
    /// Approved by a decider.
    Approved,
    /// Denied by a decider.
    Denied,
}

impl GrantStatus {
    /// Whether this status ends the approval workflow.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

/// Fallback behaviour when no explicit rule matches a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultAction {
    /// Deny the request outright.
    #[default]
    Block,
    /// Request a grant and block in-flight until it is decided.
    Request,
    /// Request a grant and defer immediately with a retry token.
    RequestAsync,
}

impl fmt::Display for DefaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Request => write!(f, "request"),
            Self::RequestAsync => write!(f, "request-async"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_kind_reusability() {
        assert!(!GrantKind::Once.is_reusable());
        assert!(GrantKind::Timed.is_reusable());
        assert!(GrantKind::Always.is_reusable());
    }

    #[test]
    fn test_grant_status_terminal() {
        assert!(!GrantStatus::Pending.is_terminal());
        assert!(GrantStatus::Approved.is_terminal());
        assert!(GrantStatus::Denied.is_terminal());
    }

    #[test]
    fn test_grant_kind_wire_format() {
        let json = serde_json::to_string(&GrantKind::Once).unwrap();
        assert_eq!(json, "\"once\"");
        let kind: GrantKind = serde_json::from_str("\"always\"").unwrap();
        assert_eq!(kind, GrantKind::Always);
    }

    #[test]
    fn test_default_action_wire_format() {
        let json = serde_json::to_string(&DefaultAction::RequestAsync).unwrap();
        assert_eq!(json, "\"request-async\"");
        let action: DefaultAction = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(action, DefaultAction::Block);
    }

    #[test]
    fn test_default_action_default_is_block() {
        assert_eq!(DefaultAction::default(), DefaultAction::Block);
    }

    #[test]
    fn test_agent_identity_display() {
        let agent = AgentIdentity::new("agent@example.com");
        assert_eq!(agent.to_string(), "agent@example.com");
    }
}
