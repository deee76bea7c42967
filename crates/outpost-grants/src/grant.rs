//! Grant wire types and the reusable-grant selection rules.

use outpost_core::{GrantKind, GrantStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A grant snapshot as returned by the broker.
///
/// The broker owns and mutates grant state; the gateway only observes.
/// Deserialization is tolerant of omitted optional fields, and the defaults
/// fail safe: an unspecified kind is `once` (never reusable) and an
/// unspecified status is `pending` (not approved).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    /// Broker-assigned grant identifier.
    pub id: String,
    /// Identity the grant was requested for.
    #[serde(default)]
    pub requester: String,
    /// Target domain the grant covers.
    #[serde(default)]
    pub target: String,
    /// Reuse kind.
    #[serde(default = "default_kind")]
    pub grant_type: GrantKind,
    /// Permission scope the grant covers.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Current lifecycle status.
    #[serde(default = "default_status")]
    pub status: GrantStatus,
    /// Expiry as unix seconds; `None` means no expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Identity that approved or denied the grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

fn default_kind() -> GrantKind {
    GrantKind::Once
}

fn default_status() -> GrantStatus {
    GrantStatus::Pending
}

impl Grant {
    /// Whether the grant's expiry has passed at `now` (unix seconds).
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Whether the grant's permission scope covers every requested
    /// permission. A grant with an empty scope covers nothing that is
    /// actually requested.
    #[must_use]
    pub fn covers(&self, permissions: &[String]) -> bool {
        permissions
            .iter()
            .all(|permission| self.permissions.contains(permission))
    }

    /// The strict reuse check: approved, not single-use, unexpired, exact
    /// target, and full permission coverage.
    #[must_use]
    pub fn is_reusable_for(&self, target: &str, permissions: &[String], now: i64) -> bool {
        self.status == GrantStatus::Approved
            && self.grant_type.is_reusable()
            && !self.is_expired(now)
            && self.target == target
            && self.covers(permissions)
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grant {} ({} {} for {})",
            self.id, self.status, self.grant_type, self.requester
        )
    }
}

/// Pick the first grant that may satisfy the request under the strict
/// reuse rules. Broker ordering is preserved; no local re-ranking.
#[must_use]
pub fn select_reusable<'a>(
    grants: &'a [Grant],
    target: &str,
    permissions: &[String],
    now: i64,
) -> Option<&'a Grant> {
    grants
        .iter()
        .find(|grant| grant.is_reusable_for(target, permissions, now))
}

/// Body of a grant-creation call (`POST /api/grants`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrantRequest {
    /// Identity requesting the grant.
    pub requester: String,
    /// Target domain the grant should cover.
    pub target: String,
    /// Requested reuse kind.
    pub grant_type: GrantKind,
    /// Requested permission scope.
    pub permissions: Vec<String>,
    /// Human-readable reason shown to the approver.
    pub reason: String,
    /// Fingerprint binding the grant to one exact request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_hash: Option<String>,
    /// Requested validity in seconds, for `timed` grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl NewGrantRequest {
    /// Create a grant request with an empty scope and reason.
    #[must_use]
    pub fn new(
        requester: impl Into<String>,
        target: impl Into<String>,
        grant_type: GrantKind,
    ) -> Self {
        Self {
            requester: requester.into(),
            target: target.into(),
            grant_type,
            permissions: Vec::new(),
            reason: String::new(),
            request_hash: None,
            duration: None,
        }
    }

    /// Set the requested permission scope.
    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Set the approver-facing reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Attach the request-binding fingerprint.
    #[must_use]
    pub fn with_request_hash(mut self, hash: impl Into<String>) -> Self {
        self.request_hash = Some(hash.into());
        self
    }

    /// Set the requested validity in seconds.
    #[must_use]
    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration = Some(seconds);
        self
    }
}
