//! Configuration struct definitions.

use outpost_core::{DefaultAction, GrantKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gateway settings.
    pub proxy: ProxySection,
    /// Ordered allow rules.
    #[serde(default)]
    pub allow: Vec<RuleEntry>,
    /// Ordered deny rules. Deny always wins regardless of position.
    #[serde(default)]
    pub deny: Vec<RuleEntry>,
    /// Ordered grant-required rules.
    #[serde(default)]
    pub grant_required: Vec<GrantRuleEntry>,
}

/// The `[proxy]` section.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProxySection {
    /// Bind address as `host:port`.
    pub listen: String,
    /// Base URL of the identity provider / grant broker.
    pub idp_url: String,
    /// Default identity requests are attributed to when the caller's
    /// credential is absent or unverified.
    pub agent_email: String,
    /// Fallback when no rule matches.
    #[serde(default)]
    pub default_action: DefaultAction,
    /// Audit log file; when unset only the diagnostic stream is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<PathBuf>,
    /// Bearer token for broker calls. Prefer environment injection over
    /// storing this in a file.
    #[serde(default, skip_serializing)]
    pub broker_token: Option<String>,
    /// How long a blocking request waits for a grant decision.
    #[serde(default = "default_grant_wait")]
    pub grant_wait_timeout_secs: u64,
    /// Interval between grant status polls.
    #[serde(default = "default_poll_interval")]
    pub grant_poll_interval_secs: u64,
}

fn default_grant_wait() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    2
}

impl std::fmt::Debug for ProxySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySection")
            .field("listen", &self.listen)
            .field("idp_url", &self.idp_url)
            .field("agent_email", &self.agent_email)
            .field("default_action", &self.default_action)
            .field("audit_log", &self.audit_log)
            .field("has_broker_token", &self.broker_token.is_some())
            .field("grant_wait_timeout_secs", &self.grant_wait_timeout_secs)
            .field("grant_poll_interval_secs", &self.grant_poll_interval_secs)
            .finish()
    }
}

/// One allow or deny rule as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Domain glob.
    pub domain: String,
    /// Allowed HTTP methods; absent means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    /// Path glob; absent means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Free-text annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One grant-required rule as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRuleEntry {
    /// The underlying rule.
    #[serde(flatten)]
    pub rule: RuleEntry,
    /// Kind of grant to request on match.
    pub grant_type: GrantKind,
    /// Explicit permission scope; defaults to `"<method>:<domain>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    /// Requested validity in seconds for `timed` grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}
