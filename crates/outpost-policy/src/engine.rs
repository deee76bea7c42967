//! Ordered policy evaluation.

use outpost_core::{DefaultAction, GrantKind};
use std::sync::Arc;
use tracing::debug;

use crate::error::PolicyResult;
use crate::rule::{CompiledGrantRule, CompiledRule, GrantRule, RulePattern};

/// The outcome of evaluating a request against a [`PolicySet`].
///
/// Produced fresh per request and never persisted.
#[derive(Debug, Clone)]
pub enum Decision {
    /// Forward without a grant.
    Allow,
    /// Refuse the request.
    Deny {
        /// Why the request was refused, surfaced in the response body.
        reason: String,
    },
    /// Escalate into the grant workflow.
    GrantRequired {
        /// The grant rule that matched (or the synthesized implicit rule).
        rule: Arc<CompiledGrantRule>,
    },
}

/// The gateway's rule policy: ordered deny, allow, and grant-required lists
/// plus a default action. Loaded once at startup and read-only afterwards.
#[derive(Debug)]
pub struct PolicySet {
    deny: Vec<CompiledRule>,
    allow: Vec<CompiledRule>,
    grant_required: Vec<Arc<CompiledGrantRule>>,
    default_action: DefaultAction,
    /// Synthesized rule used when no explicit rule matches and the default
    /// action escalates instead of blocking: domain `*`, kind `once`.
    implicit: Arc<CompiledGrantRule>,
}

impl PolicySet {
    /// Compile raw rule lists into a policy set.
    ///
    /// Declaration order is preserved; it is the only tie-breaker between
    /// overlapping rules in the same tier.
    ///
    /// # Errors
    ///
    /// Returns the first pattern compilation error encountered.
    pub fn new(
        deny: &[RulePattern],
        allow: &[RulePattern],
        grant_required: &[GrantRule],
        default_action: DefaultAction,
    ) -> PolicyResult<Self> {
        let deny = deny
            .iter()
            .map(RulePattern::compile)
            .collect::<PolicyResult<Vec<_>>>()?;
        let allow = allow
            .iter()
            .map(RulePattern::compile)
            .collect::<PolicyResult<Vec<_>>>()?;
        let grant_required = grant_required
            .iter()
            .map(|rule| rule.compile().map(Arc::new))
            .collect::<PolicyResult<Vec<_>>>()?;

        let implicit = Arc::new(GrantRule::new("*", GrantKind::Once).compile()?);

        Ok(Self {
            deny,
            allow,
            grant_required,
            default_action,
            implicit,
        })
    }

    /// Resolve a `(domain, method, path)` triple to a [`Decision`].
    ///
    /// Tier order is fixed: deny, then allow, then grant-required, then the
    /// default action. A deny match wins regardless of any allow or grant
    /// rule the request also matches; within a tier the first match in
    /// declared order wins.
    #[must_use]
    pub fn evaluate(&self, domain: &str, method: &str, path: &str) -> Decision {
        for rule in &self.deny {
            if rule.matches(domain, method, path) {
                debug!(domain, method, path, "matched deny rule");
                return Decision::Deny {
                    reason: rule.note().unwrap_or("deny rule").to_string(),
                };
            }
        }

        for rule in &self.allow {
            if rule.matches(domain, method, path) {
                debug!(domain, method, path, "matched allow rule");
                return Decision::Allow;
            }
        }

        for rule in &self.grant_required {
            if rule.matches(domain, method, path) {
                debug!(domain, method, path, "matched grant-required rule");
                return Decision::GrantRequired {
                    rule: Arc::clone(rule),
                };
            }
        }

        match self.default_action {
            DefaultAction::Block => Decision::Deny {
                reason: "no matching rule (default action: block)".to_string(),
            },
            DefaultAction::Request | DefaultAction::RequestAsync => Decision::GrantRequired {
                rule: Arc::clone(&self.implicit),
            },
        }
    }

    /// The configured default action.
    #[must_use]
    pub fn default_action(&self) -> DefaultAction {
        self.default_action
    }

    /// Rule counts as `(allow, deny, grant_required)`, for startup summaries.
    #[must_use]
    pub fn rule_counts(&self) -> (usize, usize, usize) {
        (
            self.allow.len(),
            self.deny.len(),
            self.grant_required.len(),
        )
    }
}
