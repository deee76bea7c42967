//! Config-to-domain conversion.
//!
//! `outpost-config` keeps its rule entries as plain mirrored structs so the
//! config crate stays leaf-like; this module converts them into compiled
//! policy types at the integration boundary.

use outpost_config::{Config, GrantRuleEntry, RuleEntry};
use outpost_policy::{GrantRule, PolicyResult, PolicySet, RulePattern};

/// Compile a loaded configuration into the gateway's policy set.
///
/// # Errors
///
/// Returns the first rule pattern that fails to compile.
pub fn compile_policy(config: &Config) -> PolicyResult<PolicySet> {
    let deny: Vec<RulePattern> = config.deny.iter().map(rule_pattern).collect();
    let allow: Vec<RulePattern> = config.allow.iter().map(rule_pattern).collect();
    let grants: Vec<GrantRule> = config.grant_required.iter().map(grant_rule).collect();

    PolicySet::new(&deny, &allow, &grants, config.proxy.default_action)
}

fn rule_pattern(entry: &RuleEntry) -> RulePattern {
    RulePattern {
        domain: entry.domain.clone(),
        methods: entry.methods.clone(),
        path: entry.path.clone(),
        note: entry.note.clone(),
    }
}

fn grant_rule(entry: &GrantRuleEntry) -> GrantRule {
    GrantRule {
        pattern: rule_pattern(&entry.rule),
        grant_type: entry.grant_type,
        permissions: entry.permissions.clone(),
        duration: entry.duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::{DefaultAction, GrantKind};
    use outpost_config::ProxySection;
    use outpost_policy::Decision;

    fn config() -> Config {
        Config {
            proxy: ProxySection {
                listen: "127.0.0.1:9090".to_string(),
                idp_url: "https://idp.example.com".to_string(),
                agent_email: "agent@example.com".to_string(),
                default_action: DefaultAction::Block,
                audit_log: None,
                broker_token: None,
                grant_wait_timeout_secs: 300,
                grant_poll_interval_secs: 2,
            },
            allow: vec![RuleEntry {
                domain: "api.github.com".to_string(),
                methods: Some(vec!["GET".to_string()]),
                path: None,
                note: None,
            }],
            deny: vec![RuleEntry {
                domain: "*.evil.com".to_string(),
                methods: None,
                path: None,
                note: Some("bad".to_string()),
            }],
            grant_required: vec![GrantRuleEntry {
                rule: RuleEntry {
                    domain: "api.stripe.com".to_string(),
                    methods: None,
                    path: None,
                    note: None,
                },
                grant_type: GrantKind::Timed,
                permissions: None,
                duration: Some(3600),
            }],
        }
    }

    #[test]
    fn test_compiled_policy_preserves_rule_semantics() {
        let policy = compile_policy(&config()).unwrap();

        assert!(matches!(
            policy.evaluate("sub.evil.com", "GET", "/"),
            Decision::Deny { .. }
        ));
        assert!(matches!(
            policy.evaluate("api.github.com", "GET", "/repos/x"),
            Decision::Allow
        ));
        match policy.evaluate("api.stripe.com", "POST", "/v1/charges") {
            Decision::GrantRequired { rule } => {
                assert_eq!(rule.kind(), GrantKind::Timed);
                assert_eq!(rule.duration_secs(), Some(3600));
            },
            other => panic!("expected grant, got {other:?}"),
        }
        assert_eq!(policy.default_action(), DefaultAction::Block);
        assert_eq!(policy.rule_counts(), (1, 1, 1));
    }
}
