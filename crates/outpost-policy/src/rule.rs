//! Rule types: raw configuration entries and their compiled forms.

use outpost_core::GrantKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{PolicyError, PolicyResult};
use crate::pattern::{DomainPattern, Pattern};

/// A wildcard rule as declared in configuration. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulePattern {
    /// Domain glob the rule applies to.
    pub domain: String,
    /// Allowed HTTP methods; absent or empty means any method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    /// Path glob; absent means any path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Free-text annotation, surfaced in deny responses and audit records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RulePattern {
    /// Create a rule matching a domain glob, any method, any path.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            methods: None,
            path: None,
            note: None,
        }
    }

    /// Restrict the rule to a set of HTTP methods.
    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = String>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Restrict the rule to a path glob.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach an annotation.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Compile the rule's globs and method filter.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptyDomainPattern`] for an empty domain glob
    /// and [`PolicyError::EmptyMethod`] for a blank method entry.
    pub fn compile(&self) -> PolicyResult<CompiledRule> {
        if self.domain.is_empty() {
            return Err(PolicyError::EmptyDomainPattern);
        }

        let methods = match &self.methods {
            Some(list) if !list.is_empty() => {
                let mut set = HashSet::with_capacity(list.len());
                for method in list {
                    if method.trim().is_empty() {
                        return Err(PolicyError::EmptyMethod {
                            domain: self.domain.clone(),
                        });
                    }
                    set.insert(method.to_ascii_uppercase());
                }
                Some(set)
            },
            _ => None,
        };

        Ok(CompiledRule {
            domain: DomainPattern::new(&self.domain),
            methods,
            path: self.path.as_deref().map(Pattern::path),
            note: self.note.clone(),
        })
    }
}

impl fmt::Display for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.domain)?;
        if let Some(methods) = &self.methods {
            write!(f, " [{}]", methods.join(","))?;
        }
        if let Some(path) = &self.path {
            write!(f, " {path}")?;
        }
        Ok(())
    }
}

/// A rule whose match escalates the request into the grant workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRule {
    /// The underlying wildcard rule.
    #[serde(flatten)]
    pub pattern: RulePattern,
    /// Kind of grant to request when this rule matches.
    pub grant_type: GrantKind,
    /// Explicit permission scope; defaults to `"<method>:<domain>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    /// Requested validity in seconds for `timed` grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl GrantRule {
    /// Create a grant rule for a domain glob.
    #[must_use]
    pub fn new(domain: impl Into<String>, grant_type: GrantKind) -> Self {
        Self {
            pattern: RulePattern::new(domain),
            grant_type,
            permissions: None,
            duration: None,
        }
    }

    /// Compile the underlying rule pattern.
    ///
    /// # Errors
    ///
    /// Propagates pattern compilation errors from [`RulePattern::compile`].
    pub fn compile(&self) -> PolicyResult<CompiledGrantRule> {
        Ok(CompiledGrantRule {
            rule: self.pattern.compile()?,
            kind: self.grant_type,
            permissions: self.permissions.clone(),
            duration_secs: self.duration,
        })
    }
}

/// A [`RulePattern`] with its globs tokenized and methods uppercased.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    domain: DomainPattern,
    methods: Option<HashSet<String>>,
    path: Option<Pattern>,
    note: Option<String>,
}

impl CompiledRule {
    /// Check whether a `(domain, method, path)` triple satisfies this rule.
    ///
    /// The domain glob, method filter, and path glob (when present) must all
    /// succeed. Methods are compared case-insensitively.
    #[must_use]
    pub fn matches(&self, domain: &str, method: &str, path: &str) -> bool {
        if !self.domain.matches(domain) {
            return false;
        }
        if let Some(methods) = &self.methods {
            if !methods.contains(&method.to_ascii_uppercase()) {
                return false;
            }
        }
        match &self.path {
            Some(pattern) => pattern.matches(path),
            None => true,
        }
    }

    /// The rule's annotation, if any.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// A compiled [`GrantRule`].
#[derive(Debug, Clone)]
pub struct CompiledGrantRule {
    rule: CompiledRule,
    kind: GrantKind,
    permissions: Option<Vec<String>>,
    duration_secs: Option<u64>,
}

impl CompiledGrantRule {
    /// Check whether a `(domain, method, path)` triple satisfies this rule.
    #[must_use]
    pub fn matches(&self, domain: &str, method: &str, path: &str) -> bool {
        self.rule.matches(domain, method, path)
    }

    /// Kind of grant this rule requests.
    #[must_use]
    pub fn kind(&self) -> GrantKind {
        self.kind
    }

    /// Requested validity in seconds, for `timed` grants.
    #[must_use]
    pub fn duration_secs(&self) -> Option<u64> {
        self.duration_secs
    }

    /// The rule's annotation, if any.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.rule.note()
    }

    /// The permission scope a grant must cover for this request.
    ///
    /// An explicit non-empty `permissions` list wins; otherwise the scope
    /// defaults to the single entry `"<method>:<domain>"` with the method
    /// lowercased.
    #[must_use]
    pub fn effective_permissions(&self, method: &str, domain: &str) -> Vec<String> {
        match &self.permissions {
            Some(perms) if !perms.is_empty() => perms.clone(),
            _ => vec![format!("{}:{domain}", method.to_ascii_lowercase())],
        }
    }
}
