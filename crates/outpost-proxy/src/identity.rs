//! Caller identity resolution seam.

use async_trait::async_trait;
use outpost_core::AgentIdentity;

/// Verifies an agent's bearer credential and resolves it to an identity.
///
/// Credential verification against an identity provider's key set lives
/// outside the gateway core; the orchestrator only needs this one injected
/// operation. Returning `None` degrades the request to the configured
/// default identity. That degradation is deliberate: identity affects audit
/// attribution and grant matching only, so an unverifiable credential never
/// blocks a request on its own, and deny rules apply either way.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve a bearer token to an identity, or `None` if unverifiable.
    async fn verify(&self, credential: &str) -> Option<AgentIdentity>;
}

/// Verifier that treats every credential as unverified.
///
/// Used when no identity-provider integration is wired in; every request is
/// attributed to the gateway's default identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIdentityVerifier;

#[async_trait]
impl IdentityVerifier for NullIdentityVerifier {
    async fn verify(&self, _credential: &str) -> Option<AgentIdentity> {
        None
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub(crate) fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer   abc123  "), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }

    #[tokio::test]
    async fn test_null_verifier_never_verifies() {
        assert!(NullIdentityVerifier.verify("anything").await.is_none());
    }
}
