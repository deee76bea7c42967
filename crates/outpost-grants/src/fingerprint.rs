//! Request-binding fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A deterministic digest tying an approval to one exact request.
///
/// Computed as hex SHA-256 of `"<METHOD> <full-target-URL>\n<raw body>"`.
/// The fingerprint rides along on the grant-creation call and the audit
/// record as an opaque binding token; it is never reversed. A human who
/// approves `GET https://api.example.com/issues` therefore cannot be
/// deceived into having approved a different method, URL, or payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    /// Compute the fingerprint of a request.
    #[must_use]
    pub fn compute(method: &str, target_url: &str, body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(b" ");
        hasher.update(target_url.as_bytes());
        hasher.update(b"\n");
        hasher.update(body);
        Self(hex::encode(hasher.finalize()))
    }

    /// The digest as a lowercase hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = RequestFingerprint::compute("GET", "https://api.example.com/issues", b"");
        let b = RequestFingerprint::compute("GET", "https://api.example.com/issues", b"");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_changes_with_method() {
        let get = RequestFingerprint::compute("GET", "https://api.example.com/issues", b"");
        let post = RequestFingerprint::compute("POST", "https://api.example.com/issues", b"");
        assert_ne!(get, post);
    }

    #[test]
    fn test_fingerprint_changes_with_url() {
        let a = RequestFingerprint::compute("GET", "https://api.example.com/issues", b"");
        let b = RequestFingerprint::compute("GET", "https://api.example.com/issues/1", b"");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_changes_with_body() {
        let a = RequestFingerprint::compute("POST", "https://api.example.com/x", b"{\"n\":1}");
        let b = RequestFingerprint::compute("POST", "https://api.example.com/x", b"{\"n\":2}");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = RequestFingerprint::compute("GET", "https://example.com/", b"");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_serializes_as_string() {
        let fp = RequestFingerprint::compute("GET", "https://example.com/", b"");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{fp}\""));
    }
}
