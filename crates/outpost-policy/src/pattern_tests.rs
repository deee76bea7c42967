use super::{DomainPattern, Pattern};

#[test]
fn test_literal_exact_match() {
    let p = Pattern::path("/repos/x/issues");
    assert!(p.matches("/repos/x/issues"));
    assert!(!p.matches("/repos/x/issues/1"));
    assert!(!p.matches("/repos/x"));
}

#[test]
fn test_matching_is_anchored() {
    let p = Pattern::path("issues");
    assert!(!p.matches("/repos/issues"));
    assert!(!p.matches("issues/1"));
    assert!(p.matches("issues"));
}

#[test]
fn test_star_within_segment() {
    let p = Pattern::path("/repos/*/issues");
    assert!(p.matches("/repos/x/issues"));
    assert!(p.matches("/repos/some-org/issues"));
    assert!(!p.matches("/repos/x/y/issues"));
}

#[test]
fn test_star_matches_empty_run() {
    let p = Pattern::path("/v*/users");
    assert!(p.matches("/v1/users"));
    assert!(p.matches("/v/users"));
}

#[test]
fn test_double_star_crosses_segments() {
    let p = Pattern::path("/repos/**");
    assert!(p.matches("/repos/"));
    assert!(p.matches("/repos/x"));
    assert!(p.matches("/repos/x/issues/42"));
    assert!(!p.matches("/users/x"));
}

#[test]
fn test_double_star_in_middle() {
    let p = Pattern::path("/api/**/delete");
    assert!(p.matches("/api/v1/things/delete"));
    assert!(p.matches("/api//delete"));
    assert!(!p.matches("/api/v1/things/remove"));
}

#[test]
fn test_star_backtracking() {
    // The first star must be able to give characters back to the literal.
    let p = Pattern::path("a*b*c");
    assert!(p.matches("abc"));
    assert!(p.matches("axxbyyc"));
    assert!(p.matches("abbc"));
    assert!(!p.matches("ab"));
}

#[test]
fn test_empty_pattern_matches_only_empty() {
    let p = Pattern::path("");
    assert!(p.matches(""));
    assert!(!p.matches("/"));
}

#[test]
fn test_regex_metacharacters_are_literal() {
    // Dots, brackets, and friends must not gain regex meaning.
    let p = Pattern::path("/a.c/[x]/(y)");
    assert!(p.matches("/a.c/[x]/(y)"));
    assert!(!p.matches("/abc/[x]/(y)"));
}

#[test]
fn test_domain_exact() {
    let d = DomainPattern::new("api.github.com");
    assert!(d.matches("api.github.com"));
    assert!(!d.matches("github.com"));
    assert!(!d.matches("api.github.com.evil.net"));
}

#[test]
fn test_domain_wildcard_covers_subdomains_and_apex() {
    let d = DomainPattern::new("*.evil.com");
    assert!(d.matches("evil.com"));
    assert!(d.matches("api.evil.com"));
    assert!(d.matches("a.b.evil.com"));
    assert!(!d.matches("evil.com.example.org"));
    assert!(!d.matches("notevil.com"));
}

#[test]
fn test_domain_match_all() {
    let d = DomainPattern::new("*");
    assert!(d.matches("api.github.com"));
    assert!(d.matches("localhost"));
}

#[test]
fn test_domain_is_case_insensitive() {
    let d = DomainPattern::new("API.GitHub.com");
    assert!(d.matches("api.github.com"));
    let wild = DomainPattern::new("*.Evil.COM");
    assert!(wild.matches("sub.evil.com"));
}

#[test]
fn test_domain_infix_wildcard() {
    let d = DomainPattern::new("api.*.internal");
    assert!(d.matches("api.staging.internal"));
    // No separator in domain globs, so the star spans labels.
    assert!(d.matches("api.a.b.internal"));
    assert!(!d.matches("api.internal"));
}
