//! Wildcard pattern compiler and matcher.
//!
//! Patterns support two wildcard tokens: `*` matches any run of characters
//! excluding the field separator, `**` matches any run including it. All
//! other characters match literally, and matching is anchored: the whole
//! candidate must match, not a substring.
//!
//! Path patterns use `/` as the separator. Hostnames contain no separator,
//! so in domain patterns `*` spans label boundaries; a domain pattern with a
//! leading `*.` additionally matches the apex domain itself, so a deny rule
//! on `*.evil.com` covers `evil.com` as well as every subdomain.

/// One element of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// A literal run of characters.
    Literal(String),
    /// `*`: any run excluding the separator.
    Star,
    /// `**`: any run including the separator.
    DoubleStar,
}

/// A compiled wildcard pattern, anchored at both ends.
#[derive(Debug, Clone)]
pub struct Pattern {
    tokens: Vec<Token>,
    separator: Option<char>,
}

impl Pattern {
    /// Compile a path glob (`*` stops at `/`, `**` spans segments).
    #[must_use]
    pub fn path(source: &str) -> Self {
        Self::compile(source, Some('/'))
    }

    fn compile(source: &str, separator: Option<char>) -> Self {
        Self {
            tokens: tokenize(source),
            separator,
        }
    }

    /// Check whether the whole candidate string matches this pattern.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match_tokens(&self.tokens, candidate, self.separator)
    }
}

/// A compiled domain glob.
///
/// Matching is case-insensitive. `*` and `**` both span label boundaries
/// (hostnames carry no separator character), and a leading `*.` also covers
/// the apex domain.
#[derive(Debug, Clone)]
pub struct DomainPattern {
    glob: Pattern,
    apex: Option<Pattern>,
}

impl DomainPattern {
    /// Compile a domain glob.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let source = source.to_ascii_lowercase();
        let apex = source
            .strip_prefix("*.")
            .map(|rest| Pattern::compile(rest, None));
        Self {
            glob: Pattern::compile(&source, None),
            apex,
        }
    }

    /// Check whether a hostname matches this domain glob.
    #[must_use]
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.glob.matches(&host) || self.apex.as_ref().is_some_and(|apex| apex.matches(&host))
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '*' {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            if chars.peek() == Some(&'*') {
                chars.next();
                tokens.push(Token::DoubleStar);
            } else {
                tokens.push(Token::Star);
            }
        } else {
            literal.push(c);
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    tokens
}

/// Anchored backtracking matcher over the token list.
fn match_tokens(tokens: &[Token], input: &str, separator: Option<char>) -> bool {
    let Some((first, rest)) = tokens.split_first() else {
        return input.is_empty();
    };

    match first {
        Token::Literal(lit) => input
            .strip_prefix(lit.as_str())
            .is_some_and(|tail| match_tokens(rest, tail, separator)),
        Token::Star => {
            // A star may consume up to (not including) the first separator.
            let limit = separator
                .and_then(|sep| input.find(sep))
                .unwrap_or(input.len());
            split_points(input, limit).any(|at| match_tokens(rest, &input[at..], separator))
        },
        Token::DoubleStar => {
            split_points(input, input.len()).any(|at| match_tokens(rest, &input[at..], separator))
        },
    }
}

/// Char-boundary offsets in `input[..limit]`, including `limit` itself.
fn split_points(input: &str, limit: usize) -> impl Iterator<Item = usize> + '_ {
    input[..limit]
        .char_indices()
        .map(|(at, _)| at)
        .chain(std::iter::once(limit))
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
