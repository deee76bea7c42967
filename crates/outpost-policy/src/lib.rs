//! Outpost Policy - wildcard rule matching and ordered policy evaluation.
//!
//! A [`PolicySet`] holds ordered deny, allow, and grant-required rule lists
//! plus a default action, and resolves a `(domain, method, path)` triple to a
//! [`Decision`]. Evaluation order is the engine's core correctness property:
//! deny rules always win, then allow, then grant-required, then the default
//! action; within each tier the first matching rule in declared order wins.
//!
//! Patterns are compiled by an explicit tokenizer (literal runs, `*`, `**`)
//! and matched with an anchored backtracking matcher rather than being
//! rewritten into a general regex engine, so unescaped literals in rules can
//! never change the matching semantics.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod engine;
/// Policy error types.
pub mod error;
mod pattern;
mod rule;

pub use engine::{Decision, PolicySet};
pub use error::{PolicyError, PolicyResult};
pub use pattern::{DomainPattern, Pattern};
pub use rule::{CompiledGrantRule, CompiledRule, GrantRule, RulePattern};
