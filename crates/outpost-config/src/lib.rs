//! Outpost Config - gateway configuration loading and validation.
//!
//! One [`Config`] type covering the `[proxy]` section plus the ordered
//! `[[allow]]` / `[[deny]]` / `[[grant_required]]` rule arrays. Files ending
//! in `.json` are parsed as JSON, everything else as TOML. A configuration
//! that fails validation is fatal at startup; the gateway must not bind a
//! listener with a broken policy.
//!
//! This crate depends only on the leaf vocabulary crate (`outpost-core`).
//! Rule entries are mirrored structs; conversion into compiled policy types
//! happens at the integration boundary.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Configuration error types.
pub mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::{Config, GrantRuleEntry, ProxySection, RuleEntry};
