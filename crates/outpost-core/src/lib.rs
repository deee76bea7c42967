//! Outpost Core - shared domain types for the egress authorization gateway.
//!
//! This crate is the dependency-free vocabulary of the workspace: the agent
//! identity attached to every audited request, the grant kinds and statuses
//! spoken by the grant broker, and the gateway's fallback action. All other
//! outpost crates depend on these types; this crate depends only on `serde`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod types;

pub use types::{AgentIdentity, DefaultAction, GrantKind, GrantStatus};
