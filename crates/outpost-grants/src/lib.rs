//! Outpost Grants - the grant broker protocol client.
//!
//! A grant is a broker-issued authorization record permitting a specific
//! requester to reach a target under a permission scope. This crate owns:
//!
//! - The grant wire types ([`Grant`], [`NewGrantRequest`]) and the strict
//!   reusable-grant selection rules.
//! - The [`RequestFingerprint`] that binds an approval to one exact request
//!   (method + full URL + body), so an approver cannot be baited into
//!   approving a different call than the one audited.
//! - The [`GrantBroker`] trait and its HTTP implementation: create a grant,
//!   fetch a grant snapshot, search approved grants for a reusable one, and
//!   poll a grant at a fixed interval until it is terminal or a deadline
//!   passes.
//!
//! The broker owns all grant state; this client only observes snapshots.
//! Every ambiguity in the lookup path (transport errors, malformed
//! responses) resolves toward requiring a fresh approval, never toward
//! silently authorizing.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod client;
/// Grant error types.
pub mod error;
mod fingerprint;
mod grant;

pub use client::{GrantBroker, HttpGrantBroker};
pub use error::{GrantError, GrantResult};
pub use fingerprint::RequestFingerprint;
pub use grant::{Grant, NewGrantRequest, select_reusable};
