//! Outpost Proxy - the authorization orchestrator and HTTP surface.
//!
//! Agents address upstream services by encoding the full target URL in the
//! gateway's request path: `http://proxy:9090/https://api.github.com/x`.
//! Every inbound request runs one pass of the decision state machine:
//!
//! 1. Decode and parse the target; malformed targets are a local 400.
//! 2. Resolve the caller's identity through the injected
//!    [`IdentityVerifier`]; verification failures degrade to the configured
//!    default identity (attribution only, never an authorization bypass).
//! 3. Evaluate the policy. Deny responds 403; allow forwards; grant-required
//!    runs the grant workflow: reuse a standing grant, defer with a retry
//!    token in async mode, or block on the broker's decision.
//! 4. Emit exactly one audit record and exactly one response, with at most
//!    one upstream call.
//!
//! The orchestrator owns no grant state and shares nothing mutable across
//! requests; the policy set is read-only for the process lifetime and the
//! broker holds the authoritative grant lifecycle.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod bridge;
/// Proxy error types.
pub mod error;
mod forward;
mod identity;
mod orchestrator;
mod server;

pub use bridge::compile_policy;
pub use error::{ProxyError, ProxyResult};
pub use forward::{ForwardRequest, ForwardResponse, Forwarder, HttpForwarder};
pub use identity::{IdentityVerifier, NullIdentityVerifier};
pub use orchestrator::{ProxyRequest, ProxyResponse, ProxyState};
pub use server::{router, serve};
