//! Outpost Audit - one structured record per completed request.
//!
//! Every request the gateway finishes handling produces exactly one
//! [`AuditEntry`] describing who asked for what and how it was decided.
//! Entries are immutable once created and handed to an [`AuditSink`]:
//! the production [`AuditLog`] emits a one-line summary on the `audit`
//! tracing target and appends a JSON line to a configured file, while
//! [`MemoryAuditSink`] captures entries for assertions in tests.
//!
//! The sink is a handle injected into the orchestrator at construction;
//! there is no ambient global audit destination.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod entry;
/// Audit error types.
pub mod error;
mod sink;

pub use entry::{AuditAction, AuditEntry};
pub use error::{AuditError, AuditResult};
pub use sink::{AuditLog, AuditSink, MemoryAuditSink};
