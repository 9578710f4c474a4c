//! # Tenure Adapters
//!
//! Interfaces to everything outside the grant store: the member directory,
//! the role system, the reminder channel, and the audit log.
//!
//! ## Key Types
//!
//! - [`MembershipResolver`] - Subject lookup
//! - [`RoleAuthority`] - Grants and revokes the role behind a group
//! - [`Notifier`] - Delivers [`Reminder`]s
//! - [`AuditSink`] - Receives [`AuditEvent`]s
//!
//! The [`memory`] module has scripted in-memory implementations for tests.

pub mod audit;
pub mod error;
pub mod memory;
pub mod reminder;
pub mod traits;

pub use audit::{AuditEvent, NoopAuditSink, TracingAuditSink};
pub use error::{AdapterError, Result};
pub use memory::{MemoryDirectory, RecordingAuditSink};
pub use reminder::{format_millis, Reminder};
pub use traits::{AuditSink, MemberHandle, MembershipResolver, Notifier, RoleAuthority};
