//! Collaborator traits.
//!
//! The manager never talks to a chat platform, role system, or directory
//! directly. It goes through these traits, so any transport can sit behind
//! them. Implementations must be thread-safe (Send + Sync).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tenure_core::{GroupDefinition, GroupId, SubjectId};

use crate::audit::AuditEvent;
use crate::error::Result;
use crate::reminder::Reminder;

/// A resolved member of the managed population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberHandle {
    /// The subject this handle was resolved from.
    pub subject_id: SubjectId,

    /// Name used in log and audit lines.
    pub display_name: String,
}

impl MemberHandle {
    pub fn new(subject_id: SubjectId, display_name: impl Into<String>) -> Self {
        Self {
            subject_id,
            display_name: display_name.into(),
        }
    }
}

/// Looks subjects up in the managed population.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Resolve a subject.
    ///
    /// `Ok(None)` means the subject is not (or no longer) a member, for
    /// example because they left. `Err` is a failure to ask.
    async fn resolve(&self, subject_id: &SubjectId) -> Result<Option<MemberHandle>>;
}

/// Adds and removes the externally held role behind a group.
#[async_trait]
pub trait RoleAuthority: Send + Sync {
    /// Give `member` the role for `group_id`.
    async fn grant(
        &self,
        member: &MemberHandle,
        group_id: &GroupId,
        group: &GroupDefinition,
    ) -> Result<()>;

    /// Take the role for `group_id` away from `member`.
    async fn revoke(
        &self,
        member: &MemberHandle,
        group_id: &GroupId,
        group: &GroupDefinition,
    ) -> Result<()>;
}

/// Delivers reminders to members.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `reminder` to `member`.
    ///
    /// Failure is expected (closed inboxes); the caller never retries.
    async fn notify(&self, member: &MemberHandle, reminder: &Reminder) -> Result<()>;
}

/// Receives human-readable audit events.
///
/// Recording never fails from the caller's point of view; a sink that
/// cannot deliver logs the problem itself.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent);
}
