//! In-memory collaborators for testing.
//!
//! [`MemoryDirectory`] plays resolver, role authority, and notifier at once.
//! Failures are scripted per subject and every call is recorded, so tests
//! can assert exactly which side effects a sweep attempted.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tenure_core::{GroupDefinition, GroupId, SubjectId};

use crate::audit::AuditEvent;
use crate::error::{AdapterError, Result};
use crate::reminder::Reminder;
use crate::traits::{AuditSink, MemberHandle, MembershipResolver, Notifier, RoleAuthority};

/// A side effect the directory was asked to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Resolve(SubjectId),
    Grant { subject_id: SubjectId, role_id: String },
    Revoke { subject_id: SubjectId, role_id: String },
    Notify { subject_id: SubjectId, reminder: Reminder },
}

#[derive(Default)]
struct DirectoryState {
    members: HashMap<SubjectId, MemberHandle>,
    roles: HashMap<SubjectId, HashSet<String>>,
    fail_resolve: HashSet<SubjectId>,
    fail_grant: HashSet<SubjectId>,
    fail_revoke: HashSet<SubjectId>,
    fail_notify: HashSet<SubjectId>,
    calls: Vec<Call>,
}

/// Scriptable in-memory member directory.
#[derive(Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `subject_id` resolvable.
    pub fn add_member(&self, subject_id: impl Into<SubjectId>, display_name: &str) {
        let subject_id = subject_id.into();
        let handle = MemberHandle::new(subject_id.clone(), display_name);
        self.state().members.insert(subject_id, handle);
    }

    /// Make `subject_id` unresolvable, as if they left.
    pub fn remove_member(&self, subject_id: &SubjectId) {
        let mut state = self.state();
        state.members.remove(subject_id);
        state.roles.remove(subject_id);
    }

    /// Resolving `subject_id` returns a transport error.
    pub fn fail_resolve_for(&self, subject_id: impl Into<SubjectId>) {
        self.state().fail_resolve.insert(subject_id.into());
    }

    /// Granting a role to `subject_id` is rejected.
    pub fn fail_grant_for(&self, subject_id: impl Into<SubjectId>) {
        self.state().fail_grant.insert(subject_id.into());
    }

    /// Revoking a role from `subject_id` is rejected.
    pub fn fail_revoke_for(&self, subject_id: impl Into<SubjectId>) {
        self.state().fail_revoke.insert(subject_id.into());
    }

    /// Reminders to `subject_id` are rejected, like a closed inbox.
    pub fn fail_notify_for(&self, subject_id: impl Into<SubjectId>) {
        self.state().fail_notify.insert(subject_id.into());
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Reminders attempted for `subject_id`, successful or not.
    pub fn notify_count(&self, subject_id: &SubjectId) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Notify { subject_id: s, .. } if s == subject_id))
            .count()
    }

    /// Revocations attempted for `subject_id`, successful or not.
    pub fn revoke_count(&self, subject_id: &SubjectId) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Revoke { subject_id: s, .. } if s == subject_id))
            .count()
    }

    /// Roles `subject_id` currently holds.
    pub fn roles_of(&self, subject_id: &SubjectId) -> HashSet<String> {
        self.state()
            .roles
            .get(subject_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MembershipResolver for MemoryDirectory {
    async fn resolve(&self, subject_id: &SubjectId) -> Result<Option<MemberHandle>> {
        let mut state = self.state();
        state.calls.push(Call::Resolve(subject_id.clone()));

        if state.fail_resolve.contains(subject_id) {
            return Err(AdapterError::Transport("directory unreachable".into()));
        }
        Ok(state.members.get(subject_id).cloned())
    }
}

#[async_trait]
impl RoleAuthority for MemoryDirectory {
    async fn grant(
        &self,
        member: &MemberHandle,
        _group_id: &GroupId,
        group: &GroupDefinition,
    ) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::Grant {
            subject_id: member.subject_id.clone(),
            role_id: group.role_id.clone(),
        });

        if state.fail_grant.contains(&member.subject_id) {
            return Err(AdapterError::Rejected("missing permission to manage roles".into()));
        }
        state
            .roles
            .entry(member.subject_id.clone())
            .or_default()
            .insert(group.role_id.clone());
        Ok(())
    }

    async fn revoke(
        &self,
        member: &MemberHandle,
        _group_id: &GroupId,
        group: &GroupDefinition,
    ) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::Revoke {
            subject_id: member.subject_id.clone(),
            role_id: group.role_id.clone(),
        });

        if state.fail_revoke.contains(&member.subject_id) {
            return Err(AdapterError::Rejected("missing permission to manage roles".into()));
        }
        if let Some(roles) = state.roles.get_mut(&member.subject_id) {
            roles.remove(&group.role_id);
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for MemoryDirectory {
    async fn notify(&self, member: &MemberHandle, reminder: &Reminder) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::Notify {
            subject_id: member.subject_id.clone(),
            reminder: reminder.clone(),
        });

        if state.fail_notify.contains(&member.subject_id) {
            return Err(AdapterError::Rejected("recipient does not accept messages".into()));
        }
        Ok(())
    }
}

/// Audit sink that keeps every event.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold() -> GroupDefinition {
        GroupDefinition::new("Gold", "role-gold")
    }

    #[tokio::test]
    async fn test_resolve_known_and_unknown() {
        let dir = MemoryDirectory::new();
        dir.add_member("alice", "alice#0001");

        let alice = dir.resolve(&"alice".into()).await.unwrap().unwrap();
        assert_eq!(alice.display_name, "alice#0001");
        assert!(dir.resolve(&"bob".into()).await.unwrap().is_none());

        dir.fail_resolve_for("alice");
        assert!(dir.resolve(&"alice".into()).await.is_err());
    }

    #[tokio::test]
    async fn test_grant_and_revoke_track_roles() {
        let dir = MemoryDirectory::new();
        dir.add_member("alice", "alice");
        let alice = dir.resolve(&"alice".into()).await.unwrap().unwrap();

        dir.grant(&alice, &"gold".into(), &gold()).await.unwrap();
        assert!(dir.roles_of(&"alice".into()).contains("role-gold"));

        dir.revoke(&alice, &"gold".into(), &gold()).await.unwrap();
        assert!(dir.roles_of(&"alice".into()).is_empty());
        assert_eq!(dir.revoke_count(&"alice".into()), 1);
    }

    #[tokio::test]
    async fn test_scripted_failures_are_still_recorded() {
        let dir = MemoryDirectory::new();
        dir.add_member("alice", "alice");
        dir.fail_revoke_for("alice");
        let alice = dir.resolve(&"alice".into()).await.unwrap().unwrap();

        let err = dir.revoke(&alice, &"gold".into(), &gold()).await.unwrap_err();
        assert!(matches!(err, AdapterError::Rejected(_)));
        assert_eq!(dir.revoke_count(&"alice".into()), 1);
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingAuditSink::new();
        sink.record(&AuditEvent::Revoked {
            member: "a".into(),
            group: "g".into(),
        })
        .await;
        assert_eq!(sink.events().len(), 1);
    }
}
