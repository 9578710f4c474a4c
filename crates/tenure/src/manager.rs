//! The Manager: enrollment and the lifecycle sweep.
//!
//! The manager owns the only path that creates a grant ([`Manager::enroll`])
//! and the only path that mutates or removes one ([`Manager::sweep`]). Both
//! run behind one write gate, so the store always sees a single writer.
//!
//! Each grant a sweep touches goes through the same two steps: attempt the
//! external effect (reminder or revocation), then persist the transition.
//! The persisted transition never depends on whether the external effect
//! succeeded.

use std::sync::Arc;

use tenure_adapters::{
    AuditEvent, AuditSink, MemberHandle, MembershipResolver, Notifier, Reminder, RoleAuthority,
};
use tenure_core::{classify, now_millis, Grant, GroupCatalog, GroupId, SubjectId, Transition};
use tenure_store::GrantStore;
use tokio::sync::Mutex;

use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};

/// The external collaborators a manager drives.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn MembershipResolver>,
    pub roles: Arc<dyn RoleAuthority>,
    pub notifier: Arc<dyn Notifier>,
    pub audit: Arc<dyn AuditSink>,
}

impl Collaborators {
    /// Use one directory for resolution, roles, and notification.
    pub fn from_directory<D>(directory: Arc<D>, audit: Arc<dyn AuditSink>) -> Self
    where
        D: MembershipResolver + RoleAuthority + Notifier + 'static,
    {
        Self {
            resolver: directory.clone(),
            roles: directory.clone(),
            notifier: directory,
            audit,
        }
    }
}

/// What one sweep did with one grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Nothing due.
    Held,
    /// Reminder delivered and recorded.
    Reminded,
    /// Reminder attempted, delivery failed, recorded anyway.
    ReminderFailed,
    /// Reminder due but the subject could not be resolved; left untouched.
    Unresolved,
    /// Role revoked and grant deleted.
    Revoked,
    /// Revocation failed; grant deleted anyway.
    RevokeFailed,
    /// Revocation not attempted (subject gone or group unknown); grant deleted.
    RevokeSkipped,
    /// The transition could not be persisted.
    StoreFailed,
}

/// Result of one sweep cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Grants looked at.
    pub examined: usize,
    /// Grants with nothing due.
    pub held: usize,
    /// Reminders delivered.
    pub reminded: usize,
    /// Reminders attempted but not delivered.
    pub notify_failed: usize,
    /// Reminders skipped because the subject did not resolve.
    pub unresolved: usize,
    /// Expired grants deleted, however revocation went.
    pub expired: usize,
    /// Deleted grants whose revocation failed.
    pub revoke_failed: usize,
    /// Deleted grants whose revocation was never attempted.
    pub revoke_skipped: usize,
    /// Grants whose transition could not be persisted.
    pub errors: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: SweepOutcome) {
        self.examined += 1;
        match outcome {
            SweepOutcome::Held => self.held += 1,
            SweepOutcome::Reminded => self.reminded += 1,
            SweepOutcome::ReminderFailed => self.notify_failed += 1,
            SweepOutcome::Unresolved => self.unresolved += 1,
            SweepOutcome::Revoked => self.expired += 1,
            SweepOutcome::RevokeFailed => {
                self.expired += 1;
                self.revoke_failed += 1;
            }
            SweepOutcome::RevokeSkipped => {
                self.expired += 1;
                self.revoke_skipped += 1;
            }
            SweepOutcome::StoreFailed => self.errors += 1,
        }
    }
}

/// How the revocation half of an expiry went.
enum Revocation {
    Done { member: String, group: String },
    Failed { member: String, group: String, reason: String },
    Skipped { reason: String },
}

/// The membership lifecycle manager.
pub struct Manager<S: GrantStore + ?Sized> {
    /// The grant store; the only copy of grant state.
    store: Arc<S>,
    /// External collaborators.
    collaborators: Collaborators,
    /// Group display metadata and role ids.
    catalog: GroupCatalog,
    /// Configuration.
    config: ManagerConfig,
    /// Serializes enrollment and sweeps.
    gate: Mutex<()>,
}

impl<S: GrantStore + ?Sized> Manager<S> {
    /// Create a new manager.
    pub fn new(
        store: Arc<S>,
        collaborators: Collaborators,
        catalog: GroupCatalog,
        config: ManagerConfig,
    ) -> Self {
        Self {
            store,
            collaborators,
            catalog,
            config,
            gate: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &GroupCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Snapshot of every live grant.
    pub async fn grants(&self) -> Result<Vec<Grant>> {
        Ok(self.store.all().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Enrollment
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `subject_id` membership in `group_id` for `duration_days`.
    ///
    /// Replaces any existing grant for the subject. See [`Manager::enroll_at`].
    pub async fn enroll(
        &self,
        subject_id: impl Into<SubjectId>,
        group_id: impl Into<GroupId>,
        duration_days: i64,
    ) -> Result<Grant> {
        self.enroll_at(subject_id, group_id, duration_days, now_millis())
            .await
    }

    /// Enroll with an explicit clock reading.
    ///
    /// The role is granted before anything is stored: if the grant call
    /// fails, no grant is written. Non-positive durations are accepted and
    /// expire on the next sweep.
    pub async fn enroll_at(
        &self,
        subject_id: impl Into<SubjectId>,
        group_id: impl Into<GroupId>,
        duration_days: i64,
        now: i64,
    ) -> Result<Grant> {
        let subject_id = subject_id.into();
        let group_id = group_id.into();
        let _gate = self.gate.lock().await;

        let group = self
            .catalog
            .get(&group_id)
            .ok_or_else(|| ManagerError::UnknownGroup(group_id.clone()))?;

        let member = self
            .collaborators
            .resolver
            .resolve(&subject_id)
            .await?
            .ok_or_else(|| ManagerError::SubjectNotFound(subject_id.clone()))?;

        self.collaborators
            .roles
            .grant(&member, &group_id, group)
            .await?;

        let grant = Grant::for_days(subject_id, group_id, now, duration_days);
        self.store.upsert(&grant).await?;

        tracing::info!(
            subject_id = %grant.subject_id,
            group_id = %grant.group_id,
            expires_at = grant.expires_at,
            "enrolled"
        );
        self.audit(AuditEvent::Enrolled {
            member: member.display_name,
            group: group.display_name.clone(),
            days: duration_days,
        })
        .await;

        Ok(grant)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sweep
    // ─────────────────────────────────────────────────────────────────────────

    /// Run one sweep cycle at the current time.
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(now_millis()).await
    }

    /// Run one sweep cycle as if the clock read `now`.
    ///
    /// Only a failure to read the grant set fails the cycle. Every per-grant
    /// failure is logged, audited, and counted in the report, and the sweep
    /// moves on to the next grant.
    pub async fn sweep_at(&self, now: i64) -> Result<SweepReport> {
        let _gate = self.gate.lock().await;
        let mut report = SweepReport::default();

        for grant in self.store.all().await? {
            let outcome = match classify(&grant, now, self.config.reminder_window) {
                Transition::Hold => {
                    tracing::debug!(
                        subject_id = %grant.subject_id,
                        time_left = grant.time_left(now),
                        "holding"
                    );
                    SweepOutcome::Held
                }
                Transition::Remind => self.remind(grant, now).await,
                Transition::Expire => self.expire(grant).await,
            };
            report.record(outcome);
        }

        tracing::info!(
            examined = report.examined,
            reminded = report.reminded,
            expired = report.expired,
            errors = report.errors,
            "sweep complete"
        );
        Ok(report)
    }

    /// Remind step: notify, then mark reminded whatever the delivery outcome.
    async fn remind(&self, mut grant: Grant, now: i64) -> SweepOutcome {
        let Some(member) = self.resolve_quietly(&grant.subject_id).await else {
            return SweepOutcome::Unresolved;
        };

        let reminder = Reminder::for_grant(&grant, &self.catalog, now);
        let delivery = self
            .collaborators
            .notifier
            .notify(&member, &reminder)
            .await;

        grant.mark_reminded();
        if let Err(e) = self.store.upsert(&grant).await {
            return self.store_failed(&grant.subject_id, e.to_string()).await;
        }

        match delivery {
            Ok(()) => {
                tracing::info!(
                    subject_id = %grant.subject_id,
                    group_id = %grant.group_id,
                    hours_left = reminder.hours_left,
                    "reminder sent"
                );
                self.audit(AuditEvent::ReminderSent {
                    member: member.display_name,
                    group: reminder.display_name,
                    expires_at: grant.expires_at,
                })
                .await;
                SweepOutcome::Reminded
            }
            Err(e) => {
                tracing::warn!(
                    subject_id = %grant.subject_id,
                    group_id = %grant.group_id,
                    error = %e,
                    "reminder not delivered"
                );
                self.audit(AuditEvent::ReminderFailed {
                    member: member.display_name,
                    group: reminder.display_name,
                    reason: e.to_string(),
                })
                .await;
                SweepOutcome::ReminderFailed
            }
        }
    }

    /// Expire step: attempt revocation, then delete unconditionally.
    async fn expire(&self, grant: Grant) -> SweepOutcome {
        let revocation = self.revoke(&grant).await;

        if let Err(e) = self.store.delete(&grant.subject_id).await {
            return self.store_failed(&grant.subject_id, e.to_string()).await;
        }

        match revocation {
            Revocation::Done { member, group } => {
                tracing::info!(
                    subject_id = %grant.subject_id,
                    group_id = %grant.group_id,
                    "expired and revoked"
                );
                self.audit(AuditEvent::Revoked { member, group }).await;
                SweepOutcome::Revoked
            }
            Revocation::Failed {
                member,
                group,
                reason,
            } => {
                self.audit(AuditEvent::RevokeFailed {
                    member,
                    group,
                    reason,
                })
                .await;
                SweepOutcome::RevokeFailed
            }
            Revocation::Skipped { reason } => {
                tracing::info!(
                    subject_id = %grant.subject_id,
                    group_id = %grant.group_id,
                    reason = %reason,
                    "expired without revocation"
                );
                self.audit(AuditEvent::RevokeSkipped {
                    subject_id: grant.subject_id.clone(),
                    group_id: grant.group_id.clone(),
                    reason,
                })
                .await;
                SweepOutcome::RevokeSkipped
            }
        }
    }

    async fn revoke(&self, grant: &Grant) -> Revocation {
        let Some(group) = self.catalog.lookup(&grant.group_id) else {
            tracing::warn!(
                subject_id = %grant.subject_id,
                group_id = %grant.group_id,
                "expired grant references a group missing from the catalog"
            );
            return Revocation::Skipped {
                reason: format!("group {} is not in the catalog", grant.group_id),
            };
        };

        let member = match self.collaborators.resolver.resolve(&grant.subject_id).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                return Revocation::Skipped {
                    reason: "subject is no longer a member".to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(subject_id = %grant.subject_id, error = %e, "resolve failed");
                return Revocation::Skipped {
                    reason: format!("could not resolve subject: {}", e),
                };
            }
        };

        match self
            .collaborators
            .roles
            .revoke(&member, &grant.group_id, group)
            .await
        {
            Ok(()) => Revocation::Done {
                member: member.display_name,
                group: group.display_name.clone(),
            },
            Err(e) => {
                tracing::warn!(
                    subject_id = %grant.subject_id,
                    group_id = %grant.group_id,
                    error = %e,
                    "revoke failed"
                );
                Revocation::Failed {
                    member: member.display_name,
                    group: group.display_name.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Resolve for the remind step. Failures are logged and yield `None`.
    async fn resolve_quietly(&self, subject_id: &SubjectId) -> Option<MemberHandle> {
        match self.collaborators.resolver.resolve(subject_id).await {
            Ok(Some(member)) => Some(member),
            Ok(None) => {
                tracing::debug!(subject_id = %subject_id, "subject not found, skipping");
                None
            }
            Err(e) => {
                tracing::warn!(subject_id = %subject_id, error = %e, "resolve failed, skipping");
                None
            }
        }
    }

    async fn store_failed(&self, subject_id: &SubjectId, reason: String) -> SweepOutcome {
        tracing::error!(subject_id = %subject_id, error = %reason, "could not persist transition");
        self.audit(AuditEvent::StoreFailed {
            subject_id: subject_id.clone(),
            reason,
        })
        .await;
        SweepOutcome::StoreFailed
    }

    async fn audit(&self, event: AuditEvent) {
        self.collaborators.audit.record(&event).await;
    }
}
