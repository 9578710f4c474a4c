//! Audit events and the built-in sinks.

use std::fmt;

use async_trait::async_trait;
use tenure_core::{GroupId, SubjectId};

use crate::reminder::format_millis;
use crate::traits::AuditSink;

/// Something an operator may want to follow up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    Enrolled {
        member: String,
        group: String,
        days: i64,
    },
    ReminderSent {
        member: String,
        group: String,
        expires_at: i64,
    },
    ReminderFailed {
        member: String,
        group: String,
        reason: String,
    },
    Revoked {
        member: String,
        group: String,
    },
    RevokeFailed {
        member: String,
        group: String,
        reason: String,
    },
    /// Expired grant removed without a revocation call.
    RevokeSkipped {
        subject_id: SubjectId,
        group_id: GroupId,
        reason: String,
    },
    /// A grant could not be persisted or removed during a sweep.
    StoreFailed {
        subject_id: SubjectId,
        reason: String,
    },
}

impl AuditEvent {
    /// Whether this event needs manual follow-up.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AuditEvent::ReminderFailed { .. }
                | AuditEvent::RevokeFailed { .. }
                | AuditEvent::RevokeSkipped { .. }
                | AuditEvent::StoreFailed { .. }
        )
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::Enrolled { member, group, days } => {
                write!(f, "Added {} to {} for {} day(s).", member, group, days)
            }
            AuditEvent::ReminderSent {
                member,
                group,
                expires_at,
            } => write!(
                f,
                "Reminder sent to {} for {} (expires {}).",
                member,
                group,
                format_millis(*expires_at)
            ),
            AuditEvent::ReminderFailed {
                member,
                group,
                reason,
            } => write!(
                f,
                "Could not deliver reminder to {} for {}: {}",
                member, group, reason
            ),
            AuditEvent::Revoked { member, group } => {
                write!(f, "Removed {} role from {} (expired).", group, member)
            }
            AuditEvent::RevokeFailed {
                member,
                group,
                reason,
            } => write!(
                f,
                "Failed to remove {} role from {}: {}",
                group, member, reason
            ),
            AuditEvent::RevokeSkipped {
                subject_id,
                group_id,
                reason,
            } => write!(
                f,
                "Expired grant for {} in {} removed without revoking: {}",
                subject_id, group_id, reason
            ),
            AuditEvent::StoreFailed { subject_id, reason } => {
                write!(f, "Storage failure for {}: {}", subject_id, reason)
            }
        }
    }
}

/// Sink for when no audit destination is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _event: &AuditEvent) {}
}

/// Sink that writes events to the `tenure::audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) {
        if event.is_failure() {
            tracing::warn!(target: "tenure::audit", "{}", event);
        } else {
            tracing::info!(target: "tenure::audit", "{}", event);
        }
    }
}
