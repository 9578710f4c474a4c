//! The Grant: a single subject's time-bounded membership record.

use serde::{Deserialize, Serialize};

use crate::time::{days_to_millis, HOUR_MS};
use crate::types::{GroupId, SubjectId};

/// A time-limited membership grant.
///
/// There is at most one live grant per subject. Enrolling a subject again
/// replaces its grant wholesale, which is the only way `reminded` can be
/// `false` again for that subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Who holds the membership.
    pub subject_id: SubjectId,

    /// Which group the membership is for.
    pub group_id: GroupId,

    /// When access lapses (Unix milliseconds).
    pub expires_at: i64,

    /// Whether the pre-expiry reminder has been attempted.
    reminded: bool,
}

impl Grant {
    /// Create a fresh grant that has not been reminded yet.
    pub fn new(subject_id: SubjectId, group_id: GroupId, expires_at: i64) -> Self {
        Self {
            subject_id,
            group_id,
            expires_at,
            reminded: false,
        }
    }

    /// Create a grant lasting `duration_days` from `now`.
    ///
    /// Non-positive durations produce a grant that is already expired.
    pub fn for_days(subject_id: SubjectId, group_id: GroupId, now: i64, duration_days: i64) -> Self {
        Self::new(
            subject_id,
            group_id,
            now.saturating_add(days_to_millis(duration_days)),
        )
    }

    /// Rebuild a grant from persisted fields.
    pub fn restore(subject_id: SubjectId, group_id: GroupId, expires_at: i64, reminded: bool) -> Self {
        Self {
            subject_id,
            group_id,
            expires_at,
            reminded,
        }
    }

    /// Whether the reminder has been attempted.
    pub fn reminded(&self) -> bool {
        self.reminded
    }

    /// Record that the reminder was attempted. One-way.
    pub fn mark_reminded(&mut self) {
        self.reminded = true;
    }

    /// Milliseconds until expiry; zero or negative once expired.
    pub fn time_left(&self, now: i64) -> i64 {
        self.expires_at.saturating_sub(now)
    }

    /// Whether the grant has lapsed at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.time_left(now) <= 0
    }

    /// Whole hours left, rounded up, never negative.
    pub fn hours_left(&self, now: i64) -> i64 {
        let left = self.time_left(now);
        if left <= 0 {
            0
        } else {
            left / HOUR_MS + i64::from(left % HOUR_MS != 0)
        }
    }
}
