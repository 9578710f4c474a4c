//! Lifecycle classification.
//!
//! A grant moves through `Active(reminded=false)` -> `Active(reminded=true)`
//! -> `Removed`, or straight from `Active(reminded=false)` to `Removed` when
//! expiry comes before the reminder window. [`classify`] decides which
//! transition, if any, a sweep should drive for one grant. It is pure: the
//! side effects and persistence live in the manager.

use std::time::Duration;

use crate::grant::Grant;
use crate::time::duration_to_millis;

/// Default lead time for the reminder: 24 hours.
pub const DEFAULT_REMINDER_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// What a sweep should do with a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do this cycle.
    Hold,
    /// Inside the reminder window and not reminded yet.
    Remind,
    /// Expired: revoke and delete.
    Expire,
}

/// Classify a grant at `now`.
///
/// Expiry wins over the reminder: a grant with no time left always takes
/// the expiry path, whether or not it was reminded.
pub fn classify(grant: &Grant, now: i64, reminder_window: Duration) -> Transition {
    let time_left = grant.time_left(now);

    if time_left <= 0 {
        Transition::Expire
    } else if time_left <= duration_to_millis(reminder_window) && !grant.reminded() {
        Transition::Remind
    } else {
        Transition::Hold
    }
}
