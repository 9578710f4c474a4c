//! GrantStore trait: the abstract interface for grant persistence.
//!
//! The manager is storage-agnostic. Implementations include SQLite
//! (primary), a single JSON file, and in-memory (for tests).

use async_trait::async_trait;
use tenure_core::{Grant, SubjectId};

use crate::error::Result;

/// Async interface for grant persistence, keyed by subject.
///
/// # Contract
///
/// - **Durable mutations**: `upsert` and `delete` have reached stable
///   storage when they return `Ok`. A crash right after must not lose them.
/// - **One grant per subject**: `upsert` replaces the whole record.
/// - **Idempotent delete**: deleting an absent subject is not an error.
/// - **Snapshots**: `all` returns copies in no particular order.
/// - **Single writer**: concurrent mutation of the same key is not
///   supported; callers serialize writes.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Insert or replace the grant for `grant.subject_id`.
    async fn upsert(&self, grant: &Grant) -> Result<()>;

    /// Remove the grant for `subject_id`.
    ///
    /// Returns `true` if a grant was removed, `false` if none existed.
    async fn delete(&self, subject_id: &SubjectId) -> Result<bool>;

    /// Get the grant for one subject.
    async fn get(&self, subject_id: &SubjectId) -> Result<Option<Grant>>;

    /// Snapshot of every stored grant.
    async fn all(&self) -> Result<Vec<Grant>>;

    /// Number of stored grants.
    async fn count(&self) -> Result<usize> {
        Ok(self.all().await?.len())
    }
}
