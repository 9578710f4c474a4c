//! Error types for the manager.

use tenure_adapters::AdapterError;
use tenure_core::{GroupId, SubjectId};
use tenure_store::StoreError;
use thiserror::Error;

/// Errors returned synchronously by [`Manager`](crate::Manager) operations.
///
/// Sweeps never return per-grant failures through this type; those are
/// logged, audited, and counted in the [`SweepReport`](crate::SweepReport).
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// An external collaborator failed.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// The group is not in the catalog.
    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),

    /// The subject is not a member of the managed population.
    #[error("subject not found: {0}")]
    SubjectNotFound(SubjectId),
}

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;
