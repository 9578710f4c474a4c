//! Error types for collaborator calls.

use thiserror::Error;

/// Errors returned by external collaborators.
///
/// All of these are recoverable from the manager's point of view: they are
/// logged and audited, and never corrupt grant state.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The remote side does not know the subject or role.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote side refused the call (permissions, closed inbox, ...).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Network or protocol failure talking to the remote side.
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
