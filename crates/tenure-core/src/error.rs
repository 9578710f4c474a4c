//! Error types for Tenure core.

use thiserror::Error;

/// Errors raised while validating core data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid group catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid color {0:?}: expected #RRGGBB")]
    InvalidColor(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
