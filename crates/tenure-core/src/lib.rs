//! # Tenure Core
//!
//! Pure primitives for Tenure: grants, the group catalog, and lifecycle
//! classification.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Grant`] - A subject's time-bounded membership record
//! - [`SubjectId`] / [`GroupId`] - Identifier newtypes
//! - [`GroupCatalog`] - Static mapping from group id to display metadata
//! - [`Transition`] - What a sweep should do with a grant, see [`classify`]
//!
//! ## Time
//!
//! Timestamps are Unix milliseconds (`i64`). See the [`time`] module.

pub mod catalog;
pub mod error;
pub mod grant;
pub mod lifecycle;
pub mod time;
pub mod types;

pub use catalog::{parse_color, GroupCatalog, GroupDefinition, FALLBACK_COLOR, FALLBACK_CONTACT};
pub use error::{CoreError, Result};
pub use grant::Grant;
pub use lifecycle::{classify, Transition, DEFAULT_REMINDER_WINDOW};
pub use time::{now_millis, DAY_MS, HOUR_MS};
pub use types::{GroupId, SubjectId};
