//! # Tenure
//!
//! Time-limited group membership. A subject is enrolled into a group for a
//! number of days; a periodic sweep sends one reminder shortly before the
//! grant expires and revokes the membership once it has.
//!
//! ## Overview
//!
//! - **Enrollment** grants the external role and writes a fresh grant,
//!   replacing any previous one for the subject.
//! - **Sweep** classifies every grant as hold, remind, or expire, performs
//!   the external effect, and persists the transition before moving on.
//! - **Scheduler** runs the sweep after a startup delay and then on a fixed
//!   interval.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tenure::{Collaborators, Manager, ManagerConfig, Scheduler};
//! use tenure::adapters::{MemoryDirectory, TracingAuditSink};
//! use tenure::core::{GroupCatalog, GroupDefinition};
//! use tenure::store::SqliteStore;
//!
//! async fn example() {
//!     let store = Arc::new(SqliteStore::open("tenure.db").unwrap());
//!     let directory = Arc::new(MemoryDirectory::new());
//!     let catalog = GroupCatalog::new()
//!         .with_group("gold", GroupDefinition::new("Gold", "role-gold"));
//!
//!     let manager = Arc::new(Manager::new(
//!         store,
//!         Collaborators::from_directory(directory, Arc::new(TracingAuditSink)),
//!         catalog,
//!         ManagerConfig::default(),
//!     ));
//!
//!     manager.enroll("1234", "gold", 30).await.unwrap();
//!
//!     let scheduler = Scheduler::spawn(manager.clone());
//!     // ...
//!     scheduler.shutdown().await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `tenure::core` - Grants, the catalog, lifecycle classification
//! - `tenure::store` - Grant storage
//! - `tenure::adapters` - Collaborator traits and built-in sinks

pub mod config;
pub mod error;
pub mod manager;
pub mod scheduler;

pub use tenure_adapters as adapters;
pub use tenure_core as core;
pub use tenure_store as store;

pub use config::ManagerConfig;
pub use error::{ManagerError, Result};
pub use manager::{Collaborators, Manager, SweepOutcome, SweepReport};
pub use scheduler::Scheduler;

pub use tenure_core::{Grant, GroupCatalog, GroupDefinition, GroupId, SubjectId};
