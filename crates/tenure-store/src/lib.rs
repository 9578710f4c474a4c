//! # Tenure Store
//!
//! Storage abstraction for grants. Provides a trait-based interface with
//! SQLite, JSON-file, and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`GrantStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage (primary)
//! - [`JsonFileStore`] - One JSON object in one file
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenure_core::Grant;
//! use tenure_store::{GrantStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("tenure.db").unwrap();
//!
//!     let grant = Grant::new("1234".into(), "gold".into(), 1_735_689_600_000);
//!     store.upsert(&grant).await.unwrap();
//!
//!     for grant in store.all().await.unwrap() {
//!         println!("{} -> {}", grant.subject_id, grant.group_id);
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Durable writes**: a successful `upsert`/`delete` is on stable storage
//! - **Missing storage** starts empty; **corrupt storage** fails `open`
//! - **No caching layer**: the store is the only copy of grant state

pub mod error;
pub mod json;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::GrantStore;
