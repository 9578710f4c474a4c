//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use tenure::{Collaborators, Manager, ManagerConfig};
use tenure_adapters::{MemoryDirectory, RecordingAuditSink};
use tenure_core::{Grant, GroupCatalog, GroupDefinition};
use tenure_store::{GrantStore, MemoryStore};

/// A fixed clock reading (2023-11-14T22:13:20Z) for deterministic tests.
pub const NOW: i64 = 1_700_000_000_000;

/// Members known to the fixture's directory: `(subject_id, display_name)`.
pub const MEMBERS: &[(&str, &str)] = &[
    ("alice", "alice#0001"),
    ("bob", "bob#0002"),
    ("carol", "carol#0003"),
];

/// An in-memory store, a scriptable directory, and a recording audit sink.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub directory: Arc<MemoryDirectory>,
    pub audit: Arc<RecordingAuditSink>,
    pub catalog: GroupCatalog,
    pub config: ManagerConfig,
}

impl TestFixture {
    /// Create a fixture with groups `gold` and `silver` and the [`MEMBERS`].
    pub fn new() -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        for (subject_id, display_name) in MEMBERS {
            directory.add_member(*subject_id, display_name);
        }

        Self {
            store: Arc::new(MemoryStore::new()),
            directory,
            audit: Arc::new(RecordingAuditSink::new()),
            catalog: default_catalog(),
            config: ManagerConfig::default(),
        }
    }

    /// Seed the store with `grants`.
    pub fn with_grants(mut self, grants: impl IntoIterator<Item = Grant>) -> Self {
        self.store = Arc::new(MemoryStore::with_grants(grants));
        self
    }

    /// Collaborators backed by the fixture's directory and audit sink.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::from_directory(self.directory.clone(), self.audit.clone())
    }

    /// A manager over the fixture's memory store.
    pub fn manager(&self) -> Manager<MemoryStore> {
        self.manager_with_store(self.store.clone())
    }

    /// A manager over another store, sharing the fixture's collaborators.
    pub fn manager_with_store<S: GrantStore + ?Sized>(&self, store: Arc<S>) -> Manager<S> {
        Manager::new(
            store,
            self.collaborators(),
            self.catalog.clone(),
            self.config.clone(),
        )
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Catalog with `gold` and `silver`.
pub fn default_catalog() -> GroupCatalog {
    GroupCatalog::new()
        .with_group(
            "gold",
            GroupDefinition::new("Gold Members", "role-gold")
                .with_color("#FFD700")
                .with_contact("support@example.com"),
        )
        .with_group("silver", GroupDefinition::new("Silver Members", "role-silver"))
}

/// Grant expiring `offset_ms` after [`NOW`].
pub fn grant_in(subject_id: &str, group_id: &str, offset_ms: i64, reminded: bool) -> Grant {
    Grant::restore(
        subject_id.into(),
        group_id.into(),
        NOW.saturating_add(offset_ms),
        reminded,
    )
}
