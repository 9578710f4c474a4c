//! In-memory implementation of the GrantStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tenure_core::{Grant, SubjectId};

use crate::error::{Result, StoreError};
use crate::traits::GrantStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    grants: RwLock<HashMap<SubjectId, Grant>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `grants`.
    pub fn with_grants(grants: impl IntoIterator<Item = Grant>) -> Self {
        let map = grants
            .into_iter()
            .map(|g| (g.subject_id.clone(), g))
            .collect();
        Self {
            grants: RwLock::new(map),
        }
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn upsert(&self, grant: &Grant) -> Result<()> {
        let mut grants = self.grants.write().map_err(|_| StoreError::LockPoisoned)?;
        grants.insert(grant.subject_id.clone(), grant.clone());
        Ok(())
    }

    async fn delete(&self, subject_id: &SubjectId) -> Result<bool> {
        let mut grants = self.grants.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(grants.remove(subject_id).is_some())
    }

    async fn get(&self, subject_id: &SubjectId) -> Result<Option<Grant>> {
        let grants = self.grants.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(grants.get(subject_id).cloned())
    }

    async fn all(&self) -> Result<Vec<Grant>> {
        let grants = self.grants.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(grants.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        let grants = self.grants.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(grants.len())
    }
}
