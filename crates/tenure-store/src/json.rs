//! Single-file JSON implementation of the GrantStore trait.
//!
//! The file holds one object keyed by subject id:
//!
//! ```json
//! {
//!   "1234567890": { "expires_at": 1735689600000, "group_id": "gold", "reminded": false }
//! }
//! ```
//!
//! Files written by older deployments that use `expiry` / `group` as field
//! names are read transparently and rewritten in the current layout on the
//! next mutation.
//!
//! Every mutation rewrites the whole file: write a sibling temp file, fsync
//! it, rename it over the original, then fsync the directory. The in-memory
//! map is only updated after the rename succeeds, so it never runs ahead of
//! what is on disk.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tenure_core::{Grant, GroupId, SubjectId};

use crate::error::{Result, StoreError};
use crate::traits::GrantStore;

/// On-disk shape of one grant; the subject id is the map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GrantRecord {
    #[serde(alias = "expiry")]
    expires_at: i64,
    #[serde(alias = "group")]
    group_id: String,
    #[serde(default)]
    reminded: bool,
}

impl GrantRecord {
    fn from_grant(grant: &Grant) -> Self {
        Self {
            expires_at: grant.expires_at,
            group_id: grant.group_id.as_str().to_string(),
            reminded: grant.reminded(),
        }
    }

    fn into_grant(self, subject_id: &str) -> Grant {
        Grant::restore(
            SubjectId::new(subject_id),
            GroupId::new(self.group_id),
            self.expires_at,
            self.reminded,
        )
    }
}

type Records = BTreeMap<String, GrantRecord>;

struct JsonInner {
    path: PathBuf,
    records: Records,
}

impl JsonInner {
    /// Persist `next` and adopt it only once it is durable.
    fn commit(&mut self, next: Records) -> Result<()> {
        write_atomically(&self.path, &next)?;
        self.records = next;
        Ok(())
    }
}

/// JSON-file store implementation.
pub struct JsonFileStore {
    inner: Arc<Mutex<JsonInner>>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file is created holding an empty mapping. A file that
    /// exists but does not parse is [`StoreError::Corrupt`]; it is left
    /// untouched for an operator to inspect.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str::<Records>(&text).map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let empty = Records::new();
            write_atomically(&path, &empty)?;
            tracing::info!(path = %path.display(), "created empty grant file");
            empty
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(JsonInner { path, records })),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> Result<PathBuf> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.path.clone())
    }

    /// Run `f` with the store locked on the blocking pool.
    async fn with_inner<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut JsonInner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let mut inner = inner.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut inner)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn write_atomically(path: &Path, records: &Records) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let tmp = temp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    sync_parent_dir(path)?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "grants.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl GrantStore for JsonFileStore {
    async fn upsert(&self, grant: &Grant) -> Result<()> {
        let grant = grant.clone();

        self.with_inner(move |inner| {
            let mut next = inner.records.clone();
            next.insert(
                grant.subject_id.as_str().to_string(),
                GrantRecord::from_grant(&grant),
            );
            inner.commit(next)
        })
        .await
    }

    async fn delete(&self, subject_id: &SubjectId) -> Result<bool> {
        let subject_id = subject_id.clone();

        self.with_inner(move |inner| {
            if !inner.records.contains_key(subject_id.as_str()) {
                return Ok(false);
            }
            let mut next = inner.records.clone();
            next.remove(subject_id.as_str());
            inner.commit(next)?;
            Ok(true)
        })
        .await
    }

    async fn get(&self, subject_id: &SubjectId) -> Result<Option<Grant>> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .records
            .get(subject_id.as_str())
            .cloned()
            .map(|r| r.into_grant(subject_id.as_str())))
    }

    async fn all(&self) -> Result<Vec<Grant>> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .records
            .iter()
            .map(|(id, r)| r.clone().into_grant(id))
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(subject: &str, group: &str, expires_at: i64) -> Grant {
        Grant::new(subject.into(), group.into(), expires_at)
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("grants.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[tokio::test]
    async fn test_unparsable_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::open(&path).err().unwrap();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        // The broken file is left for inspection.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_reads_legacy_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.json");
        fs::write(
            &path,
            r#"{"42": {"expiry": 1700000000000, "group": "SmartFX Premium", "reminded": true}}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        let got = store.get(&"42".into()).await.unwrap().unwrap();
        assert_eq!(got.expires_at, 1_700_000_000_000);
        assert_eq!(got.group_id.as_str(), "SmartFX Premium");
        assert!(got.reminded());
    }

    #[tokio::test]
    async fn test_mutations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.upsert(&grant("alice", "gold", 1_000)).await.unwrap();
            store.upsert(&grant("bob", "silver", 2_000)).await.unwrap();
            store.upsert(&grant("carol", "gold", 3_000)).await.unwrap();
            assert!(store.delete(&"bob".into()).await.unwrap());
        }

        let store = JsonFileStore::open(&path).unwrap();
        let mut all = store.all().await.unwrap();
        all.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
        assert_eq!(
            all,
            vec![grant("alice", "gold", 1_000), grant("carol", "gold", 3_000)]
        );
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_delete_absent_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants.json");
        let store = JsonFileStore::open(&path).unwrap();

        assert!(!store.delete(&"nobody".into()).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/var/lib/tenure/grants.json"));
        assert_eq!(tmp, PathBuf::from("/var/lib/tenure/grants.json.tmp"));
    }
}
