//! SQLite implementation of the GrantStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. The connection runs
//! with `synchronous = FULL` so a committed write survives a crash.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tenure_core::{now_millis, Grant, GroupId, SubjectId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::GrantStore;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// A missing file (and any missing parent directory) is created with an
    /// empty schema. A file that exists but is not a readable database is
    /// reported as [`StoreError::Corrupt`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Connection::open(path)
            .map_err(StoreError::from)
            .and_then(Self::init)
            .map_err(|e| corrupt_if_not_database(e, path))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "synchronous", "FULL")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn corrupt_if_not_database(err: StoreError, path: &Path) -> StoreError {
    let unreadable = matches!(
        &err,
        StoreError::Database(rusqlite::Error::SqliteFailure(e, _))
            if matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    );

    if unreadable {
        StoreError::Corrupt {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    } else {
        err
    }
}

/// Row conversion failures are bad data; anything else is the database.
fn row_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => {
            StoreError::InvalidData(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

// Helper to convert a row to Grant
fn row_to_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Grant> {
    let subject_id: String = row.get("subject_id")?;
    let group_id: String = row.get("group_id")?;
    let expires_at: i64 = row.get("expires_at")?;
    let reminded: i64 = row.get("reminded")?;

    Ok(Grant::restore(
        SubjectId::new(subject_id),
        GroupId::new(group_id),
        expires_at,
        reminded != 0,
    ))
}

#[async_trait]
impl GrantStore for SqliteStore {
    async fn upsert(&self, grant: &Grant) -> Result<()> {
        let grant = grant.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO grants (subject_id, group_id, expires_at, reminded, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(subject_id) DO UPDATE SET
                    group_id = excluded.group_id,
                    expires_at = excluded.expires_at,
                    reminded = excluded.reminded,
                    updated_at = excluded.updated_at",
                params![
                    grant.subject_id.as_str(),
                    grant.group_id.as_str(),
                    grant.expires_at,
                    i64::from(grant.reminded()),
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, subject_id: &SubjectId) -> Result<bool> {
        let subject_id = subject_id.clone();

        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM grants WHERE subject_id = ?1",
                params![subject_id.as_str()],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn get(&self, subject_id: &SubjectId) -> Result<Option<Grant>> {
        let subject_id = subject_id.clone();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT subject_id, group_id, expires_at, reminded
                 FROM grants WHERE subject_id = ?1",
                params![subject_id.as_str()],
                row_to_grant,
            )
            .optional()
            .map_err(row_error)
        })
        .await
    }

    async fn all(&self) -> Result<Vec<Grant>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT subject_id, group_id, expires_at, reminded FROM grants",
            )?;

            let grants = stmt
                .query_map([], row_to_grant)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(row_error)?;

            Ok(grants)
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM grants", [], |row| row.get(0))?;
            usize::try_from(n).map_err(|e| StoreError::InvalidData(e.to_string()))
        })
        .await
    }
}
