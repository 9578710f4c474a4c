//! SQLite schema versions.
//!
//! [`MIGRATIONS`] lists the SQL that takes the schema from version N-1 to
//! N. Pending steps run in one transaction on open, and a database written
//! by a newer build is refused rather than guessed at.

use rusqlite::{params, Connection};
use tenure_core::now_millis;

use crate::error::{Result, StoreError};

/// `(version, sql)` in ascending version order.
const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
    -- One live grant per subject
    CREATE TABLE grants (
        subject_id TEXT PRIMARY KEY,
        group_id TEXT NOT NULL,
        expires_at INTEGER NOT NULL,       -- Unix ms
        reminded INTEGER NOT NULL DEFAULT 0 CHECK (reminded IN (0, 1)),
        updated_at INTEGER NOT NULL        -- local time of last write
    );

    CREATE INDEX idx_grants_expires_at ON grants(expires_at);
    "#,
)];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = 1;

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "schema version {} was written by a newer release (this one supports {})",
            found, CURRENT_VERSION
        )));
    }

    let pending: Vec<_> = MIGRATIONS.iter().filter(|(v, _)| *v > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, now_millis()],
        )?;
    }
    tx.commit()?;

    tracing::info!(from = found, to = CURRENT_VERSION, "migrated grant schema");
    Ok(())
}

/// Highest applied version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?)
}
