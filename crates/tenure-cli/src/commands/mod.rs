//! Command implementations for the tenure CLI.
//!
//! Each submodule implements one subcommand. Shared wiring (store, member
//! directory, audit sink, manager) lives here.

pub mod enroll;
pub mod groups;
pub mod list;
pub mod run;
pub mod sweep;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tenure::{Collaborators, Manager};
use tenure_adapters::{AuditSink, TracingAuditSink};
use tenure_store::{GrantStore, JsonFileStore, SqliteStore};

use crate::config::{Backend, Config};
use crate::directory::{HttpDirectory, WebhookAuditSink};

/// Open the configured grant store. Corrupt storage is fatal.
pub fn open_store(config: &Config) -> Result<Arc<dyn GrantStore>> {
    let path = &config.store.path;
    let store: Arc<dyn GrantStore> = match config.store.backend {
        Backend::Sqlite => Arc::new(
            SqliteStore::open(path)
                .with_context(|| format!("Failed to open SQLite store {}", path.display()))?,
        ),
        Backend::Json => Arc::new(
            JsonFileStore::open(path)
                .with_context(|| format!("Failed to open JSON store {}", path.display()))?,
        ),
    };
    Ok(store)
}

/// Build a manager wired to the HTTP directory and the configured audit sink.
pub fn build_manager(config: &Config) -> Result<Arc<Manager<dyn GrantStore>>> {
    let directory_config = config.directory()?;
    let token = config.directory_token()?;
    let directory = Arc::new(
        HttpDirectory::new(directory_config, token).context("Failed to create directory client")?,
    );

    let audit: Arc<dyn AuditSink> = match &config.audit.webhook_url {
        Some(url) => Arc::new(
            WebhookAuditSink::new(url.clone(), Duration::from_secs(directory_config.timeout_secs))
                .context("Failed to create audit webhook client")?,
        ),
        None => Arc::new(TracingAuditSink),
    };

    Ok(Arc::new(Manager::new(
        open_store(config)?,
        Collaborators::from_directory(directory, audit),
        config.groups.clone(),
        config.manager_config(),
    )))
}
