//! Application context: which config file and registry to work on.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cfgform::{EditSession, FileStore, data::Schema};

/// Paths given on the command line.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Configuration document (`.toml` or `.json`).
    pub config: PathBuf,
    /// Registry override; the built-in registry when `None`.
    pub schema: Option<PathBuf>,
}

impl AppContext {
    pub fn new(config: PathBuf, schema: Option<PathBuf>) -> Self {
        AppContext { config, schema }
    }

    /// Loads the registry override, or returns the built-in one.
    pub fn load_schema(&self) -> Result<Schema> {
        match &self.schema {
            Some(path) => {
                debug!("loading schema from {}", path.display());
                Schema::from_path(path)
                    .with_context(|| format!("failed to load schema {}", path.display()))
            }
            None => Ok(Schema::builtin()),
        }
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.config)
    }

    /// Loads the config file and projects it.
    pub async fn open_session(&self) -> Result<EditSession<FileStore>> {
        let schema = self.load_schema()?;
        EditSession::open(self.store(), schema)
            .await
            .with_context(|| format!("failed to open {}", self.config.display()))
    }
}
