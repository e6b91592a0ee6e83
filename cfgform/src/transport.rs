//! Loading and saving configuration documents.
//!
//! [`ConfigStore`] is the seam between an edit session and wherever the
//! document lives. [`FileStore`] keeps it in a JSON or TOML file chosen by
//! extension and writes a timestamped backup before every overwrite.

use std::{
    future::Future,
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::{debug, info};
use serde_json::{Map, Value};
use thiserror::Error;

/// Load or save failure, reported to the user verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            message: message.into(),
        }
    }
}

/// Where configuration documents come from and go to.
pub trait ConfigStore: Send + Sync {
    /// Read the current document. The root is always a mapping.
    fn load(&self) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// Replace the stored document with `document`.
    ///
    /// On failure the previously stored content must be left intact.
    fn save(&self, document: &Value) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, TransportError> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match ext {
            "json" => Ok(Format::Json),
            "toml" | "tml" => Ok(Format::Toml),
            _ => Err(TransportError::new(format!(
                "unsupported config file extension: {ext:?}"
            ))),
        }
    }

    fn parse(self, content: &str) -> Result<Value, TransportError> {
        let parsed = match self {
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| TransportError::new(format!("failed to parse config: {e}")))
    }

    fn render(self, document: &Value) -> Result<String, TransportError> {
        let rendered = match self {
            Format::Json => serde_json::to_string_pretty(document).map_err(|e| e.to_string()),
            Format::Toml => toml::to_string_pretty(document).map_err(|e| e.to_string()),
        };
        rendered.map_err(|e| TransportError::new(format!("failed to serialize config: {e}")))
    }
}

/// Document stored in a `.json` or `.toml` file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backup file name for a save at `secs`: `config.bk-1700000000.toml`.
    pub fn backup_path(&self, secs: u64) -> PathBuf {
        let ext = self
            .path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        self.path.with_extension(format!("bk-{secs}.{ext}"))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> TransportError {
    TransportError::new(format!("failed to {action} {}: {e}", path.display()))
}

impl ConfigStore for FileStore {
    async fn load(&self) -> Result<Value, TransportError> {
        let format = Format::of(&self.path)?;
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("{} does not exist, starting empty", self.path.display());
                return Ok(Value::Object(Map::new()));
            }
            Err(e) => return Err(io_error("read", &self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        let value = format.parse(&content)?;
        if !value.is_object() {
            return Err(TransportError::new(format!(
                "{}: root of the config must be a mapping",
                self.path.display()
            )));
        }
        info!("loaded config from {}", self.path.display());
        Ok(value)
    }

    async fn save(&self, document: &Value) -> Result<(), TransportError> {
        let format = Format::of(&self.path)?;
        let content = format.render(document)?;

        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            let secs = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            let backup = self.backup_path(secs);
            tokio::fs::copy(&self.path, &backup)
                .await
                .map_err(|e| io_error("back up", &self.path, e))?;
            debug!("backed up {} to {}", self.path.display(), backup.display());
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| io_error("write", &self.path, e))?;
        info!("saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_and_empty_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.toml"));
        assert_eq!(store.load().await.unwrap(), json!({}));

        std::fs::write(store.path(), "  \n").unwrap();
        assert_eq!(store.load().await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_toml_save_keeps_order_and_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[OLD]\nX = 1\n").unwrap();
        let store = FileStore::new(&path);

        let doc = json!({"SETTINGS": {"THREADS": 2, "ACCOUNTS_RANGE": [1, 5]}, "FLOW": {"SKIP_FAILED_TASKS": true}});
        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), doc);

        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("config.bk-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].ends_with(".toml"));
        let backup = std::fs::read_to_string(dir.path().join(&backups[0])).unwrap();
        assert_eq!(backup, "[OLD]\nX = 1\n");
    }

    #[tokio::test]
    async fn test_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.json"));
        let doc = json!({"EXCHANGES": {"withdrawals": [{"retries": 3}]}});
        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_unserializable_document_leaves_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[A]\nB = 1\n").unwrap();
        let store = FileStore::new(&path);

        // TOML has no null.
        let err = store.save(&json!({"A": {"B": null}})).await.unwrap_err();
        assert!(err.message.contains("serialize"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[A]\nB = 1\n");
    }

    #[tokio::test]
    async fn test_rejects_unknown_extension_and_scalar_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.yaml"));
        assert!(store.load().await.is_err());

        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = FileStore::new(&path).load().await.unwrap_err();
        assert!(err.message.contains("mapping"));
    }

    #[test]
    fn test_backup_path() {
        let store = FileStore::new("/tmp/x/config.toml");
        assert_eq!(
            store.backup_path(42),
            PathBuf::from("/tmp/x/config.bk-42.toml")
        );
    }
}
