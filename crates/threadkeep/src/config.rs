//! Configuration management for threadkeep.
//!
//! A threadkeep root is any directory containing `.threadkeep/config.yaml`:
//!
//! ```yaml
//! storage:
//!   backend: sqlite
//!   database: .threadkeep/threads.db
//! request-timeout-secs: 30
//! ```
//!
//! `THREADKEEP_STORAGE` and `THREADKEEP_DATABASE` override the file.

use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Name of the threadkeep directory
pub const THREADKEEP_DIR_NAME: &str = ".threadkeep";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the SQLite database file
pub const DATABASE_FILE_NAME: &str = "threads.db";

/// Overrides `storage.backend`
pub const ENV_STORAGE: &str = "THREADKEEP_STORAGE";

/// Overrides `storage.database`
pub const ENV_DATABASE: &str = "THREADKEEP_DATABASE";

/// Database path that selects an in-memory SQLite database
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Default per-command deadline
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum directory depth to traverse when searching for the root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Storage backend kind as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Durable SQLite database
    Sqlite,
    /// Process-local, lost on exit
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!(
                "unknown storage backend '{other}' (expected 'sqlite' or 'memory')"
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadkeepConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Deadline applied to each command; 0 disables it
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: BackendKind,

    /// Database path, relative to the root unless absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ThreadkeepConfig {
    /// Create a configuration for the given backend with default paths.
    pub fn new(backend: BackendKind) -> Self {
        let database = match backend {
            BackendKind::Sqlite => Some(format!("{THREADKEEP_DIR_NAME}/{DATABASE_FILE_NAME}")),
            BackendKind::Memory => None,
        };
        Self {
            storage: StorageConfig { backend, database },
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = non_empty(ENV_STORAGE) {
            self.storage.backend = backend.parse()?;
            tracing::debug!(backend = %self.storage.backend, "Storage backend overridden from environment");
        }
        if let Some(database) = non_empty(ENV_DATABASE) {
            tracing::debug!(database = %database, "Database path overridden from environment");
            self.storage.database = Some(database);
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Per-command deadline, if enabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Resolve the storage backend relative to `root`.
    pub fn to_backend(&self, root: &Path) -> StorageBackend {
        match self.storage.backend {
            BackendKind::Memory => StorageBackend::InMemory,
            BackendKind::Sqlite => match self.storage.database.as_deref() {
                Some(IN_MEMORY_DATABASE) => StorageBackend::SqliteInMemory,
                Some(path) => StorageBackend::Sqlite(resolve(root, path)),
                None => StorageBackend::Sqlite(
                    root.join(THREADKEEP_DIR_NAME).join(DATABASE_FILE_NAME),
                ),
            },
        }
    }
}

impl Default for ThreadkeepConfig {
    fn default() -> Self {
        Self::new(BackendKind::Sqlite)
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Find the threadkeep root directory by searching up the directory tree.
///
/// Returns the directory containing `.threadkeep/`, or `None` if no root is
/// found within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_threadkeep_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(THREADKEEP_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_new_sqlite() {
        let config = ThreadkeepConfig::new(BackendKind::Sqlite);
        assert_eq!(config.storage.database.as_deref(), Some(".threadkeep/threads.db"));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let original = ThreadkeepConfig::new(BackendKind::Sqlite);
        original.save(&config_path).await.unwrap();

        let content = tokio::fs::read_to_string(&config_path).await.unwrap();
        assert!(content.contains("backend: sqlite"));
        assert!(content.contains("request-timeout-secs: 30"));

        let loaded = ThreadkeepConfig::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_timeout_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&config_path, "storage:\n  backend: memory\n")
            .await
            .unwrap();

        let loaded = ThreadkeepConfig::load(&config_path).await.unwrap();
        assert_eq!(loaded.storage.backend, BackendKind::Memory);
        assert_eq!(loaded.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_config_rejects_unknown_backend() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&config_path, "storage:\n  backend: postgres\n")
            .await
            .unwrap();

        let err = ThreadkeepConfig::load(&config_path).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides_backend_and_database() {
        let mut config = ThreadkeepConfig::new(BackendKind::Memory);
        config
            .apply_overrides(env(&[(ENV_STORAGE, "SQLite"), (ENV_DATABASE, "/var/lib/t.db")]))
            .unwrap();

        assert_eq!(config.storage.backend, BackendKind::Sqlite);
        assert_eq!(
            config.to_backend(Path::new("/root")),
            StorageBackend::Sqlite(PathBuf::from("/var/lib/t.db"))
        );
    }

    #[test]
    fn test_env_override_ignores_empty_values() {
        let mut config = ThreadkeepConfig::new(BackendKind::Sqlite);
        config.apply_overrides(env(&[(ENV_STORAGE, "  ")])).unwrap();
        assert_eq!(config.storage.backend, BackendKind::Sqlite);
    }

    #[test]
    fn test_env_override_rejects_unknown_backend() {
        let mut config = ThreadkeepConfig::default();
        let err = config
            .apply_overrides(env(&[(ENV_STORAGE, "redis")]))
            .unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    #[rstest]
    #[case::memory(BackendKind::Memory, None, StorageBackend::InMemory)]
    #[case::sqlite_default(
        BackendKind::Sqlite,
        None,
        StorageBackend::Sqlite(PathBuf::from("/proj/.threadkeep/threads.db"))
    )]
    #[case::sqlite_relative(
        BackendKind::Sqlite,
        Some("data/t.db"),
        StorageBackend::Sqlite(PathBuf::from("/proj/data/t.db"))
    )]
    #[case::sqlite_in_memory(BackendKind::Sqlite, Some(":memory:"), StorageBackend::SqliteInMemory)]
    fn test_to_backend(
        #[case] backend: BackendKind,
        #[case] database: Option<&str>,
        #[case] expected: StorageBackend,
    ) {
        let config = ThreadkeepConfig {
            storage: StorageConfig {
                backend,
                database: database.map(str::to_string),
            },
            request_timeout_secs: 0,
        };
        assert_eq!(config.to_backend(Path::new("/proj")), expected);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_find_root_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(THREADKEEP_DIR_NAME)).unwrap();

        let sub_dir = temp_dir.path().join("sub").join("nested");
        std::fs::create_dir_all(&sub_dir).unwrap();

        assert_eq!(
            find_threadkeep_root(&sub_dir),
            Some(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_find_root_not_found() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_threadkeep_root(temp_dir.path()).is_none());
    }
}
