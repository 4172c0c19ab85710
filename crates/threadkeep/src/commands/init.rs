//! Implementation of the `init` command.
//!
//! Creates the `.threadkeep/` directory with a configuration file and, for
//! the SQLite backend, an empty database with the schema applied.

use crate::config::{
    BackendKind, ThreadkeepConfig, CONFIG_FILE_NAME, DATABASE_FILE_NAME, THREADKEEP_DIR_NAME,
};
use crate::error::{Error, Result};
use crate::storage::sqlite::SqliteStorage;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within .threadkeep
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created threadkeep directory
    pub threadkeep_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created database, for the SQLite backend
    pub database_file: Option<PathBuf>,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
    /// The configured backend
    pub backend: BackendKind,
}

/// Initialize a new threadkeep root in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.threadkeep/` directory already exists
/// - File system operations fail
/// - The database cannot be created
pub async fn init(base_dir: &Path, backend: BackendKind) -> Result<InitResult> {
    let threadkeep_dir = base_dir.join(THREADKEEP_DIR_NAME);

    if is_initialized(base_dir) {
        return Err(Error::Config(format!(
            "threadkeep is already initialized in this directory. Found existing '{THREADKEEP_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&threadkeep_dir).await?;

    let config_file = threadkeep_dir.join(CONFIG_FILE_NAME);
    let config = ThreadkeepConfig::new(backend);
    config.save(&config_file).await?;

    let database_file = match backend {
        BackendKind::Sqlite => {
            let path = threadkeep_dir.join(DATABASE_FILE_NAME);
            let open_path = path.clone();
            tokio::task::spawn_blocking(move || SqliteStorage::open(&open_path))
                .await
                .map_err(|e| Error::StorageUnavailable(format!("failed to create database: {e}")))??;
            Some(path)
        }
        BackendKind::Memory => None,
    };

    let gitignore_file = threadkeep_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# threadkeep database files
threads.db
threads.db-wal
threads.db-shm
";
    fs::write(&gitignore_file, gitignore_content).await?;

    tracing::info!(path = %threadkeep_dir.display(), %backend, "Initialized threadkeep");

    Ok(InitResult {
        threadkeep_dir,
        config_file,
        database_file,
        gitignore_file,
        backend,
    })
}

/// Check if a directory has been initialized with threadkeep.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(THREADKEEP_DIR_NAME).exists()
}
