//! Application context for CLI command execution.
//!
//! This module provides the `App` struct that locates the threadkeep root,
//! opens the configured storage, and hands out operation contexts.
//!
//! # Example
//!
//! ```no_run
//! use threadkeep::app::App;
//! use threadkeep::domain::{PageRequest, ThreadMode};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let ctx = app.context(None);
//!     let page = app
//!         .service()
//!         .list_posts(&ctx, &PageRequest::default(), ThreadMode::MetadataOnly)
//!         .await?;
//!     println!("{} posts", page.items.len());
//!     Ok(())
//! }
//! ```

use crate::config::{find_threadkeep_root, ThreadkeepConfig, CONFIG_FILE_NAME, THREADKEEP_DIR_NAME};
use crate::context::OpContext;
use crate::error::{Error, Result};
use crate::service::Service;
use crate::storage::{create_storage, StorageBackend};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application context for CLI operations.
pub struct App {
    service: Service,

    /// Directory containing `.threadkeep/`
    root: PathBuf,

    config: ThreadkeepConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("service", &self.service)
            .finish()
    }
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree for `.threadkeep/`, loads the
    /// configuration, applies environment overrides, and opens storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No threadkeep root is found in the directory tree
    /// - Configuration cannot be loaded
    /// - Storage initialization fails
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root = find_threadkeep_root(working_dir).ok_or_else(|| {
            Error::Config(format!(
                "Not a threadkeep root (or any parent): {}. Run 'threadkeep init' first.",
                working_dir.display()
            ))
        })?;

        let config_path = root.join(THREADKEEP_DIR_NAME).join(CONFIG_FILE_NAME);
        let mut config = ThreadkeepConfig::load(&config_path).await?;
        config.apply_env_overrides()?;

        Self::with_config(root, config).await
    }

    /// Create an App from an already loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if storage initialization fails.
    pub async fn with_config(root: PathBuf, config: ThreadkeepConfig) -> Result<Self> {
        let backend = config.to_backend(&root);
        if backend == StorageBackend::InMemory {
            tracing::warn!("Using in-memory storage; data is discarded when the command exits");
        }

        let storage = create_storage(backend).await?;
        Ok(Self {
            service: Service::new(storage),
            root,
            config,
        })
    }

    /// The service all commands go through.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Directory containing `.threadkeep/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Effective configuration after environment overrides.
    pub fn config(&self) -> &ThreadkeepConfig {
        &self.config
    }

    /// Context for one command. `timeout` overrides the configured deadline.
    pub fn context(&self, timeout: Option<Duration>) -> OpContext {
        match timeout.or_else(|| self.config.request_timeout()) {
            Some(timeout) => OpContext::with_timeout(timeout),
            None => OpContext::background(),
        }
    }
}
