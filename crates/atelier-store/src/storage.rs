// ABOUTME: The storage context: one document store per domain plus the run log, built once per process.
// ABOUTME: Collaborators receive it by reference instead of reaching for global store instances.

use std::io;
use std::path::{Path, PathBuf};

use atelier_core::{ConfigDocument, LibraryDocument, ResourcesDocument};
use thiserror::Error;

use crate::config::AtelierConfig;
use crate::document::{DocumentError, DocumentStore};
use crate::recovery::sweep_stale_temps;
use crate::run_log::{LogStore, RunLogError};

/// Errors that can occur while opening or warming the storage context.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("run log error: {0}")]
    RunLog(#[from] RunLogError),
}

/// Every store rooted at one data directory. The process constructs this
/// once at startup and shares it (typically as `Arc<Storage>`).
pub struct Storage {
    root: PathBuf,
    config: DocumentStore<ConfigDocument>,
    resources: DocumentStore<ResourcesDocument>,
    library: DocumentStore<LibraryDocument>,
    run_logs: LogStore,
}

impl Storage {
    /// Open the stores under `root`, creating the directory if needed.
    /// Documents are not read until first use.
    pub async fn open(root: PathBuf) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!("opening storage at {}", root.display());

        Ok(Self {
            config: DocumentStore::open(&root),
            resources: DocumentStore::open(&root),
            library: DocumentStore::open(&root),
            run_logs: LogStore::open(&root),
            root,
        })
    }

    /// Resolve the data root from `config`, sweep stale temp files if
    /// configured, then open the stores.
    pub async fn open_with(config: &AtelierConfig, cwd: &Path) -> Result<Self, StorageError> {
        let root = config.data_root(cwd);
        if config.sweep_temps {
            sweep_stale_temps(&root).await?;
        }
        Self::open(root).await
    }

    /// Read every document once, seeding defaults for any that are missing
    /// and failing fast on a corrupt one.
    pub async fn load_all(&self) -> Result<(), StorageError> {
        self.config.read().await?;
        self.resources.read().await?;
        self.library.read().await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &DocumentStore<ConfigDocument> {
        &self.config
    }

    pub fn resources(&self) -> &DocumentStore<ResourcesDocument> {
        &self.resources
    }

    pub fn library(&self) -> &DocumentStore<LibraryDocument> {
        &self.library
    }

    pub fn run_logs(&self) -> &LogStore {
        &self.run_logs
    }
}
