// ABOUTME: Persistence layer for atelier, owning every file under the data root.
// ABOUTME: Provides cached JSON document stores, the sharded run log, atomic writes, and startup recovery.

pub mod atomic;
pub mod config;
pub mod document;
pub mod paths;
pub mod recovery;
pub mod run_log;
pub mod storage;

pub use atomic::{StagedFile, stage, write_atomic};
pub use config::{AtelierConfig, ConfigError, RunMode};
pub use document::{DocumentError, DocumentStore};
pub use paths::resolve_data_root;
pub use recovery::sweep_stale_temps;
pub use run_log::{LogStore, RUN_LOG_DIR, RunLogError};
pub use storage::{Storage, StorageError};
