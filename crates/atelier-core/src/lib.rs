// ABOUTME: Core library for atelier, containing the persisted document and run-log types.
// ABOUTME: These types define the on-disk JSON shapes owned by the atelier-store crate.

pub mod document;
pub mod library;
pub mod resources;
pub mod run_log;
pub mod settings;

pub use document::{Document, SCHEMA_VERSION};
pub use library::{Folder, LibraryDocument, LibraryImage};
pub use resources::{Model, PromptTemplate, Provider, ResourcesDocument};
pub use run_log::{RunLog, RunLogFilter, RunStatus, ShardKey};
pub use settings::{ApiToken, ConfigDocument};
