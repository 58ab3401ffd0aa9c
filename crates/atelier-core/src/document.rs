// ABOUTME: The Document trait implemented by every whole-file JSON domain (config, resources, library).
// ABOUTME: Ties a document type to its file name and its schema version tag.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Schema version written into freshly seeded documents.
pub const SCHEMA_VERSION: &str = "1";

/// A single JSON document persisted whole under the data root.
///
/// `Default` must produce the document a fresh data directory is seeded
/// with: the current schema version and empty collections.
pub trait Document: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// File name relative to the data root, e.g. `config.json`.
    const FILE_NAME: &'static str;

    /// The `schemaVersion` tag carried by this document.
    fn schema_version(&self) -> &str;
}
