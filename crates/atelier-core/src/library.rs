// ABOUTME: The media library document (library.json): folders and the images filed in them.
// ABOUTME: Removing a folder moves its images and child folders up to its parent instead of dropping them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

use crate::document::{Document, SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A generated or imported image tracked by the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryImage {
    /// Location of the image file, relative to the data root.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Run-log id of the generation that produced this image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LibraryImage {
    pub fn new(path: String) -> Self {
        Self {
            path,
            folder_id: None,
            prompt: None,
            run_id: None,
            width: None,
            height: None,
            created_at: Utc::now(),
            favorite: false,
            extra: Map::new(),
        }
    }
}

/// Media library: `{schemaVersion, folders, images}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocument {
    pub schema_version: String,
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
    #[serde(default)]
    pub images: BTreeMap<String, LibraryImage>,
}

impl Default for LibraryDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            folders: BTreeMap::new(),
            images: BTreeMap::new(),
        }
    }
}

impl Document for LibraryDocument {
    const FILE_NAME: &'static str = "library.json";

    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

impl LibraryDocument {
    /// Create a folder under `parent_id` (or the root) and return its new id.
    pub fn add_folder(&mut self, name: String, parent_id: Option<String>) -> String {
        let id = Ulid::new().to_string();
        self.folders.insert(
            id.clone(),
            Folder {
                name,
                parent_id,
                created_at: Utc::now(),
                extra: Map::new(),
            },
        );
        id
    }

    /// File an image and return its new id.
    pub fn add_image(&mut self, image: LibraryImage) -> String {
        let id = Ulid::new().to_string();
        self.images.insert(id.clone(), image);
        id
    }

    /// Images filed directly in `folder_id`; `None` selects the library root.
    pub fn images_in_folder<'a>(
        &'a self,
        folder_id: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a str, &'a LibraryImage)> + 'a {
        self.images
            .iter()
            .filter(move |(_, img)| img.folder_id.as_deref() == folder_id)
            .map(|(id, img)| (id.as_str(), img))
    }

    /// Remove a folder. Its images and child folders move up to the removed
    /// folder's parent. Returns the removed folder, if it existed.
    pub fn remove_folder(&mut self, folder_id: &str) -> Option<Folder> {
        let removed = self.folders.remove(folder_id)?;

        for image in self.images.values_mut() {
            if image.folder_id.as_deref() == Some(folder_id) {
                image.folder_id = removed.parent_id.clone();
            }
        }
        for folder in self.folders.values_mut() {
            if folder.parent_id.as_deref() == Some(folder_id) {
                folder.parent_id = removed.parent_id.clone();
            }
        }

        Some(removed)
    }
}
