//! Module for folder resources.

use crate::file::File;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier used in place of a folder id to address the root folder.
pub const ROOT: &str = "root";

/// A folder resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    /// The parent folder. `None` means the folder lives in the root folder.
    #[serde(default, rename = "parentFolderId", alias = "parentFolder")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The contents of a folder, as returned by `GET /folders/:id`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderContents {
    /// The folder itself. `None` for the root folder.
    #[serde(default)]
    pub folder: Option<Folder>,
    #[serde(default)]
    pub subfolders: Vec<Folder>,
    #[serde(default)]
    pub files: Vec<File>,
}
