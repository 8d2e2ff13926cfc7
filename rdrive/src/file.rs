//! Module for file resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Key of the object in the storage service.
    #[serde(default, alias = "key")]
    pub s3_key: String,
    /// The owning folder. `None` means the file lives in the root folder.
    #[serde(default, alias = "folder")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

pub(crate) fn default_mime_type() -> String {
    "application/octet-stream".to_owned()
}
