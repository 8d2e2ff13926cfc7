//! Module for the operations of the drive API.
//!
//! [`DriveApi`] is implemented by [`Client`](crate::Client) over HTTP. The upload
//! orchestrator and the dashboard only depend on the trait.

use crate::{
    file::File,
    folder::{Folder, FolderContents},
    Error, Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage used by the signed-in user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    /// Bytes used by all files of the user.
    #[serde(default)]
    pub total_usage: u64,
    /// The quota in bytes, if the server reports one.
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Request for a pre-signed upload URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: String,
    pub file_type: String,
    pub size: u64,
    pub folder_id: Option<String>,
}

/// Where the bytes of a file are stored before its metadata is saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadTarget {
    /// Pre-signed URL that accepts a `PUT` of the file content.
    pub upload_url: String,
    /// Key of the object in the storage service.
    pub s3_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawUploadTarget {
    upload_url: Option<String>,
    signed_url: Option<String>,
    url: Option<String>,
    s3_key: Option<String>,
    key: Option<String>,
}

impl RawUploadTarget {
    pub(crate) fn into_target(self) -> Result<UploadTarget> {
        let upload_url = self
            .upload_url
            .or(self.signed_url)
            .or(self.url)
            .filter(|v| !v.is_empty())
            .ok_or(Error::MalformedResponse("uploadUrl"))?;
        Ok(UploadTarget {
            upload_url,
            s3_key: self.s3_key.or(self.key).unwrap_or_default(),
        })
    }
}

/// Metadata saved after the content of a file has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub s3_key: String,
    pub folder_id: Option<String>,
}

/// The content of a file that is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Content {
    Memory(Vec<u8>),
    /// A local file that is read when it is uploaded.
    Path(PathBuf),
}

/// The operations the drive API offers to a signed-in user.
///
/// Folder ids of `None` address the root folder.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// `GET /folders/:id` (or `/folders/root`).
    async fn folder_contents(&self, folder_id: Option<&str>) -> Result<FolderContents>;
    /// `GET /files?folderId=`.
    async fn list_files(&self, folder_id: Option<&str>) -> Result<Vec<File>>;
    /// `POST /folders`.
    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<Folder>;
    /// `DELETE /folders/:id`. Contained files and folders are deleted by the server.
    async fn delete_folder(&self, id: &str) -> Result<()>;
    /// Resolves a folder path relative to `parent_id` to a folder id, creating
    /// missing folders on the way.
    async fn resolve_folder_path(&self, path: &str, parent_id: Option<&str>) -> Result<String>;
    /// `DELETE /files/:id`.
    async fn delete_file(&self, id: &str) -> Result<()>;
    /// `GET /files/:id/download`. Returns a time-limited URL.
    async fn download_url(&self, id: &str) -> Result<String>;
    /// `GET /files/storage`.
    async fn storage_usage(&self) -> Result<StorageUsage>;
    /// `POST /files/upload-url`.
    async fn upload_url(&self, request: &UploadUrlRequest) -> Result<UploadTarget>;
    /// Stores the content at a pre-signed URL. No session credentials are sent.
    async fn put_object(&self, url: &str, content: Content, content_type: &str) -> Result<()>;
    /// `POST /files`.
    async fn save_file(&self, metadata: &FileMetadata) -> Result<File>;
}
