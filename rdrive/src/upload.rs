//! Module for uploading batches of files.
//!
//! Each file goes through three steps that succeed or fail together:
//!
//! 1. request a pre-signed upload URL from the API,
//! 2. `PUT` the content to that URL,
//! 3. save the file metadata through the API.
//!
//! Files that were dropped together with their folders carry a relative path. The
//! folders of such a path are resolved (and created, if missing) by the API once per
//! batch, see [`FolderResolver`].

use crate::{
    api::{Content, DriveApi, FileMetadata, UploadUrlRequest},
    config::DEFAULT_UPLOAD_CONCURRENCY,
    file::{default_mime_type, File},
    notify::{Notice, Notifier},
    path::{split_entry_path, RemotePath},
    util::format_bytes,
    Error, Result,
};
use derive_setters::Setters;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::{collections::HashMap, path::Path, sync::Arc};
use tokio::sync::{Mutex, OnceCell};

/// Reason reported for a failed file when the error carries no message.
pub const GENERIC_FAILURE: &str = "Upload failed";

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Setters)]
#[setters(strip_option, prefix = "with_")]
pub struct UploadEntry {
    #[setters(skip)]
    pub name: String,
    /// Path relative to the selected folder, e.g. `photos/2021/beach.jpg`.
    #[setters(into)]
    pub relative_path: Option<String>,
    #[setters(into)]
    pub mime_type: Option<String>,
    #[setters(skip)]
    pub size: u64,
    #[setters(skip)]
    pub content: Content,
}

impl UploadEntry {
    /// Creates an entry with in-memory content.
    pub fn from_bytes<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            mime_type: None,
            size: bytes.len() as u64,
            content: Content::Memory(bytes),
        }
    }

    /// Creates an entry for a local file. The content is read when it is uploaded.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            relative_path: None,
            mime_type: None,
            size: metadata.len(),
            content: Content::Path(path.to_owned()),
        })
    }

    fn content_type(&self) -> String {
        self.mime_type
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_mime_type)
    }
}

/// Options of an upload batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Setters)]
#[setters(strip_option, prefix = "with_")]
pub struct UploadOptions {
    /// The folder the batch is uploaded to. `None` is the root folder.
    #[setters(into)]
    pub folder_id: Option<String>,
    /// Free space in bytes. Files that do not fit anymore are skipped.
    pub remaining_space: Option<u64>,
    /// Maximum number of files uploaded at the same time.
    pub concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            folder_id: None,
            remaining_space: None,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }
}

/// A file that was not uploaded because it exceeds the remaining space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkippedEntry {
    pub name: String,
    pub size: u64,
}

/// A file whose upload failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadFailure {
    pub name: String,
    pub reason: String,
}

/// The outcome of an upload batch. All lists keep the order of the input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: Vec<File>,
    pub failures: Vec<UploadFailure>,
    pub skipped: Vec<SkippedEntry>,
}

impl UploadSummary {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }
}

/// Splits entries into those that fit into `remaining_space` and those that don't.
///
/// Entries are admitted in order while their running total fits. An entry that does
/// not fit is skipped and later, smaller entries may still be admitted.
pub fn admit(
    entries: Vec<UploadEntry>,
    remaining_space: Option<u64>,
) -> (Vec<UploadEntry>, Vec<SkippedEntry>) {
    let remaining_space = match remaining_space {
        Some(v) => v,
        None => return (entries, Vec::new()),
    };
    let mut admitted = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    let mut batch_size: u64 = 0;
    for entry in entries {
        match batch_size.checked_add(entry.size) {
            Some(total) if total <= remaining_space => {
                batch_size = total;
                admitted.push(entry);
            }
            _ => skipped.push(SkippedEntry {
                name: entry.name,
                size: entry.size,
            }),
        }
    }
    (admitted, skipped)
}

/// Resolves relative folder paths to folder ids.
///
/// Paths are resolved one folder at a time, parents before children, and each folder
/// is resolved by the API at most once per batch, even when several uploads ask for
/// it at the same time: the first caller performs the request and the others wait for
/// its result. Failed resolutions are not remembered.
pub struct FolderResolver<'a, A: ?Sized> {
    api: &'a A,
    parent_id: Option<String>,
    resolved: Mutex<HashMap<RemotePath, Arc<OnceCell<String>>>>,
}

impl<'a, A: DriveApi + ?Sized> FolderResolver<'a, A> {
    /// Creates a resolver for paths relative to `parent_id`.
    pub fn new(api: &'a A, parent_id: Option<String>) -> Self {
        Self {
            api,
            parent_id,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the id of the folder at `path`. An empty path is the parent folder.
    pub async fn resolve(&self, path: &RemotePath) -> Result<Option<String>> {
        let mut folder_id = self.parent_id.clone();
        let mut prefix = RemotePath::default();
        for segment in path {
            prefix.push(segment);
            let cell = {
                let mut resolved = self.resolved.lock().await;
                Arc::clone(resolved.entry(prefix.clone()).or_default())
            };
            let id = cell
                .get_or_try_init(|| self.api.resolve_folder_path(segment, folder_id.as_deref()))
                .await?;
            folder_id = Some(id.clone());
        }
        Ok(folder_id)
    }
}

async fn upload_entry<A>(
    api: &A,
    resolver: &FolderResolver<'_, A>,
    entry: UploadEntry,
) -> Result<File>
where
    A: DriveApi + ?Sized,
{
    let (folder, name) = split_entry_path(entry.relative_path.as_deref(), &entry.name);
    let folder_id = match folder {
        Some(path) => resolver.resolve(&path).await?,
        None => resolver.parent_id.clone(),
    };
    let content_type = entry.content_type();

    let target = api
        .upload_url(&UploadUrlRequest {
            file_name: name.clone(),
            file_type: content_type.clone(),
            size: entry.size,
            folder_id: folder_id.clone(),
        })
        .await?;
    api.put_object(&target.upload_url, entry.content, &content_type)
        .await?;
    let file = api
        .save_file(&FileMetadata {
            name,
            size: entry.size,
            mime_type: content_type,
            s3_key: target.s3_key,
            folder_id,
        })
        .await?;
    debug!("uploaded {} as {}", entry.name, file.id);
    Ok(file)
}

/// Returns the reason shown to the user for a failed upload.
pub fn failure_reason(error: &Error) -> String {
    if let Some(message) = error.server_message() {
        return message.to_owned();
    }
    let message = error.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_owned()
    } else {
        message
    }
}

/// Uploads a batch of files.
///
/// Files that exceed the remaining space are skipped, the others are uploaded with
/// at most `options.concurrency` files in flight. A failing file never stops the
/// others. Progress and the final result are reported to `notifier`; the returned
/// summary contains the same information.
pub async fn upload_batch<A>(
    api: &A,
    notifier: &dyn Notifier,
    entries: Vec<UploadEntry>,
    options: &UploadOptions,
) -> UploadSummary
where
    A: DriveApi + ?Sized,
{
    let (admitted, skipped) = admit(entries, options.remaining_space);
    for entry in &skipped {
        notifier.notify(Notice::error(format!(
            "Skipped \"{}\": exceeds remaining storage ({}).",
            entry.name,
            format_bytes(options.remaining_space.unwrap_or_default())
        )));
    }
    let mut summary = UploadSummary {
        skipped,
        ..UploadSummary::default()
    };
    if admitted.is_empty() {
        return summary;
    }

    let total = admitted.len();
    let resolver = FolderResolver::new(api, options.folder_id.clone());
    notifier.notify(Notice::progress(format!("Uploading files... 0 / {}", total)));

    let resolver = &resolver;
    let mut outcomes = stream::iter(admitted.into_iter().enumerate())
        .map(|(index, entry)| async move {
            let name = entry.name.clone();
            (index, name, upload_entry(api, resolver, entry).await)
        })
        .buffer_unordered(options.concurrency.max(1));

    let mut results = Vec::with_capacity(total);
    while let Some(outcome) = outcomes.next().await {
        results.push(outcome);
        notifier.notify(Notice::progress(format!(
            "Uploading files... {} / {}",
            results.len(),
            total
        )));
    }
    results.sort_by_key(|(index, ..)| *index);

    for (_, name, result) in results {
        match result {
            Ok(file) => summary.uploaded.push(file),
            Err(e) => {
                warn!("upload of {} failed: {}", name, e);
                summary.failures.push(UploadFailure {
                    reason: failure_reason(&e),
                    name,
                });
            }
        }
    }

    if !summary.uploaded.is_empty() {
        notifier.notify(Notice::success(format!(
            "{} file(s) uploaded successfully",
            summary.uploaded.len()
        )));
    }
    for failure in &summary.failures {
        notifier.notify(Notice::error(format!("{}: {}", failure.name, failure.reason)));
    }
    summary
}
