//! Module for browsing and managing the drive.
//!
//! [`Dashboard`] keeps the state of a drive listing (current folder, breadcrumbs,
//! files, folder tree, storage usage) and performs the user operations on it. Failed
//! operations are reported through the [`Notifier`] and never leave the state half
//! updated.

use crate::{
    api::{DriveApi, StorageUsage},
    file::File,
    folder::Folder,
    notify::{Notice, Notifier},
    upload::{upload_batch, UploadEntry, UploadOptions, UploadSummary},
    Config, Error,
};
use log::{debug, warn};
use std::sync::Arc;

/// Name of the root breadcrumb.
pub const ROOT_NAME: &str = "My Drive";

/// An entry of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crumb {
    /// `None` for the root folder.
    pub id: Option<String>,
    pub name: String,
}

impl Crumb {
    pub fn root() -> Self {
        Self {
            id: None,
            name: ROOT_NAME.to_owned(),
        }
    }
}

/// The folder that is shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum View {
    Root,
    Folder(String),
}

impl View {
    pub fn folder_id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Folder(id) => Some(id),
        }
    }
}

/// The listing of the current folder.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Contents {
    pub files: Vec<File>,
    pub folders: Vec<Folder>,
}

/// A node of the lazily loaded folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    pub children: Vec<TreeNode>,
    /// Whether the children have been fetched.
    pub loaded: bool,
}

impl TreeNode {
    fn from_folder(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            children: Vec::new(),
            loaded: false,
        }
    }

    fn find_mut<'a>(nodes: &'a mut [TreeNode], id: &str) -> Option<&'a mut TreeNode> {
        for node in nodes {
            if node.id == id {
                return Some(node);
            }
            if let Some(found) = Self::find_mut(&mut node.children, id) {
                return Some(found);
            }
        }
        None
    }
}

/// A download link for a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadLink {
    pub url: String,
    pub file_name: String,
}

/// State and operations of a drive listing.
pub struct Dashboard<A> {
    api: A,
    notifier: Arc<dyn Notifier>,
    storage_limit: u64,
    upload_concurrency: usize,
    view: View,
    current_folder: Option<Folder>,
    breadcrumbs: Vec<Crumb>,
    contents: Contents,
    tree: Vec<TreeNode>,
    usage: StorageUsage,
    search: String,
}

impl<A: DriveApi> Dashboard<A> {
    /// Creates a dashboard showing the root folder. Nothing is loaded yet.
    pub fn new(api: A, notifier: Arc<dyn Notifier>, config: &Config) -> Self {
        Self {
            api,
            notifier,
            storage_limit: config.storage_limit_bytes(),
            upload_concurrency: config.upload_concurrency,
            view: View::Root,
            current_folder: None,
            breadcrumbs: vec![Crumb::root()],
            contents: Contents::default(),
            tree: Vec::new(),
            usage: StorageUsage::default(),
            search: String::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn current_folder(&self) -> Option<&Folder> {
        self.current_folder.as_ref()
    }

    pub fn breadcrumbs(&self) -> &[Crumb] {
        &self.breadcrumbs
    }

    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn usage(&self) -> StorageUsage {
        self.usage
    }

    /// Returns the storage limit to display. A limit reported by the server takes
    /// precedence over the configured one.
    pub fn storage_limit(&self) -> u64 {
        match self.usage.limit {
            Some(limit) if limit > 0 => limit,
            _ => self.storage_limit,
        }
    }

    /// Returns the space left under the configured limit.
    pub fn remaining_space(&self) -> u64 {
        self.storage_limit.saturating_sub(self.usage.total_usage)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Sets the query that filters [`visible_files`](Self::visible_files) and
    /// [`visible_folders`](Self::visible_folders). Matching ignores case.
    pub fn set_search<S: Into<String>>(&mut self, query: S) {
        self.search = query.into();
    }

    pub fn visible_files(&self) -> Vec<&File> {
        let query = self.search.to_lowercase();
        self.contents
            .files
            .iter()
            .filter(|v| v.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn visible_folders(&self) -> Vec<&Folder> {
        let query = self.search.to_lowercase();
        self.contents
            .folders
            .iter()
            .filter(|v| v.name.to_lowercase().contains(&query))
            .collect()
    }

    fn report(&self, error: &Error, message: String) {
        warn!("{}: {}", message, error);
        // Expired sessions are reported by the session itself.
        if !matches!(error, Error::Unauthorized) {
            self.notifier.notify(Notice::error(message));
        }
    }

    /// Loads the contents of a folder (`None` is the root folder) and refreshes the
    /// storage usage. Returns whether the listing was loaded.
    pub async fn load_content(&mut self, folder_id: Option<&str>) -> bool {
        let data = match self.api.folder_contents(folder_id).await {
            Ok(v) => v,
            Err(e) => {
                self.report(&e, "Failed to load content".to_owned());
                return false;
            }
        };
        match data.folder {
            Some(folder) => {
                self.view = View::Folder(folder.id.clone());
                self.current_folder = Some(folder);
            }
            None => {
                self.view = View::Root;
                self.current_folder = None;
                self.breadcrumbs = vec![Crumb::root()];
            }
        }
        self.contents = Contents {
            files: data.files,
            folders: data.subfolders,
        };
        self.load_storage().await;
        true
    }

    /// Refreshes the storage usage. Failures keep the previous value.
    pub async fn load_storage(&mut self) -> bool {
        match self.api.storage_usage().await {
            Ok(usage) => {
                self.usage = usage;
                true
            }
            Err(e) => {
                warn!("failed to load storage usage: {}", e);
                false
            }
        }
    }

    /// Loads the top level of the folder tree.
    pub async fn load_root_folders(&mut self) -> bool {
        match self.api.folder_contents(None).await {
            Ok(data) => {
                self.tree = data
                    .subfolders
                    .into_iter()
                    .map(TreeNode::from_folder)
                    .collect();
                true
            }
            Err(e) => {
                warn!("failed to load folder tree: {}", e);
                false
            }
        }
    }

    /// Loads the children of a tree node, unless they were loaded before.
    pub async fn expand_folder(&mut self, id: &str) -> bool {
        match TreeNode::find_mut(&mut self.tree, id) {
            Some(node) if node.loaded => return true,
            Some(_) => {}
            None => return false,
        }
        let children = match self.api.folder_contents(Some(id)).await {
            Ok(data) => data.subfolders,
            Err(e) => {
                warn!("failed to load subfolders of {}: {}", id, e);
                return false;
            }
        };
        match TreeNode::find_mut(&mut self.tree, id) {
            Some(node) => {
                node.children = children.into_iter().map(TreeNode::from_folder).collect();
                node.loaded = true;
                true
            }
            None => false,
        }
    }

    /// Opens a folder. If the folder is already part of the breadcrumb trail, the
    /// trail is cut after it, otherwise the folder is appended.
    pub async fn navigate(&mut self, id: &str, name: &str) -> bool {
        let mut breadcrumbs = self.breadcrumbs.clone();
        match breadcrumbs.iter().position(|v| v.id.as_deref() == Some(id)) {
            Some(index) => breadcrumbs.truncate(index + 1),
            None => breadcrumbs.push(Crumb {
                id: Some(id.to_owned()),
                name: name.to_owned(),
            }),
        }
        if !self.load_content(Some(id)).await {
            return false;
        }
        self.breadcrumbs = breadcrumbs;
        true
    }

    /// Opens the folder of the breadcrumb at `index`.
    pub async fn breadcrumb(&mut self, index: usize) -> bool {
        let crumb = match self.breadcrumbs.get(index) {
            Some(v) => v.clone(),
            None => return false,
        };
        if !self.load_content(crumb.id.as_deref()).await {
            return false;
        }
        self.breadcrumbs.truncate(index + 1);
        true
    }

    /// Creates a folder in the current folder and reloads the listing.
    pub async fn create_folder(&mut self, name: &str) -> Option<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let parent_id = self.view.folder_id().map(str::to_owned);
        match self.api.create_folder(name, parent_id.as_deref()).await {
            Ok(folder) => {
                self.notifier
                    .notify(Notice::success(format!("Folder \"{}\" created", folder.name)));
                self.load_content(parent_id.as_deref()).await;
                Some(folder)
            }
            Err(e) => {
                let message = match (&e, e.server_message()) {
                    (Error::Response(r), _) if r.is_conflict() => {
                        "Failed to create folder. Name might be taken.".to_owned()
                    }
                    (_, Some(message)) => format!("Failed to create folder: {}", message),
                    _ => "Failed to create folder. Name might be taken.".to_owned(),
                };
                self.report(&e, message);
                None
            }
        }
    }

    /// Deletes a file of the current listing after `confirm` accepted its name.
    ///
    /// The file disappears from the listing at once and is put back when the
    /// request fails.
    pub async fn delete_file<F>(&mut self, id: &str, confirm: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        let name = match self.contents.files.iter().find(|v| v.id == id) {
            Some(v) => v.name.clone(),
            None => return false,
        };
        if !confirm(&name) {
            return false;
        }
        let snapshot = self.contents.files.clone();
        self.contents.files.retain(|v| v.id != id);
        match self.api.delete_file(id).await {
            Ok(()) => {
                self.notifier
                    .notify(Notice::success(format!("File \"{}\" deleted permanently", name)));
                self.load_storage().await;
                true
            }
            Err(e) => {
                self.contents.files = snapshot;
                self.report(&e, format!("Failed to delete \"{}\"", name));
                false
            }
        }
    }

    /// Deletes a folder (and everything below it) of the current listing after
    /// `confirm` accepted its name. Works like [`delete_file`](Self::delete_file).
    pub async fn delete_folder<F>(&mut self, id: &str, confirm: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        let name = match self.contents.folders.iter().find(|v| v.id == id) {
            Some(v) => v.name.clone(),
            None => return false,
        };
        if !confirm(&name) {
            return false;
        }
        let snapshot = self.contents.folders.clone();
        self.contents.folders.retain(|v| v.id != id);
        match self.api.delete_folder(id).await {
            Ok(()) => {
                self.notifier.notify(Notice::success(format!(
                    "Folder \"{}\" and its contents deleted",
                    name
                )));
                self.tree.retain(|v| v.id != id);
                self.load_storage().await;
                true
            }
            Err(e) => {
                self.contents.folders = snapshot;
                self.report(&e, format!("Failed to delete \"{}\"", name));
                false
            }
        }
    }

    /// Requests a download link for a file.
    pub async fn download(&self, id: &str) -> Option<DownloadLink> {
        let file_name = self
            .contents
            .files
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| id.to_owned());
        match self.api.download_url(id).await {
            Ok(url) => {
                debug!("download link for {} created", file_name);
                Some(DownloadLink { url, file_name })
            }
            Err(e) => {
                self.report(&e, "Download failed. Please try again.".to_owned());
                None
            }
        }
    }

    /// Uploads files into the current folder and reloads the listing afterwards.
    pub async fn upload(&mut self, entries: Vec<UploadEntry>) -> UploadSummary {
        let folder_id = self.view.folder_id().map(str::to_owned);
        let mut options = UploadOptions::default()
            .with_remaining_space(self.remaining_space())
            .with_concurrency(self.upload_concurrency);
        options.folder_id = folder_id.clone();
        let summary = upload_batch(&self.api, &*self.notifier, entries, &options).await;
        if !summary.uploaded.is_empty() {
            self.load_content(folder_id.as_deref()).await;
        }
        summary
    }
}
