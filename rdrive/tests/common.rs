#![allow(dead_code)] // https://github.com/rust-lang/rust/issues/46379

use async_trait::async_trait;
use rdrive::{
    api::{Content, DriveApi, FileMetadata, StorageUsage, UploadTarget, UploadUrlRequest},
    file::File,
    folder::{Folder, FolderContents},
    notify::MemoryNotifier,
    response, Config, Error, Result,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use url::Url;

pub fn config() -> Config {
    let mut config = Config::new(Url::parse("http://localhost:5000/api").unwrap());
    config.storage_limit_mb = 250;
    config.upload_concurrency = 4;
    config
}

pub fn notifier() -> Arc<MemoryNotifier> {
    Arc::new(MemoryNotifier::new())
}

pub fn server_error(status: u16, message: &str) -> Error {
    Error::Response(response::Error {
        status,
        message: Some(message.to_owned()),
    })
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    folders: Vec<Folder>,
    files: Vec<File>,
    /// Uploaded objects by key, with the name of the file they were requested for.
    objects: HashMap<String, (String, u64)>,
    pending: HashMap<String, String>,
    resolve_calls: HashMap<String, usize>,
    save_calls: usize,
    put_calls: usize,
    fail_save: HashSet<String>,
    fail_put: HashSet<String>,
    fail_delete: HashSet<String>,
    fail_listing: bool,
    fail_resolve: HashMap<String, usize>,
    limit: Option<u64>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn find_folder(&self, name: &str, parent_id: Option<&str>) -> Option<&Folder> {
        self.folders
            .iter()
            .find(|v| v.name == name && v.parent_id.as_deref() == parent_id)
    }

    fn insert_folder(&mut self, name: &str, parent_id: Option<&str>) -> Folder {
        let folder = Folder {
            id: self.next_id("folder-"),
            name: name.to_owned(),
            parent_id: parent_id.map(str::to_owned),
            created_at: None,
        };
        self.folders.push(folder.clone());
        folder
    }

    fn remove_folder(&mut self, id: &str) {
        let children = self
            .folders
            .iter()
            .filter(|v| v.parent_id.as_deref() == Some(id))
            .map(|v| v.id.clone())
            .collect::<Vec<_>>();
        for child in children {
            self.remove_folder(&child);
        }
        self.files.retain(|v| v.folder_id.as_deref() != Some(id));
        self.folders.retain(|v| v.id != id);
    }
}

/// An in-memory drive backend.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<State>,
    resolve_delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes folder path resolution wait between looking a folder up and creating
    /// it, so that concurrent uploads overlap like they do against a real server.
    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = Some(delay);
        self
    }

    pub fn with_limit(self, limit: u64) -> Self {
        self.state.lock().unwrap().limit = Some(limit);
        self
    }

    pub fn add_folder(&self, name: &str, parent_id: Option<&str>) -> Folder {
        self.state.lock().unwrap().insert_folder(name, parent_id)
    }

    pub fn add_file(&self, name: &str, size: u64, folder_id: Option<&str>) -> File {
        let mut state = self.state.lock().unwrap();
        let file = File {
            id: state.next_id("file-"),
            name: name.to_owned(),
            size,
            mime_type: "text/plain".to_owned(),
            s3_key: format!("uploads/{}", name),
            folder_id: folder_id.map(str::to_owned),
            created_at: None,
        };
        state.files.push(file.clone());
        file
    }

    pub fn fail_save(&self, name: &str) {
        self.state.lock().unwrap().fail_save.insert(name.to_owned());
    }

    pub fn fail_put(&self, name: &str) {
        self.state.lock().unwrap().fail_put.insert(name.to_owned());
    }

    pub fn fail_delete(&self, id: &str) {
        self.state.lock().unwrap().fail_delete.insert(id.to_owned());
    }

    /// Makes the next resolution of `path` fail once.
    pub fn fail_resolve(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        *state.fail_resolve.entry(path.to_owned()).or_default() += 1;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn folders(&self) -> Vec<Folder> {
        self.state.lock().unwrap().folders.clone()
    }

    pub fn files(&self) -> Vec<File> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn folder_by_name(&self, name: &str) -> Option<Folder> {
        self.folders().into_iter().find(|v| v.name == name)
    }

    pub fn resolve_calls(&self, path: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.resolve_calls.get(path).copied().unwrap_or_default()
    }

    pub fn total_resolve_calls(&self) -> usize {
        self.state.lock().unwrap().resolve_calls.values().sum()
    }

    pub fn save_calls(&self) -> usize {
        self.state.lock().unwrap().save_calls
    }

    pub fn put_calls(&self) -> usize {
        self.state.lock().unwrap().put_calls
    }
}

#[async_trait]
impl DriveApi for MockBackend {
    async fn folder_contents(&self, folder_id: Option<&str>) -> Result<FolderContents> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(server_error(500, "Internal server error"));
        }
        let folder = match folder_id {
            Some(id) => match state.folders.iter().find(|v| v.id == id) {
                Some(v) => Some(v.clone()),
                None => return Err(server_error(404, "Folder not found")),
            },
            None => None,
        };
        Ok(FolderContents {
            folder,
            subfolders: state
                .folders
                .iter()
                .filter(|v| v.parent_id.as_deref() == folder_id)
                .cloned()
                .collect(),
            files: state
                .files
                .iter()
                .filter(|v| v.folder_id.as_deref() == folder_id)
                .cloned()
                .collect(),
        })
    }

    async fn list_files(&self, folder_id: Option<&str>) -> Result<Vec<File>> {
        Ok(self.folder_contents(folder_id).await?.files)
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<Folder> {
        let mut state = self.state.lock().unwrap();
        if state.find_folder(name, parent_id).is_some() {
            return Err(server_error(409, "Folder already exists"));
        }
        Ok(state.insert_folder(name, parent_id))
    }

    async fn delete_folder(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete.contains(id) {
            return Err(server_error(500, "Delete failed"));
        }
        if !state.folders.iter().any(|v| v.id == id) {
            return Err(server_error(404, "Folder not found"));
        }
        state.remove_folder(id);
        Ok(())
    }

    async fn resolve_folder_path(&self, path: &str, parent_id: Option<&str>) -> Result<String> {
        {
            let mut state = self.state.lock().unwrap();
            *state.resolve_calls.entry(path.to_owned()).or_default() += 1;
            if let Some(remaining) = state.fail_resolve.get_mut(path) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(server_error(503, "Folder service unavailable"));
                }
            }
        }
        let mut current = parent_id.map(str::to_owned);
        for segment in path.split('/').filter(|v| !v.is_empty()) {
            let found = self
                .state
                .lock()
                .unwrap()
                .find_folder(segment, current.as_deref())
                .map(|v| v.id.clone());
            let id = match found {
                Some(v) => v,
                None => {
                    // Lookup and insert are separate steps, nothing stops a
                    // concurrent caller from creating the same folder in between.
                    if let Some(delay) = self.resolve_delay {
                        tokio::time::sleep(delay).await;
                    }
                    let mut state = self.state.lock().unwrap();
                    state.insert_folder(segment, current.as_deref()).id
                }
            };
            current = Some(id);
        }
        current.ok_or_else(|| server_error(400, "Path is empty"))
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete.contains(id) {
            return Err(server_error(500, "Delete failed"));
        }
        let len = state.files.len();
        state.files.retain(|v| v.id != id);
        if state.files.len() == len {
            return Err(server_error(404, "File not found"));
        }
        Ok(())
    }

    async fn download_url(&self, id: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        match state.files.iter().find(|v| v.id == id) {
            Some(file) => Ok(format!("https://storage.test/{}?signature=1", file.s3_key)),
            None => Err(server_error(404, "File not found")),
        }
    }

    async fn storage_usage(&self) -> Result<StorageUsage> {
        let state = self.state.lock().unwrap();
        Ok(StorageUsage {
            total_usage: state.files.iter().map(|v| v.size).sum(),
            limit: state.limit,
        })
    }

    async fn upload_url(&self, request: &UploadUrlRequest) -> Result<UploadTarget> {
        let mut state = self.state.lock().unwrap();
        let key = format!("uploads/{}", state.next_id("object-"));
        let upload_url = format!("https://storage.test/put/{}", key);
        state.pending.insert(upload_url.clone(), request.file_name.clone());
        Ok(UploadTarget {
            upload_url,
            s3_key: key,
        })
    }

    async fn put_object(&self, url: &str, content: Content, _content_type: &str) -> Result<()> {
        let size = match content {
            Content::Memory(bytes) => bytes.len() as u64,
            Content::Path(path) => std::fs::metadata(path)?.len(),
        };
        let mut state = self.state.lock().unwrap();
        state.put_calls += 1;
        let name = match state.pending.remove(url) {
            Some(v) => v,
            None => return Err(server_error(403, "Signature mismatch")),
        };
        if state.fail_put.contains(&name) {
            return Err(server_error(503, "Storage unavailable"));
        }
        let key = url.trim_start_matches("https://storage.test/put/").to_owned();
        state.objects.insert(key, (name, size));
        Ok(())
    }

    async fn save_file(&self, metadata: &FileMetadata) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        state.save_calls += 1;
        if state.fail_save.contains(&metadata.name) {
            return Err(server_error(500, "Database unavailable"));
        }
        if !state.objects.contains_key(&metadata.s3_key) {
            return Err(server_error(400, "Object not found"));
        }
        let file = File {
            id: state.next_id("file-"),
            name: metadata.name.clone(),
            size: metadata.size,
            mime_type: metadata.mime_type.clone(),
            s3_key: metadata.s3_key.clone(),
            folder_id: metadata.folder_id.clone(),
            created_at: None,
        };
        state.files.push(file.clone());
        Ok(file)
    }
}
