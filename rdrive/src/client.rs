use crate::api::{
    Content, DriveApi, FileMetadata, RawUploadTarget, StorageUsage, UploadTarget,
    UploadUrlRequest,
};
use crate::util::ResponseExt;
use crate::{
    file::File,
    folder::{self, Folder, FolderContents},
    session::AuthSession,
    store::Store,
    Config, Error, Result,
};
use async_trait::async_trait;
use log::debug;
use reqwest::{header, Body, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::{path::Path, sync::Arc};
use tokio::{fs, io::AsyncWriteExt};
use tokio_util::io::ReaderStream;

/// A client used for interacting with the drive API.
///
/// Every request carries the bearer token of the session, if there is one. When the
/// server answers a request with `401 Unauthorized`, the session is ended (see
/// [`AuthSession::expire`]) and [`Error::Unauthorized`] is returned.
///
/// # Example
///
/// ```ignore
/// use rdrive::{notify::LogNotifier, session::AuthSession, store::JsonFileStore, Client, Config};
/// use std::sync::Arc;
///
/// let store = JsonFileStore::new(".rdrive-session.json");
/// let session = AuthSession::restore(store, Arc::new(LogNotifier)).await?;
/// let client = Client::new(Config::from_env()?, Arc::new(session));
/// client.login("ada@example.com", "Secret123").await?;
/// ```
#[derive(Debug)]
pub struct Client<TStore> {
    client: reqwest::Client,
    config: Config,
    session: Arc<AuthSession<TStore>>,
}

impl<TStore> Clone for Client<TStore> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FolderResponse {
    Wrapped { folder: Folder },
    Plain(Folder),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileResponse {
    Wrapped { file: File },
    Plain(File),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilesResponse {
    Wrapped { files: Vec<File> },
    Plain(Vec<File>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedPath {
    folder_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadResponse {
    download_url: Option<String>,
}

impl<TStore> Client<TStore> {
    pub fn new(config: Config, session: Arc<AuthSession<TStore>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            session,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<AuthSession<TStore>> {
        &self.session
    }

    pub(crate) fn request<I>(&self, method: Method, path_segments: I) -> Result<RequestBuilder>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.config.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path_segments);
        Ok(self.client.request(method, url))
    }
}

impl<TStore: Store> Client<TStore> {
    /// Sends a request to the API with the bearer token of the session.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.session.token().await;
        let request = match &token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url().path());
        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(token) = token {
                self.session.expire(&token).await?;
                return Err(Error::Unauthorized);
            }
        }
        Ok(response)
    }

    /// Downloads the content behind a signed URL into a local file and returns the
    /// number of bytes written.
    ///
    /// Like [`DriveApi::put_object`], this does not send the session token.
    pub async fn download_to<P: AsRef<Path>>(&self, url: &str, path: P) -> Result<u64> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return response.parse_empty().await.map(|_| 0);
        }
        let mut file = fs::File::create(path.as_ref()).await?;
        let mut written = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl<TStore: Store> DriveApi for Client<TStore> {
    async fn folder_contents(&self, folder_id: Option<&str>) -> Result<FolderContents> {
        let id = folder_id.unwrap_or(folder::ROOT);
        self.send(self.request(Method::GET, &["folders", id])?)
            .await?
            .parse()
            .await
    }

    async fn list_files(&self, folder_id: Option<&str>) -> Result<Vec<File>> {
        let mut request = self.request(Method::GET, &["files"])?;
        if let Some(id) = folder_id {
            request = request.query(&[("folderId", id)]);
        }
        let files = match self.send(request).await?.parse::<FilesResponse>().await? {
            FilesResponse::Wrapped { files } | FilesResponse::Plain(files) => files,
        };
        Ok(files)
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<Folder> {
        let response = self
            .send(
                self.request(Method::POST, &["folders"])?
                    .json(&json!({ "name": name, "parentFolderId": parent_id })),
            )
            .await?
            .parse::<FolderResponse>()
            .await?;
        Ok(match response {
            FolderResponse::Wrapped { folder } | FolderResponse::Plain(folder) => folder,
        })
    }

    async fn delete_folder(&self, id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, &["folders", id])?)
            .await?
            .parse_empty()
            .await
    }

    async fn resolve_folder_path(&self, path: &str, parent_id: Option<&str>) -> Result<String> {
        let resolved: ResolvedPath = self
            .send(
                self.request(Method::POST, &["folders", "resolve-path"])?
                    .json(&json!({ "path": path, "parentFolderId": parent_id })),
            )
            .await?
            .parse()
            .await?;
        debug!("resolved folder path {:?} to {}", path, resolved.folder_id);
        Ok(resolved.folder_id)
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, &["files", id])?)
            .await?
            .parse_empty()
            .await
    }

    async fn download_url(&self, id: &str) -> Result<String> {
        let response: DownloadResponse = self
            .send(self.request(Method::GET, &["files", id, "download"])?)
            .await?
            .parse()
            .await?;
        response
            .download_url
            .filter(|v| !v.is_empty())
            .ok_or(Error::MalformedResponse("downloadUrl"))
    }

    async fn storage_usage(&self) -> Result<StorageUsage> {
        self.send(self.request(Method::GET, &["files", "storage"])?)
            .await?
            .parse()
            .await
    }

    async fn upload_url(&self, request: &UploadUrlRequest) -> Result<UploadTarget> {
        self.send(self.request(Method::POST, &["files", "upload-url"])?.json(request))
            .await?
            .parse::<RawUploadTarget>()
            .await?
            .into_target()
    }

    async fn put_object(&self, url: &str, content: Content, content_type: &str) -> Result<()> {
        let (body, len) = match content {
            Content::Memory(bytes) => {
                let len = bytes.len() as u64;
                (Body::from(bytes), len)
            }
            Content::Path(path) => {
                let file = fs::File::open(&path).await?;
                let len = file.metadata().await?.len();
                (Body::wrap_stream(ReaderStream::new(file)), len)
            }
        };
        self.client
            .put(url)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?
            .parse_empty()
            .await
    }

    async fn save_file(&self, metadata: &FileMetadata) -> Result<File> {
        let response = self
            .send(self.request(Method::POST, &["files"])?.json(metadata))
            .await?
            .parse::<FileResponse>()
            .await?;
        Ok(match response {
            FileResponse::Wrapped { file } | FileResponse::Plain(file) => file,
        })
    }
}
