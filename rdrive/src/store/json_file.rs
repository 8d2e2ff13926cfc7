use crate::{account::User, session::TokenCookie, store::Store};
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error as ThisError;
use tokio::{fs, io};

/// The data of a [`JsonFileStore`].
///
/// The user is kept as raw JSON so that a corrupted profile can be dropped without
/// losing the token.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct JsonFileStoreData {
    pub token: Option<TokenCookie>,
    pub user: Option<serde_json::Value>,
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to serialize/deserialize session store")]
    Serde(#[from] serde_json::Error),
    #[error("IO error while reading or writing session store")]
    Io(#[from] io::Error),
}

/// A store that writes the session to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a new [`JsonFileStore`]. The file is created on the first write.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Reads the file. A missing file reads as empty data.
    pub async fn read_data(&self) -> Result<JsonFileStoreData, Error> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(JsonFileStoreData::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write_data(&self, data: &JsonFileStoreData) -> Result<(), Error> {
        let value = serde_json::to_vec_pretty(&data)?;
        fs::write(&self.path, &value).await?;
        Ok(())
    }

    async fn modify_data<F>(&self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut JsonFileStoreData) -> Result<(), Error> + Send,
    {
        let mut data = self.read_data().await?;
        f(&mut data)?;
        self.write_data(&data).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    type Error = Error;

    async fn load_token(&mut self) -> Result<Option<TokenCookie>, Self::Error> {
        Ok(self.read_data().await?.token)
    }

    async fn save_token<'a>(&mut self, value: &'a TokenCookie) -> Result<(), Self::Error> {
        self.modify_data(|data| {
            data.token = Some(value.clone());
            Ok(())
        })
        .await
    }

    async fn delete_token(&mut self) -> Result<(), Self::Error> {
        self.modify_data(|data| {
            data.token = None;
            Ok(())
        })
        .await
    }

    async fn load_user(&mut self) -> Result<Option<User>, Self::Error> {
        let mut data = self.read_data().await?;
        let value = match data.user.take() {
            Some(v) => v,
            None => return Ok(None),
        };
        match serde_json::from_value(value) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("invalid user data in {}, clearing it: {}", self.path.display(), e);
                self.write_data(&data).await?;
                Ok(None)
            }
        }
    }

    async fn save_user<'a>(&mut self, value: &'a User) -> Result<(), Self::Error> {
        let value = serde_json::to_value(value)?;
        self.modify_data(|data| {
            data.user = Some(value);
            Ok(())
        })
        .await
    }

    async fn clear(&mut self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
