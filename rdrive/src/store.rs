//! Module for session stores.
//!
//! A store keeps the authentication token and the profile of the signed-in user
//! between runs, the way a browser keeps a cookie and local storage.

use crate::{account::User, session::TokenCookie};
use async_trait::async_trait;
use std::error::Error;

mod empty;
mod json_file;
mod memory;

pub use empty::EmptyStore;
pub use json_file::{JsonFileStore, JsonFileStoreData};
pub use memory::MemoryStore;

/// A trait for persisting the session.
#[async_trait]
pub trait Store: Send {
    type Error: Error + Send + Sync + 'static;

    async fn load_token(&mut self) -> Result<Option<TokenCookie>, Self::Error>;
    async fn save_token<'a>(&mut self, value: &'a TokenCookie) -> Result<(), Self::Error>;
    async fn delete_token(&mut self) -> Result<(), Self::Error>;

    async fn load_user(&mut self) -> Result<Option<User>, Self::Error>;
    async fn save_user<'a>(&mut self, value: &'a User) -> Result<(), Self::Error>;

    async fn clear(&mut self) -> Result<(), Self::Error>;
}
