use crate::{account::User, session::TokenCookie, store::Store};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemoryStore {
    pub token: Option<TokenCookie>,
    pub user: Option<User>,
}

#[async_trait]
impl Store for MemoryStore {
    type Error = Infallible;

    async fn load_token(&mut self) -> Result<Option<TokenCookie>, Self::Error> {
        Ok(self.token.clone())
    }

    async fn save_token<'a>(&mut self, value: &'a TokenCookie) -> Result<(), Self::Error> {
        self.token = Some(value.clone());
        Ok(())
    }

    async fn delete_token(&mut self) -> Result<(), Self::Error> {
        self.token = None;
        Ok(())
    }

    async fn load_user(&mut self) -> Result<Option<User>, Self::Error> {
        Ok(self.user.clone())
    }

    async fn save_user<'a>(&mut self, value: &'a User) -> Result<(), Self::Error> {
        self.user = Some(value.clone());
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), Self::Error> {
        *self = Self::default();
        Ok(())
    }
}
