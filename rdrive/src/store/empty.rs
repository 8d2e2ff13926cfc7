use crate::{account::User, session::TokenCookie, store::Store};
use async_trait::async_trait;
use std::convert::Infallible;

/// A store that does not keep any data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmptyStore;

#[async_trait]
impl Store for EmptyStore {
    type Error = Infallible;

    async fn load_token(&mut self) -> Result<Option<TokenCookie>, Self::Error> {
        Ok(None)
    }

    async fn save_token<'a>(&mut self, _value: &'a TokenCookie) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn delete_token(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn load_user(&mut self) -> Result<Option<User>, Self::Error> {
        Ok(None)
    }

    async fn save_user<'a>(&mut self, _value: &'a User) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
