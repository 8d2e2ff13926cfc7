//! Module for the authentication session.

use crate::{
    account::User,
    notify::{Notice, Notifier},
    store::Store,
    Error, Result,
};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

/// Message shown when the server rejects the token of the current session.
pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";

/// The `SameSite` attribute of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// The authentication token, kept with the attributes of the cookie it is stored in.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenCookie {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    /// Lifetime in seconds, counted from `issued_at`.
    pub max_age: i64,
    pub same_site: SameSite,
}

impl TokenCookie {
    /// Name of the cookie.
    pub const NAME: &'static str = "token";
    /// Lifetime of a new cookie (24 hours).
    pub const MAX_AGE: i64 = 24 * 60 * 60;

    /// Creates a cookie issued now with the default lifetime.
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
            issued_at: Utc::now(),
            max_age: Self::MAX_AGE,
            same_site: SameSite::Strict,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.max_age)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for TokenCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCookie")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("max_age", &self.max_age)
            .field("same_site", &self.same_site)
            .finish()
    }
}

struct Inner<TStore> {
    store: TStore,
    token: Option<TokenCookie>,
    user: Option<User>,
}

/// The state of the signed-in user, shared by everything that talks to the API.
///
/// A session is created once at startup (see [`AuthSession::restore`]) and handed to
/// the [`Client`](crate::Client) explicitly.
pub struct AuthSession<TStore> {
    inner: Mutex<Inner<TStore>>,
    notifier: Arc<dyn Notifier>,
}

impl<TStore> fmt::Debug for AuthSession<TStore> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession").finish_non_exhaustive()
    }
}

impl<TStore: Store> AuthSession<TStore> {
    /// Creates a signed-out session that writes to the given store.
    pub fn new(store: TStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store,
                token: None,
                user: None,
            }),
            notifier,
        }
    }

    /// Creates a session from the data kept in the store.
    ///
    /// An expired token is removed from the store.
    pub async fn restore(mut store: TStore, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let token = match store.load_token().await.map_err(Error::store)? {
            Some(token) if token.is_expired() => {
                info!("stored token expired at {}", token.expires_at());
                store.delete_token().await.map_err(Error::store)?;
                None
            }
            token => token,
        };
        let user = store.load_user().await.map_err(Error::store)?;
        Ok(Self {
            inner: Mutex::new(Inner { store, token, user }),
            notifier,
        })
    }

    /// Stores the token and the user and marks the session as authenticated.
    pub async fn login(&self, token: String, user: User) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let cookie = TokenCookie::new(token);
        inner.store.save_token(&cookie).await.map_err(Error::store)?;
        inner.store.save_user(&user).await.map_err(Error::store)?;
        inner.token = Some(cookie);
        inner.user = Some(user);
        Ok(())
    }

    /// Removes the token and the user from the session and the store.
    pub async fn logout(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.token = None;
        inner.user = None;
        inner.store.clear().await.map_err(Error::store)?;
        drop(inner);
        info!("signed out");
        self.notifier.notify(Notice::info("Signed out."));
        Ok(())
    }

    /// Ends the session after the server rejected `rejected_token`.
    ///
    /// Only the first call for the current token signs out and notifies the user;
    /// calls for a token that is no longer current do nothing. Returns whether this
    /// call ended the session.
    pub async fn expire(&self, rejected_token: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match &inner.token {
            Some(token) if token.value == rejected_token => {}
            _ => return Ok(false),
        }
        inner.token = None;
        inner.user = None;
        if let Err(e) = inner.store.clear().await {
            warn!("failed to clear session store: {}", e);
        }
        drop(inner);
        info!("session expired");
        self.notifier.notify(Notice::error(SESSION_EXPIRED));
        Ok(true)
    }

    /// Returns the token, unless there is none or it has expired.
    pub async fn token(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner
            .token
            .as_ref()
            .filter(|v| !v.is_expired())
            .map(|v| v.value.clone())
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.lock().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{notify::MemoryNotifier, store::MemoryStore};

    fn user() -> User {
        User {
            id: Some("u1".to_owned()),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
        }
    }

    #[test]
    fn cookie_expires_after_a_day() {
        let cookie = TokenCookie::new("abc");
        assert_eq!(cookie.same_site, SameSite::Strict);
        assert!(!cookie.is_expired());
        assert!(!cookie.is_expired_at(cookie.issued_at + Duration::hours(23)));
        assert!(cookie.is_expired_at(cookie.issued_at + Duration::hours(24)));
    }

    #[test]
    fn cookie_debug_hides_value() {
        let cookie = TokenCookie::new("secret-token");
        assert!(!format!("{:?}", cookie).contains("secret-token"));
    }

    #[tokio::test]
    async fn restore_drops_expired_token() {
        let mut cookie = TokenCookie::new("old");
        cookie.issued_at = Utc::now() - Duration::days(2);
        let store = MemoryStore {
            token: Some(cookie),
            user: Some(user()),
        };
        let session = AuthSession::restore(store, Arc::new(MemoryNotifier::new()))
            .await
            .unwrap();
        assert!(!session.is_authenticated().await);
        assert_eq!(session.user().await, Some(user()));
        assert_eq!(session.inner.lock().await.store.token, None);
    }

    #[tokio::test]
    async fn login_then_logout() {
        let notifier = Arc::new(MemoryNotifier::new());
        let session = AuthSession::new(MemoryStore::default(), notifier.clone());
        session.login("abc".to_owned(), user()).await.unwrap();
        assert_eq!(session.token().await.as_deref(), Some("abc"));
        assert_eq!(
            session.inner.lock().await.store.user.as_ref(),
            Some(&user())
        );

        session.logout().await.unwrap();
        assert_eq!(session.token().await, None);
        assert_eq!(session.user().await, None);
        assert_eq!(session.inner.lock().await.store, MemoryStore::default());
        assert_eq!(notifier.notices(), vec![Notice::info("Signed out.")]);
    }

    #[tokio::test]
    async fn expire_ignores_stale_tokens() {
        let notifier = Arc::new(MemoryNotifier::new());
        let session = AuthSession::new(MemoryStore::default(), notifier.clone());
        session.login("new".to_owned(), user()).await.unwrap();

        assert!(!session.expire("old").await.unwrap());
        assert!(session.is_authenticated().await);
        assert!(notifier.notices().is_empty());

        assert!(session.expire("new").await.unwrap());
        assert!(!session.expire("new").await.unwrap());
        assert_eq!(notifier.notices(), vec![Notice::error(SESSION_EXPIRED)]);
    }
}
