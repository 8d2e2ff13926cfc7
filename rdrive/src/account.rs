//! Module for account resources and the authentication endpoints.

use crate::{store::Store, util::ResponseExt, validate, Client, Result};
use derive_setters::Setters;
use log::info;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The profile of a signed-in user.
// NOTE: Serialize is only needed for the session store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

impl User {
    /// Returns the full name, or the email address if no name is known.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_owned()
        }
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Details about a password reset token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Data used for registering a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Setters)]
#[setters(strip_option, prefix = "with_")]
pub struct RegisterData {
    #[setters(skip)]
    pub email: String,
    #[setters(skip)]
    pub password: String,
    #[setters(into)]
    pub first_name: String,
    #[setters(into)]
    pub last_name: String,
}

impl RegisterData {
    /// Creates a new [`RegisterData`].
    pub fn new<E, P>(email: E, password: P) -> Self
    where
        E: Into<String>,
        P: Into<String>,
    {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    fn validate(&self) -> std::result::Result<(), validate::ValidationError> {
        validate::name("first name", &self.first_name)?;
        validate::name("last name", &self.last_name)?;
        validate::email(&self.email)?;
        validate::password(&self.password)
    }
}

impl<TStore: Store> Client<TStore> {
    /// Signs in and stores the returned token and profile in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        validate::email(email)?;
        validate::not_empty("password", password)?;
        let response: LoginResponse = self
            .send(
                self.request(Method::POST, &["auth", "login"])?
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?
            .parse()
            .await?;
        self.session()
            .login(response.token, response.user.clone())
            .await?;
        info!("signed in as {}", response.user.email);
        Ok(response.user)
    }

    /// Signs out, removing the token and profile from the session store.
    pub async fn logout(&self) -> Result<()> {
        self.session().logout().await
    }

    /// Registers a new account. The server sends an activation link by email.
    pub async fn register(&self, data: &RegisterData) -> Result<()> {
        data.validate()?;
        self.send(self.request(Method::POST, &["auth", "register"])?.json(&json!({
            "firstName": data.first_name,
            "lastName": data.last_name,
            "email": data.email,
            "password": data.password,
        })))
        .await?
        .parse_empty()
        .await
    }

    /// Activates an account with the token from the activation email.
    pub async fn activate(&self, token: &str) -> Result<()> {
        validate::not_empty("activation token", token)?;
        self.send(self.request(Method::GET, &["auth", "activate", token])?)
            .await?
            .parse_empty()
            .await
    }

    /// Requests a password reset link for the given email address.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        validate::email(email)?;
        self.send(
            self.request(Method::POST, &["auth", "forgot-password"])?
                .json(&json!({ "email": email })),
        )
        .await?
        .parse_empty()
        .await
    }

    /// Looks up the details of a password reset token.
    pub async fn reset_password_info(&self, token: &str) -> Result<ResetPasswordInfo> {
        validate::not_empty("reset token", token)?;
        self.send(self.request(Method::GET, &["auth", "reset-password", token])?)
            .await?
            .parse()
            .await
    }

    /// Sets a new password with the token from the reset email.
    ///
    /// The password is checked locally before anything is sent.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<()> {
        validate::not_empty("reset token", token)?;
        validate::password(password)?;
        self.send(
            self.request(Method::POST, &["auth", "reset-password", token])?
                .json(&json!({ "password": password })),
        )
        .await?
        .parse_empty()
        .await
    }
}
