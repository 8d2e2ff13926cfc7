//! Rust bindings to a cloud drive API.
//!
//! The crate is split into a thin HTTP layer ([`Client`]), the session state it
//! authenticates with ([`session::AuthSession`]) and two orchestration layers built on
//! the [`api::DriveApi`] trait: the batch uploader ([`upload`]) and the listing
//! controller ([`dashboard`]).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

use displaydoc::Display;
use std::result::Result as StdResult;
use thiserror::Error as ThisError;

pub use client::Client;
pub use config::Config;

mod util;

pub mod account;
pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod file;
pub mod folder;
pub mod notify;
pub mod path;
pub mod response;
pub mod session;
pub mod store;
pub mod upload;
pub mod validate;

pub use util::format_bytes;

/// Type alias for `Result<T, Error>`.
pub type Result<T> = StdResult<T, Error>;

/// Errors that can occur while interacting with the drive API.
#[derive(Debug, Display, ThisError)]
pub enum Error {
    /// Failed to send request.
    Request(#[from] reqwest::Error),
    /// Failed to parse URL.
    ParseUrl(#[from] url::ParseError),
    /// {0}
    Response(#[from] response::Error),
    /// Session expired. Please login again.
    Unauthorized,
    /// {0}
    Validation(#[from] validate::ValidationError),
    /// Failed to read or write the session store.
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// IO error while reading or writing local data.
    Io(#[from] std::io::Error),
    /// Invalid server response: missing `{0}`.
    MalformedResponse(&'static str),
}

impl Error {
    /// Returns the message the server attached to the error, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Response(e) => e.message.as_deref(),
            _ => None,
        }
    }

    /// Returns the HTTP status code of a server error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    pub(crate) fn store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(error))
    }
}
