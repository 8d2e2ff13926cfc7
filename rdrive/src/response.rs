//! Module for errors returned from the drive API.

use serde::Deserialize;
use std::fmt;

#[derive(Deserialize)]
struct InnerError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// An error returned from the drive API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The HTTP status code of the response.
    pub status: u16,
    /// The message from the response body, if the server sent one.
    pub message: Option<String>,
}

impl Error {
    /// Creates an error from a status code and a response body.
    ///
    /// Bodies that are not JSON, or that carry neither a `message` nor an `error`
    /// field, leave the message empty.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<InnerError>(body)
            .ok()
            .and_then(|v| v.message.or(v.error))
            .filter(|v| !v.trim().is_empty());
        Self { status, message }
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => write!(f, "request failed with status {}", self.status),
        }
    }
}

impl std::error::Error for Error {}
