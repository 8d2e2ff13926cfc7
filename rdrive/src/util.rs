use crate::{response, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

#[async_trait]
pub trait ResponseExt {
    async fn parse<T: DeserializeOwned>(self) -> Result<T>;
    async fn parse_empty(self) -> Result<()>;
}

#[async_trait]
impl ResponseExt for reqwest::Response {
    async fn parse<T: DeserializeOwned>(self) -> Result<T> {
        if self.status().is_success() {
            Ok(self.json().await?)
        } else {
            Err(into_error(self).await)
        }
    }

    async fn parse_empty(self) -> Result<()> {
        if self.status().is_success() {
            Ok(())
        } else {
            Err(into_error(self).await)
        }
    }
}

async fn into_error(response: reqwest::Response) -> crate::Error {
    let status = response.status().as_u16();
    match response.bytes().await {
        Ok(body) => response::Error::from_body(status, &body).into(),
        Err(e) => e.into(),
    }
}

/// Formats a byte count with binary units, e.g. `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
