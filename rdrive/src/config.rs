//! Module for client configuration.

use std::{env, str::FromStr};
use url::Url;

/// API URL used when neither the build nor the runtime environment sets one.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Storage quota (in MiB) used for the client-side space check.
pub const DEFAULT_STORAGE_LIMIT_MB: u64 = 250;

/// Number of files uploaded at the same time.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

const API_URL_VAR: &str = "RDRIVE_API_URL";
const STORAGE_LIMIT_VAR: &str = "RDRIVE_STORAGE_LIMIT_MB";
const UPLOAD_CONCURRENCY_VAR: &str = "RDRIVE_UPLOAD_CONCURRENCY";

/// Configuration of a [`Client`](crate::Client).
///
/// | Variable                    | Default                     |
/// |-----------------------------|-----------------------------|
/// | `RDRIVE_API_URL`            | `http://localhost:5000/api` |
/// | `RDRIVE_STORAGE_LIMIT_MB`   | `250`                       |
/// | `RDRIVE_UPLOAD_CONCURRENCY` | `4`                         |
///
/// Values present at build time become the defaults, values present at runtime
/// override them (see [`Config::from_env`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the REST API. Endpoint paths are appended to it.
    pub api_url: Url,
    /// Storage quota in MiB used to compute the remaining space before uploads.
    pub storage_limit_mb: u64,
    /// Maximum number of files that are uploaded concurrently.
    pub upload_concurrency: usize,
}

impl Config {
    /// Creates a new [`Config`] for the given API URL with default limits.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            storage_limit_mb: build_time_number(option_env!("RDRIVE_STORAGE_LIMIT_MB"))
                .unwrap_or(DEFAULT_STORAGE_LIMIT_MB),
            upload_concurrency: build_time_number(option_env!("RDRIVE_UPLOAD_CONCURRENCY"))
                .unwrap_or(DEFAULT_UPLOAD_CONCURRENCY),
        }
    }

    /// Creates a [`Config`] from the build-time values, overridden by the variables
    /// of the current process environment.
    pub fn from_env() -> Result<Self, url::ParseError> {
        let mut config = Self::build_time()?;
        if let Ok(v) = env::var(API_URL_VAR) {
            config.api_url = Url::parse(&v)?;
        }
        if let Some(v) = runtime_number(STORAGE_LIMIT_VAR) {
            config.storage_limit_mb = v;
        }
        if let Some(v) = runtime_number(UPLOAD_CONCURRENCY_VAR) {
            config.upload_concurrency = v;
        }
        Ok(config)
    }

    /// Creates a [`Config`] from the values captured at build time.
    pub fn build_time() -> Result<Self, url::ParseError> {
        let api_url = option_env!("RDRIVE_API_URL").unwrap_or(DEFAULT_API_URL);
        Ok(Self::new(Url::parse(api_url)?))
    }

    /// Returns the storage quota in bytes.
    pub fn storage_limit_bytes(&self) -> u64 {
        self.storage_limit_mb.saturating_mul(1024 * 1024)
    }
}

fn build_time_number<T>(value: Option<&str>) -> Option<T>
where
    T: FromStr + Default + PartialEq,
{
    value.and_then(|v| v.trim().parse().ok()).and_then(non_zero)
}

fn runtime_number<T>(name: &str) -> Option<T>
where
    T: FromStr + Default + PartialEq,
{
    let value = env::var(name).ok()?;
    match value.trim().parse::<T>() {
        Ok(v) if v != T::default() => Some(v),
        _ => {
            log::warn!("ignoring invalid value {:?} of {}", value, name);
            None
        }
    }
}

fn non_zero<T: Default + PartialEq>(value: T) -> Option<T> {
    if value == T::default() {
        None
    } else {
        Some(value)
    }
}
