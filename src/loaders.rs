//! Resource loading
//!
//! Reads the bytes behind a resolved schema location: local files directly,
//! remote locations through a time-bounded blocking HTTP client.

use std::fs;
use std::time::Duration;

use crate::error::{Error, LocationError, Result};
use crate::limits::Limits;
use crate::locations::Location;

/// Default timeout for remote fetches
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Resource loader for schema documents
#[derive(Debug)]
pub struct Loader {
    limits: Limits,
    allow_remote: bool,
    timeout: Duration,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            allow_remote: true,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set whether remote locations may be fetched
    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    /// Set the remote fetch timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load the bytes behind a concrete location
    pub fn load(&self, location: &Location) -> Result<Vec<u8>> {
        match location {
            Location::Path(path) => {
                let content = fs::read(path).map_err(|e| {
                    Error::Location(LocationError::new(
                        path.to_string_lossy(),
                        format!("failed to read file: {}", e),
                    ))
                })?;
                self.limits.check_document_size(content.len())?;
                Ok(content)
            }
            Location::Url(url) => {
                if !self.allow_remote {
                    return Err(Error::Location(LocationError::new(
                        url.as_str(),
                        "remote locations are not allowed",
                    )));
                }

                tracing::debug!(url = %url, "fetching remote schema");
                let client = reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| {
                        Error::Location(LocationError::new(url.as_str(), e.to_string()))
                    })?;
                let response = client.get(url.as_str()).send().map_err(|e| {
                    Error::Location(LocationError::new(
                        url.as_str(),
                        format!("fetch failed: {}", e),
                    ))
                })?;
                if !response.status().is_success() {
                    return Err(Error::Location(LocationError::new(
                        url.as_str(),
                        format!("fetch failed with status {}", response.status()),
                    )));
                }
                let bytes = response.bytes().map_err(|e| {
                    Error::Location(LocationError::new(url.as_str(), e.to_string()))
                })?;
                self.limits.check_document_size(bytes.len())?;
                Ok(bytes.to_vec())
            }
            Location::Memory(content) => Ok(content.as_bytes().to_vec()),
        }
    }

    /// Load and resolve in one step
    pub fn load_location(&self, concrete: &str) -> Result<Vec<u8>> {
        let location = Location::from_str(concrete)?;
        self.load(&location)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
