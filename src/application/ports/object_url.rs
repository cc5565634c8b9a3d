//! Object URL port interface

use std::fmt;

use thiserror::Error;

use crate::domain::recording::AudioBlob;

/// Object URL errors
#[derive(Debug, Clone, Error)]
#[error("Failed to create object URL: {0}")]
pub struct ObjectUrlError(pub String);

/// Handle to a blob exposed at a URL a playback engine can read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Port for exposing blobs as URLs
pub trait ObjectUrlStore: Send + Sync {
    fn create(&self, blob: &AudioBlob) -> Result<ObjectUrl, ObjectUrlError>;

    /// Release a URL. Unknown URLs are ignored.
    fn revoke(&self, url: &ObjectUrl);
}
