//! Bearer credentials shared by the REST client

use std::sync::{Arc, RwLock};

/// Access token holder.
///
/// Clones share the same slot, so an invalidation seen by one request is
/// seen by every holder.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load credentials from a stored token; blank tokens count as absent
    pub fn from_token(token: Option<String>) -> Self {
        let credentials = Self::new();
        if let Some(token) = token {
            credentials.set(token);
        }
        credentials
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if let Ok(mut slot) = self.token.write() {
            *slot = if token.trim().is_empty() {
                None
            } else {
                Some(token)
            };
        }
    }

    /// Drop the token after the service rejected it
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}
