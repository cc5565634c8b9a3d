//! Note service port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::note::{ChatReply, Note, Project};
use crate::domain::recording::AudioBlob;
use crate::domain::transcript::{Analysis, Transcript};

/// Note service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Not logged in or session expired. Run 'voicenote login'.")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ApiError {
    /// Whether the same request may succeed when retried unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// An upload request
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    pub project_id: &'a str,
    pub title: &'a str,
    pub file_name: &'a str,
    pub audio: &'a AudioBlob,
}

/// Port for the note service REST API
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// Upload audio as a new note; the service starts processing it
    async fn upload(&self, request: UploadRequest<'_>) -> Result<Note, ApiError>;

    async fn note(&self, note_id: &str) -> Result<Note, ApiError>;

    async fn transcript(&self, note_id: &str) -> Result<Transcript, ApiError>;

    async fn analysis(&self, note_id: &str) -> Result<Analysis, ApiError>;

    async fn projects(&self) -> Result<Vec<Project>, ApiError>;

    /// Ask a question about a note. Without `session_id` the service
    /// starts a new conversation.
    async fn chat(
        &self,
        note_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, ApiError>;

    /// Exchange credentials for an access token
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;
}
