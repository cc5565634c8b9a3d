//! reqwest client for the note service

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::ports::{ApiError, NotesApi, UploadRequest};
use crate::domain::auth::Credentials;
use crate::domain::note::{ChatReply, Note, Project};
use crate::domain::transcript::{Analysis, Transcript};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Error body; `detail` is a string, or a list for validation errors
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Note service client. Every request carries the current bearer token.
pub struct HttpNotesApi {
    base_url: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl HttpNotesApi {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))
    }

    /// Map non-success responses; a 401 drops the stored token
    async fn check(&self, response: Response, resource: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(resource, "Session rejected by the note service");
            self.credentials.invalidate();
            return Err(ApiError::Unauthorized);
        }

        let message = error_message(response).await;
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T, ApiError> {
        let response = self.send(self.client.get(self.url(path))).await?;
        let response = self.check(response, resource).await?;
        parse_json(response).await
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json()
        .await
        .map_err(|e| ApiError::ParseError(e.to_string()))
}

/// `detail` from an error body, or the raw body when it has none
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        Err(_) => body,
    }
}

#[async_trait]
impl NotesApi for HttpNotesApi {
    async fn upload(&self, request: UploadRequest<'_>) -> Result<Note, ApiError> {
        let part = Part::bytes(request.audio.data().to_vec())
            .file_name(request.file_name.to_string())
            .mime_str(request.audio.mime_type().as_str())
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        let form = Form::new().part("file", part);

        debug!(
            project_id = request.project_id,
            file_name = request.file_name,
            size = request.audio.size_bytes(),
            "Uploading audio"
        );

        let builder = self
            .client
            .post(self.url("/api/notes/upload"))
            .query(&[
                ("project_id", request.project_id),
                ("title", request.title),
            ])
            .multipart(form);
        let response = self.send(builder).await?;
        let response = self.check(response, "project").await?;
        parse_json(response).await
    }

    async fn note(&self, note_id: &str) -> Result<Note, ApiError> {
        self.get_json(&format!("/api/notes/{note_id}"), "note").await
    }

    async fn transcript(&self, note_id: &str) -> Result<Transcript, ApiError> {
        self.get_json(&format!("/api/notes/{note_id}/transcript"), "transcript")
            .await
    }

    async fn analysis(&self, note_id: &str) -> Result<Analysis, ApiError> {
        self.get_json(&format!("/api/notes/{note_id}/analysis"), "analysis")
            .await
    }

    async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json("/api/projects", "projects").await
    }

    async fn chat(
        &self,
        note_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, ApiError> {
        let mut builder = self
            .client
            .post(self.url(&format!("/api/notes/{note_id}/chat")))
            .json(&ChatRequest {
                message,
                session_id,
            });
        // The service reads the session from the query string
        if let Some(session_id) = session_id {
            builder = builder.query(&[("session_id", session_id)]);
        }
        let response = self.send(builder).await?;
        let response = self.check(response, "chat session").await?;
        parse_json(response).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        // Wrong credentials are a rejection here, not an expired session
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let token: TokenResponse = parse_json(response).await?;
        self.credentials.set(token.access_token.clone());
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let api = HttpNotesApi::new("http://localhost:8200/", Credentials::new());
        assert_eq!(api.url("/api/projects"), "http://localhost:8200/api/projects");
    }

    #[test]
    fn error_body_accepts_validation_lists() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["query","project_id"]}]}"#).unwrap();
        assert!(body.detail.is_array());
    }
}
