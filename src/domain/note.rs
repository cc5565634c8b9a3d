//! Note and project records returned by the note service

use serde::{Deserialize, Serialize};

use super::status::ProcessingStatus;

/// An uploaded voice note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub language: Option<String>,
    pub status: ProcessingStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Server-side storage path of the uploaded audio, when exposed
    #[serde(default)]
    pub file_path: Option<String>,
}

impl Note {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }

    /// Public URL of the note's audio under the service's upload mount
    pub fn audio_url(&self, api_url: &str) -> Option<String> {
        let file_name = self.file_path.as_deref()?.rsplit(['/', '\\']).next()?;
        if file_name.is_empty() {
            return None;
        }
        Some(format!("{}/uploads/{}", api_url.trim_end_matches('/'), file_name))
    }
}

/// Upload destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One assistant answer about a note. `session_id` threads follow-up
/// questions into the same conversation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_parses_minimal_payload() {
        let note: Note = serde_json::from_str(r#"{"id":"n1","status":"pending"}"#).unwrap();
        assert_eq!(note.id, "n1");
        assert_eq!(note.display_title(), "(untitled)");
        assert!(!note.status.is_terminal());
        assert!(note.audio_url("http://api").is_none());
    }

    #[test]
    fn audio_url_uses_stored_file_name() {
        let note: Note = serde_json::from_str(
            r#"{"id":"n1","status":"completed","file_path":"./uploads/ab12.webm"}"#,
        )
        .unwrap();
        assert_eq!(
            note.audio_url("http://api:8200/").as_deref(),
            Some("http://api:8200/uploads/ab12.webm")
        );
    }

    #[test]
    fn project_parses_null_description() {
        let project: Project = serde_json::from_str(
            r#"{"id":"p1","name":"Team","description":null,"created_at":"2026-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(project.name, "Team");
        assert!(project.description.is_none());
    }
}
