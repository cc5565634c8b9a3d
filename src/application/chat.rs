//! Question-and-answer conversation about one note

use tracing::debug;

use super::ports::{ApiError, NotesApi};

/// A conversation with the note service about `note_id`.
///
/// The first answer opens a server-side session; later questions are sent
/// with its id so the assistant sees the earlier turns.
pub struct NoteChat<'a, A: NotesApi> {
    api: &'a A,
    note_id: String,
    session_id: Option<String>,
}

impl<'a, A: NotesApi> NoteChat<'a, A> {
    pub fn new(api: &'a A, note_id: &str) -> Self {
        Self {
            api,
            note_id: note_id.to_string(),
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Send `message` and return the reply. Blank messages are not sent.
    pub async fn ask(&mut self, message: &str) -> Result<Option<String>, ApiError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }
        let answer = self
            .api
            .chat(&self.note_id, message, self.session_id.as_deref())
            .await?;
        if self.session_id.as_deref() != Some(answer.session_id.as_str()) {
            debug!(session_id = %answer.session_id, "Chat session opened");
        }
        self.session_id = Some(answer.session_id);
        Ok(Some(answer.reply))
    }

    /// Forget the session; the next question starts a new conversation
    pub fn restart(&mut self) {
        self.session_id = None;
    }
}
