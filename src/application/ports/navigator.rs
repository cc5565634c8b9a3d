//! Navigation port interface

/// Port for leaving the upload flow once a note is ready
pub trait Navigator: Send + Sync {
    /// Open the finished note
    fn open_note(&self, note_id: &str);
}
