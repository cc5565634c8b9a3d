//! Application layer - Controllers and port interfaces
//!
//! Contains the controllers that drive capture, playback, transcript
//! sync, status tracking and uploads, and the trait definitions for
//! external system interactions.

pub mod chat;
pub mod error;
pub mod playback;
pub mod ports;
pub mod recording;
pub mod resource_guard;
pub mod status_channel;
pub mod transcript_sync;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export controllers
pub use chat::NoteChat;
pub use error::MisuseError;
pub use playback::PlaybackController;
pub use recording::{RecorderError, RecordingController, TIMESLICE_MS};
pub use resource_guard::MediaResourceGuard;
pub use status_channel::{FrameOutcome, StatusChannel, StatusEvent, StatusWatch};
pub use transcript_sync::TranscriptSyncView;
pub use upload::{UploadConfig, UploadError, UploadEvent, UploadOrchestrator};
