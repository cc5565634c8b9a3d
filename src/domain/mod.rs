//! Domain layer - Core business logic
//!
//! Contains value objects, state machines, and domain errors.
//! This layer has no dependencies on external systems.

pub mod auth;
pub mod config;
pub mod duration;
pub mod error;
pub mod note;
pub mod playback;
pub mod recording;
pub mod status;
pub mod transcript;
pub mod upload;

// Re-export common types
pub use auth::Credentials;
pub use config::AppConfig;
pub use duration::Duration;
pub use error::*;
pub use note::{ChatReply, Note, Project};
pub use playback::{format_timestamp, EngineEvent, PlaybackState};
pub use recording::{
    format_elapsed, AudioBlob, AudioMimeType, InvalidRecorderTransition, RecorderStatus,
    RecordingSession,
};
pub use status::{display_progress, ChannelState, ProcessingStatus, StatusSnapshot};
pub use transcript::{active_indices, speaker_label, ActionItem, Analysis, Transcript, TranscriptSegment};
pub use upload::{DraftError, InvalidUploadTransition, UploadDraft, UploadFlow, UploadPhase, UploadSource};
