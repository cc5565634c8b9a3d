//! Recording domain module

mod audio_blob;
mod session;

pub use audio_blob::{human_readable_size, AudioBlob, AudioMimeType, ACCEPTED_TYPES};
pub use session::{format_elapsed, InvalidRecorderTransition, RecorderStatus, RecordingSession};
