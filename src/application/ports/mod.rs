//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod navigator;
pub mod notes_api;
pub mod notifier;
pub mod object_url;
pub mod playback;
pub mod status;

// Re-export common types
pub use capture::{CaptureError, CaptureHandles, CaptureHost, CaptureSupport, InputStream, MediaRecorder};
pub use config::ConfigStore;
pub use navigator::Navigator;
pub use notes_api::{ApiError, NotesApi, UploadRequest};
pub use notifier::{NotificationError, NoticeKind, Notifier};
pub use object_url::{ObjectUrl, ObjectUrlError, ObjectUrlStore};
pub use playback::{EngineFactory, PlaybackEngine, PlaybackError};
pub use status::{Frame, StatusStream, StatusTransport, TransportError};
