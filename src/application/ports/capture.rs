//! Audio capture port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::AudioMimeType;

/// Whether the host can capture audio at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSupport {
    Available,
    /// Capture exists but is withheld from this context
    InsecureContext,
    /// No capture facility on this host
    NoCaptureApi,
}

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone access was denied")]
    PermissionDenied,

    #[error("No usable audio input: {0}")]
    DeviceUnavailable(String),

    #[error("Recorder failed: {0}")]
    RecorderFailed(String),

    #[error("Failed to encode recording: {0}")]
    EncodingFailed(String),
}

/// A live input device stream
pub trait InputStream: Send {
    /// Stop every track of the stream and release the device
    fn stop_tracks(&mut self);
}

/// Chunked recorder bound to an input stream.
///
/// Fragments handed out by `request_data` and `stop` are raw and only
/// meaningful once concatenated and passed through `seal`.
pub trait MediaRecorder: Send {
    /// Encoding of sealed recordings
    fn mime_type(&self) -> AudioMimeType;

    /// Begin collecting; `timeslice_ms` is the intended collection interval
    fn start(&mut self, timeslice_ms: u64) -> Result<(), CaptureError>;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Drain the data collected since the previous call
    fn request_data(&mut self) -> Vec<u8>;

    /// Halt collection and return the final fragment
    fn stop(&mut self) -> Vec<u8>;

    /// Turn the concatenated fragments into one playable container
    fn seal(&self, data: Vec<u8>) -> Result<Vec<u8>, CaptureError>;
}

/// Handles produced by one successful acquisition
pub struct CaptureHandles {
    pub input: Box<dyn InputStream>,
    pub recorder: Box<dyn MediaRecorder>,
}

/// Port for the host's capture facility
#[async_trait]
pub trait CaptureHost: Send + Sync {
    /// Report capture capability without touching any device
    fn support(&self) -> CaptureSupport;

    /// Open the default input and a recorder on it
    async fn acquire(&self) -> Result<CaptureHandles, CaptureError>;
}
