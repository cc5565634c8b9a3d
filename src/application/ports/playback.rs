//! Playback engine port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::playback::EngineEvent;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Failed to load audio: {0}")]
    LoadFailed(String),

    #[error("No audio output device: {0}")]
    NoOutputDevice(String),

    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),
}

/// A loaded playback engine.
///
/// The engine reports everything it does as `EngineEvent`s; callers never
/// read its clock directly.
pub trait PlaybackEngine: Send {
    /// Start when paused, pause when playing
    fn play_pause(&mut self);

    /// Move the cursor to `fraction` of the duration (0.0..=1.0)
    fn seek_to(&mut self, fraction: f64);

    /// Drain pending notifications
    fn poll_events(&mut self) -> Vec<EngineEvent>;

    /// Stop output and release the engine's resources
    fn destroy(&mut self);
}

/// Port for creating engines bound to one source
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(&self, source: &str) -> Result<Box<dyn PlaybackEngine>, PlaybackError>;
}
