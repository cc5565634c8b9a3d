//! Transcript highlight synchronized with playback

use tokio::sync::watch;

use super::playback::PlaybackController;
use super::ports::EngineFactory;
use crate::domain::transcript::{active_indices, TranscriptSegment};

/// Projection of the playback clock onto a static segment list.
///
/// The view never seeks on its own: its only outbound action is a seek
/// request raised by `request_seek`, consumed once by `forward_to`.
#[derive(Debug, Default)]
pub struct TranscriptSyncView {
    segments: Vec<TranscriptSegment>,
    current_time: f64,
    active: Vec<usize>,
    pending_seek: Option<f64>,
}

impl TranscriptSyncView {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        let active = active_indices(&segments, 0.0);
        Self {
            segments,
            current_time: 0.0,
            active,
            pending_seek: None,
        }
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Indices of the highlighted segments
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active.contains(&index)
    }

    /// Recompute the highlight for `time`. Returns true when it changed.
    pub fn on_time(&mut self, time: f64) -> bool {
        self.current_time = time;
        let active = active_indices(&self.segments, time);
        if active == self.active {
            return false;
        }
        self.active = active;
        true
    }

    /// Apply the latest value of a playback time signal, if it moved
    pub fn follow(&mut self, time: &mut watch::Receiver<f64>) -> bool {
        match time.has_changed() {
            Ok(true) => {
                let t = *time.borrow_and_update();
                self.on_time(t)
            }
            _ => false,
        }
    }

    /// Ask playback to jump to the start of segment `index`
    pub fn request_seek(&mut self, index: usize) -> Option<f64> {
        let start = self.segments.get(index)?.start;
        self.pending_seek = Some(start);
        Some(start)
    }

    /// Consume the pending seek request
    pub fn take_seek_request(&mut self) -> Option<f64> {
        self.pending_seek.take()
    }

    /// Hand the pending seek request to `playback`.
    /// Returns true when a seek was issued.
    pub fn forward_to<F: EngineFactory>(&mut self, playback: &mut PlaybackController<F>) -> bool {
        match self.take_seek_request() {
            Some(time) => playback.seek(time).is_ok(),
            None => false,
        }
    }
}
