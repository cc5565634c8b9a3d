//! Scoped ownership of host media resources

use std::sync::Arc;

use tracing::debug;

use super::ports::{CaptureHandles, InputStream, MediaRecorder, ObjectUrl, ObjectUrlError, ObjectUrlStore};
use crate::domain::recording::AudioBlob;

/// Exclusive owner of the capture stream, its recorder and the object URL
/// of the latest result.
///
/// Each resource is released at most once: by the explicit release calls,
/// or on drop for whatever is still held.
pub struct MediaResourceGuard {
    urls: Arc<dyn ObjectUrlStore>,
    input: Option<Box<dyn InputStream>>,
    recorder: Option<Box<dyn MediaRecorder>>,
    url: Option<ObjectUrl>,
}

impl MediaResourceGuard {
    pub fn new(urls: Arc<dyn ObjectUrlStore>) -> Self {
        Self {
            urls,
            input: None,
            recorder: None,
            url: None,
        }
    }

    /// Take ownership of freshly acquired capture handles, releasing any
    /// previously held stream first
    pub fn hold_capture(&mut self, handles: CaptureHandles) {
        self.release_capture();
        self.input = Some(handles.input);
        self.recorder = Some(handles.recorder);
    }

    pub fn holds_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn recorder(&mut self) -> Option<&mut Box<dyn MediaRecorder>> {
        self.recorder.as_mut()
    }

    /// Stop the input tracks and drop the recorder.
    /// Returns false when nothing was held.
    pub fn release_capture(&mut self) -> bool {
        self.recorder = None;
        match self.input.take() {
            Some(mut input) => {
                input.stop_tracks();
                debug!("Released input stream");
                true
            }
            None => false,
        }
    }

    /// Expose `blob` at a new URL, revoking the previous one
    pub fn publish(&mut self, blob: &AudioBlob) -> Result<ObjectUrl, ObjectUrlError> {
        self.revoke_url();
        let url = self.urls.create(blob)?;
        debug!(url = %url, "Published recording");
        self.url = Some(url.clone());
        Ok(url)
    }

    pub fn url(&self) -> Option<&ObjectUrl> {
        self.url.as_ref()
    }

    /// Revoke the held URL. Returns false when none was held.
    pub fn revoke_url(&mut self) -> bool {
        match self.url.take() {
            Some(url) => {
                self.urls.revoke(&url);
                debug!(url = %url, "Revoked recording URL");
                true
            }
            None => false,
        }
    }

    /// Release everything still held
    pub fn release_all(&mut self) {
        self.release_capture();
        self.revoke_url();
    }
}

impl Drop for MediaResourceGuard {
    fn drop(&mut self) {
        self.release_all();
    }
}
