//! Recording controller

use std::sync::Arc;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::error::MisuseError;
use super::ports::{CaptureError, CaptureHost, CaptureSupport, ObjectUrl, ObjectUrlStore};
use super::resource_guard::MediaResourceGuard;
use crate::domain::recording::{AudioBlob, RecorderStatus, RecordingSession};
use crate::domain::upload::UploadSource;

/// Chunk collection interval in milliseconds
pub const TIMESLICE_MS: u64 = 1000;

/// Failures surfaced through `RecordingController::error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("Audio capture is not available in this context")]
    InsecureContext,

    #[error("This system has no audio capture support")]
    NoCaptureApi,

    #[error("Microphone access was denied. Check your system's privacy settings and try again.")]
    PermissionDenied,

    #[error("Microphone unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Recording failed: {0}")]
    Failed(String),
}

impl RecorderError {
    /// Whether the capability itself is missing, as opposed to a failed attempt
    pub fn is_unsupported_environment(&self) -> bool {
        matches!(self, Self::InsecureContext | Self::NoCaptureApi)
    }
}

impl From<CaptureError> for RecorderError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => Self::PermissionDenied,
            CaptureError::DeviceUnavailable(msg) => Self::DeviceUnavailable(msg),
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Drives one microphone recording at a time.
///
/// The host calls `tick` once per `TIMESLICE_MS`; each tick collects one
/// chunk and advances the elapsed counter while recording.
pub struct RecordingController<H: CaptureHost> {
    host: H,
    guard: MediaResourceGuard,
    session: RecordingSession,
    error: Option<RecorderError>,
    disposed: bool,
}

impl<H: CaptureHost> RecordingController<H> {
    pub fn new(host: H, urls: Arc<dyn ObjectUrlStore>) -> Self {
        Self {
            host,
            guard: MediaResourceGuard::new(urls),
            session: RecordingSession::new(),
            error: None,
            disposed: false,
        }
    }

    pub fn status(&self) -> RecorderStatus {
        self.session.status()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session.elapsed_seconds()
    }

    pub fn result_blob(&self) -> Option<&AudioBlob> {
        self.session.result()
    }

    pub fn result_url(&self) -> Option<&ObjectUrl> {
        self.guard.url()
    }

    pub fn error(&self) -> Option<&RecorderError> {
        self.error.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> Result<(), MisuseError> {
        if self.disposed {
            return Err(MisuseError::Disposed("RecordingController"));
        }
        Ok(())
    }

    fn fail(&mut self, err: RecorderError) {
        warn!(error = %err, "Recording error");
        self.error = Some(err);
    }

    /// Acquire the microphone and start recording.
    ///
    /// Only valid while idle. Any previous result and its URL are discarded.
    pub async fn start(&mut self) -> Result<(), MisuseError> {
        self.ensure_live()?;
        if !self.session.is_idle() {
            debug!(status = %self.session.status(), "Ignoring start");
            return Ok(());
        }
        self.error = None;

        match self.host.support() {
            CaptureSupport::Available => {}
            CaptureSupport::InsecureContext => {
                self.fail(RecorderError::InsecureContext);
                return Ok(());
            }
            CaptureSupport::NoCaptureApi => {
                self.fail(RecorderError::NoCaptureApi);
                return Ok(());
            }
        }

        self.guard.revoke_url();

        let handles = match self.host.acquire().await {
            Ok(handles) => handles,
            Err(err) => {
                self.fail(err.into());
                return Ok(());
            }
        };
        self.guard.hold_capture(handles);

        let started = match self.guard.recorder() {
            Some(recorder) => recorder.start(TIMESLICE_MS),
            None => Err(CaptureError::RecorderFailed("recorder missing".to_string())),
        };
        if let Err(err) = started {
            self.guard.release_capture();
            self.fail(err.into());
            return Ok(());
        }

        if let Err(err) = self.session.begin() {
            debug!(error = %err, "Session refused to begin");
            self.guard.release_capture();
            return Ok(());
        }
        info!("Recording started");
        Ok(())
    }

    /// One collection interval: gather a chunk and advance the clock.
    /// Returns true when the elapsed counter moved.
    pub fn tick(&mut self) -> Result<bool, MisuseError> {
        self.ensure_live()?;
        if !self.session.is_recording() {
            return Ok(false);
        }
        let chunk = self
            .guard
            .recorder()
            .map(|r| r.request_data())
            .unwrap_or_default();
        self.session.push_chunk(chunk);
        Ok(self.session.tick())
    }

    /// RECORDING -> PAUSED; the device stays acquired
    pub fn pause(&mut self) -> Result<(), MisuseError> {
        self.ensure_live()?;
        match self.session.pause() {
            Ok(()) => {
                if let Some(recorder) = self.guard.recorder() {
                    recorder.pause();
                }
                debug!("Recording paused");
            }
            Err(err) => debug!(error = %err, "Ignoring pause"),
        }
        Ok(())
    }

    /// PAUSED -> RECORDING
    pub fn resume(&mut self) -> Result<(), MisuseError> {
        self.ensure_live()?;
        match self.session.resume() {
            Ok(()) => {
                if let Some(recorder) = self.guard.recorder() {
                    recorder.resume();
                }
                debug!("Recording resumed");
            }
            Err(err) => debug!(error = %err, "Ignoring resume"),
        }
        Ok(())
    }

    /// Finish the recording: seal the chunks into one blob, publish its URL
    /// and release the microphone
    pub fn stop(&mut self) -> Result<(), MisuseError> {
        self.ensure_live()?;
        if self.session.is_idle() {
            debug!("Ignoring stop while idle");
            return Ok(());
        }

        let final_chunk = self
            .guard
            .recorder()
            .map(|r| r.stop())
            .unwrap_or_default();
        let data = match self.session.finish(final_chunk) {
            Ok(data) => data,
            Err(err) => {
                debug!(error = %err, "Ignoring stop");
                return Ok(());
            }
        };

        let sealed = self
            .guard
            .recorder()
            .map(|r| (r.mime_type(), r.seal(data)));
        self.guard.release_capture();

        let blob = match sealed {
            Some((mime_type, Ok(bytes))) => AudioBlob::new(bytes, mime_type),
            Some((_, Err(err))) => {
                self.fail(err.into());
                return Ok(());
            }
            None => {
                self.fail(RecorderError::Failed("recorder missing".to_string()));
                return Ok(());
            }
        };

        if let Err(err) = self.guard.publish(&blob) {
            self.fail(RecorderError::Failed(err.to_string()));
        }
        info!(
            seconds = self.session.elapsed_seconds(),
            size = %blob.human_readable_size(),
            "Recording finished"
        );
        self.session.attach_result(blob);
        Ok(())
    }

    /// Discard any recording in progress or finished, and its URL
    pub fn reset(&mut self) -> Result<(), MisuseError> {
        self.ensure_live()?;
        if !self.session.is_idle() {
            if let Some(recorder) = self.guard.recorder() {
                recorder.stop();
            }
        }
        self.guard.release_all();
        self.session = RecordingSession::new();
        self.error = None;
        debug!("Recorder reset");
        Ok(())
    }

    /// Hand the finished recording over for upload
    pub fn confirm(&self, recorded_at: NaiveDateTime) -> Option<UploadSource> {
        self.session
            .result()
            .map(|blob| UploadSource::recording(blob.clone(), recorded_at))
    }

    /// Release every resource and refuse further use
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if !self.session.is_idle() {
            if let Some(recorder) = self.guard.recorder() {
                recorder.stop();
            }
        }
        self.guard.release_all();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{MockCapture, MockHost, MockUrlStore};
    use chrono::NaiveDate;

    fn controller() -> (RecordingController<MockHost>, MockCapture, Arc<MockUrlStore>) {
        let capture = MockCapture::new();
        let urls = Arc::new(MockUrlStore::new());
        let controller = RecordingController::new(MockHost::new(capture.clone()), urls.clone());
        (controller, capture, urls)
    }

    fn with_host(host: MockHost) -> RecordingController<MockHost> {
        RecordingController::new(host, Arc::new(MockUrlStore::new()))
    }

    #[tokio::test]
    async fn start_recording_from_idle() {
        let (mut recorder, capture, _) = controller();
        recorder.start().await.unwrap();

        assert_eq!(recorder.status(), RecorderStatus::Recording);
        assert_eq!(recorder.elapsed_seconds(), 0);
        assert!(recorder.error().is_none());
        assert_eq!(capture.calls(), vec!["start"]);
    }

    #[tokio::test]
    async fn twelve_second_recording_end_to_end() {
        let (mut recorder, capture, urls) = controller();
        recorder.start().await.unwrap();
        for _ in 0..12 {
            assert!(recorder.tick().unwrap());
        }
        recorder.stop().unwrap();

        assert_eq!(recorder.status(), RecorderStatus::Idle);
        assert_eq!(recorder.elapsed_seconds(), 12);
        let blob = recorder.result_blob().unwrap();
        assert_eq!(blob.size_bytes(), 13);
        assert_eq!(blob.data()[0], 1);
        assert_eq!(blob.data()[12], 0xFF);
        assert!(recorder.result_url().is_some());
        assert_eq!(capture.stops(), 1);

        recorder.reset().unwrap();
        assert!(recorder.result_url().is_none());
        assert!(recorder.result_blob().is_none());
        assert_eq!(urls.live(), 0);
        assert_eq!(capture.stops(), 1);
    }

    #[tokio::test]
    async fn elapsed_is_frozen_while_paused() {
        let (mut recorder, capture, _) = controller();
        recorder.start().await.unwrap();
        recorder.tick().unwrap();
        recorder.pause().unwrap();
        assert!(!recorder.tick().unwrap());
        assert!(!recorder.tick().unwrap());
        recorder.resume().unwrap();
        recorder.tick().unwrap();

        assert_eq!(recorder.elapsed_seconds(), 2);
        assert_eq!(capture.calls(), vec!["start", "pause", "resume"]);
    }

    #[tokio::test]
    async fn invalid_calls_are_no_ops() {
        let (mut recorder, capture, _) = controller();
        recorder.pause().unwrap();
        recorder.resume().unwrap();
        recorder.stop().unwrap();
        assert_eq!(recorder.status(), RecorderStatus::Idle);
        assert!(recorder.result_blob().is_none());

        recorder.start().await.unwrap();
        recorder.resume().unwrap();
        recorder.start().await.unwrap();
        assert_eq!(recorder.status(), RecorderStatus::Recording);
        assert_eq!(capture.calls(), vec!["start"]);
    }

    #[tokio::test]
    async fn stop_while_paused_finalizes() {
        let (mut recorder, capture, _) = controller();
        recorder.start().await.unwrap();
        recorder.tick().unwrap();
        recorder.pause().unwrap();
        recorder.stop().unwrap();

        assert_eq!(recorder.status(), RecorderStatus::Idle);
        assert!(recorder.result_blob().is_some());
        assert_eq!(capture.stops(), 1);
    }

    #[tokio::test]
    async fn double_stop_and_reset_release_once() {
        let (mut recorder, capture, urls) = controller();
        recorder.start().await.unwrap();
        recorder.tick().unwrap();
        recorder.stop().unwrap();
        recorder.stop().unwrap();
        recorder.reset().unwrap();
        recorder.reset().unwrap();

        assert_eq!(capture.stops(), 1);
        assert_eq!(urls.revoked().len(), 1);
    }

    #[tokio::test]
    async fn new_start_revokes_previous_url() {
        let (mut recorder, _, urls) = controller();
        recorder.start().await.unwrap();
        recorder.tick().unwrap();
        recorder.stop().unwrap();
        let first = recorder.result_url().cloned().unwrap();

        recorder.start().await.unwrap();
        assert_eq!(urls.revoked(), vec![first]);
        assert_eq!(recorder.elapsed_seconds(), 0);
        assert!(recorder.result_blob().is_none());
    }

    #[tokio::test]
    async fn reset_while_recording_releases_device() {
        let (mut recorder, capture, _) = controller();
        recorder.start().await.unwrap();
        recorder.reset().unwrap();

        assert_eq!(recorder.status(), RecorderStatus::Idle);
        assert_eq!(capture.stops(), 1);
        assert!(recorder.result_blob().is_none());
    }

    #[tokio::test]
    async fn permission_denied_is_reported_and_cleared_on_retry() {
        let mut host = MockHost::new(MockCapture::new());
        host.failure = Some(CaptureError::PermissionDenied);
        host.fail_once = true;
        let mut recorder = with_host(host);

        recorder.start().await.unwrap();
        assert_eq!(recorder.error(), Some(&RecorderError::PermissionDenied));
        assert_eq!(recorder.status(), RecorderStatus::Idle);

        recorder.start().await.unwrap();
        assert!(recorder.error().is_none());
        assert_eq!(recorder.status(), RecorderStatus::Recording);
    }

    #[tokio::test]
    async fn device_failure_maps_to_unavailable() {
        let mut host = MockHost::new(MockCapture::new());
        host.failure = Some(CaptureError::DeviceUnavailable("busy".to_string()));
        let mut recorder = with_host(host);

        recorder.start().await.unwrap();
        assert_eq!(
            recorder.error(),
            Some(&RecorderError::DeviceUnavailable("busy".to_string()))
        );
    }

    #[tokio::test]
    async fn unsupported_environment_never_acquires() {
        for (support, expected) in [
            (CaptureSupport::InsecureContext, RecorderError::InsecureContext),
            (CaptureSupport::NoCaptureApi, RecorderError::NoCaptureApi),
        ] {
            let mut host = MockHost::new(MockCapture::new());
            host.support = support;
            let mut recorder = with_host(host);

            recorder.start().await.unwrap();
            assert_eq!(recorder.error(), Some(&expected));
            assert!(expected.is_unsupported_environment());
            assert_eq!(recorder.host.acquisitions(), 0);
        }
    }

    #[tokio::test]
    async fn error_cleared_by_next_start() {
        let (mut recorder, _, _) = controller();
        recorder.error = Some(RecorderError::PermissionDenied);
        recorder.start().await.unwrap();
        assert!(recorder.error().is_none());
    }

    #[tokio::test]
    async fn dispose_releases_and_rejects_use() {
        let (mut recorder, capture, urls) = controller();
        recorder.start().await.unwrap();
        recorder.tick().unwrap();
        recorder.stop().unwrap();
        recorder.dispose();
        recorder.dispose();

        assert_eq!(urls.live(), 0);
        assert_eq!(capture.stops(), 1);
        assert_eq!(
            recorder.start().await,
            Err(MisuseError::Disposed("RecordingController"))
        );
        assert!(recorder.tick().is_err());
    }

    #[tokio::test]
    async fn drop_while_recording_releases_device() {
        let (mut recorder, capture, _) = controller();
        recorder.start().await.unwrap();
        drop(recorder);
        assert_eq!(capture.stops(), 1);
    }

    #[tokio::test]
    async fn confirm_hands_over_result() {
        let (mut recorder, _, _) = controller();
        let at = NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert!(recorder.confirm(at).is_none());

        recorder.start().await.unwrap();
        recorder.tick().unwrap();
        recorder.stop().unwrap();
        let source = recorder.confirm(at).unwrap();
        assert_eq!(source.file_name(), "recording_2026-01-02_10-30.flac");
    }
}
