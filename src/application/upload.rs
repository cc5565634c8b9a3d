//! Upload orchestrator: compose, submit, watch progress, navigate

use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::ports::{ApiError, Navigator, NotesApi, NoticeKind, Notifier, StatusTransport, UploadRequest};
use super::status_channel::{StatusEvent, StatusWatch};
use crate::domain::duration::Duration;
use crate::domain::status::{display_progress, ChannelState, StatusSnapshot, PROGRESS_FLOOR};
use crate::domain::upload::{DraftError, UploadDraft, UploadFlow, UploadPhase, UploadSource};

/// Failures surfaced through `UploadOrchestrator::error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Upload failed: {0}")]
    Upload(ApiError),

    #[error("Processing failed on the server")]
    ProcessingFailed,

    #[error("Processing did not finish within {0}")]
    TimedOut(Duration),

    #[error("Status connection closed before processing finished")]
    ChannelClosed,
}

impl UploadError {
    /// Whether submitting or watching again may succeed without changing
    /// the draft
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upload(err) => err.is_retryable(),
            Self::ChannelClosed => true,
            _ => false,
        }
    }
}

/// Configuration for the upload flow
#[derive(Debug, Clone, Default)]
pub struct UploadConfig {
    /// Whether to show a desktop notification when processing ends
    pub notify: bool,
    /// Give up watching after this long; None waits indefinitely
    pub watch_timeout: Option<Duration>,
}

/// Progress of a watched upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Channel(ChannelState),
    Progress(StatusSnapshot),
    Completed { note_id: String },
    Failed(UploadError),
}

/// Drives "select or record, upload, watch progress, navigate on completion".
///
/// Phases: COMPOSING -> SUBMITTING -> WATCHING -> COMPLETED | FAILED.
/// A rejected upload returns to COMPOSING with the audio kept.
pub struct UploadOrchestrator<A, N, V>
where
    A: NotesApi,
    N: Notifier,
    V: Navigator,
{
    api: A,
    transport: Arc<dyn StatusTransport>,
    notifier: N,
    navigator: V,
    config: UploadConfig,
    flow: UploadFlow,
    draft: UploadDraft,
    note_id: Option<String>,
    latest: Option<StatusSnapshot>,
    watch: Option<StatusWatch>,
    deadline: Option<Instant>,
    error: Option<UploadError>,
    navigated: bool,
}

enum Wake {
    Event(Option<StatusEvent>),
    Expired,
}

impl<A, N, V> UploadOrchestrator<A, N, V>
where
    A: NotesApi,
    N: Notifier,
    V: Navigator,
{
    pub fn new(
        api: A,
        transport: Arc<dyn StatusTransport>,
        notifier: N,
        navigator: V,
        config: UploadConfig,
    ) -> Self {
        Self {
            api,
            transport,
            notifier,
            navigator,
            config,
            flow: UploadFlow::new(),
            draft: UploadDraft::new(),
            note_id: None,
            latest: None,
            watch: None,
            deadline: None,
            error: None,
            navigated: false,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.flow.phase()
    }

    pub fn draft(&self) -> &UploadDraft {
        &self.draft
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    /// Latest snapshot received while watching
    pub fn latest(&self) -> Option<&StatusSnapshot> {
        self.latest.as_ref()
    }

    pub fn error(&self) -> Option<&UploadError> {
        self.error.as_ref()
    }

    /// Progress as displayed, never below the floor
    pub fn display_progress(&self) -> f64 {
        self.latest
            .as_ref()
            .map(|s| display_progress(s.progress))
            .unwrap_or(PROGRESS_FLOOR)
    }

    fn composing(&self, action: &str) -> bool {
        if self.flow.phase() != UploadPhase::Composing {
            debug!(phase = %self.flow.phase(), action, "Ignoring draft change");
            return false;
        }
        true
    }

    pub fn set_source(&mut self, source: UploadSource) {
        if self.composing("set source") {
            self.draft.set_source(source);
        }
    }

    pub fn set_project(&mut self, project_id: &str) {
        if self.composing("set project") {
            self.draft.set_project(project_id);
        }
    }

    pub fn set_title(&mut self, title: &str) {
        if self.composing("set title") {
            self.draft.set_title(title);
        }
    }

    /// Whether submission is enabled
    pub fn can_submit(&self) -> bool {
        self.flow.phase() == UploadPhase::Composing && self.draft.validate().is_ok()
    }

    /// Upload the draft and start watching its processing.
    /// Returns the phase reached.
    pub async fn submit(&mut self) -> UploadPhase {
        if self.flow.phase() != UploadPhase::Composing {
            debug!(phase = %self.flow.phase(), "Ignoring submit");
            return self.flow.phase();
        }
        if let Err(err) = self.draft.validate() {
            self.error = Some(err.into());
            return self.flow.phase();
        }
        let Some(source) = self.draft.source().cloned() else {
            return self.flow.phase();
        };
        let project_id = self.draft.project_id().unwrap_or_default().to_string();
        let title = self.draft.title().trim().to_string();
        let file_name = source.file_name();

        if let Err(err) = self.flow.submit() {
            debug!(error = %err, "Ignoring submit");
            return self.flow.phase();
        }
        self.error = None;
        info!(file_name = %file_name, size = %source.blob().human_readable_size(), "Uploading");

        let result = self
            .api
            .upload(UploadRequest {
                project_id: &project_id,
                title: &title,
                file_name: &file_name,
                audio: source.blob(),
            })
            .await;

        match result {
            Ok(note) => {
                info!(note_id = %note.id, "Upload accepted");
                let _ = self.flow.accept();
                self.watch = Some(StatusWatch::spawn(
                    self.transport.clone(),
                    Some(&note.id),
                    true,
                ));
                self.deadline = self
                    .config
                    .watch_timeout
                    .map(|timeout| Instant::now() + timeout.as_std());
                self.note_id = Some(note.id);
            }
            Err(err) => {
                warn!(error = %err, "Upload rejected");
                let _ = self.flow.reject();
                self.error = Some(UploadError::Upload(err));
            }
        }
        self.flow.phase()
    }

    /// Wait for the next watch event. Returns None when not watching or once
    /// the status channel is gone.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        if self.flow.phase() != UploadPhase::Watching {
            return None;
        }
        let deadline = self.deadline;
        let watch = self.watch.as_mut()?;

        let wake = match deadline {
            Some(deadline) => tokio::select! {
                event = watch.next() => Wake::Event(event),
                _ = tokio::time::sleep_until(deadline) => Wake::Expired,
            },
            None => Wake::Event(watch.next().await),
        };

        match wake {
            Wake::Expired => self.expire_watch().await,
            Wake::Event(None) => None,
            Wake::Event(Some(StatusEvent::StateChanged(ChannelState::Closed))) => {
                // Still WATCHING: the server keeps processing and `rewatch` can reconnect
                warn!(note_id = ?self.note_id, "Status channel closed while watching");
                self.error = Some(UploadError::ChannelClosed);
                Some(UploadEvent::Channel(ChannelState::Closed))
            }
            Wake::Event(Some(StatusEvent::StateChanged(state))) => Some(UploadEvent::Channel(state)),
            Wake::Event(Some(StatusEvent::Snapshot(snapshot))) => {
                self.latest = Some(snapshot.clone());
                if snapshot.status.is_failed() {
                    self.fail(UploadError::ProcessingFailed).await
                } else {
                    Some(UploadEvent::Progress(snapshot))
                }
            }
            Wake::Event(Some(StatusEvent::Completed(snapshot))) => {
                self.latest = Some(snapshot);
                self.complete().await
            }
        }
    }

    async fn complete(&mut self) -> Option<UploadEvent> {
        if let Err(err) = self.flow.complete() {
            debug!(error = %err, "Ignoring completion");
            return None;
        }
        let note_id = self.note_id.clone()?;
        self.deadline = None;
        if let Some(watch) = self.watch.take() {
            watch.close().await;
        }
        info!(note_id = %note_id, "Processing completed");
        if self.config.notify {
            self.send_notification("Voice note ready", NoticeKind::Ready)
                .await;
        }
        if !self.navigated {
            self.navigated = true;
            self.navigator.open_note(&note_id);
        }
        Some(UploadEvent::Completed { note_id })
    }

    async fn fail(&mut self, err: UploadError) -> Option<UploadEvent> {
        if let Err(transition) = self.flow.fail() {
            debug!(error = %transition, "Ignoring failure");
            return None;
        }
        warn!(error = %err, "Upload processing failed");
        self.deadline = None;
        if let Some(watch) = self.watch.take() {
            watch.close().await;
        }
        self.error = Some(err.clone());
        if self.config.notify {
            self.send_notification(&err.to_string(), NoticeKind::Failed)
                .await;
        }
        Some(UploadEvent::Failed(err))
    }

    async fn send_notification(&self, message: &str, kind: NoticeKind) {
        if let Err(err) = self.notifier.notify("VoiceNote", message, kind).await {
            debug!(error = %err, "Notification failed");
        }
    }

    /// Give up watching: WATCHING -> FAILED with a timeout error
    pub async fn expire_watch(&mut self) -> Option<UploadEvent> {
        let timeout = self.config.watch_timeout?;
        self.fail(UploadError::TimedOut(timeout)).await
    }

    /// Reopen the status channel for the note being watched, after the
    /// previous one closed. Returns false outside WATCHING.
    pub async fn rewatch(&mut self) -> bool {
        if self.flow.phase() != UploadPhase::Watching {
            debug!(phase = %self.flow.phase(), "Ignoring rewatch");
            return false;
        }
        let Some(note_id) = self.note_id.clone() else {
            return false;
        };
        if let Some(watch) = self.watch.take() {
            watch.close().await;
        }
        info!(note_id = %note_id, "Reopening status channel");
        self.error = None;
        self.watch = Some(StatusWatch::spawn(
            self.transport.clone(),
            Some(&note_id),
            true,
        ));
        true
    }

    /// Back to a fresh draft, discarding the audio and the status channel.
    /// The destination project is kept.
    pub fn reset(&mut self) {
        self.watch = None;
        self.deadline = None;
        self.flow.reset();
        self.draft.clear_source();
        self.draft.set_title("");
        self.note_id = None;
        self.latest = None;
        self.error = None;
        self.navigated = false;
    }

    /// Close the status channel, waiting for the connection to shut down
    pub async fn shutdown(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{MockApi, MockNavigator, MockNotifier, MockTransport};
    use crate::domain::recording::{AudioBlob, AudioMimeType};
    use chrono::NaiveDate;

    type Orchestrator = UploadOrchestrator<MockApi, MockNotifier, MockNavigator>;

    fn frame(status: &str, progress: f64) -> String {
        format!(r#"{{"note_id":"note-1","status":"{status}","progress":{progress}}}"#)
    }

    fn recording() -> UploadSource {
        let at = NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        UploadSource::recording(AudioBlob::new(vec![1, 2, 3], AudioMimeType::Flac), at)
    }

    fn orchestrator(api: MockApi, transport: MockTransport, config: UploadConfig) -> (Orchestrator, MockNavigator, MockNotifier) {
        let navigator = MockNavigator::default();
        let notifier = MockNotifier::default();
        let orchestrator = UploadOrchestrator::new(
            api,
            Arc::new(transport),
            notifier.clone(),
            navigator.clone(),
            config,
        );
        (orchestrator, navigator, notifier)
    }

    fn ready(orchestrator: &mut Orchestrator) {
        orchestrator.set_source(recording());
        orchestrator.set_project("p1");
    }

    async fn drain(orchestrator: &mut Orchestrator) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Some(event) = orchestrator.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn submission_requires_audio_project_and_title() {
        let (mut upload, _, _) = orchestrator(MockApi::new(), MockTransport::default(), UploadConfig::default());
        assert!(!upload.can_submit());

        upload.set_source(recording());
        assert!(!upload.can_submit());
        assert_eq!(upload.submit().await, UploadPhase::Composing);
        assert_eq!(upload.error(), Some(&UploadError::Draft(DraftError::MissingProject)));
        assert_eq!(upload.api.upload_count(), 0);

        upload.set_project("p1");
        assert!(upload.can_submit());
        assert_eq!(upload.draft().title(), "Recording 2026-05-01 14:00");
    }

    #[tokio::test]
    async fn full_cycle_navigates_once() {
        let transport = MockTransport::texts(&[
            &frame("pending", 0.0),
            &frame("transcribing", 40.0),
            &frame("completed", 100.0),
            &frame("completed", 100.0),
        ]);
        let (mut upload, navigator, _) = orchestrator(MockApi::new(), transport, UploadConfig::default());
        ready(&mut upload);

        assert_eq!(upload.submit().await, UploadPhase::Watching);
        assert_eq!(upload.note_id(), Some("note-1"));
        assert_eq!(upload.display_progress(), 5.0);

        let events = drain(&mut upload).await;
        assert!(events.contains(&UploadEvent::Completed {
            note_id: "note-1".to_string()
        }));
        assert_eq!(upload.phase(), UploadPhase::Completed);
        assert_eq!(upload.latest().unwrap().status.as_str(), "completed");
        assert_eq!(*navigator.opened.lock().unwrap(), vec!["note-1".to_string()]);

        let uploads = upload.api.uploads.lock().unwrap().clone();
        assert_eq!(
            uploads,
            vec![(
                "p1".to_string(),
                "Recording 2026-05-01 14:00".to_string(),
                "recording_2026-05-01_14-00.flac".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn progress_is_floored_for_display() {
        let transport = MockTransport::texts(&[&frame("pending", 0.0), &frame("stt", 10.0)]).held_open();
        let (mut upload, _, _) = orchestrator(MockApi::new(), transport, UploadConfig::default());
        ready(&mut upload);
        upload.submit().await;

        loop {
            match upload.next_event().await {
                Some(UploadEvent::Progress(snapshot)) if snapshot.status.as_str() == "pending" => {
                    assert_eq!(upload.display_progress(), 5.0);
                }
                Some(UploadEvent::Progress(_)) => {
                    assert_eq!(upload.display_progress(), 10.0);
                    break;
                }
                Some(_) => {}
                None => panic!("watch ended early"),
            }
        }
        upload.shutdown().await;
    }

    #[tokio::test]
    async fn rejected_upload_keeps_audio_for_retry() {
        let api = MockApi::failing(ApiError::RequestFailed("connection refused".to_string()));
        let (mut upload, _, _) = orchestrator(api, MockTransport::default(), UploadConfig::default());
        ready(&mut upload);

        assert_eq!(upload.submit().await, UploadPhase::Composing);
        let err = upload.error().unwrap();
        assert!(err.is_retryable());
        assert!(upload.draft().source().is_some());

        assert_eq!(upload.submit().await, UploadPhase::Watching);
        assert!(upload.error().is_none());
        assert_eq!(upload.api.upload_count(), 2);
    }

    #[tokio::test]
    async fn failed_status_fails_and_reset_discards() {
        let transport = MockTransport::texts(&[&frame("stt", 10.0), &frame("failed", 0.0)]);
        let config = UploadConfig {
            notify: true,
            ..UploadConfig::default()
        };
        let (mut upload, navigator, notifier) = orchestrator(MockApi::new(), transport, config);
        ready(&mut upload);
        upload.submit().await;

        let events = drain(&mut upload).await;
        assert!(events.contains(&UploadEvent::Failed(UploadError::ProcessingFailed)));
        assert_eq!(upload.phase(), UploadPhase::Failed);
        assert!(navigator.opened.lock().unwrap().is_empty());
        assert_eq!(notifier.sent.lock().unwrap()[0].1, NoticeKind::Failed);

        upload.reset();
        assert_eq!(upload.phase(), UploadPhase::Composing);
        assert!(upload.draft().source().is_none());
        assert!(upload.latest().is_none());
        assert_eq!(upload.draft().project_id(), Some("p1"));
    }

    #[tokio::test]
    async fn draft_is_frozen_while_watching() {
        let transport = MockTransport::default().held_open();
        let (mut upload, _, _) = orchestrator(MockApi::new(), transport, UploadConfig::default());
        ready(&mut upload);
        upload.submit().await;

        upload.set_title("changed");
        assert_eq!(upload.draft().title(), "Recording 2026-05-01 14:00");
        assert_eq!(upload.submit().await, UploadPhase::Watching);
        assert_eq!(upload.api.upload_count(), 1);
        upload.shutdown().await;
    }

    #[tokio::test]
    async fn watch_times_out_when_configured() {
        let transport = MockTransport::texts(&[&frame("stt", 10.0)]).held_open();
        let config = UploadConfig {
            notify: false,
            watch_timeout: Some(Duration::from_millis(50)),
        };
        let (mut upload, _, _) = orchestrator(MockApi::new(), transport, config);
        ready(&mut upload);
        upload.submit().await;

        let events = drain(&mut upload).await;
        assert_eq!(
            events.last(),
            Some(&UploadEvent::Failed(UploadError::TimedOut(Duration::from_millis(50))))
        );
        assert_eq!(upload.phase(), UploadPhase::Failed);
    }

    #[tokio::test]
    async fn failed_status_closes_the_channel() {
        let transport = MockTransport::texts(&[&frame("failed", 0.0)]).held_open();
        let (mut upload, _, _) = orchestrator(MockApi::new(), transport.clone(), UploadConfig::default());
        ready(&mut upload);
        upload.submit().await;

        let events = drain(&mut upload).await;
        assert_eq!(events.last(), Some(&UploadEvent::Failed(UploadError::ProcessingFailed)));
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test]
    async fn timeout_closes_the_channel() {
        let transport = MockTransport::default().held_open();
        let config = UploadConfig {
            notify: false,
            watch_timeout: Some(Duration::from_millis(20)),
        };
        let (mut upload, _, _) = orchestrator(MockApi::new(), transport.clone(), config);
        ready(&mut upload);
        upload.submit().await;

        drain(&mut upload).await;
        assert_eq!(upload.phase(), UploadPhase::Failed);
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test]
    async fn closed_channel_is_retryable_and_rewatch_reconnects() {
        let transport = MockTransport::texts(&[&frame("stt", 10.0)]);
        let (mut upload, _, _) = orchestrator(MockApi::new(), transport.clone(), UploadConfig::default());
        ready(&mut upload);
        upload.submit().await;

        let events = drain(&mut upload).await;
        assert_eq!(events.last(), Some(&UploadEvent::Channel(ChannelState::Closed)));
        assert_eq!(upload.phase(), UploadPhase::Watching);
        assert_eq!(upload.error(), Some(&UploadError::ChannelClosed));
        assert!(upload.error().unwrap().is_retryable());
        assert!(upload.draft().source().is_some());

        assert!(upload.rewatch().await);
        assert!(upload.error().is_none());
        assert!(matches!(upload.next_event().await, Some(UploadEvent::Channel(ChannelState::Connecting))));
        assert!(matches!(upload.next_event().await, Some(UploadEvent::Channel(ChannelState::Open))));
        assert!(matches!(upload.next_event().await, Some(UploadEvent::Progress(_))));
        assert_eq!(transport.connects(), 2);
        upload.shutdown().await;
    }

    #[tokio::test]
    async fn rewatch_outside_watching_is_ignored() {
        let transport = MockTransport::default();
        let (mut upload, _, _) = orchestrator(MockApi::new(), transport.clone(), UploadConfig::default());
        ready(&mut upload);
        assert!(!upload.rewatch().await);
        assert_eq!(transport.connects(), 0);
    }
}
