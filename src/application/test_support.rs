//! Hand-written port doubles shared by the controller tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ports::{
    ApiError, CaptureError, CaptureHandles, CaptureHost, CaptureSupport, EngineFactory, Frame,
    InputStream, MediaRecorder, Navigator, NotesApi, NotificationError, NoticeKind, Notifier,
    ObjectUrl, ObjectUrlError, ObjectUrlStore, PlaybackEngine, PlaybackError, StatusStream,
    StatusTransport, TransportError, UploadRequest,
};
use crate::domain::note::{ChatReply, Note, Project};
use crate::domain::playback::EngineEvent;
use crate::domain::recording::{AudioBlob, AudioMimeType};
use crate::domain::status::ProcessingStatus;
use crate::domain::transcript::{Analysis, Transcript};

// Capture

#[derive(Default)]
struct CaptureLog {
    stops: usize,
    calls: Vec<&'static str>,
    next_chunk: u8,
}

/// Capture double. Every `request_data` yields one single-byte fragment,
/// `stop` yields a final `[0xFF]` and `seal` is the identity.
#[derive(Clone, Default)]
pub struct MockCapture {
    log: Arc<Mutex<CaptureLog>>,
}

impl MockCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> CaptureHandles {
        CaptureHandles {
            input: Box::new(MockInput {
                log: self.log.clone(),
            }),
            recorder: Box::new(MockRecorder {
                log: self.log.clone(),
            }),
        }
    }

    /// Number of times an input stream was stopped
    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().calls.clone()
    }
}

struct MockInput {
    log: Arc<Mutex<CaptureLog>>,
}

impl InputStream for MockInput {
    fn stop_tracks(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }
}

struct MockRecorder {
    log: Arc<Mutex<CaptureLog>>,
}

impl MockRecorder {
    fn record(&self, call: &'static str) {
        self.log.lock().unwrap().calls.push(call);
    }
}

impl MediaRecorder for MockRecorder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Flac
    }

    fn start(&mut self, _timeslice_ms: u64) -> Result<(), CaptureError> {
        self.record("start");
        Ok(())
    }

    fn pause(&mut self) {
        self.record("pause");
    }

    fn resume(&mut self) {
        self.record("resume");
    }

    fn request_data(&mut self) -> Vec<u8> {
        let mut log = self.log.lock().unwrap();
        log.next_chunk = log.next_chunk.wrapping_add(1);
        vec![log.next_chunk]
    }

    fn stop(&mut self) -> Vec<u8> {
        self.record("stop");
        vec![0xFF]
    }

    fn seal(&self, data: Vec<u8>) -> Result<Vec<u8>, CaptureError> {
        Ok(data)
    }
}

pub struct MockHost {
    pub support: CaptureSupport,
    pub failure: Option<CaptureError>,
    /// Only the first acquisition fails
    pub fail_once: bool,
    pub capture: MockCapture,
    acquisitions: AtomicUsize,
}

impl MockHost {
    pub fn new(capture: MockCapture) -> Self {
        Self {
            support: CaptureSupport::Available,
            failure: None,
            fail_once: false,
            capture,
            acquisitions: AtomicUsize::new(0),
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureHost for MockHost {
    fn support(&self) -> CaptureSupport {
        self.support
    }

    async fn acquire(&self) -> Result<CaptureHandles, CaptureError> {
        let earlier = self.acquisitions.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) if !(self.fail_once && earlier > 0) => Err(err.clone()),
            _ => Ok(self.capture.handles()),
        }
    }
}

// Object URLs

#[derive(Default)]
pub struct MockUrlStore {
    created: AtomicUsize,
    revoked: Mutex<Vec<ObjectUrl>>,
}

impl MockUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoked(&self) -> Vec<ObjectUrl> {
        self.revoked.lock().unwrap().clone()
    }

    /// URLs created and not yet revoked
    pub fn live(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.revoked.lock().unwrap().len()
    }
}

impl ObjectUrlStore for MockUrlStore {
    fn create(&self, _blob: &AudioBlob) -> Result<ObjectUrl, ObjectUrlError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(ObjectUrl::new(format!("blob:test/{n}")))
    }

    fn revoke(&self, url: &ObjectUrl) {
        self.revoked.lock().unwrap().push(url.clone());
    }
}

// Playback

#[derive(Default)]
pub struct EngineLog {
    pub sources: Vec<String>,
    pub seeks: Vec<f64>,
    pub toggles: usize,
    pub destroyed: usize,
}

/// Engine factory double. Engines report `Ready` on their first poll and
/// answer seeks with a time update.
#[derive(Clone)]
pub struct MockEngines {
    pub duration: f64,
    pub log: Arc<Mutex<EngineLog>>,
}

impl MockEngines {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            log: Arc::new(Mutex::new(EngineLog::default())),
        }
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.log.lock().unwrap().seeks.clone()
    }

    pub fn destroyed(&self) -> usize {
        self.log.lock().unwrap().destroyed
    }
}

#[async_trait]
impl EngineFactory for MockEngines {
    async fn create(&self, source: &str) -> Result<Box<dyn PlaybackEngine>, PlaybackError> {
        if source.is_empty() {
            return Err(PlaybackError::LoadFailed("empty source".to_string()));
        }
        self.log.lock().unwrap().sources.push(source.to_string());
        let mut pending = VecDeque::new();
        pending.push_back(EngineEvent::Ready {
            duration: self.duration,
        });
        Ok(Box::new(MockEngine {
            duration: self.duration,
            playing: false,
            pending,
            log: self.log.clone(),
        }))
    }
}

pub struct MockEngine {
    duration: f64,
    playing: bool,
    pending: VecDeque<EngineEvent>,
    log: Arc<Mutex<EngineLog>>,
}

impl PlaybackEngine for MockEngine {
    fn play_pause(&mut self) {
        self.log.lock().unwrap().toggles += 1;
        self.playing = !self.playing;
        self.pending.push_back(if self.playing {
            EngineEvent::Play
        } else {
            EngineEvent::Pause
        });
    }

    fn seek_to(&mut self, fraction: f64) {
        self.log.lock().unwrap().seeks.push(fraction);
        self.pending
            .push_back(EngineEvent::TimeUpdate(fraction * self.duration));
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        self.pending.drain(..).collect()
    }

    fn destroy(&mut self) {
        self.log.lock().unwrap().destroyed += 1;
    }
}

// Status transport

#[derive(Default)]
pub struct TransportLog {
    pub connects: Vec<String>,
    pub closes: usize,
}

/// Transport double replaying scripted frames. With `hold_open` the stream
/// stays pending after the script instead of ending.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub frames: Vec<Result<Frame, TransportError>>,
    pub hold_open: bool,
    pub refuse: Option<TransportError>,
    pub log: Arc<Mutex<TransportLog>>,
}

impl MockTransport {
    pub fn texts(frames: &[&str]) -> Self {
        Self {
            frames: frames.iter().map(|f| Ok(Frame::Text(f.to_string()))).collect(),
            ..Self::default()
        }
    }

    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn connects(&self) -> usize {
        self.log.lock().unwrap().connects.len()
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

#[async_trait]
impl StatusTransport for MockTransport {
    async fn connect(&self, note_id: &str) -> Result<Box<dyn StatusStream>, TransportError> {
        self.log.lock().unwrap().connects.push(note_id.to_string());
        if let Some(err) = &self.refuse {
            return Err(err.clone());
        }
        Ok(Box::new(MockStream {
            frames: self.frames.clone().into(),
            hold_open: self.hold_open,
            closed: false,
            log: self.log.clone(),
        }))
    }
}

struct MockStream {
    frames: VecDeque<Result<Frame, TransportError>>,
    hold_open: bool,
    closed: bool,
    log: Arc<Mutex<TransportLog>>,
}

#[async_trait]
impl StatusStream for MockStream {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        if self.closed {
            return None;
        }
        match self.frames.pop_front() {
            Some(frame) => Some(frame),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.lock().unwrap().closes += 1;
        }
    }
}

// Note service

pub struct MockApi {
    pub upload_failure: Mutex<Option<ApiError>>,
    pub uploads: Mutex<Vec<(String, String, String)>>,
    pub stored: Mutex<Option<Note>>,
    pub transcript_failure: Mutex<Option<ApiError>>,
    pub analysis_failure: Mutex<Option<ApiError>>,
    /// (message, session id sent) per chat call
    pub questions: Mutex<Vec<(String, Option<String>)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            upload_failure: Mutex::new(None),
            uploads: Mutex::new(Vec::new()),
            stored: Mutex::new(None),
            transcript_failure: Mutex::new(None),
            analysis_failure: Mutex::new(None),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ApiError) -> Self {
        let api = Self::new();
        *api.upload_failure.lock().unwrap() = Some(err);
        api
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl NotesApi for MockApi {
    async fn upload(&self, request: UploadRequest<'_>) -> Result<Note, ApiError> {
        self.uploads.lock().unwrap().push((
            request.project_id.to_string(),
            request.title.to_string(),
            request.file_name.to_string(),
        ));
        if let Some(err) = self.upload_failure.lock().unwrap().take() {
            return Err(err);
        }
        Ok(Note {
            id: "note-1".to_string(),
            project_id: Some(request.project_id.to_string()),
            title: Some(request.title.to_string()),
            duration_seconds: None,
            language: None,
            status: ProcessingStatus::new("queued"),
            created_at: None,
            file_path: None,
        })
    }

    async fn note(&self, note_id: &str) -> Result<Note, ApiError> {
        self.stored
            .lock()
            .unwrap()
            .clone()
            .filter(|note| note.id == note_id)
            .ok_or_else(|| ApiError::NotFound(note_id.to_string()))
    }

    async fn transcript(&self, _note_id: &str) -> Result<Transcript, ApiError> {
        match self.transcript_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(Transcript::default()),
        }
    }

    async fn analysis(&self, _note_id: &str) -> Result<Analysis, ApiError> {
        match self.analysis_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(Analysis::default()),
        }
    }

    async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(Vec::new())
    }

    async fn chat(
        &self,
        note_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, ApiError> {
        let mut questions = self.questions.lock().unwrap();
        questions.push((message.to_string(), session_id.map(str::to_string)));
        if self.stored.lock().unwrap().as_ref().map(|n| n.id.as_str()) != Some(note_id) {
            return Err(ApiError::NotFound(note_id.to_string()));
        }
        Ok(ChatReply {
            reply: format!("answer {}", questions.len()),
            session_id: "s-1".to_string(),
        })
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<String, ApiError> {
        Err(ApiError::Unauthorized)
    }
}

#[derive(Clone, Default)]
pub struct MockNavigator {
    pub opened: Arc<Mutex<Vec<String>>>,
}

impl Navigator for MockNavigator {
    fn open_note(&self, note_id: &str) {
        self.opened.lock().unwrap().push(note_id.to_string());
    }
}

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<(String, NoticeKind)>>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(
        &self,
        _title: &str,
        message: &str,
        icon: NoticeKind,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push((message.to_string(), icon));
        Ok(())
    }
}
