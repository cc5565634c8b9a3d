//! Rodio-based playback engine
//!
//! The output stream is not `Send`, so each engine owns a thread holding the
//! stream and sink. Commands go in and `EngineEvent`s come out over std
//! channels; the controller drains them with `poll_events`.

use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::application::ports::{EngineFactory, PlaybackEngine, PlaybackError};
use crate::domain::playback::EngineEvent;
use crate::infrastructure::object_url::path_from_url;

/// Interval between clock reports while playing
const TICK: Duration = Duration::from_millis(100);

enum Command {
    PlayPause,
    Seek(f64),
    Destroy,
}

/// Creates rodio engines from http(s) URLs, `file://` URLs or plain paths
#[derive(Clone, Default)]
pub struct RodioEngineFactory {
    http: reqwest::Client,
}

impl RodioEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self, source: &str) -> Result<Vec<u8>, PlaybackError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .http
                .get(source)
                .send()
                .await
                .map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;
            if !response.status().is_success() {
                return Err(PlaybackError::LoadFailed(format!(
                    "HTTP {} for {}",
                    response.status().as_u16(),
                    source
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;
            return Ok(bytes.to_vec());
        }

        let path = path_from_url(source).unwrap_or_else(|| std::path::Path::new(source));
        tokio::fs::read(path)
            .await
            .map_err(|e| PlaybackError::LoadFailed(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl EngineFactory for RodioEngineFactory {
    async fn create(&self, source: &str) -> Result<Box<dyn PlaybackEngine>, PlaybackError> {
        let bytes: Arc<[u8]> = self.fetch(source).await?.into();
        let duration = measure_duration(&bytes)?;
        debug!(source, duration, "Audio source decoded");

        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("voicenote-playback".to_string())
            .spawn(move || run_output(bytes, duration, command_rx, event_tx, ready_tx))
            .map_err(|e| PlaybackError::NoOutputDevice(e.to_string()))?;

        ready_rx
            .await
            .map_err(|_| PlaybackError::NoOutputDevice("Playback thread exited".to_string()))??;

        Ok(Box::new(RodioEngine {
            commands: command_tx,
            events: event_rx,
            thread: Some(thread),
        }))
    }
}

fn decoder(bytes: &Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>, PlaybackError> {
    Decoder::new(Cursor::new(Arc::clone(bytes)))
        .map_err(|e| PlaybackError::DecodeFailed(e.to_string()))
}

/// Duration in seconds. Falls back to counting samples when the container
/// carries no length.
fn measure_duration(bytes: &Arc<[u8]>) -> Result<f64, PlaybackError> {
    let source = decoder(bytes)?;
    if let Some(total) = source.total_duration() {
        return Ok(total.as_secs_f64());
    }

    let channels = f64::from(source.channels().max(1));
    let rate = f64::from(source.sample_rate().max(1));
    let samples = source.count() as f64;
    Ok(samples / channels / rate)
}

fn run_output(
    bytes: Arc<[u8]>,
    duration: f64,
    commands: Receiver<Command>,
    events: Sender<EngineEvent>,
    ready: oneshot::Sender<Result<(), PlaybackError>>,
) {
    let opened = OutputStream::try_default()
        .map_err(|e| PlaybackError::NoOutputDevice(e.to_string()))
        .and_then(|(stream, handle)| {
            Sink::try_new(&handle)
                .map(|sink| (stream, sink))
                .map_err(|e| PlaybackError::NoOutputDevice(e.to_string()))
        });

    let (_stream, sink) = match opened {
        Ok(output) => output,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    sink.pause();
    if let Err(err) = decoder(&bytes).map(|source| sink.append(source)) {
        let _ = ready.send(Err(err));
        return;
    }
    let _ = ready.send(Ok(()));
    let _ = events.send(EngineEvent::Ready { duration });

    let mut playing = false;
    loop {
        match commands.recv_timeout(TICK) {
            Ok(Command::PlayPause) => {
                if playing {
                    sink.pause();
                    playing = false;
                    let _ = events.send(EngineEvent::Pause);
                } else {
                    if sink.empty() && !requeue(&sink, &bytes) {
                        continue;
                    }
                    sink.play();
                    playing = true;
                    let _ = events.send(EngineEvent::Play);
                }
            }
            Ok(Command::Seek(fraction)) => {
                if sink.empty() && !requeue(&sink, &bytes) {
                    continue;
                }
                let target = (fraction.clamp(0.0, 1.0) * duration).max(0.0);
                match sink.try_seek(Duration::from_secs_f64(target)) {
                    Ok(()) => {
                        let _ = events.send(EngineEvent::TimeUpdate(target));
                    }
                    Err(e) => warn!(error = %e, target, "Seek failed"),
                }
            }
            Ok(Command::Destroy) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if playing {
            if sink.empty() {
                playing = false;
                let _ = events.send(EngineEvent::TimeUpdate(duration));
                let _ = events.send(EngineEvent::Finish);
            } else {
                let _ = events.send(EngineEvent::TimeUpdate(sink.get_pos().as_secs_f64()));
            }
        }
    }

    sink.stop();
    debug!("Playback thread stopped");
}

/// Queue the source again after it finished; the sink stays paused
fn requeue(sink: &Sink, bytes: &Arc<[u8]>) -> bool {
    match decoder(bytes) {
        Ok(source) => {
            sink.pause();
            sink.append(source);
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to requeue audio");
            false
        }
    }
}

struct RodioEngine {
    commands: Sender<Command>,
    events: Receiver<EngineEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackEngine for RodioEngine {
    fn play_pause(&mut self) {
        let _ = self.commands.send(Command::PlayPause);
    }

    fn seek_to(&mut self, fraction: f64) {
        let _ = self.commands.send(Command::Seek(fraction));
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        self.events.try_iter().collect()
    }

    fn destroy(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.send(Command::Destroy);
            let _ = thread.join();
        }
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}
