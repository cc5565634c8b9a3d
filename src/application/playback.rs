//! Playback controller

use tokio::sync::watch;
use tracing::{debug, warn};

use super::error::MisuseError;
use super::ports::{EngineFactory, PlaybackEngine, PlaybackError};
use crate::domain::playback::{EngineEvent, PlaybackState};

/// Wraps one playback engine and republishes its clock.
///
/// `PlaybackState` only changes through engine events, delivered by the
/// host via `handle_event` or drained with `pump`. Every time update is
/// published on a `watch` channel for other views.
pub struct PlaybackController<F: EngineFactory> {
    factory: F,
    engine: Option<Box<dyn PlaybackEngine>>,
    state: PlaybackState,
    time: watch::Sender<f64>,
    source: Option<String>,
    error: Option<PlaybackError>,
    disposed: bool,
}

impl<F: EngineFactory> PlaybackController<F> {
    pub fn new(factory: F) -> Self {
        let (time, _) = watch::channel(0.0);
        Self {
            factory,
            engine: None,
            state: PlaybackState::new(),
            time,
            source: None,
            error: None,
            disposed: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.state.duration()
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        self.error.as_ref()
    }

    /// Receiver of the playback time signal
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.time.subscribe()
    }

    fn ensure_live(&self) -> Result<(), MisuseError> {
        if self.disposed {
            return Err(MisuseError::Disposed("PlaybackController"));
        }
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
            debug!("Playback engine destroyed");
        }
    }

    /// Load a new source, destroying the previous engine first
    pub async fn load(&mut self, source: &str) -> Result<(), MisuseError> {
        self.ensure_live()?;
        self.teardown();
        self.state = PlaybackState::new();
        self.time.send_replace(0.0);
        self.error = None;
        self.source = Some(source.to_string());

        match self.factory.create(source).await {
            Ok(engine) => {
                debug!(source, "Playback engine created");
                self.engine = Some(engine);
            }
            Err(err) => {
                warn!(error = %err, source, "Failed to load audio");
                self.error = Some(err);
            }
        }
        Ok(())
    }

    /// Fold one engine notification into the state
    pub fn handle_event(&mut self, event: EngineEvent) {
        if self.disposed {
            return;
        }
        let was_ready = self.state.is_ready();
        self.state.apply(event);
        match event {
            EngineEvent::TimeUpdate(_) => {
                self.time.send_replace(self.state.current_time());
            }
            EngineEvent::Ready { .. } if !was_ready => {
                debug!(duration = self.state.duration(), "Playback ready");
            }
            _ => {}
        }
    }

    /// Drain and apply every pending engine notification.
    /// Returns the number of events applied.
    pub fn pump(&mut self) -> usize {
        let events = match self.engine.as_mut() {
            Some(engine) => engine.poll_events(),
            None => return 0,
        };
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        count
    }

    /// Play or pause. Ignored until ready.
    pub fn toggle_play(&mut self) -> Result<(), MisuseError> {
        self.ensure_live()?;
        if !self.state.is_ready() {
            debug!("Ignoring toggle before ready");
            return Ok(());
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.play_pause();
        }
        Ok(())
    }

    /// Seek to `time` seconds, clamped to the duration.
    /// Ignored until ready or when the duration is zero.
    pub fn seek(&mut self, time: f64) -> Result<(), MisuseError> {
        self.ensure_live()?;
        let Some(target) = self.state.seek_target(time) else {
            debug!(time, "Ignoring seek");
            return Ok(());
        };
        if let Some(engine) = self.engine.as_mut() {
            engine.seek_to(target / self.state.duration());
        }
        Ok(())
    }

    /// Seek relative to the current position
    pub fn skip(&mut self, delta: f64) -> Result<(), MisuseError> {
        self.ensure_live()?;
        match self.state.skip_target(delta) {
            Some(target) => self.seek(target),
            None => Ok(()),
        }
    }

    /// Destroy the engine and refuse further use
    pub fn dispose(&mut self) {
        self.teardown();
        self.disposed = true;
    }
}

impl<F: EngineFactory> Drop for PlaybackController<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
