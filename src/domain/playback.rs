//! Playback state mirrored from the engine's clock

/// Notifications emitted by a playback engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// Source decoded and seekable
    Ready { duration: f64 },
    /// Playback cursor moved (playing, or after a seek)
    TimeUpdate(f64),
    Play,
    Pause,
    /// Reached the end of the source
    Finish,
}

/// Mirror of the engine state. Only `apply` mutates it, so the view can
/// never diverge from what the engine reported.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    current_time: f64,
    duration: f64,
    is_ready: bool,
    is_playing: bool,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Fold one engine notification into the state.
    /// Returns true when `current_time` changed.
    pub fn apply(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Ready { duration } => {
                if self.is_ready {
                    return false;
                }
                self.duration = sanitize(duration);
                self.is_ready = true;
                false
            }
            EngineEvent::TimeUpdate(time) => {
                let time = if self.is_ready {
                    self.clamp(time)
                } else {
                    sanitize(time)
                };
                let changed = time != self.current_time;
                self.current_time = time;
                changed
            }
            EngineEvent::Play => {
                self.is_playing = true;
                false
            }
            EngineEvent::Pause | EngineEvent::Finish => {
                self.is_playing = false;
                false
            }
        }
    }

    /// Clamp a time into `[0, duration]`; infinities land on the bounds
    pub fn clamp(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.duration)
    }

    /// Target of a seek request, or None when seeking is not possible yet
    pub fn seek_target(&self, time: f64) -> Option<f64> {
        if !self.is_ready || self.duration <= 0.0 || time.is_nan() {
            return None;
        }
        Some(self.clamp(time))
    }

    /// Target of a relative skip from the current cursor
    pub fn skip_target(&self, delta: f64) -> Option<f64> {
        self.seek_target(self.current_time + delta)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Format seconds as m:ss
pub fn format_timestamp(seconds: f64) -> String {
    let total = sanitize(seconds).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
