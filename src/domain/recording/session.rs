//! Recording session state machine

use std::fmt;
use thiserror::Error;

use super::audio_blob::AudioBlob;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderStatus {
    #[default]
    Idle,
    Recording,
    Paused,
}

impl RecorderStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid recorder transition: cannot {action} while {current_state}")]
pub struct InvalidRecorderTransition {
    pub current_state: RecorderStatus,
    pub action: &'static str,
}

/// One recording attempt.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> IDLE (finish)
///
/// `finish` freezes the chunk list; a result is attached afterwards.
#[derive(Debug, Default)]
pub struct RecordingSession {
    status: RecorderStatus,
    elapsed_seconds: u64,
    chunks: Vec<Vec<u8>>,
    finished: bool,
    result: Option<AudioBlob>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    pub fn is_idle(&self) -> bool {
        self.status == RecorderStatus::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.status == RecorderStatus::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.status == RecorderStatus::Paused
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    pub fn result(&self) -> Option<&AudioBlob> {
        self.result.as_ref()
    }

    /// Transition from IDLE to RECORDING, discarding any previous attempt
    pub fn begin(&mut self) -> Result<(), InvalidRecorderTransition> {
        if self.status != RecorderStatus::Idle {
            return Err(InvalidRecorderTransition {
                current_state: self.status,
                action: "start",
            });
        }
        *self = Self {
            status: RecorderStatus::Recording,
            ..Self::default()
        };
        Ok(())
    }

    /// Transition from RECORDING to PAUSED
    pub fn pause(&mut self) -> Result<(), InvalidRecorderTransition> {
        if self.status != RecorderStatus::Recording {
            return Err(InvalidRecorderTransition {
                current_state: self.status,
                action: "pause",
            });
        }
        self.status = RecorderStatus::Paused;
        Ok(())
    }

    /// Transition from PAUSED to RECORDING
    pub fn resume(&mut self) -> Result<(), InvalidRecorderTransition> {
        if self.status != RecorderStatus::Paused {
            return Err(InvalidRecorderTransition {
                current_state: self.status,
                action: "resume",
            });
        }
        self.status = RecorderStatus::Recording;
        Ok(())
    }

    /// Advance the clock by one collection interval.
    /// Returns false (and changes nothing) unless recording.
    pub fn tick(&mut self) -> bool {
        if self.status != RecorderStatus::Recording {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Append an encoded fragment. Empty fragments and fragments arriving
    /// outside RECORDING are ignored.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> bool {
        if self.status != RecorderStatus::Recording || chunk.is_empty() {
            return false;
        }
        self.chunks.push(chunk);
        true
    }

    /// Transition from RECORDING or PAUSED to IDLE.
    ///
    /// `final_chunk` is the recorder's last flush, which may arrive while
    /// paused. Returns the concatenation of every fragment.
    pub fn finish(&mut self, final_chunk: Vec<u8>) -> Result<Vec<u8>, InvalidRecorderTransition> {
        if self.status == RecorderStatus::Idle {
            return Err(InvalidRecorderTransition {
                current_state: self.status,
                action: "stop",
            });
        }
        if !final_chunk.is_empty() {
            self.chunks.push(final_chunk);
        }
        self.status = RecorderStatus::Idle;
        self.finished = true;
        Ok(self.chunks.concat())
    }

    /// Attach the finalized blob. Only valid once, right after `finish`.
    pub fn attach_result(&mut self, blob: AudioBlob) -> bool {
        if !self.finished || self.result.is_some() {
            return false;
        }
        self.result = Some(blob);
        true
    }

    /// Whether `finish` has run for this attempt
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Format an elapsed second count as MM:SS
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
