//! Processing status pushed by the note service

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest progress value shown to users, so a fresh upload never looks stalled
pub const PROGRESS_FLOOR: f64 = 5.0;

/// Opaque server-side processing status.
///
/// Only `completed` and `failed` carry meaning here; every other value is
/// passed through for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingStatus(String);

impl ProcessingStatus {
    pub const COMPLETED: &'static str = "completed";
    pub const FAILED: &'static str = "failed";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_completed(&self) -> bool {
        self.0 == Self::COMPLETED
    }

    pub fn is_failed(&self) -> bool {
        self.0 == Self::FAILED
    }

    /// `completed` or `failed`
    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_failed()
    }

    /// Human label for known statuses; unknown ones are shown verbatim
    pub fn label(&self) -> &str {
        match self.0.as_str() {
            "pending" | "queued" => "Waiting",
            "transcribing" | "stt" => "Transcribing",
            "stt_done" => "Transcribed",
            "diarizing" => "Separating speakers",
            "analyzing" => "Analyzing",
            "analyzing_done" => "Analyzed",
            "completed" => "Completed",
            "failed" => "Failed",
            other => other,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latest full status record for a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub note_id: String,
    pub status: ProcessingStatus,
    pub progress: f64,
}

impl StatusSnapshot {
    /// Parse one inbound text frame. Anything that is not a well-formed
    /// `{note_id, status, progress}` object yields None.
    pub fn parse(frame: &str) -> Option<Self> {
        serde_json::from_str::<Self>(frame)
            .ok()
            .filter(|s| s.progress.is_finite())
    }

    /// Progress as displayed: floored at 5 and capped at 100
    pub fn display_progress(&self) -> f64 {
        display_progress(self.progress)
    }
}

/// Apply the display floor to a raw progress value
pub fn display_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        return PROGRESS_FLOOR;
    }
    progress.clamp(PROGRESS_FLOOR, 100.0)
}

/// Connection lifecycle of a status channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelState {
    /// Disabled or never started
    #[default]
    Inactive,
    Connecting,
    Open,
    Closed,
}

impl ChannelState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_frame() {
        let snapshot =
            StatusSnapshot::parse(r#"{"note_id":"n1","status":"stt","progress":10}"#).unwrap();
        assert_eq!(snapshot.note_id, "n1");
        assert_eq!(snapshot.status.as_str(), "stt");
        assert_eq!(snapshot.progress, 10.0);
    }

    #[test]
    fn parse_rejects_malformed_frames() {
        assert!(StatusSnapshot::parse("not json").is_none());
        assert!(StatusSnapshot::parse(r#"{"status":"stt"}"#).is_none());
        assert!(StatusSnapshot::parse(r#"{"note_id":"n1","status":"stt","progress":"ten"}"#)
            .is_none());
        assert!(StatusSnapshot::parse("[]").is_none());
    }

    #[test]
    fn parse_ignores_extra_fields() {
        let snapshot = StatusSnapshot::parse(
            r#"{"note_id":"n1","status":"completed","progress":100,"eta":3}"#,
        )
        .unwrap();
        assert!(snapshot.status.is_completed());
    }

    #[test]
    fn terminal_statuses() {
        assert!(ProcessingStatus::new("completed").is_terminal());
        assert!(ProcessingStatus::new("failed").is_terminal());
        assert!(!ProcessingStatus::new("failed").is_completed());
        assert!(!ProcessingStatus::new("analyzing").is_terminal());
    }

    #[test]
    fn labels() {
        assert_eq!(ProcessingStatus::new("pending").label(), "Waiting");
        assert_eq!(ProcessingStatus::new("stt").label(), "Transcribing");
        assert_eq!(ProcessingStatus::new("diarizing").label(), "Separating speakers");
        assert_eq!(ProcessingStatus::new("reticulating").label(), "reticulating");
    }

    #[test]
    fn progress_floor() {
        assert_eq!(display_progress(0.0), 5.0);
        assert_eq!(display_progress(4.0), 5.0);
        assert_eq!(display_progress(40.0), 40.0);
        assert_eq!(display_progress(130.0), 100.0);
        assert_eq!(display_progress(f64::NAN), 5.0);
    }
}
