//! Upload flow state machine and draft validation

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

use super::recording::{AudioBlob, AudioMimeType, ACCEPTED_TYPES};

/// Upload flow phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadPhase {
    #[default]
    Composing,
    Submitting,
    Watching,
    Completed,
    Failed,
}

impl UploadPhase {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Composing => "composing",
            Self::Submitting => "submitting",
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid phase transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid upload transition: cannot {action} while {current_phase}")]
pub struct InvalidUploadTransition {
    pub current_phase: UploadPhase,
    pub action: &'static str,
}

/// Upload flow state machine.
///
///   COMPOSING -> SUBMITTING (submit)
///   SUBMITTING -> WATCHING (accept)
///   SUBMITTING -> COMPOSING (reject)
///   WATCHING -> COMPLETED (complete)
///   WATCHING -> FAILED (fail)
///   any -> COMPOSING (reset)
#[derive(Debug, Default)]
pub struct UploadFlow {
    phase: UploadPhase,
}

impl UploadFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    fn transition(
        &mut self,
        from: UploadPhase,
        to: UploadPhase,
        action: &'static str,
    ) -> Result<(), InvalidUploadTransition> {
        if self.phase != from {
            return Err(InvalidUploadTransition {
                current_phase: self.phase,
                action,
            });
        }
        self.phase = to;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<(), InvalidUploadTransition> {
        self.transition(UploadPhase::Composing, UploadPhase::Submitting, "submit")
    }

    pub fn accept(&mut self) -> Result<(), InvalidUploadTransition> {
        self.transition(UploadPhase::Submitting, UploadPhase::Watching, "accept")
    }

    pub fn reject(&mut self) -> Result<(), InvalidUploadTransition> {
        self.transition(UploadPhase::Submitting, UploadPhase::Composing, "reject")
    }

    pub fn complete(&mut self) -> Result<(), InvalidUploadTransition> {
        self.transition(UploadPhase::Watching, UploadPhase::Completed, "complete")
    }

    pub fn fail(&mut self) -> Result<(), InvalidUploadTransition> {
        self.transition(UploadPhase::Watching, UploadPhase::Failed, "fail")
    }

    pub fn reset(&mut self) {
        self.phase = UploadPhase::Composing;
    }
}

/// Why a draft cannot be submitted yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("No recording or file selected")]
    MissingAudio,

    #[error("No project selected")]
    MissingProject,

    #[error("Title must not be empty")]
    MissingTitle,

    #[error("Unsupported file type '{extension}'. Accepted: {accepted}")]
    UnsupportedType { extension: String, accepted: String },
}

/// Audio chosen for upload: a confirmed recording or a selected file
#[derive(Debug, Clone, PartialEq)]
pub enum UploadSource {
    Recording {
        blob: AudioBlob,
        recorded_at: NaiveDateTime,
    },
    File {
        path: PathBuf,
        blob: AudioBlob,
    },
}

impl UploadSource {
    pub fn recording(blob: AudioBlob, recorded_at: NaiveDateTime) -> Self {
        Self::Recording { blob, recorded_at }
    }

    /// Wrap a selected file's bytes, rejecting extensions the service does
    /// not accept
    pub fn file(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self, DraftError> {
        let path = path.into();
        let mime_type = check_extension(&path)?;
        Ok(Self::File {
            blob: AudioBlob::new(data, mime_type),
            path,
        })
    }

    pub fn blob(&self) -> &AudioBlob {
        match self {
            Self::Recording { blob, .. } | Self::File { blob, .. } => blob,
        }
    }

    /// Name the file is uploaded under
    pub fn file_name(&self) -> String {
        match self {
            Self::Recording { blob, recorded_at } => format!(
                "recording_{}.{}",
                recorded_at.format("%Y-%m-%d_%H-%M"),
                blob.mime_type().extension()
            ),
            Self::File { path, blob } => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("audio.{}", blob.mime_type().extension())),
        }
    }

    /// Title used when the user gives none
    pub fn default_title(&self) -> String {
        match self {
            Self::Recording { recorded_at, .. } => {
                format!("Recording {}", recorded_at.format("%Y-%m-%d %H:%M"))
            }
            Self::File { path, .. } => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Check a path's extension against the accepted upload types
pub fn check_extension(path: &Path) -> Result<AudioMimeType, DraftError> {
    AudioMimeType::from_path(path).ok_or_else(|| DraftError::UnsupportedType {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string(),
        accepted: ACCEPTED_TYPES
            .iter()
            .map(|t| t.extension())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Everything the user composes before submitting
#[derive(Debug, Clone, Default)]
pub struct UploadDraft {
    source: Option<UploadSource>,
    project_id: Option<String>,
    title: String,
}

impl UploadDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&UploadSource> {
        self.source.as_ref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Select audio. An empty title is filled with the source's default.
    pub fn set_source(&mut self, source: UploadSource) {
        if self.title.trim().is_empty() {
            self.title = source.default_title();
        }
        self.source = Some(source);
    }

    pub fn clear_source(&mut self) {
        self.source = None;
    }

    pub fn set_project(&mut self, project_id: impl Into<String>) {
        let project_id = project_id.into();
        self.project_id = if project_id.trim().is_empty() {
            None
        } else {
            Some(project_id)
        };
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Check that audio, destination and title are all present
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.source.is_none() {
            return Err(DraftError::MissingAudio);
        }
        if self.project_id.is_none() {
            return Err(DraftError::MissingProject);
        }
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        Ok(())
    }
}
