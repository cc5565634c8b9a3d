//! Audio blob value object

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Audio encodings the note service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMimeType {
    Wav,
    Mp3,
    M4a,
    Flac,
    Ogg,
    /// Opus in a WebM container
    Webm,
}

/// Every accepted type, in the order shown to users
pub const ACCEPTED_TYPES: &[AudioMimeType] = &[
    AudioMimeType::Wav,
    AudioMimeType::Mp3,
    AudioMimeType::M4a,
    AudioMimeType::Flac,
    AudioMimeType::Ogg,
    AudioMimeType::Webm,
];

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::M4a => "audio/mp4",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
            Self::Webm => "audio/webm;codecs=opus",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Webm => "webm",
        }
    }

    /// Look up a type by file extension (case-insensitive, without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        ACCEPTED_TYPES
            .iter()
            .copied()
            .find(|t| t.extension() == ext)
    }

    /// Look up a type from a file path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable encoded audio, as produced by a finished recording or read from
/// a selected file. Clones share the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    data: Arc<[u8]>,
    mime_type: AudioMimeType,
}

impl AudioBlob {
    /// Create a blob from raw bytes
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self {
            data: data.into(),
            mime_type,
        }
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        human_readable_size(self.size_bytes())
    }
}

/// Format a byte count as B / KB / MB
pub fn human_readable_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
