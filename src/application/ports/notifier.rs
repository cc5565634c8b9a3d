//! Desktop notification port

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Notification could not be shown: {0}")]
    Unavailable(String),
}

/// Processing outcome a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Ready,
    Failed,
}

impl NoticeKind {
    /// freedesktop icon name
    pub const fn icon_name(&self) -> &'static str {
        match self {
            Self::Ready => "emblem-default",
            Self::Failed => "dialog-error",
        }
    }

    /// How long the notice stays up; failures stay until dismissed
    pub const fn expires_after_ms(&self) -> Option<u32> {
        match self {
            Self::Ready => Some(6_000),
            Self::Failed => None,
        }
    }
}

/// Tells the user about a finished upload while the terminal is unattended
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str, kind: NoticeKind)
        -> Result<(), NotificationError>;
}
