//! Desktop notifications through notify-rust

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{NoticeKind, NotificationError, Notifier};

const APP_NAME: &str = "voicenote";

/// Sends through the platform notification service (D-Bus on Linux)
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyRustNotifier;

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self
    }
}

fn build(title: &str, body: &str, kind: NoticeKind) -> Notification {
    let mut notification = Notification::new();
    notification
        .appname(APP_NAME)
        .summary(title)
        .body(body)
        .icon(kind.icon_name())
        .timeout(match kind.expires_after_ms() {
            Some(ms) => Timeout::Milliseconds(ms),
            None => Timeout::Never,
        });
    notification
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        body: &str,
        kind: NoticeKind,
    ) -> Result<(), NotificationError> {
        let notification = build(title, body, kind);

        // show() blocks on the session bus
        tokio::task::spawn_blocking(move || notification.show().map(drop))
            .await
            .map_err(|e| NotificationError::Unavailable(e.to_string()))?
            .map_err(|e| NotificationError::Unavailable(e.to_string()))
    }
}
