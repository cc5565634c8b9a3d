//! Live processing status channel

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ports::{Frame, StatusStream, StatusTransport};
use crate::domain::status::{ChannelState, StatusSnapshot};

/// What a single inbound frame did to the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Malformed; the snapshot is unchanged
    Dropped,
    Updated,
    /// Updated, and the completion trigger fired
    Completed,
}

/// Status model for one note, fed frame by frame.
///
/// Lifecycle: INACTIVE -> CONNECTING -> OPEN -> CLOSED, with CLOSED also
/// reachable straight from CONNECTING. The snapshot is replaced wholesale
/// on every valid frame and discarded on close.
#[derive(Debug, Default)]
pub struct StatusChannel {
    note_id: Option<String>,
    enabled: bool,
    state: ChannelState,
    snapshot: Option<StatusSnapshot>,
    completion_fired: bool,
}

impl StatusChannel {
    pub fn new(note_id: Option<&str>, enabled: bool) -> Self {
        Self {
            note_id: note_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            enabled,
            ..Self::default()
        }
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn snapshot(&self) -> Option<&StatusSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn completion_fired(&self) -> bool {
        self.completion_fired
    }

    /// A disabled channel, or one without a note, never connects
    pub fn should_connect(&self) -> bool {
        self.enabled && self.note_id.is_some() && self.state == ChannelState::Inactive
    }

    pub fn on_connecting(&mut self) {
        if self.state == ChannelState::Inactive {
            self.state = ChannelState::Connecting;
        }
    }

    pub fn on_open(&mut self) {
        if self.state == ChannelState::Connecting {
            self.state = ChannelState::Open;
        }
    }

    /// Apply one inbound text frame
    pub fn on_frame(&mut self, text: &str) -> FrameOutcome {
        if self.state != ChannelState::Open {
            return FrameOutcome::Dropped;
        }
        let Some(snapshot) = StatusSnapshot::parse(text) else {
            debug!(frame = text, "Dropping malformed status frame");
            return FrameOutcome::Dropped;
        };
        let fires = snapshot.status.is_completed() && !self.completion_fired;
        self.snapshot = Some(snapshot);
        if fires {
            self.completion_fired = true;
            FrameOutcome::Completed
        } else {
            FrameOutcome::Updated
        }
    }

    /// Connection failed, was closed by the server, or errored
    pub fn on_closed(&mut self) {
        if matches!(self.state, ChannelState::Connecting | ChannelState::Open) {
            self.state = ChannelState::Closed;
            self.snapshot = None;
        }
    }
}

/// Notifications from a running status watch
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    StateChanged(ChannelState),
    Snapshot(StatusSnapshot),
    /// One-shot completion trigger; follows the `completed` snapshot
    Completed(StatusSnapshot),
}

/// A `StatusChannel` driven by a background task.
///
/// Dropping the watch closes the connection.
pub struct StatusWatch {
    events: mpsc::UnboundedReceiver<StatusEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    state: ChannelState,
}

impl StatusWatch {
    /// Start watching `note_id`. A disabled or identifier-less watch never
    /// connects and yields no events.
    pub fn spawn(
        transport: Arc<dyn StatusTransport>,
        note_id: Option<&str>,
        enabled: bool,
    ) -> Self {
        let channel = StatusChannel::new(note_id, enabled);
        let (tx, events) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();

        let task = if channel.should_connect() {
            Some(tokio::spawn(run(transport, channel, tx, shutdown_rx)))
        } else {
            debug!("Status channel inactive");
            None
        };

        Self {
            events,
            shutdown: Some(shutdown),
            task,
            state: ChannelState::Inactive,
        }
    }

    /// Last state reported by the channel
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Next event; None once the channel is closed or inactive
    pub async fn next(&mut self) -> Option<StatusEvent> {
        let event = self.events.recv().await?;
        if let StatusEvent::StateChanged(state) = event {
            self.state = state;
        }
        Some(event)
    }

    /// Close the connection and wait for the driver task to finish
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for StatusWatch {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn run(
    transport: Arc<dyn StatusTransport>,
    mut channel: StatusChannel,
    tx: mpsc::UnboundedSender<StatusEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let Some(note_id) = channel.note_id().map(str::to_string) else {
        return;
    };

    channel.on_connecting();
    let _ = tx.send(StatusEvent::StateChanged(channel.state()));

    let connected = tokio::select! {
        result = transport.connect(&note_id) => result,
        _ = &mut shutdown => {
            channel.on_closed();
            let _ = tx.send(StatusEvent::StateChanged(channel.state()));
            return;
        }
    };
    let mut stream = match connected {
        Ok(stream) => stream,
        Err(err) => {
            warn!(error = %err, note_id = %note_id, "Status connection failed");
            channel.on_closed();
            let _ = tx.send(StatusEvent::StateChanged(channel.state()));
            return;
        }
    };

    channel.on_open();
    info!(note_id = %note_id, "Status channel open");
    let _ = tx.send(StatusEvent::StateChanged(channel.state()));

    pump(&mut channel, stream.as_mut(), &tx, &mut shutdown).await;
    stream.close().await;

    channel.on_closed();
    debug!(note_id = %note_id, "Status channel closed");
    let _ = tx.send(StatusEvent::StateChanged(channel.state()));
}

async fn pump(
    channel: &mut StatusChannel,
    stream: &mut dyn StatusStream,
    tx: &mpsc::UnboundedSender<StatusEvent>,
    shutdown: &mut oneshot::Receiver<()>,
) {
    loop {
        let frame = tokio::select! {
            frame = stream.next_frame() => frame,
            _ = &mut *shutdown => return,
        };
        match frame {
            Some(Ok(Frame::Text(text))) => match channel.on_frame(&text) {
                FrameOutcome::Dropped => {}
                FrameOutcome::Updated => {
                    if let Some(snapshot) = channel.snapshot() {
                        let _ = tx.send(StatusEvent::Snapshot(snapshot.clone()));
                    }
                }
                FrameOutcome::Completed => {
                    if let Some(snapshot) = channel.snapshot() {
                        let _ = tx.send(StatusEvent::Snapshot(snapshot.clone()));
                        let _ = tx.send(StatusEvent::Completed(snapshot.clone()));
                    }
                }
            },
            Some(Ok(Frame::Other)) => {}
            Some(Ok(Frame::Close)) | None => return,
            Some(Err(err)) => {
                warn!(error = %err, "Status connection error");
                return;
            }
        }
    }
}
