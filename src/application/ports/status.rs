//! Status push transport port interfaces

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Failed to connect: {0}")]
    ConnectFailed(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// One inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Server-initiated close
    Close,
    /// Binary, ping and pong frames
    Other,
}

/// An open push connection
#[async_trait]
pub trait StatusStream: Send {
    /// Next inbound frame; None once the connection is gone
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;

    /// Close the connection. Safe to call more than once.
    async fn close(&mut self);
}

/// Port for opening per-note status connections
#[async_trait]
pub trait StatusTransport: Send + Sync {
    async fn connect(&self, note_id: &str) -> Result<Box<dyn StatusStream>, TransportError>;
}
