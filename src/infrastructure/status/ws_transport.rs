//! WebSocket status transport
//!
//! One connection per note at `{ws_url}/ws/notes/{id}/status`. The server
//! only pushes; nothing is sent apart from the closing handshake.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::application::ports::{Frame, StatusStream, StatusTransport, TransportError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsStatusTransport {
    base_url: String,
}

impl WsStatusTransport {
    /// `base_url` is a ws:// or wss:// origin, optionally with a path prefix
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn status_url(&self, note_id: &str) -> String {
        format!("{}/ws/notes/{}/status", self.base_url, note_id)
    }
}

#[async_trait]
impl StatusTransport for WsStatusTransport {
    async fn connect(&self, note_id: &str) -> Result<Box<dyn StatusStream>, TransportError> {
        let url = self.status_url(note_id);
        let (socket, response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        debug!(url = %url, status = response.status().as_u16(), "Status socket open");

        Ok(Box::new(WsStatusStream {
            socket: Some(socket),
        }))
    }
}

struct WsStatusStream {
    socket: Option<Socket>,
}

#[async_trait]
impl StatusStream for WsStatusStream {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        let socket = self.socket.as_mut()?;
        let frame = match socket.next().await? {
            Ok(Message::Text(text)) => Ok(Frame::Text(text.to_string())),
            Ok(Message::Close(_)) => Ok(Frame::Close),
            Ok(_) => Ok(Frame::Other),
            Err(e) => Err(TransportError::Connection(e.to_string())),
        };
        Some(frame)
    }

    async fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                debug!(error = %e, "Status socket close failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_url_joins_note_path() {
        let transport = WsStatusTransport::new("ws://localhost:8200/");
        assert_eq!(
            transport.status_url("n-1"),
            "ws://localhost:8200/ws/notes/n-1/status"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = WsStatusTransport::new(format!("ws://127.0.0.1:{port}"));
        assert!(matches!(
            transport.connect("n-1").await,
            Err(TransportError::ConnectFailed(_))
        ));
    }

    #[tokio::test]
    async fn relays_pushed_frames_until_close() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::text(
                r#"{"note_id":"n-1","status":"transcribing","progress":40}"#,
            ))
            .await
            .unwrap();
            ws.close(None).await.unwrap();
        });

        let transport = WsStatusTransport::new(format!("ws://127.0.0.1:{port}"));
        let mut stream = transport.connect("n-1").await.unwrap();

        match stream.next_frame().await {
            Some(Ok(Frame::Text(text))) => assert!(text.contains("transcribing")),
            other => panic!("unexpected frame: {other:?}"),
        }
        assert_eq!(stream.next_frame().await, Some(Ok(Frame::Close)));

        stream.close().await;
        stream.close().await;
        server.await.unwrap();
    }
}
