//! Where the channel's frames come from.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::stream::Stream;
use futures_util::{StreamExt, future};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

use crate::error::ChannelError;

/// Text frames of one open connection. The stream ending means the
/// connection closed; an `Err` item means it broke.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String, ChannelError>> + Send>>;

/// Opens connections to the event endpoint. One call is one attempt.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    async fn connect(&self) -> Result<MessageStream, ChannelError>;
}

/// WebSocket endpoint (`ws://` or `wss://`).
#[derive(Debug, Clone)]
pub struct WebSocketSource {
    url: String,
}

impl WebSocketSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSource for WebSocketSource {
    async fn connect(&self) -> Result<MessageStream, ChannelError> {
        info!(url = %self.url, "connecting to event endpoint");
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!(url = %self.url, "websocket handshake completed");

        // Read-only: the client never sends, so the stream is not split.
        let frames = ws_stream.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => Some(
                    String::from_utf8(data.to_vec())
                        .map_err(|e| ChannelError::Protocol(format!("binary frame is not utf-8: {e}"))),
                ),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "server closed the connection");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(ChannelError::Stream(e.to_string()))),
            })
        });
        Ok(Box::pin(frames))
    }
}
