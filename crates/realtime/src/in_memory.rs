//! In-process event source for tests and local development.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use shelfwatch_events::RealtimeEvent;

use crate::error::ChannelError;
use crate::source::{EventSource, MessageStream};

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicUsize,
    refuse: AtomicUsize,
}

/// Event source backed by in-process channels.
///
/// - No IO
/// - Every successful `connect` hands an [`InMemorySession`] to the feed
/// - Connection attempts can be refused to exercise reconnects
#[derive(Debug, Clone)]
pub struct InMemorySource {
    sessions: mpsc::UnboundedSender<InMemorySession>,
    counters: Arc<Counters>,
}

/// Test-side handle: receives the server end of every accepted connection.
#[derive(Debug)]
pub struct InMemoryFeed {
    sessions: mpsc::UnboundedReceiver<InMemorySession>,
    counters: Arc<Counters>,
}

/// Server end of one in-memory connection.
#[derive(Debug)]
pub struct InMemorySession {
    tx: mpsc::UnboundedSender<Result<String, ChannelError>>,
}

impl InMemorySource {
    pub fn new() -> (Self, InMemoryFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        (
            Self {
                sessions: tx,
                counters: counters.clone(),
            },
            InMemoryFeed {
                sessions: rx,
                counters,
            },
        )
    }
}

#[async_trait]
impl EventSource for InMemorySource {
    async fn connect(&self) -> Result<MessageStream, ChannelError> {
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);

        let refused = self
            .counters
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ChannelError::Connect("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // A dropped feed just means nobody will ever write to this session.
        let _ = self.sessions.send(InMemorySession { tx });
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

impl InMemoryFeed {
    /// Wait for the next accepted connection.
    pub async fn next_session(&mut self) -> Option<InMemorySession> {
        self.sessions.recv().await
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: usize) {
        self.counters.refuse.store(n, Ordering::SeqCst);
    }

    /// Connection attempts made so far, refused ones included.
    pub fn attempts(&self) -> usize {
        self.counters.attempts.load(Ordering::SeqCst)
    }
}

impl InMemorySession {
    /// Push a raw text frame. Returns `false` once the client side is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.tx.send(Ok(text.into())).is_ok()
    }

    pub fn send_event(&self, event: &RealtimeEvent) -> bool {
        match serde_json::to_string(event) {
            Ok(text) => self.send_text(text),
            Err(_) => false,
        }
    }

    /// Break the connection with a transport error.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.tx.send(Err(ChannelError::Stream(message.into()))).is_ok()
    }

    /// Close the connection cleanly.
    pub fn close(self) {
        drop(self.tx);
    }

    /// Whether the client dropped its end of the connection.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
