//! Reconnecting, deduplicating, batching event channel.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep, sleep, sleep_until};
use tracing::{debug, info, warn};

use shelfwatch_events::{EventHistory, RealtimeEvent, SequenceTracker};

use crate::config::ChannelConfig;
use crate::error::ChannelError;
use crate::source::{EventSource, MessageStream, WebSocketSource};
use crate::status::ConnectionStatus;

/// Events accepted during one quiet period, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch {
    events: Arc<[RealtimeEvent]>,
}

impl EventBatch {
    fn new(events: Vec<RealtimeEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }

    pub fn events(&self) -> &[RealtimeEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RealtimeEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a RealtimeEvent;
    type IntoIter = std::slice::Iter<'a, RealtimeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug)]
struct Shared {
    history: Mutex<EventHistory<RealtimeEvent>>,
    latest: Mutex<Option<EventBatch>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One subscriber's view of the catalog event stream.
///
/// The connection, timers and deduplication state live on a background task
/// owned by this handle. Batches are delivered in flush order through
/// [`next_batch`](Self::next_batch).
#[derive(Debug)]
pub struct RealtimeChannel {
    shared: Arc<Shared>,
    status: watch::Receiver<ConnectionStatus>,
    batches: mpsc::UnboundedReceiver<EventBatch>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RealtimeChannel {
    /// Start the channel on the current tokio runtime.
    pub fn spawn<S: EventSource>(source: S, config: ChannelConfig) -> Self {
        let shared = Arc::new(Shared {
            history: Mutex::new(EventHistory::with_limit(config.history_limit)),
            latest: Mutex::new(None),
        });
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = Worker {
            source: Arc::new(source),
            tracker: SequenceTracker::with_limits(config.dedup_capacity, config.dedup_retain),
            config,
            pending: Vec::new(),
            shared: shared.clone(),
            status: status_tx,
            batches: batch_tx,
        };
        let task = tokio::spawn(worker.run(shutdown_rx));

        Self {
            shared,
            status: status_rx,
            batches: batch_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Connect to a WebSocket endpoint.
    pub fn connect(url: impl Into<String>, config: ChannelConfig) -> Self {
        Self::spawn(WebSocketSource::new(url), config)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Subscribe to connection status changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Wait for the next flushed batch. `None` once the background task is gone.
    pub async fn next_batch(&mut self) -> Option<EventBatch> {
        self.batches.recv().await
    }

    /// The most recently flushed batch.
    pub fn latest_batch(&self) -> Option<EventBatch> {
        lock(&self.shared.latest).clone()
    }

    /// Delivered events, highest sequence first.
    pub fn history(&self) -> Vec<RealtimeEvent> {
        lock(&self.shared.history).as_slice().to_vec()
    }

    /// Close the connection and cancel every pending timer.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "realtime task ended abnormally");
            }
        }
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

type ConnectFuture = Pin<Box<dyn Future<Output = Result<MessageStream, ChannelError>> + Send>>;

/// Connection lifecycle. Exactly one of these is in flight at a time.
enum Link {
    Connecting(ConnectFuture),
    Open(MessageStream),
    Waiting(Pin<Box<Sleep>>),
}

enum Step {
    Opened(MessageStream),
    Failed(ChannelError),
    Message(String),
    Dropped(Option<ChannelError>),
    RetryDue,
}

impl Link {
    /// Cancel-safe: all state lives in `self`.
    async fn next_step(&mut self) -> Step {
        match self {
            Link::Connecting(connect) => match connect.await {
                Ok(stream) => Step::Opened(stream),
                Err(e) => Step::Failed(e),
            },
            Link::Open(stream) => match stream.next().await {
                Some(Ok(text)) => Step::Message(text),
                Some(Err(e)) => Step::Dropped(Some(e)),
                None => Step::Dropped(None),
            },
            Link::Waiting(delay) => {
                delay.as_mut().await;
                Step::RetryDue
            }
        }
    }
}

enum Wake {
    Shutdown,
    Flush,
    Link(Step),
}

struct Worker {
    source: Arc<dyn EventSource>,
    config: ChannelConfig,
    tracker: SequenceTracker,
    pending: Vec<RealtimeEvent>,
    shared: Arc<Shared>,
    status: watch::Sender<ConnectionStatus>,
    batches: mpsc::UnboundedSender<EventBatch>,
}

impl Worker {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let mut link = self.start_connect();
        let mut attempt: u32 = 0;
        let mut flush_at: Option<Instant> = None;

        loop {
            let wake = tokio::select! {
                _ = &mut shutdown => Wake::Shutdown,
                _ = sleep_until(flush_at.unwrap_or_else(Instant::now)), if flush_at.is_some() => Wake::Flush,
                step = link.next_step() => Wake::Link(step),
            };

            match wake {
                Wake::Shutdown => {
                    debug!("realtime channel shutting down");
                    break;
                }
                Wake::Flush => {
                    flush_at = None;
                    self.flush();
                }
                Wake::Link(Step::Opened(stream)) => {
                    info!("realtime channel connected");
                    self.set_status(ConnectionStatus::Connected);
                    attempt = 0;
                    link = Link::Open(stream);
                }
                Wake::Link(Step::Failed(e)) => {
                    warn!(error = %e, "realtime connection attempt failed");
                    link = self.schedule_retry(&mut attempt);
                }
                Wake::Link(Step::Dropped(reason)) => {
                    match reason {
                        Some(e) => warn!(error = %e, "realtime connection broke"),
                        None => info!("realtime connection closed"),
                    }
                    link = self.schedule_retry(&mut attempt);
                }
                Wake::Link(Step::Message(text)) => {
                    if self.accept(&text) {
                        flush_at = Some(Instant::now() + self.config.quiet_period);
                    }
                }
                Wake::Link(Step::RetryDue) => {
                    link = self.start_connect();
                }
            }
        }

        drop(link);
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn start_connect(&self) -> Link {
        self.set_status(ConnectionStatus::Connecting);
        let source = Arc::clone(&self.source);
        Link::Connecting(Box::pin(async move { source.connect().await }))
    }

    fn schedule_retry(&self, attempt: &mut u32) -> Link {
        self.set_status(ConnectionStatus::Disconnected);
        *attempt = attempt.saturating_add(1);
        let delay = self.config.reconnect.delay_for_attempt(*attempt);
        info!(attempt = *attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
        Link::Waiting(Box::pin(sleep(delay)))
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!(from = %previous, to = %status, "connection status changed");
        }
    }

    /// Decode, validate and deduplicate one frame. Returns whether it was queued.
    fn accept(&mut self, text: &str) -> bool {
        let event = match RealtimeEvent::decode(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping malformed event");
                return false;
            }
        };

        if !self.tracker.observe(&event.id, event.sequence) {
            debug!(
                event_id = %event.id,
                sequence = event.sequence,
                "dropping stale or duplicate event"
            );
            return false;
        }

        self.pending.push(event);
        true
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.pending);
        lock(&self.shared.history).extend(events.iter().cloned());

        let batch = EventBatch::new(events);
        *lock(&self.shared.latest) = Some(batch.clone());
        debug!(events = batch.len(), "flushing event batch");

        if self.batches.send(batch).is_err() {
            debug!("batch receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::in_memory::{InMemoryFeed, InMemorySession, InMemorySource};
    use crate::policy::ReconnectPolicy;
    use shelfwatch_core::Item;

    fn deleted(id: &str, seq: u64) -> RealtimeEvent {
        RealtimeEvent::deleted(id, seq, format!("p-{seq}"))
    }

    fn sequences(batch: &EventBatch) -> Vec<u64> {
        batch.iter().map(|e| e.sequence).collect()
    }

    async fn connected(config: ChannelConfig) -> (RealtimeChannel, InMemoryFeed, InMemorySession) {
        let (source, mut feed) = InMemorySource::new();
        let channel = RealtimeChannel::spawn(source, config);
        let session = feed.next_session().await.unwrap();
        channel
            .watch_status()
            .wait_for(|s| s.is_connected())
            .await
            .unwrap();
        (channel, feed, session)
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_accepted_events_after_quiet_period() {
        let (mut channel, _feed, session) = connected(ChannelConfig::default()).await;
        let start = Instant::now();

        session.send_event(&deleted("e1", 1));
        session.send_event(&deleted("e2", 2));

        let batch = channel.next_batch().await.unwrap();
        assert_eq!(sequences(&batch), vec![1, 2]);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(channel.latest_batch(), Some(batch));
    }

    #[tokio::test(start_paused = true)]
    async fn every_arrival_restarts_the_quiet_period() {
        let (mut channel, _feed, session) = connected(ChannelConfig::default()).await;
        let start = Instant::now();

        session.send_event(&deleted("e1", 1));
        tokio::time::sleep(Duration::from_millis(30)).await;
        session.send_event(&deleted("e2", 2));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(channel.latest_batch().is_none());

        let batch = channel.next_batch().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_and_duplicate_sequences_are_dropped() {
        let (mut channel, _feed, session) = connected(ChannelConfig::default()).await;

        for seq in [3, 1, 5, 2, 5] {
            session.send_event(&deleted("e", seq));
        }

        let batch = channel.next_batch().await.unwrap();
        assert_eq!(sequences(&batch), vec![3, 5]);

        // Still remembered in the next quiet period.
        session.send_event(&deleted("e", 5));
        session.send_event(&deleted("other", 1));
        let batch = channel.next_batch().await.unwrap();
        assert_eq!(sequences(&batch), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frames_never_reach_the_subscriber() {
        let (mut channel, _feed, session) = connected(ChannelConfig::default()).await;

        session.send_text("{not json");
        let mut without_payload = RealtimeEvent::updated("e1", 1, Item::new("p-1", "S", "Chair"));
        without_payload.data.product = None;
        session.send_event(&without_payload);
        session.send_event(&deleted("e2", 1));

        let batch = channel.next_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.events()[0].id.as_str(), "e2");
        assert!(channel.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_close_with_fixed_delay() {
        let (channel, mut feed, session) = connected(ChannelConfig::default()).await;
        let mut status = channel.watch_status();

        let start = Instant::now();
        session.close();
        status
            .wait_for(|s| *s == ConnectionStatus::Disconnected)
            .await
            .unwrap();

        let second = feed.next_session().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(feed.attempts(), 2);

        status.wait_for(|s| s.is_connected()).await.unwrap();
        second.fail("reset by peer");
        status
            .wait_for(|s| *s == ConnectionStatus::Disconnected)
            .await
            .unwrap();
        let _third = feed.next_session().await.unwrap();
        assert_eq!(feed.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_attempts_are_retried_until_one_succeeds() {
        let (source, mut feed) = InMemorySource::new();
        feed.refuse_next(2);
        let start = Instant::now();
        let channel = RealtimeChannel::spawn(source, ChannelConfig::default());

        let _session = feed.next_session().await.unwrap();
        assert_eq!(feed.attempts(), 3);
        assert!(start.elapsed() >= Duration::from_secs(10));

        channel
            .watch_status()
            .wait_for(|s| s.is_connected())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_policy_stretches_retry_delays() {
        let (source, mut feed) = InMemorySource::new();
        feed.refuse_next(3);
        let config = ChannelConfig::default().with_reconnect(ReconnectPolicy::exponential(
            Duration::from_secs(1),
            Duration::from_secs(30),
        ));
        let start = Instant::now();
        let _channel = RealtimeChannel::spawn(source, config);

        let _session = feed.next_session().await.unwrap();
        // 1 + 2 + 4 seconds of backoff.
        assert!(start.elapsed() >= Duration::from_secs(7));
        assert!(start.elapsed() < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn history_keeps_the_highest_sequences_up_to_its_limit() {
        let (mut channel, _feed, session) = connected(ChannelConfig::default()).await;

        for seq in 1..=150u64 {
            session.send_event(&deleted(&format!("e{seq}"), seq));
        }
        let batch = channel.next_batch().await.unwrap();
        assert_eq!(batch.len(), 150);

        let history = channel.history();
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].sequence, 150);
        assert_eq!(history[99].sequence, 51);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_connection_and_stops_reconnecting() {
        let (channel, feed, session) = connected(ChannelConfig::default()).await;

        session.send_event(&deleted("e1", 1));
        channel.shutdown().await;

        assert!(session.is_closed());
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(feed.attempts(), 1);
    }
}
