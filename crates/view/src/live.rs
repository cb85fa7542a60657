//! The list's single owner task: page fetches, event batches and viewport
//! signals all funnel through here.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shelfwatch_client::{Page, PageSource, TransportError};
use shelfwatch_realtime::{ConnectionStatus, EventBatch, RealtimeChannel};

use crate::estimator::{ViewConfig, Viewport};
use crate::list::{ListViewModel, PageRequest};
use crate::snapshot::ListSnapshot;

/// Input from whatever renders the list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportSignal {
    /// The sentinel after the last rendered item scrolled into view.
    SentinelVisible,
    /// Container width or viewport height changed (px).
    Resized { width: f64, height: f64 },
    /// Reload from the first page.
    Refresh,
}

/// Cheap, cloneable sender for [`ViewportSignal`]s.
#[derive(Debug, Clone)]
pub struct LiveListHandle {
    signals: mpsc::UnboundedSender<ViewportSignal>,
}

impl LiveListHandle {
    /// Returns `false` once the list has shut down.
    pub fn send(&self, signal: ViewportSignal) -> bool {
        self.signals.send(signal).is_ok()
    }

    pub fn sentinel_visible(&self) -> bool {
        self.send(ViewportSignal::SentinelVisible)
    }

    pub fn resized(&self, width: f64, height: f64) -> bool {
        self.send(ViewportSignal::Resized { width, height })
    }

    pub fn refresh(&self) -> bool {
        self.send(ViewportSignal::Refresh)
    }
}

/// A list kept current by page loads and the real-time channel.
///
/// Publishes a [`ListSnapshot`] after every change.
#[derive(Debug)]
pub struct LiveList {
    handle: LiveListHandle,
    snapshots: watch::Receiver<ListSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveList {
    /// Start the owner task and request the first page.
    pub fn spawn<P: PageSource>(
        pages: P,
        channel: RealtimeChannel,
        config: ViewConfig,
        viewport: Viewport,
    ) -> Self {
        Self::with_model(pages, channel, ListViewModel::new(config, viewport))
    }

    /// Start with a prepared view-model.
    pub fn with_model<P: PageSource>(pages: P, channel: RealtimeChannel, model: ListViewModel) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(model.snapshot(channel.is_connected()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let owner = Owner {
            pages: Arc::new(pages),
            status: channel.watch_status(),
            channel,
            model,
            loads_tx,
            fetch: None,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(owner.run(signal_rx, loads_rx, shutdown_rx));

        Self {
            handle: LiveListHandle { signals: signal_tx },
            snapshots: snapshot_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn handle(&self) -> LiveListHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the owner task, cancel any in-flight fetch and shut the channel down.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "live list task ended abnormally");
            }
        }
    }
}

impl Drop for LiveList {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

type LoadResult = (PageRequest, Result<Page, TransportError>);

enum Wake {
    Shutdown,
    Loaded(LoadResult),
    Batch(Option<EventBatch>),
    Status,
    Signal(Option<ViewportSignal>),
}

struct Owner<P> {
    pages: Arc<P>,
    channel: RealtimeChannel,
    status: watch::Receiver<ConnectionStatus>,
    model: ListViewModel,
    loads_tx: mpsc::UnboundedSender<LoadResult>,
    fetch: Option<JoinHandle<()>>,
    snapshots: watch::Sender<ListSnapshot>,
}

impl<P: PageSource> Owner<P> {
    async fn run(
        mut self,
        mut signals: mpsc::UnboundedReceiver<ViewportSignal>,
        mut loads: mpsc::UnboundedReceiver<LoadResult>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let first = self.model.request_page(1);
        self.start_fetch(first);
        self.publish();

        let mut channel_open = true;
        let mut status_open = true;

        loop {
            let wake = tokio::select! {
                _ = &mut shutdown => Wake::Shutdown,
                Some(done) = loads.recv() => Wake::Loaded(done),
                batch = self.channel.next_batch(), if channel_open => Wake::Batch(batch),
                changed = self.status.changed(), if status_open => {
                    if changed.is_err() {
                        status_open = false;
                    }
                    Wake::Status
                }
                signal = signals.recv() => Wake::Signal(signal),
            };

            match wake {
                Wake::Shutdown | Wake::Signal(None) => break,
                Wake::Loaded((request, result)) => {
                    self.fetch = None;
                    let next = self.model.complete_load(request, result);
                    self.start_fetch(next);
                }
                Wake::Batch(Some(batch)) => {
                    let applied = self.model.apply_batch(&batch);
                    debug!(events = batch.len(), applied, "merged event batch");
                }
                Wake::Batch(None) => {
                    warn!("realtime channel stopped delivering");
                    channel_open = false;
                }
                Wake::Status => {}
                Wake::Signal(Some(signal)) => {
                    let request = self.on_signal(signal);
                    self.start_fetch(request);
                }
            }
            self.publish();
        }

        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        self.channel.shutdown().await;
        info!("live list stopped");
    }

    fn on_signal(&mut self, signal: ViewportSignal) -> Option<PageRequest> {
        match signal {
            ViewportSignal::SentinelVisible => self.model.on_sentinel_visible(),
            ViewportSignal::Resized { width, height } => self.model.resize(Viewport::new(width, height)),
            ViewportSignal::Refresh => self.model.refresh(),
        }
    }

    fn start_fetch(&mut self, request: Option<PageRequest>) {
        let Some(request) = request else {
            return;
        };
        let pages = Arc::clone(&self.pages);
        let done = self.loads_tx.clone();
        self.fetch = Some(tokio::spawn(async move {
            let result = pages.fetch_page(request.page, request.page_size).await;
            let _ = done.send((request, result));
        }));
    }

    fn publish(&self) {
        let snapshot = self.model.snapshot(self.status.borrow().is_connected());
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
