//! # shelfwatch real-time channel
//!
//! Keeps a push connection to the catalog's event endpoint open and turns
//! what arrives into deduplicated, batched event deliveries for one
//! subscriber.
//!
//! ## Automatic reconnection
//!
//! Any close or failed attempt schedules a reconnect according to
//! [`ReconnectPolicy`] (fixed 5 s by default), forever.
//!
//! ## Delivery
//!
//! - Frames that fail to decode or validate are logged and dropped
//! - Per-identifier sequence tracking drops stale and duplicate events
//! - Accepted events are flushed as one batch after a quiet period; every
//!   arrival restarts the period
//!
//! ## Shutdown
//!
//! `shutdown` (or dropping the channel) closes the connection and cancels the
//! reconnect and flush timers. Nothing is delivered afterwards.
//!
//! ```rust,no_run
//! # use shelfwatch_realtime::{ChannelConfig, RealtimeChannel};
//! #[tokio::main]
//! async fn main() {
//!     let mut channel = RealtimeChannel::connect("ws://localhost:8080/ws", ChannelConfig::default());
//!     while let Some(batch) = channel.next_batch().await {
//!         println!("{} events, connected: {}", batch.len(), channel.is_connected());
//!     }
//! }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod in_memory;
pub mod policy;
pub mod source;
pub mod status;

pub use channel::{EventBatch, RealtimeChannel};
pub use config::ChannelConfig;
pub use error::ChannelError;
pub use in_memory::{InMemoryFeed, InMemorySession, InMemorySource};
pub use policy::{BackoffStrategy, ReconnectPolicy};
pub use source::{EventSource, MessageStream, WebSocketSource};
pub use status::ConnectionStatus;
