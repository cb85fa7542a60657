use std::time::Duration;

use shelfwatch_events::{DEFAULT_CAPACITY, DEFAULT_HISTORY_LIMIT, DEFAULT_RETAIN};

use crate::policy::ReconnectPolicy;

/// Tuning for a [`crate::RealtimeChannel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// Accepted events are flushed once no new event arrived for this long.
    pub quiet_period: Duration,
    /// Identifiers tracked before the sequence map is trimmed.
    pub dedup_capacity: usize,
    /// Identifiers kept (highest sequences) when trimming.
    pub dedup_retain: usize,
    /// Delivered events kept in the consumer-visible history.
    pub history_limit: usize,
    pub reconnect: ReconnectPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(50),
            dedup_capacity: DEFAULT_CAPACITY,
            dedup_retain: DEFAULT_RETAIN,
            history_limit: DEFAULT_HISTORY_LIMIT,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ChannelConfig {
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}
