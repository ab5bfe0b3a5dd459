use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Tunables of the chat core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Inactivity after which a typing indicator disappears.
    #[serde(default = "default_typing_timeout_ms")]
    pub typing_timeout_ms: u64,

    /// How long an unconfirmed optimistic message may be paired with a
    /// server echo by author and content.
    #[serde(default = "default_outstanding_send_window_ms")]
    pub outstanding_send_window_ms: u64,

    /// Messages requested per history page.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u16,

    /// Age after which notification feed items are dropped.
    #[serde(default = "default_notification_ttl_secs")]
    pub notification_ttl_secs: u64,

    /// Upper bound on the notification feed.
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,

    /// Period of the notification feed sweep.
    #[serde(default = "default_feed_sweep_interval_ms")]
    pub feed_sweep_interval_ms: u64,
}

fn default_typing_timeout_ms() -> u64 {
    3_000
}

fn default_outstanding_send_window_ms() -> u64 {
    30_000
}

fn default_history_page_size() -> u16 {
    50
}

fn default_notification_ttl_secs() -> u64 {
    300
}

fn default_max_notifications() -> usize {
    100
}

fn default_feed_sweep_interval_ms() -> u64 {
    1_000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_timeout_ms: default_typing_timeout_ms(),
            outstanding_send_window_ms: default_outstanding_send_window_ms(),
            history_page_size: default_history_page_size(),
            notification_ttl_secs: default_notification_ttl_secs(),
            max_notifications: default_max_notifications(),
            feed_sweep_interval_ms: default_feed_sweep_interval_ms(),
        }
    }
}

impl ChatConfig {
    #[must_use]
    pub const fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }

    #[must_use]
    pub fn outstanding_send_window(&self) -> TimeDelta {
        i64::try_from(self.outstanding_send_window_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn notification_ttl(&self) -> TimeDelta {
        i64::try_from(self.notification_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Never zero; a zero period would stall the sweep timer.
    #[must_use]
    pub fn feed_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.feed_sweep_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ChatConfig = toml::from_str("typing_timeout_ms = 500").unwrap();

        assert_eq!(config.typing_timeout(), Duration::from_millis(500));
        assert_eq!(config.history_page_size, 50);
        assert_eq!(config.max_notifications, 100);
    }
}
