use chrono::{DateTime, Utc};

use super::{ChannelId, Message};

/// Identifier of a feed entry, unique for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message that arrived for a channel other than the focused one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: NotificationId,
    pub channel_id: ChannelId,
    pub message: Message,
    pub created_at: DateTime<Utc>,
}

impl NotificationItem {
    /// One-line summary, e.g. `alice: hello`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}",
            self.message.author().username(),
            self.message.content()
        )
    }
}
