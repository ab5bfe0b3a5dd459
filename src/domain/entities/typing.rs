use tokio::time::Instant;

use super::{ChannelId, UserId};

/// Identifies one typer in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypingKey {
    pub channel_id: ChannelId,
    pub user_id: UserId,
}

impl TypingKey {
    #[must_use]
    pub const fn new(channel_id: ChannelId, user_id: UserId) -> Self {
        Self {
            channel_id,
            user_id,
        }
    }
}

/// A user currently typing in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEntry {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub username: String,
    pub expires_at: Instant,
}

impl TypingEntry {
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
