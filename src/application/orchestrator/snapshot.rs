use std::collections::HashMap;

use crate::domain::ConnectionStatus;
use crate::domain::entities::{
    Channel, ChannelId, Message, NotificationItem, PanelState, PresenceStatus, TypingEntry,
    UserId, VoiceSession,
};

/// Read model published to the view layer after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub channels: Vec<Channel>,
    pub focused_channel: Option<ChannelId>,
    /// Messages of the focused channel, in insertion order.
    pub messages: Vec<Message>,
    /// Remote typers of the focused channel. Never contains the local user.
    pub typing_users: Vec<TypingEntry>,
    pub typing_indicator: Option<String>,
    pub loading: bool,
    pub has_more: bool,
    pub history_error: Option<String>,
    pub panel: PanelState,
    pub voice_session: Option<VoiceSession>,
    pub notifications: Vec<NotificationItem>,
    pub unread_counts: HashMap<ChannelId, usize>,
    pub presence: HashMap<UserId, PresenceStatus>,
    /// False while no channel is focused; sends are rejected.
    pub composer_enabled: bool,
    pub connection: ConnectionStatus,
}

impl ChatSnapshot {
    #[must_use]
    pub fn unread(&self, channel_id: &ChannelId) -> usize {
        self.unread_counts.get(channel_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn focused(&self) -> Option<&Channel> {
        let id = self.focused_channel.as_ref()?;
        self.channels.iter().find(|c| c.id() == id)
    }
}
