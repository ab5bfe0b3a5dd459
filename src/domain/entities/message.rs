use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, LocalUser, MessageId, TempId, UserId};

/// Identity used to pair local and server copies of a message.
///
/// Optimistic messages are keyed by their temporary id until the server
/// assigns a permanent one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReconcileKey {
    Temp(TempId),
    Server(MessageId),
}

/// Outbound operation that can fail on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MessageAction {
    Send,
    Edit,
    Delete,
    React,
}

impl std::fmt::Display for MessageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send => write!(f, "send"),
            Self::Edit => write!(f, "edit"),
            Self::Delete => write!(f, "delete"),
            Self::React => write!(f, "react"),
        }
    }
}

/// Delivery state shown next to a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageStatus {
    /// Sent locally, waiting for the server.
    Pending,
    /// Known to the server.
    #[default]
    Sent,
    /// The last outbound operation on this message was rejected.
    Failed {
        action: MessageAction,
        reason: String,
    },
}

impl MessageStatus {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Author of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAuthor {
    user_id: UserId,
    username: String,
    avatar: Option<String>,
}

#[allow(missing_docs)]
impl MessageAuthor {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>, avatar: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            avatar,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }
}

impl From<&LocalUser> for MessageAuthor {
    fn from(user: &LocalUser) -> Self {
        Self {
            user_id: user.id().clone(),
            username: user.username().to_string(),
            avatar: user.avatar().map(String::from),
        }
    }
}

/// Emoji reaction aggregated on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

/// Partial update carried by a `message_updated` event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub reactions: Option<Vec<Reaction>>,
}

impl MessagePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.edited_at.is_none()
            && self.pinned.is_none()
            && self.reactions.is_none()
    }
}

/// Chat message. Belongs to exactly one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    key: ReconcileKey,
    temp_id: Option<TempId>,
    channel_id: ChannelId,
    author: MessageAuthor,
    content: String,
    timestamp: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
    pinned: bool,
    reactions: Vec<Reaction>,
    status: MessageStatus,
}

#[allow(missing_docs)]
impl Message {
    /// Creates a server-confirmed message.
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        author: MessageAuthor,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            key: ReconcileKey::Server(id.into()),
            temp_id: None,
            channel_id: channel_id.into(),
            author,
            content: content.into(),
            timestamp,
            edited_at: None,
            pinned: false,
            reactions: Vec::new(),
            status: MessageStatus::Sent,
        }
    }

    /// Creates a locally originated message awaiting confirmation.
    #[must_use]
    pub fn optimistic(
        temp_id: TempId,
        channel_id: ChannelId,
        author: MessageAuthor,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            key: ReconcileKey::Temp(temp_id.clone()),
            temp_id: Some(temp_id),
            channel_id,
            author,
            content: content.into(),
            timestamp,
            edited_at: None,
            pinned: false,
            reactions: Vec::new(),
            status: MessageStatus::Pending,
        }
    }

    #[must_use]
    pub fn with_temp_id(mut self, temp_id: Option<TempId>) -> Self {
        self.temp_id = temp_id;
        self
    }

    #[must_use]
    pub const fn with_edited_at(mut self, edited_at: Option<DateTime<Utc>>) -> Self {
        self.edited_at = edited_at;
        self
    }

    #[must_use]
    pub const fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    #[must_use]
    pub fn with_reactions(mut self, reactions: Vec<Reaction>) -> Self {
        self.reactions = reactions;
        self
    }

    #[must_use]
    pub const fn key(&self) -> &ReconcileKey {
        &self.key
    }

    /// Returns the server id, if the message has been confirmed.
    #[must_use]
    pub const fn id(&self) -> Option<&MessageId> {
        match &self.key {
            ReconcileKey::Server(id) => Some(id),
            ReconcileKey::Temp(_) => None,
        }
    }

    #[must_use]
    pub const fn temp_id(&self) -> Option<&TempId> {
        self.temp_id.as_ref()
    }

    #[must_use]
    pub const fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    #[must_use]
    pub const fn author(&self) -> &MessageAuthor {
        &self.author
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn edited_at(&self) -> Option<DateTime<Utc>> {
        self.edited_at
    }

    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.pinned
    }

    #[must_use]
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    #[must_use]
    pub const fn status(&self) -> &MessageStatus {
        &self.status
    }

    /// True while the message only exists locally.
    #[must_use]
    pub const fn is_optimistic(&self) -> bool {
        matches!(self.key, ReconcileKey::Temp(_))
    }

    #[must_use]
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }

    /// Exchanges the temporary identity for the server-assigned id.
    pub fn confirm(&mut self, id: MessageId) {
        self.key = ReconcileKey::Server(id);
        self.status = MessageStatus::Sent;
    }

    pub fn set_status(&mut self, status: MessageStatus) {
        self.status = status;
    }

    pub fn apply_patch(&mut self, patch: &MessagePatch) {
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
            self.edited_at = Some(patch.edited_at.unwrap_or_else(Utc::now));
        } else if let Some(edited_at) = patch.edited_at {
            self.edited_at = Some(edited_at);
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        if let Some(reactions) = &patch.reactions {
            self.reactions.clone_from(reactions);
        }
    }
}
