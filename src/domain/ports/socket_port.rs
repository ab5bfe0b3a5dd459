//! Bidirectional socket port: channel membership, outbound mutations and
//! inbound event subscription.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    ChannelId, Message, MessageAuthor, MessageId, MessagePatch, PresenceStatus, Reaction, TempId,
    UserId,
};
use crate::domain::errors::ChatError;

/// Inbound event kinds a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum SocketEventKind {
    MessageReceived,
    MessageUpdated,
    MessageDeleted,
    UserTyping,
    UserStoppedTyping,
    UserStatusChanged,
}

impl SocketEventKind {
    /// Every kind the orchestrator listens to.
    pub const ALL: [Self; 6] = [
        Self::MessageReceived,
        Self::MessageUpdated,
        Self::MessageDeleted,
        Self::UserTyping,
        Self::UserStoppedTyping,
        Self::UserStatusChanged,
    ];

    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageReceived => "message_received",
            Self::MessageUpdated => "message_updated",
            Self::MessageDeleted => "message_deleted",
            Self::UserTyping => "user_typing",
            Self::UserStoppedTyping => "user_stopped_typing",
            Self::UserStatusChanged => "user_status_changed",
        }
    }
}

impl std::fmt::Display for SocketEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message as delivered by the server, over the socket or from history.
///
/// `channel_id` is optional on the wire; messages without one are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    pub id: MessageId,
    #[serde(default)]
    pub temp_id: Option<TempId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub content: String,
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl IncomingMessage {
    /// Converts into a domain message. Returns `None` when no channel is set.
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        let channel_id = self.channel_id?;
        let author = MessageAuthor::new(self.user_id, self.username, self.avatar);

        Some(
            Message::new(self.id, channel_id, author, self.content, self.timestamp)
                .with_temp_id(self.temp_id)
                .with_edited_at(self.edited_at)
                .with_pinned(self.pinned)
                .with_reactions(self.reactions),
        )
    }
}

/// Payload of `message_updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageUpdate {
    pub id: MessageId,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(flatten)]
    pub patch: MessagePatch,
}

/// Payload of `message_deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletion {
    pub id: MessageId,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
}

/// Payload of `user_typing` and `user_stopped_typing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingSignal {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
}

/// Payload of `user_status_changed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub user_id: UserId,
    pub status: PresenceStatus,
}

/// Inbound socket event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum SocketEvent {
    MessageReceived(IncomingMessage),
    MessageUpdated(MessageUpdate),
    MessageDeleted(MessageDeletion),
    UserTyping(TypingSignal),
    UserStoppedTyping(TypingSignal),
    UserStatusChanged(StatusChange),
}

impl SocketEvent {
    #[must_use]
    pub const fn kind(&self) -> SocketEventKind {
        match self {
            Self::MessageReceived(_) => SocketEventKind::MessageReceived,
            Self::MessageUpdated(_) => SocketEventKind::MessageUpdated,
            Self::MessageDeleted(_) => SocketEventKind::MessageDeleted,
            Self::UserTyping(_) => SocketEventKind::UserTyping,
            Self::UserStoppedTyping(_) => SocketEventKind::UserStoppedTyping,
            Self::UserStatusChanged(_) => SocketEventKind::UserStatusChanged,
        }
    }
}

/// Subscriber callback. Handlers are compared by `Arc` identity, so the same
/// `Arc` passed to [`SocketPort::on`] must be passed to [`SocketPort::off`].
pub type SocketHandler = Arc<dyn Fn(SocketEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub channel_id: ChannelId,
    pub content: String,
    pub attachments: Vec<String>,
    pub temp_id: TempId,
}

impl SendMessageRequest {
    #[must_use]
    pub fn new(channel_id: ChannelId, content: impl Into<String>, temp_id: TempId) -> Self {
        Self {
            channel_id,
            content: content.into(),
            attachments: Vec::new(),
            temp_id,
        }
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Server acknowledgement of a send: the temp id paired with the real id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAck {
    pub temp_id: TempId,
    pub id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditMessageRequest {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub content: String,
}

impl EditMessageRequest {
    #[must_use]
    pub fn new(channel_id: ChannelId, message_id: MessageId, content: impl Into<String>) -> Self {
        Self {
            channel_id,
            message_id,
            content: content.into(),
        }
    }
}

/// Port for the realtime socket service.
#[async_trait]
pub trait SocketPort: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Opens the connection.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the connection cannot be established.
    async fn connect(&self) -> Result<(), ChatError>;

    fn disconnect(&self);

    /// Registers `handler` for events of `kind`.
    fn on(&self, kind: SocketEventKind, handler: SocketHandler);

    /// Removes exactly the handler previously registered with [`Self::on`].
    fn off(&self, kind: SocketEventKind, handler: &SocketHandler);

    fn join_channel(&self, channel_id: &ChannelId);

    fn leave_channel(&self, channel_id: &ChannelId);

    /// Sends a new message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the transport fails or the server rejects it.
    async fn send_message(&self, request: SendMessageRequest) -> Result<SendAck, ChatError>;

    /// Edits an existing message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the transport fails or the server rejects it.
    async fn edit_message(&self, request: EditMessageRequest) -> Result<(), ChatError>;

    /// Deletes a message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the transport fails or the server rejects it.
    async fn delete_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), ChatError>;

    /// Adds a reaction to a message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the transport fails or the server rejects it.
    async fn add_reaction(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), ChatError>;

    fn start_typing(&self, channel_id: &ChannelId);

    fn stop_typing(&self, channel_id: &ChannelId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_received() {
        let json = r#"{
            "type": "message_received",
            "data": {
                "id": "msg-1",
                "tempId": "temp-9",
                "channelId": "general",
                "content": "Hello",
                "userId": "u1",
                "username": "alice",
                "timestamp": "2024-05-01T10:00:00Z"
            }
        }"#;

        let event: SocketEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), SocketEventKind::MessageReceived);

        let SocketEvent::MessageReceived(incoming) = event else {
            panic!("unexpected event");
        };
        let message = incoming.into_message().unwrap();
        assert_eq!(message.id().map(MessageId::as_str), Some("msg-1"));
        assert_eq!(message.temp_id().map(TempId::as_str), Some("temp-9"));
        assert_eq!(message.channel_id().as_str(), "general");
    }

    #[test]
    fn test_message_without_channel_is_dropped() {
        let json = r#"{"id":"msg-1","content":"x","userId":"u1","username":"alice"}"#;
        let incoming: IncomingMessage = serde_json::from_str(json).unwrap();

        assert!(incoming.into_message().is_none());
    }

    #[test]
    fn test_decode_message_updated_flattens_patch() {
        let json = r#"{
            "type": "message_updated",
            "data": {"id": "msg-1", "channelId": "general", "content": "edited", "pinned": true}
        }"#;

        let event: SocketEvent = serde_json::from_str(json).unwrap();
        let SocketEvent::MessageUpdated(update) = event else {
            panic!("unexpected event");
        };
        assert_eq!(update.patch.content.as_deref(), Some("edited"));
        assert_eq!(update.patch.pinned, Some(true));
        assert!(update.patch.reactions.is_none());
    }

    #[test]
    fn test_kind_names_match_wire() {
        for kind in SocketEventKind::ALL {
            assert!(!kind.as_str().is_empty());
        }
        assert_eq!(
            SocketEventKind::UserStoppedTyping.to_string(),
            "user_stopped_typing"
        );
    }
}
