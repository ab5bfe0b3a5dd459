//! JSON frames exchanged with the realtime service.
//!
//! Every frame is `{"type": ..., "data": {...}}`. Requests that expect an
//! answer carry a `requestId`; the server answers with a `reply` frame.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{ChannelId, MessageId, TempId};
use crate::domain::errors::ChatError;
use crate::domain::ports::SocketEvent;

const REPLY_TYPE: &str = "reply";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientFrame {
    JoinChannel {
        channel_id: ChannelId,
    },
    LeaveChannel {
        channel_id: ChannelId,
    },
    TypingStart {
        channel_id: ChannelId,
    },
    TypingStop {
        channel_id: ChannelId,
    },
    SendMessage {
        request_id: u64,
        channel_id: ChannelId,
        content: String,
        attachments: Vec<String>,
        temp_id: TempId,
    },
    EditMessage {
        request_id: u64,
        channel_id: ChannelId,
        message_id: MessageId,
        content: String,
    },
    DeleteMessage {
        request_id: u64,
        channel_id: ChannelId,
        message_id: MessageId,
    },
    AddReaction {
        request_id: u64,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    },
}

impl ClientFrame {
    /// Serializes the frame to its wire text.
    pub fn encode(&self) -> Result<String, ChatError> {
        serde_json::to_string(self).map_err(|e| ChatError::protocol(e.to_string()))
    }
}

/// Answer to a request frame. A present `error` means the server refused it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyFrame {
    pub request_id: u64,
    #[serde(default)]
    pub id: Option<MessageId>,
    #[serde(default)]
    pub temp_id: Option<TempId>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ReplyFrame {
    pub fn into_result(self) -> Result<Self, ChatError> {
        match self.error {
            Some(reason) => Err(ChatError::rejected(reason)),
            None => Ok(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Reply(ReplyFrame),
    Event(SocketEvent),
}

/// Decodes a text frame from the server.
pub fn decode_server_frame(text: &str) -> Result<ServerFrame, ChatError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ChatError::protocol(e.to_string()))?;

    if value.get("type").and_then(serde_json::Value::as_str) == Some(REPLY_TYPE) {
        let data = value.get("data").cloned().unwrap_or_default();
        return serde_json::from_value(data)
            .map(ServerFrame::Reply)
            .map_err(|e| ChatError::protocol(format!("invalid reply: {e}")));
    }

    serde_json::from_value(value)
        .map(ServerFrame::Event)
        .map_err(|e| ChatError::protocol(format!("invalid event: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SocketEventKind;

    #[test]
    fn test_send_frame_wire_shape() {
        let frame = ClientFrame::SendMessage {
            request_id: 7,
            channel_id: ChannelId::from("general"),
            content: "Hello".into(),
            attachments: Vec::new(),
            temp_id: TempId::from("temp-1"),
        };

        let value: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "send_message");
        assert_eq!(value["data"]["requestId"], 7);
        assert_eq!(value["data"]["channelId"], "general");
        assert_eq!(value["data"]["tempId"], "temp-1");
    }

    #[test]
    fn test_decode_reply() {
        let frame =
            decode_server_frame(r#"{"type":"reply","data":{"requestId":3,"id":"msg-9"}}"#).unwrap();

        let ServerFrame::Reply(reply) = frame else {
            panic!("expected reply");
        };
        assert_eq!(reply.request_id, 3);
        assert_eq!(reply.id, Some(MessageId::from("msg-9")));
        assert!(reply.into_result().is_ok());
    }

    #[test]
    fn test_rejected_reply() {
        let frame = decode_server_frame(
            r#"{"type":"reply","data":{"requestId":3,"error":"forbidden"}}"#,
        )
        .unwrap();

        let ServerFrame::Reply(reply) = frame else {
            panic!("expected reply");
        };
        assert_eq!(reply.into_result(), Err(ChatError::rejected("forbidden")));
    }

    #[test]
    fn test_decode_event() {
        let frame = decode_server_frame(
            r#"{"type":"user_typing","data":{"channelId":"general","userId":"bob"}}"#,
        )
        .unwrap();

        let ServerFrame::Event(event) = frame else {
            panic!("expected event");
        };
        assert_eq!(event.kind(), SocketEventKind::UserTyping);
    }

    #[test]
    fn test_unknown_event_is_protocol_error() {
        let result = decode_server_frame(r#"{"type":"server_hello","data":{}}"#);

        assert!(matches!(result, Err(ChatError::Protocol { .. })));
    }
}
