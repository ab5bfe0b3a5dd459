//! Messages flowing into the orchestrator's event loop.

use crate::domain::entities::{
    ChannelId, ConversationId, MessageAction, MessageId, NotificationId, PanelState, TempId,
    TypingKey, UserId,
};
use crate::domain::errors::ChatError;
use crate::domain::keybinding::Action;
use crate::domain::ports::{HistoryPage, SendAck, SocketEvent};

/// How a completed history page is applied to its channel slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMode {
    /// Replace the channel content with the newest page.
    Initial,
    /// Prepend an older page fetched with `cursor`.
    Older { cursor: String },
}

/// A typing timer firing. `token` identifies the timer generation so a stale
/// timer never removes a refreshed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingExpiry {
    pub key: TypingKey,
    pub token: u64,
}

/// Asynchronous completions and socket callbacks, applied one at a time.
#[derive(Debug)]
pub enum OrchestratorEvent {
    Inbound(SocketEvent),
    HistoryLoaded {
        channel_id: ChannelId,
        mode: LoadMode,
        result: Result<HistoryPage, ChatError>,
    },
    SendCompleted {
        channel_id: ChannelId,
        temp_id: TempId,
        result: Result<SendAck, ChatError>,
    },
    ActionFailed {
        message_id: MessageId,
        action: MessageAction,
        error: ChatError,
    },
    TypingExpired(TypingExpiry),
}

/// Intents issued by the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatIntent {
    SelectChannel(ChannelId),
    Send {
        content: String,
        attachments: Vec<String>,
    },
    RetrySend(TempId),
    Edit {
        message_id: MessageId,
        content: String,
    },
    Delete(MessageId),
    React {
        message_id: MessageId,
        emoji: String,
    },
    LoadOlder,
    OpenPanel(PanelState),
    TogglePanel(PanelState),
    OpenThread(MessageId),
    OpenDirectMessage(ConversationId),
    ClosePanel,
    Shortcut(Action),
    JoinVoice {
        channel_id: ChannelId,
        participants: Vec<UserId>,
    },
    LeaveVoice,
    OpenNotification(NotificationId),
    DismissNotification(NotificationId),
    ClearNotifications,
    ComposerActivity {
        typing: bool,
    },
}
