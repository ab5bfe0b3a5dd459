use tokio::sync::{mpsc, watch};

use super::{ChatIntent, ChatSnapshot};
use crate::domain::entities::{ChannelId, MessageId, PanelState, UserId};
use crate::domain::errors::ChatError;
use crate::domain::keybinding::Action;

/// Cloneable entry point for the view layer: sends intents to the running
/// orchestrator and observes its snapshots.
#[derive(Debug, Clone)]
pub struct ChatHandle {
    intents: mpsc::Sender<ChatIntent>,
    snapshots: watch::Receiver<ChatSnapshot>,
}

impl ChatHandle {
    #[must_use]
    pub const fn new(
        intents: mpsc::Sender<ChatIntent>,
        snapshots: watch::Receiver<ChatSnapshot>,
    ) -> Self {
        Self { intents, snapshots }
    }

    /// Queues an intent.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Closed` if the orchestrator has stopped.
    pub async fn dispatch(&self, intent: ChatIntent) -> Result<(), ChatError> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| ChatError::Closed)
    }

    pub async fn select_channel(&self, channel_id: impl Into<ChannelId>) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::SelectChannel(channel_id.into()))
            .await
    }

    pub async fn send(&self, content: impl Into<String>) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::Send {
            content: content.into(),
            attachments: Vec::new(),
        })
        .await
    }

    pub async fn edit(
        &self,
        message_id: impl Into<MessageId>,
        content: impl Into<String>,
    ) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::Edit {
            message_id: message_id.into(),
            content: content.into(),
        })
        .await
    }

    pub async fn delete(&self, message_id: impl Into<MessageId>) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::Delete(message_id.into())).await
    }

    pub async fn react(
        &self,
        message_id: impl Into<MessageId>,
        emoji: impl Into<String>,
    ) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::React {
            message_id: message_id.into(),
            emoji: emoji.into(),
        })
        .await
    }

    pub async fn open_panel(&self, panel: PanelState) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::OpenPanel(panel)).await
    }

    pub async fn close_panel(&self) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::ClosePanel).await
    }

    pub async fn shortcut(&self, action: Action) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::Shortcut(action)).await
    }

    pub async fn join_voice(
        &self,
        channel_id: impl Into<ChannelId>,
        participants: Vec<UserId>,
    ) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::JoinVoice {
            channel_id: channel_id.into(),
            participants,
        })
        .await
    }

    pub async fn leave_voice(&self) -> Result<(), ChatError> {
        self.dispatch(ChatIntent::LeaveVoice).await
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshots.clone()
    }
}
