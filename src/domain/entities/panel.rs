//! Auxiliary side panels.

use super::{ConversationId, Message};

/// Kind of auxiliary panel, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PanelKind {
    Search,
    Members,
    Thread,
    DirectMessage,
}

impl std::fmt::Display for PanelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search => write!(f, "search"),
            Self::Members => write!(f, "members"),
            Self::Thread => write!(f, "thread"),
            Self::DirectMessage => write!(f, "direct-message"),
        }
    }
}

/// The single visible auxiliary panel. Setting a new value replaces the old one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    None,
    Search,
    Members,
    Thread {
        parent_message: Box<Message>,
    },
    DirectMessage {
        conversation_id: ConversationId,
    },
}

impl PanelState {
    /// Opens a thread panel on `parent`.
    #[must_use]
    pub fn thread(parent: Message) -> Self {
        Self::Thread {
            parent_message: Box::new(parent),
        }
    }

    #[must_use]
    pub fn direct_message(conversation_id: impl Into<ConversationId>) -> Self {
        Self::DirectMessage {
            conversation_id: conversation_id.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Option<PanelKind> {
        match self {
            Self::None => None,
            Self::Search => Some(PanelKind::Search),
            Self::Members => Some(PanelKind::Members),
            Self::Thread { .. } => Some(PanelKind::Thread),
            Self::DirectMessage { .. } => Some(PanelKind::DirectMessage),
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }
}
