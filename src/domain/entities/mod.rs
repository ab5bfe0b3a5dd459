//! Domain entity definitions.

mod channel;
mod ids;
mod message;
mod notification;
mod panel;
mod typing;
mod user;
mod voice;

pub use channel::{Channel, ChannelKind};
pub use ids::{ChannelId, ConversationId, MessageId, TempId, UserId};
pub use message::{
    Message, MessageAction, MessageAuthor, MessagePatch, MessageStatus, Reaction, ReconcileKey,
};
pub use notification::{NotificationId, NotificationItem};
pub use panel::{PanelKind, PanelState};
pub use typing::{TypingEntry, TypingKey};
pub use user::{LocalUser, PresenceStatus};
pub use voice::VoiceSession;
