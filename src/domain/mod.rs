//! Domain layer with core chat entities and port definitions.

/// Connection status definitions.
pub mod connection;
/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Keybinding definitions.
pub mod keybinding;
/// Port definitions.
pub mod ports;

pub use connection::ConnectionStatus;
pub use entities::{Channel, ChannelId, LocalUser, Message, MessageId};
pub use errors::ChatError;
pub use ports::{HistoryPort, SocketPort};
