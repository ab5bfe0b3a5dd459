mod history_port;
mod socket_port;

pub use history_port::{HistoryPage, HistoryPort, HistoryQuery, Pagination};
pub use socket_port::{
    EditMessageRequest, IncomingMessage, MessageDeletion, MessageUpdate, SendAck,
    SendMessageRequest, SocketEvent, SocketEventKind, SocketHandler, SocketPort, StatusChange,
    TypingSignal,
};
