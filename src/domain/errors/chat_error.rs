//! Chat error types.

use thiserror::Error;

/// Chat error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ChatError {
    #[error("socket is not connected")]
    NotConnected,

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("server rejected request: {message}")]
    Rejected { message: String },

    #[error("history request for channel {channel_id} failed: {message}")]
    History { channel_id: String, message: String },

    #[error("malformed payload: {message}")]
    Protocol { message: String },

    #[error("no channel is focused")]
    NoFocusedChannel,

    #[error("message content is empty")]
    EmptyMessage,

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel {0} is not a voice channel")]
    NotVoiceChannel(String),

    #[error("unknown message: {0}")]
    UnknownMessage(String),

    #[error("chat orchestrator has shut down")]
    Closed,
}

impl ChatError {
    /// Creates transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates rejected error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates history error.
    #[must_use]
    pub fn history(channel_id: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::History {
            channel_id: channel_id.to_string(),
            message: message.into(),
        }
    }

    /// Creates protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns whether the error came from the socket transport.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Transport { .. } | Self::Timeout { .. } | Self::Rejected { .. }
        )
    }

    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Transport { .. } | Self::Timeout { .. } | Self::History { .. }
        )
    }
}
