//! String-backed identifiers handed out by the chat backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a channel.
    ChannelId
);

string_id!(
    /// Server-assigned message identifier.
    MessageId
);

string_id!(
    /// Client-side identifier of a message that the server has not confirmed yet.
    TempId
);

string_id!(
    /// Unique identifier for a user.
    UserId
);

string_id!(
    /// Identifier of a direct-message conversation.
    ConversationId
);

impl TempId {
    /// Generates a fresh, collision-free temporary id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("temp-{}", Uuid::new_v4()))
    }
}
