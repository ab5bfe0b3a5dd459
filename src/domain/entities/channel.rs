//! Chat channel entity.

use serde::{Deserialize, Serialize};

use super::ChannelId;

/// Channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Text channel.
    #[default]
    Text,
    /// Voice channel.
    Voice,
}

impl ChannelKind {
    /// Returns true if this is a voice channel.
    #[must_use]
    pub const fn is_voice(self) -> bool {
        matches!(self, Self::Voice)
    }

    /// Returns the display prefix for this channel type.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Text => "#",
            Self::Voice => "🔊",
        }
    }
}

/// Channel as provided by the channel list. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    id: ChannelId,
    name: String,
    #[serde(rename = "type", default)]
    kind: ChannelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Channel {
    /// Creates a channel.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            description: None,
        }
    }

    /// Creates a text channel.
    #[must_use]
    pub fn text(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self::new(id, name, ChannelKind::Text)
    }

    /// Creates a voice channel.
    #[must_use]
    pub fn voice(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self::new(id, name, ChannelKind::Voice)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> &ChannelId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the name with its type prefix.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.name)
    }
}
