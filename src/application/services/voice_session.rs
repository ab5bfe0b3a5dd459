use tracing::info;

use crate::domain::entities::{Channel, ChannelId, UserId, VoiceSession};

/// Tracks the single voice channel the user is connected to.
#[derive(Debug, Default)]
pub struct VoiceSessionController {
    session: Option<VoiceSession>,
}

impl VoiceSessionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&VoiceSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_in(&self, channel_id: &ChannelId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| &s.channel_id == channel_id)
    }

    /// Joins `channel`, leaving any previous session. Returns the replaced one.
    pub fn join(&mut self, channel: &Channel, participants: Vec<UserId>) -> Option<VoiceSession> {
        info!(channel_id = %channel.id(), "Joining voice channel");
        self.session.replace(VoiceSession::new(
            channel.id().clone(),
            channel.name(),
            participants,
        ))
    }

    pub fn leave(&mut self) -> Option<VoiceSession> {
        let left = self.session.take();
        if let Some(session) = &left {
            info!(channel_id = %session.channel_id, "Left voice channel");
        }
        left
    }
}
