use super::{ChannelId, UserId};

/// Live membership in a voice channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSession {
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub participants: Vec<UserId>,
}

impl VoiceSession {
    #[must_use]
    pub fn new(
        channel_id: ChannelId,
        channel_name: impl Into<String>,
        participants: Vec<UserId>,
    ) -> Self {
        Self {
            channel_id,
            channel_name: channel_name.into(),
            participants,
        }
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}
