use std::collections::HashMap;

use crate::domain::entities::{PresenceStatus, UserId};

/// Last known status of every user seen in `user_status_changed`.
#[derive(Debug, Default)]
pub struct PresenceRoster {
    statuses: HashMap<UserId, PresenceStatus>,
}

impl PresenceRoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a status. Returns `true` if it changed.
    pub fn update(&mut self, user_id: UserId, status: PresenceStatus) -> bool {
        self.statuses.insert(user_id, status) != Some(status)
    }

    #[must_use]
    pub fn status(&self, user_id: &UserId) -> PresenceStatus {
        self.statuses.get(user_id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn online_count(&self) -> usize {
        self.statuses.values().filter(|s| s.is_online()).count()
    }

    #[must_use]
    pub fn snapshot(&self) -> HashMap<UserId, PresenceStatus> {
        self.statuses.clone()
    }
}
