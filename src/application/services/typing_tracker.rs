use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

use crate::application::orchestrator::{OrchestratorEvent, TypingExpiry};
use crate::domain::entities::{ChannelId, TypingEntry, TypingKey, UserId};

struct ExpiryTimer {
    token: u64,
    task: JoinHandle<()>,
}

/// Remote typing indicators with per-user expiry timers.
///
/// A timer never mutates state directly; it posts a [`TypingExpiry`] back to
/// the orchestrator, which calls [`TypingTracker::expire`]. Stale tokens are
/// ignored, so a refreshed entry survives the old timer.
pub struct TypingTracker {
    local_user: UserId,
    timeout: Duration,
    entries: HashMap<ChannelId, Vec<TypingEntry>>,
    timers: HashMap<TypingKey, ExpiryTimer>,
    next_token: u64,
    events: UnboundedSender<OrchestratorEvent>,
}

impl TypingTracker {
    #[must_use]
    pub fn new(
        local_user: UserId,
        timeout: Duration,
        events: UnboundedSender<OrchestratorEvent>,
    ) -> Self {
        Self {
            local_user,
            timeout,
            entries: HashMap::new(),
            timers: HashMap::new(),
            next_token: 0,
            events,
        }
    }

    /// Records or refreshes a typer. The local user is never tracked.
    pub fn start(
        &mut self,
        channel_id: &ChannelId,
        user_id: &UserId,
        username: Option<&str>,
    ) -> bool {
        if user_id == &self.local_user {
            return false;
        }

        let expires_at = Instant::now() + self.timeout;
        let users = self.entries.entry(channel_id.clone()).or_default();

        if let Some(existing) = users.iter_mut().find(|u| &u.user_id == user_id) {
            existing.expires_at = expires_at;
            if let Some(name) = username {
                existing.username = name.to_string();
            }
        } else {
            users.push(TypingEntry {
                channel_id: channel_id.clone(),
                user_id: user_id.clone(),
                username: username.unwrap_or(user_id.as_str()).to_string(),
                expires_at,
            });
        }

        self.arm(TypingKey::new(channel_id.clone(), user_id.clone()));
        true
    }

    /// Removes a typer and cancels its timer.
    pub fn stop(&mut self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        let key = TypingKey::new(channel_id.clone(), user_id.clone());
        if let Some(timer) = self.timers.remove(&key) {
            timer.task.abort();
        }
        self.remove_entry(channel_id, user_id)
    }

    /// Applies a fired timer. Returns `false` for stale or unknown timers.
    pub fn expire(&mut self, expiry: &TypingExpiry) -> bool {
        let current = self
            .timers
            .get(&expiry.key)
            .is_some_and(|timer| timer.token == expiry.token);
        if !current {
            trace!(user_id = %expiry.key.user_id, "Stale typing timer ignored");
            return false;
        }

        self.timers.remove(&expiry.key);
        self.remove_entry(&expiry.key.channel_id, &expiry.key.user_id)
    }

    /// Active remote typers of `channel_id`.
    #[must_use]
    pub fn typing_users(&self, channel_id: &ChannelId) -> Vec<&TypingEntry> {
        let now = Instant::now();
        self.entries
            .get(channel_id)
            .map(|users| {
                users
                    .iter()
                    .filter(|u| u.user_id != self.local_user && !u.is_expired_at(now))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn format_indicator(&self, channel_id: &ChannelId) -> Option<String> {
        let users = self.typing_users(channel_id);

        match users.len() {
            0 => None,
            1 => Some(format!("{} is typing...", users[0].username)),
            2 => Some(format!(
                "{} and {} are typing...",
                users[0].username, users[1].username
            )),
            3 => Some(format!(
                "{}, {} and {} are typing...",
                users[0].username, users[1].username, users[2].username
            )),
            _ => Some("Several people are typing...".to_string()),
        }
    }

    /// Cancels every pending timer.
    pub fn shutdown(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.task.abort();
        }
        self.entries.clear();
    }

    fn arm(&mut self, key: TypingKey) {
        if let Some(previous) = self.timers.remove(&key) {
            previous.task.abort();
        }

        let Ok(runtime) = Handle::try_current() else {
            return;
        };

        self.next_token += 1;
        let token = self.next_token;
        let timeout = self.timeout;
        let events = self.events.clone();
        let expiry = TypingExpiry {
            key: key.clone(),
            token,
        };

        let task = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(OrchestratorEvent::TypingExpired(expiry));
        });

        self.timers.insert(key, ExpiryTimer { token, task });
    }

    fn remove_entry(&mut self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        let Some(users) = self.entries.get_mut(channel_id) else {
            return false;
        };
        let before = users.len();
        users.retain(|u| &u.user_id != user_id);
        let removed = users.len() != before;
        if users.is_empty() {
            self.entries.remove(channel_id);
        }
        removed
    }
}

impl Drop for TypingTracker {
    fn drop(&mut self) {
        for timer in self.timers.values() {
            timer.task.abort();
        }
    }
}
