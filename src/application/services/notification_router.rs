use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::domain::entities::{ChannelId, Message, NotificationId, NotificationItem};

/// Feed of messages that arrived outside the focused channel, plus unread
/// badges per channel.
#[derive(Debug)]
pub struct NotificationRouter {
    items: VecDeque<NotificationItem>,
    unread: HashMap<ChannelId, usize>,
    next_id: u64,
    ttl: TimeDelta,
    max_items: usize,
}

impl Default for NotificationRouter {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(5), 100)
    }
}

impl NotificationRouter {
    #[must_use]
    pub fn new(ttl: TimeDelta, max_items: usize) -> Self {
        Self {
            items: VecDeque::new(),
            unread: HashMap::new(),
            next_id: 0,
            ttl,
            max_items: max_items.max(1),
        }
    }

    /// Routes a freshly received message. Returns the feed id when an item
    /// was created; messages for the focused channel never are.
    pub fn route(
        &mut self,
        message: &Message,
        focused: Option<&ChannelId>,
    ) -> Option<NotificationId> {
        self.route_at(message, focused, Utc::now())
    }

    pub fn route_at(
        &mut self,
        message: &Message,
        focused: Option<&ChannelId>,
        now: DateTime<Utc>,
    ) -> Option<NotificationId> {
        let channel_id = message.channel_id();
        if focused == Some(channel_id) {
            return None;
        }

        let already_routed = message.id().is_some_and(|id| {
            self.items
                .iter()
                .any(|item| item.message.id() == Some(id))
        });
        if already_routed {
            return None;
        }

        self.next_id += 1;
        let id = NotificationId(self.next_id);
        self.items.push_back(NotificationItem {
            id,
            channel_id: channel_id.clone(),
            message: message.clone(),
            created_at: now,
        });
        *self.unread.entry(channel_id.clone()).or_insert(0) += 1;

        while self.items.len() > self.max_items {
            self.items.pop_front();
        }

        debug!(channel_id = %channel_id, notification_id = %id, "Notification routed");
        Some(id)
    }

    /// Removes one item and decrements its channel badge.
    pub fn dismiss(&mut self, id: NotificationId) -> Option<NotificationItem> {
        let pos = self.items.iter().position(|item| item.id == id)?;
        let item = self.items.remove(pos)?;
        if let Some(count) = self.unread.get_mut(&item.channel_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.unread.remove(&item.channel_id);
            }
        }
        Some(item)
    }

    /// Channel an item points at, without dismissing it.
    #[must_use]
    pub fn channel_of(&self, id: NotificationId) -> Option<&ChannelId> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| &item.channel_id)
    }

    /// Dismisses an item and returns the channel to navigate to.
    pub fn open(&mut self, id: NotificationId) -> Option<ChannelId> {
        self.dismiss(id).map(|item| item.channel_id)
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
        self.unread.clear();
    }

    /// Clears the badge and feed items of a channel the user is now reading.
    pub fn mark_read(&mut self, channel_id: &ChannelId) {
        self.unread.remove(channel_id);
        self.items.retain(|item| &item.channel_id != channel_id);
    }

    /// Drops items older than the TTL. Badges are left as they are.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        let ttl = self.ttl;
        self.items
            .retain(|item| now.signed_duration_since(item.created_at) <= ttl);
        before - self.items.len()
    }

    #[must_use]
    pub fn items(&self) -> Vec<NotificationItem> {
        self.items.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn unread_count(&self, channel_id: &ChannelId) -> usize {
        self.unread.get(channel_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn unread_counts(&self) -> HashMap<ChannelId, usize> {
        self.unread.clone()
    }
}
