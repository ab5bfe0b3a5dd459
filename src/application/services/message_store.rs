//! Per-channel message collections.
//!
//! The store is keyed by channel id, never by "the focused channel", so a
//! history page that resolves after the user has moved on still lands in the
//! slot it was requested for.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::application::orchestrator::LoadMode;
use crate::domain::entities::{
    ChannelId, LocalUser, Message, MessageAction, MessageAuthor, MessageId, MessagePatch,
    MessageStatus, ReconcileKey, TempId,
};
use crate::domain::ports::{HistoryPage, IncomingMessage};

/// Result of feeding a server message into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// New message, appended at the end.
    Appended,
    /// An optimistic entry was replaced in place.
    Replaced,
    /// The server id was already present. The stored entry is kept unless
    /// the payload carries a newer edit.
    Duplicate,
    /// Malformed message, nothing changed.
    Ignored,
}

#[derive(Debug, Default)]
struct ChannelSlot {
    messages: Vec<Message>,
    loaded: bool,
    loading: bool,
    has_more: bool,
    cursor: Option<String>,
    last_error: Option<String>,
    /// Server messages that landed before the first page did.
    early_arrivals: HashSet<MessageId>,
}

impl ChannelSlot {
    fn position(&self, key: &ReconcileKey) -> Option<usize> {
        self.messages.iter().position(|m| m.key() == key)
    }

    fn position_by_temp(&self, temp_id: &TempId) -> Option<usize> {
        self.messages
            .iter()
            .position(|m| m.temp_id() == Some(temp_id))
    }

    /// Whether an entry has to survive an initial page that lacks it.
    fn is_local(&self, message: &Message) -> bool {
        message.temp_id().is_some()
            || message
                .id()
                .is_some_and(|id| self.early_arrivals.contains(id))
    }

    fn oldest_cursor(&self) -> Option<String> {
        self.messages
            .iter()
            .find_map(|m| m.id().map(|id| id.as_str().to_string()))
    }
}

pub struct MessageStore {
    slots: HashMap<ChannelId, ChannelSlot>,
    outstanding_window: TimeDelta,
}

impl MessageStore {
    #[must_use]
    pub fn new(outstanding_window: TimeDelta) -> Self {
        Self {
            slots: HashMap::new(),
            outstanding_window,
        }
    }

    /// Messages of `channel_id` in insertion order.
    #[must_use]
    pub fn messages(&self, channel_id: &ChannelId) -> &[Message] {
        self.slots
            .get(channel_id)
            .map_or(&[], |slot| slot.messages.as_slice())
    }

    #[must_use]
    pub fn is_loaded(&self, channel_id: &ChannelId) -> bool {
        self.slots.get(channel_id).is_some_and(|slot| slot.loaded)
    }

    #[must_use]
    pub fn is_loading(&self, channel_id: &ChannelId) -> bool {
        self.slots.get(channel_id).is_some_and(|slot| slot.loading)
    }

    #[must_use]
    pub fn has_more(&self, channel_id: &ChannelId) -> bool {
        self.slots.get(channel_id).is_some_and(|slot| slot.has_more)
    }

    #[must_use]
    pub fn last_error(&self, channel_id: &ChannelId) -> Option<&str> {
        self.slots
            .get(channel_id)
            .and_then(|slot| slot.last_error.as_deref())
    }

    /// Cursor to request the page before the oldest loaded message.
    #[must_use]
    pub fn older_cursor(&self, channel_id: &ChannelId) -> Option<String> {
        let slot = self.slots.get(channel_id)?;
        if !slot.has_more {
            return None;
        }
        slot.cursor.clone().or_else(|| slot.oldest_cursor())
    }

    /// Looks a confirmed message up in any channel.
    #[must_use]
    pub fn find(&self, message_id: &MessageId) -> Option<&Message> {
        let key = ReconcileKey::Server(message_id.clone());
        self.slots
            .values()
            .find_map(|slot| slot.messages.iter().find(|m| m.key() == &key))
    }

    #[must_use]
    pub fn find_by_temp(&self, channel_id: &ChannelId, temp_id: &TempId) -> Option<&Message> {
        let slot = self.slots.get(channel_id)?;
        slot.position_by_temp(temp_id).map(|i| &slot.messages[i])
    }

    /// Marks a load as started. Returns `false` if one is already in flight
    /// for this channel, so pages never interleave.
    pub fn begin_load(&mut self, channel_id: &ChannelId) -> bool {
        let slot = self.slots.entry(channel_id.clone()).or_default();
        if slot.loading {
            return false;
        }
        slot.loading = true;
        slot.last_error = None;
        true
    }

    /// Applies a fetched page to the slot it was requested for.
    pub fn apply_page(&mut self, channel_id: &ChannelId, page: HistoryPage, mode: &LoadMode) {
        let slot = self.slots.entry(channel_id.clone()).or_default();
        slot.loading = false;
        slot.loaded = true;
        slot.has_more = page.pagination.has_more;
        slot.cursor = page.pagination.next_cursor;

        let fetched: Vec<Message> = page
            .messages
            .into_iter()
            .filter_map(IncomingMessage::into_message)
            .filter(|m| m.channel_id() == channel_id)
            .collect();

        match mode {
            LoadMode::Initial => {
                let fetched_ids: HashSet<&MessageId> =
                    fetched.iter().filter_map(Message::id).collect();
                let fetched_temps: HashSet<&TempId> =
                    fetched.iter().filter_map(Message::temp_id).collect();
                // Own sends and live arrivals the page was taken too early to contain.
                let carried: Vec<Message> = slot
                    .messages
                    .iter()
                    .filter(|m| slot.is_local(m))
                    .filter(|m| m.id().is_none_or(|id| !fetched_ids.contains(id)))
                    .filter(|m| m.temp_id().is_none_or(|t| !fetched_temps.contains(t)))
                    .cloned()
                    .collect();
                debug!(
                    channel_id = %channel_id,
                    fetched = fetched.len(),
                    carried = carried.len(),
                    "History page applied"
                );
                slot.messages = fetched;
                slot.messages.extend(carried);
                slot.early_arrivals.clear();
            }
            LoadMode::Older { .. } => {
                let known: HashSet<MessageId> =
                    slot.messages.iter().filter_map(Message::id).cloned().collect();
                let mut older: Vec<Message> = fetched
                    .into_iter()
                    .filter(|m| m.id().is_none_or(|id| !known.contains(id)))
                    .collect();
                debug!(channel_id = %channel_id, prepended = older.len(), "Older page applied");
                older.append(&mut slot.messages);
                slot.messages = older;
            }
        }
    }

    /// Records a failed load. Existing content stays as it was.
    pub fn fail_load(&mut self, channel_id: &ChannelId, reason: impl Into<String>) {
        let slot = self.slots.entry(channel_id.clone()).or_default();
        slot.loading = false;
        slot.last_error = Some(reason.into());
    }

    /// Appends a locally authored message and returns its temporary id.
    pub fn append_optimistic(
        &mut self,
        channel_id: &ChannelId,
        content: impl Into<String>,
        author: &LocalUser,
    ) -> TempId {
        let temp_id = TempId::generate();
        let message = Message::optimistic(
            temp_id.clone(),
            channel_id.clone(),
            MessageAuthor::from(author),
            content,
            Utc::now(),
        );
        self.slots
            .entry(channel_id.clone())
            .or_default()
            .messages
            .push(message);
        trace!(channel_id = %channel_id, temp_id = %temp_id, "Optimistic message appended");
        temp_id
    }

    /// Feeds a raw server message. Messages without a channel are ignored.
    pub fn ingest(&mut self, incoming: IncomingMessage) -> ReconcileOutcome {
        match incoming.into_message() {
            Some(message) => self.reconcile(message),
            None => {
                debug!("Ignoring message without channel id");
                ReconcileOutcome::Ignored
            }
        }
    }

    pub fn reconcile(&mut self, message: Message) -> ReconcileOutcome {
        self.reconcile_at(message, Utc::now())
    }

    /// Reconciles a server message against the channel content.
    ///
    /// Match order: same server id, then same temp id, then the oldest
    /// pending optimistic entry with the same author and content that is
    /// still inside the outstanding-send window.
    pub fn reconcile_at(&mut self, message: Message, now: DateTime<Utc>) -> ReconcileOutcome {
        let window = self.outstanding_window;
        let slot = self.slots.entry(message.channel_id().clone()).or_default();

        if let Some(pos) = slot.position(message.key()) {
            refresh_duplicate(&mut slot.messages[pos], &message);
            return ReconcileOutcome::Duplicate;
        }

        if let Some(temp_id) = message.temp_id().cloned()
            && let Some(pos) = slot.position_by_temp(&temp_id)
        {
            slot.messages[pos] = message;
            return ReconcileOutcome::Replaced;
        }

        let candidate = slot.messages.iter().position(|m| {
            m.is_optimistic()
                && m.status().is_pending()
                && m.author().user_id() == message.author().user_id()
                && m.content() == message.content()
                && now.signed_duration_since(m.timestamp()) <= window
        });
        if let Some(pos) = candidate {
            let temp_id = slot.messages[pos].temp_id().cloned();
            slot.messages[pos] = message.with_temp_id(temp_id);
            return ReconcileOutcome::Replaced;
        }

        if !slot.loaded
            && let Some(id) = message.id()
        {
            slot.early_arrivals.insert(id.clone());
        }
        slot.messages.push(message);
        ReconcileOutcome::Appended
    }

    /// Pairs a send acknowledgement with its optimistic entry.
    ///
    /// If the server echo already materialised `id`, the optimistic copy is
    /// dropped so the channel holds exactly one entry.
    pub fn confirm(&mut self, channel_id: &ChannelId, temp_id: &TempId, id: MessageId) -> bool {
        let Some(slot) = self.slots.get_mut(channel_id) else {
            return false;
        };
        let Some(pos) = slot.position_by_temp(temp_id) else {
            return false;
        };

        let key = ReconcileKey::Server(id.clone());
        if slot.messages[pos].key() == &key {
            return true;
        }
        if slot.position(&key).is_some() {
            slot.messages.remove(pos);
            return true;
        }

        slot.messages[pos].confirm(id);
        true
    }

    pub fn mark_send_failed(
        &mut self,
        channel_id: &ChannelId,
        temp_id: &TempId,
        reason: impl Into<String>,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(channel_id) else {
            return false;
        };
        let Some(pos) = slot.position_by_temp(temp_id) else {
            return false;
        };
        let message = &mut slot.messages[pos];
        if !message.is_optimistic() {
            return false;
        }
        message.set_status(MessageStatus::Failed {
            action: MessageAction::Send,
            reason: reason.into(),
        });
        true
    }

    /// Puts a failed optimistic message back to pending for a retry and
    /// returns its content.
    pub fn mark_retrying(&mut self, channel_id: &ChannelId, temp_id: &TempId) -> Option<String> {
        let slot = self.slots.get_mut(channel_id)?;
        let pos = slot.position_by_temp(temp_id)?;
        let message = &mut slot.messages[pos];
        if !message.is_optimistic() || !message.status().is_failed() {
            return None;
        }
        message.set_status(MessageStatus::Pending);
        Some(message.content().to_string())
    }

    pub fn mark_action_failed(
        &mut self,
        message_id: &MessageId,
        action: MessageAction,
        reason: impl Into<String>,
    ) -> bool {
        let Some(message) = self.find_mut(message_id, None) else {
            return false;
        };
        message.set_status(MessageStatus::Failed {
            action,
            reason: reason.into(),
        });
        true
    }

    /// Applies an edit in place. No-op if the message is not loaded.
    pub fn apply_update(
        &mut self,
        message_id: &MessageId,
        channel_hint: Option<&ChannelId>,
        patch: &MessagePatch,
    ) -> bool {
        match self.find_mut(message_id, channel_hint) {
            Some(message) => {
                message.apply_patch(patch);
                if message.status().is_failed() {
                    message.set_status(MessageStatus::Sent);
                }
                true
            }
            None => {
                trace!(message_id = %message_id, "Update for unknown message ignored");
                false
            }
        }
    }

    /// Removes a message. No-op if absent.
    pub fn apply_delete(&mut self, message_id: &MessageId, channel_hint: Option<&ChannelId>) -> bool {
        let key = ReconcileKey::Server(message_id.clone());

        if let Some(slot) = channel_hint.and_then(|id| self.slots.get_mut(id))
            && let Some(pos) = slot.position(&key)
        {
            slot.messages.remove(pos);
            return true;
        }

        for slot in self.slots.values_mut() {
            if let Some(pos) = slot.position(&key) {
                slot.messages.remove(pos);
                return true;
            }
        }

        trace!(message_id = %message_id, "Delete for unknown message ignored");
        false
    }

    fn find_mut(
        &mut self,
        message_id: &MessageId,
        channel_hint: Option<&ChannelId>,
    ) -> Option<&mut Message> {
        let key = ReconcileKey::Server(message_id.clone());

        if let Some(channel_id) = channel_hint {
            let in_hint = self
                .slots
                .get(channel_id)
                .is_some_and(|slot| slot.position(&key).is_some());
            if in_hint {
                return self
                    .slots
                    .get_mut(channel_id)
                    .and_then(|slot| slot.messages.iter_mut().find(|m| m.key() == &key));
            }
        }

        self.slots
            .values_mut()
            .find_map(|slot| slot.messages.iter_mut().find(|m| m.key() == &key))
    }
}

/// Redelivery of a known server id. Only a strictly newer edit replaces the
/// stored fields; a pending entry becomes sent.
fn refresh_duplicate(existing: &mut Message, incoming: &Message) {
    if existing.status().is_pending() {
        existing.set_status(MessageStatus::Sent);
    }
    if incoming.edited_at() > existing.edited_at() {
        existing.apply_patch(&MessagePatch {
            content: Some(incoming.content().to_string()),
            edited_at: incoming.edited_at(),
            pinned: Some(incoming.is_pinned()),
            reactions: Some(incoming.reactions().to_vec()),
        });
    }
}
