//! Chat orchestrator: owns the focused channel and routes socket events,
//! history completions and view intents into the chat services.

mod config;
mod events;
mod handle;
mod snapshot;


use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub use config::ChatConfig;
pub use events::{ChatIntent, LoadMode, OrchestratorEvent, TypingExpiry};
pub use handle::ChatHandle;
pub use snapshot::ChatSnapshot;

use crate::application::services::{
    EventBridge, MessageStore, NotificationRouter, PanelController, PresenceRoster,
    ReconcileOutcome, TypingTracker, VoiceSessionController,
};
use crate::domain::ConnectionStatus;
use crate::domain::entities::{
    Channel, ChannelId, ConversationId, LocalUser, MessageAction, MessageId, NotificationId,
    PanelState, TempId, UserId,
};
use crate::domain::errors::ChatError;
use crate::domain::keybinding::Action;
use crate::domain::ports::{
    EditMessageRequest, HistoryPort, HistoryQuery, SendMessageRequest, SocketEvent, SocketPort,
};

enum Step {
    Intent(ChatIntent),
    Event(OrchestratorEvent),
    Sweep,
    Shutdown,
}

pub struct ChatOrchestrator {
    bridge: EventBridge,
    history: Arc<dyn HistoryPort>,
    local_user: LocalUser,
    config: ChatConfig,
    channels: Vec<Channel>,
    focused: Option<ChannelId>,
    local_typing: Option<ChannelId>,
    store: MessageStore,
    typing: TypingTracker,
    notifications: NotificationRouter,
    panels: PanelController,
    voice: VoiceSessionController,
    presence: PresenceRoster,
    connection: ConnectionStatus,
    mounted: bool,
    events_tx: mpsc::UnboundedSender<OrchestratorEvent>,
    events_rx: mpsc::UnboundedReceiver<OrchestratorEvent>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
}

impl ChatOrchestrator {
    #[must_use]
    pub fn new(
        socket: Arc<dyn SocketPort>,
        history: Arc<dyn HistoryPort>,
        local_user: LocalUser,
        config: ChatConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(ChatSnapshot::default());

        Self {
            bridge: EventBridge::new(socket),
            history,
            store: MessageStore::new(config.outstanding_send_window()),
            typing: TypingTracker::new(
                local_user.id().clone(),
                config.typing_timeout(),
                events_tx.clone(),
            ),
            notifications: NotificationRouter::new(
                config.notification_ttl(),
                config.max_notifications,
            ),
            panels: PanelController::new(),
            voice: VoiceSessionController::new(),
            presence: PresenceRoster::new(),
            local_user,
            config,
            channels: Vec::new(),
            focused: None,
            local_typing: None,
            connection: ConnectionStatus::Disconnected,
            mounted: false,
            events_tx,
            events_rx,
            snapshot_tx,
        }
    }

    /// Creates a view handle and the intent receiver to pass to [`Self::run`].
    #[must_use]
    pub fn handle(&self, capacity: usize) -> (ChatHandle, mpsc::Receiver<ChatIntent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChatHandle::new(tx, self.snapshot_tx.subscribe()), rx)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_tx.subscribe()
    }

    #[must_use]
    pub const fn store(&self) -> &MessageStore {
        &self.store
    }

    #[must_use]
    pub const fn focused_channel(&self) -> Option<&ChannelId> {
        self.focused.as_ref()
    }

    /// Registers the socket handlers, connects and focuses the first channel.
    ///
    /// A failed connect is logged; the session stays usable with stale data.
    pub async fn mount(&mut self, channels: Vec<Channel>) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.channels = channels;
        self.bridge.subscribe(&self.events_tx);

        self.connection = ConnectionStatus::Connecting;
        self.publish();
        match self.bridge.connect().await {
            Ok(()) => self.connection = ConnectionStatus::Connected,
            Err(e) => {
                warn!(error = %e, "Socket connect failed");
                self.connection = ConnectionStatus::Error;
            }
        }

        if let Some(first) = self.channels.first().map(|c| c.id().clone()) {
            self.focus(first);
        }
        info!(channels = self.channels.len(), "Chat mounted");
        self.publish();
    }

    /// Leaves the focused channel, cancels timers and removes the socket
    /// handlers registered by [`Self::mount`].
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.stop_local_typing();
        if let Some(previous) = self.focused.take() {
            self.bridge.leave_channel(&previous);
        }
        self.typing.shutdown();
        self.bridge.unsubscribe();
        self.mounted = false;
        info!("Chat unmounted");
        self.publish();
    }

    pub fn select_channel(&mut self, channel_id: &ChannelId) -> Result<(), ChatError> {
        if !self.channels.iter().any(|c| c.id() == channel_id) {
            return Err(ChatError::UnknownChannel(channel_id.to_string()));
        }
        self.focus(channel_id.clone());
        Ok(())
    }

    /// Appends an optimistic message and sends it in the background.
    pub fn send(
        &mut self,
        content: impl Into<String>,
        attachments: Vec<String>,
    ) -> Result<TempId, ChatError> {
        let channel_id = self.focused.clone().ok_or(ChatError::NoFocusedChannel)?;
        let content = content.into();
        if content.trim().is_empty() && attachments.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        self.stop_local_typing();
        let temp_id = self
            .store
            .append_optimistic(&channel_id, content.clone(), &self.local_user);
        self.spawn_send(channel_id, temp_id.clone(), content, attachments);
        Ok(temp_id)
    }

    /// Re-issues a failed send under its original temporary id.
    pub fn retry_send(&mut self, temp_id: &TempId) -> Result<(), ChatError> {
        let channel_id = self
            .channels
            .iter()
            .map(Channel::id)
            .find(|id| self.store.find_by_temp(id, temp_id).is_some())
            .cloned()
            .ok_or_else(|| ChatError::UnknownMessage(temp_id.to_string()))?;
        let Some(content) = self.store.mark_retrying(&channel_id, temp_id) else {
            return Err(ChatError::UnknownMessage(temp_id.to_string()));
        };

        debug!(temp_id = %temp_id, "Retrying send");
        self.spawn_send(channel_id, temp_id.clone(), content, Vec::new());
        Ok(())
    }

    pub fn edit(&mut self, message_id: &MessageId, content: impl Into<String>) -> Result<(), ChatError> {
        let channel_id = self.channel_of(message_id)?;
        let request = EditMessageRequest::new(channel_id, message_id.clone(), content);
        let socket = self.bridge.socket();
        self.spawn_action(message_id.clone(), MessageAction::Edit, async move {
            socket.edit_message(request).await
        });
        Ok(())
    }

    pub fn delete(&mut self, message_id: &MessageId) -> Result<(), ChatError> {
        let channel_id = self.channel_of(message_id)?;
        let socket = self.bridge.socket();
        let id = message_id.clone();
        self.spawn_action(message_id.clone(), MessageAction::Delete, async move {
            socket.delete_message(&channel_id, &id).await
        });
        Ok(())
    }

    pub fn react(&mut self, message_id: &MessageId, emoji: impl Into<String>) -> Result<(), ChatError> {
        let channel_id = self.channel_of(message_id)?;
        let socket = self.bridge.socket();
        let id = message_id.clone();
        let emoji = emoji.into();
        self.spawn_action(message_id.clone(), MessageAction::React, async move {
            socket.add_reaction(&channel_id, &id, &emoji).await
        });
        Ok(())
    }

    /// Requests the page before the oldest loaded message of the focused
    /// channel. Returns `false` when there is nothing more to load.
    pub fn load_older(&mut self) -> Result<bool, ChatError> {
        let channel_id = self.focused.clone().ok_or(ChatError::NoFocusedChannel)?;
        let Some(cursor) = self.store.older_cursor(&channel_id) else {
            return Ok(false);
        };
        Ok(self.start_load(channel_id, LoadMode::Older { cursor }))
    }

    pub fn open_panel(&mut self, panel: PanelState) {
        self.panels.open(panel);
    }

    pub fn toggle_panel(&mut self, panel: PanelState) {
        self.panels.toggle(panel);
    }

    pub fn close_panel(&mut self) {
        self.panels.close();
    }

    pub fn open_thread(&mut self, message_id: &MessageId) -> Result<(), ChatError> {
        let parent = self
            .store
            .find(message_id)
            .cloned()
            .ok_or_else(|| ChatError::UnknownMessage(message_id.to_string()))?;
        self.panels.open(PanelState::thread(parent));
        Ok(())
    }

    pub fn open_direct_message(&mut self, conversation_id: ConversationId) {
        self.panels.open(PanelState::direct_message(conversation_id));
    }

    /// Applies a global keyboard action.
    pub fn handle_action(&mut self, action: Action) -> Result<(), ChatError> {
        if self.panels.handle_action(action) {
            return Ok(());
        }
        match action {
            Action::LoadHistory => self.load_older().map(|_| ()),
            Action::ClearNotifications => {
                self.notifications.clear_all();
                Ok(())
            }
            Action::OpenSearch | Action::ClosePanel | Action::ToggleMembers => Ok(()),
        }
    }

    pub fn join_voice(
        &mut self,
        channel_id: &ChannelId,
        participants: Vec<UserId>,
    ) -> Result<(), ChatError> {
        let channel = self
            .channels
            .iter()
            .find(|c| c.id() == channel_id)
            .ok_or_else(|| ChatError::UnknownChannel(channel_id.to_string()))?;
        if !channel.kind().is_voice() {
            return Err(ChatError::NotVoiceChannel(channel_id.to_string()));
        }
        self.voice.join(channel, participants);
        Ok(())
    }

    pub fn leave_voice(&mut self) {
        self.voice.leave();
    }

    /// Dismisses a notification and focuses its channel.
    ///
    /// A notification for a channel outside the list stays in the feed.
    pub fn open_notification(&mut self, id: NotificationId) -> Result<Option<ChannelId>, ChatError> {
        let Some(channel_id) = self.notifications.channel_of(id).cloned() else {
            return Ok(None);
        };
        if !self.channels.iter().any(|c| c.id() == &channel_id) {
            return Err(ChatError::UnknownChannel(channel_id.to_string()));
        }
        self.notifications.open(id);
        self.select_channel(&channel_id)?;
        Ok(Some(channel_id))
    }

    pub fn dismiss_notification(&mut self, id: NotificationId) {
        self.notifications.dismiss(id);
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear_all();
    }

    /// Forwards composer activity as typing signals for the focused channel.
    pub fn composer_activity(&mut self, typing: bool) {
        if !typing {
            self.stop_local_typing();
            return;
        }
        let Some(channel_id) = self.focused.clone() else {
            return;
        };
        if self.local_typing.as_ref() != Some(&channel_id) {
            self.stop_local_typing();
            self.bridge.start_typing(&channel_id);
            self.local_typing = Some(channel_id);
        }
    }

    pub fn handle_intent(&mut self, intent: ChatIntent) -> Result<(), ChatError> {
        match intent {
            ChatIntent::SelectChannel(channel_id) => self.select_channel(&channel_id),
            ChatIntent::Send {
                content,
                attachments,
            } => self.send(content, attachments).map(|_| ()),
            ChatIntent::RetrySend(temp_id) => self.retry_send(&temp_id),
            ChatIntent::Edit {
                message_id,
                content,
            } => self.edit(&message_id, content),
            ChatIntent::Delete(message_id) => self.delete(&message_id),
            ChatIntent::React { message_id, emoji } => self.react(&message_id, emoji),
            ChatIntent::LoadOlder => self.load_older().map(|_| ()),
            ChatIntent::OpenPanel(panel) => {
                self.open_panel(panel);
                Ok(())
            }
            ChatIntent::TogglePanel(panel) => {
                self.toggle_panel(panel);
                Ok(())
            }
            ChatIntent::OpenThread(message_id) => self.open_thread(&message_id),
            ChatIntent::OpenDirectMessage(conversation_id) => {
                self.open_direct_message(conversation_id);
                Ok(())
            }
            ChatIntent::ClosePanel => {
                self.close_panel();
                Ok(())
            }
            ChatIntent::Shortcut(action) => self.handle_action(action),
            ChatIntent::JoinVoice {
                channel_id,
                participants,
            } => self.join_voice(&channel_id, participants),
            ChatIntent::LeaveVoice => {
                self.leave_voice();
                Ok(())
            }
            ChatIntent::OpenNotification(id) => self.open_notification(id).map(|_| ()),
            ChatIntent::DismissNotification(id) => {
                self.dismiss_notification(id);
                Ok(())
            }
            ChatIntent::ClearNotifications => {
                self.clear_notifications();
                Ok(())
            }
            ChatIntent::ComposerActivity { typing } => {
                self.composer_activity(typing);
                Ok(())
            }
        }
    }

    pub fn handle_event(&mut self, event: OrchestratorEvent) {
        match event {
            OrchestratorEvent::Inbound(event) => self.handle_inbound(event),
            OrchestratorEvent::HistoryLoaded {
                channel_id,
                mode,
                result,
            } => match result {
                Ok(page) if page.success => self.store.apply_page(&channel_id, page, &mode),
                Ok(_) => {
                    warn!(channel_id = %channel_id, "History request reported failure");
                    self.store.fail_load(&channel_id, "history request was not successful");
                }
                Err(e) => {
                    warn!(
                        channel_id = %channel_id,
                        error = %e,
                        recoverable = e.is_recoverable(),
                        "History load failed"
                    );
                    self.store.fail_load(&channel_id, e.to_string());
                }
            },
            OrchestratorEvent::SendCompleted {
                channel_id,
                temp_id,
                result,
            } => match result {
                Ok(ack) => {
                    debug!(temp_id = %temp_id, message_id = %ack.id, "Send acknowledged");
                    self.store.confirm(&channel_id, &temp_id, ack.id);
                }
                Err(e) => {
                    warn!(
                        channel_id = %channel_id,
                        temp_id = %temp_id,
                        error = %e,
                        transport = e.is_transport(),
                        "Send failed"
                    );
                    self.store
                        .mark_send_failed(&channel_id, &temp_id, e.to_string());
                }
            },
            OrchestratorEvent::ActionFailed {
                message_id,
                action,
                error,
            } => {
                warn!(
                    message_id = %message_id,
                    %action,
                    error = %error,
                    recoverable = error.is_recoverable(),
                    "Message action failed"
                );
                self.store
                    .mark_action_failed(&message_id, action, error.to_string());
            }
            OrchestratorEvent::TypingExpired(expiry) => {
                self.typing.expire(&expiry);
            }
        }
    }

    /// Waits for and applies the next internal event.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Applies every event that is already queued.
    pub fn process_ready(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        if handled > 0 {
            self.publish();
        }
        handled
    }

    pub fn sweep_notifications(&mut self) -> usize {
        self.notifications.prune_expired(Utc::now())
    }

    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        let (messages, typing_users, typing_indicator, loading, has_more, history_error) =
            match &self.focused {
                Some(id) => (
                    self.store.messages(id).to_vec(),
                    self.typing.typing_users(id).into_iter().cloned().collect(),
                    self.typing.format_indicator(id),
                    self.store.is_loading(id),
                    self.store.has_more(id),
                    self.store.last_error(id).map(String::from),
                ),
                None => (Vec::new(), Vec::new(), None, false, false, None),
            };

        ChatSnapshot {
            channels: self.channels.clone(),
            focused_channel: self.focused.clone(),
            messages,
            typing_users,
            typing_indicator,
            loading,
            has_more,
            history_error,
            panel: self.panels.current().clone(),
            voice_session: self.voice.session().cloned(),
            notifications: self.notifications.items(),
            unread_counts: self.notifications.unread_counts(),
            presence: self.presence.snapshot(),
            composer_enabled: self.focused.is_some(),
            connection: self.connection,
        }
    }

    /// Drives the orchestrator until every intent sender is dropped, then
    /// unmounts.
    pub async fn run(mut self, mut intents: mpsc::Receiver<ChatIntent>) {
        let mut sweep = tokio::time::interval(self.config.feed_sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                intent = intents.recv() => intent.map_or(Step::Shutdown, Step::Intent),
                Some(event) = self.events_rx.recv() => Step::Event(event),
                _ = sweep.tick() => Step::Sweep,
            };

            match step {
                Step::Intent(intent) => {
                    if let Err(e) = self.handle_intent(intent) {
                        warn!(error = %e, "Intent rejected");
                    }
                }
                Step::Event(event) => self.handle_event(event),
                Step::Sweep => {
                    if self.sweep_notifications() == 0 {
                        continue;
                    }
                }
                Step::Shutdown => break,
            }
            self.publish();
        }

        self.unmount();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn focus(&mut self, channel_id: ChannelId) {
        if self.focused.as_ref() == Some(&channel_id) {
            return;
        }
        if let Some(previous) = self.focused.take() {
            self.stop_local_typing();
            self.bridge.leave_channel(&previous);
        }

        self.bridge.join_channel(&channel_id);
        self.notifications.mark_read(&channel_id);
        self.focused = Some(channel_id.clone());
        debug!(channel_id = %channel_id, "Channel focused");

        if !self.store.is_loaded(&channel_id) {
            self.start_load(channel_id, LoadMode::Initial);
        }
    }

    fn start_load(&mut self, channel_id: ChannelId, mode: LoadMode) -> bool {
        if !self.store.begin_load(&channel_id) {
            debug!(channel_id = %channel_id, "Load already in flight");
            return false;
        }

        let mut query = HistoryQuery::default().with_limit(self.config.history_page_size);
        if let LoadMode::Older { cursor } = &mode {
            query = query.before(cursor.clone());
        }

        let history = Arc::clone(&self.history);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = history.get_messages(&channel_id, query).await;
            let _ = events.send(OrchestratorEvent::HistoryLoaded {
                channel_id,
                mode,
                result,
            });
        });
        true
    }

    fn spawn_send(
        &self,
        channel_id: ChannelId,
        temp_id: TempId,
        content: String,
        attachments: Vec<String>,
    ) {
        let request = SendMessageRequest::new(channel_id.clone(), content, temp_id.clone())
            .with_attachments(attachments);
        let socket = self.bridge.socket();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = socket.send_message(request).await;
            let _ = events.send(OrchestratorEvent::SendCompleted {
                channel_id,
                temp_id,
                result,
            });
        });
    }

    fn spawn_action<F>(&self, message_id: MessageId, action: MessageAction, call: F)
    where
        F: Future<Output = Result<(), ChatError>> + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            if let Err(error) = call.await {
                let _ = events.send(OrchestratorEvent::ActionFailed {
                    message_id,
                    action,
                    error,
                });
            }
        });
    }

    fn channel_of(&self, message_id: &MessageId) -> Result<ChannelId, ChatError> {
        self.store
            .find(message_id)
            .map(|m| m.channel_id().clone())
            .ok_or_else(|| ChatError::UnknownMessage(message_id.to_string()))
    }

    fn stop_local_typing(&mut self) {
        if let Some(channel_id) = self.local_typing.take() {
            self.bridge.stop_typing(&channel_id);
        }
    }

    fn handle_inbound(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::MessageReceived(incoming) => {
                let Some(message) = incoming.into_message() else {
                    debug!("Dropping inbound message without channel id");
                    return;
                };
                self.typing
                    .stop(message.channel_id(), message.author().user_id());

                let outcome = self.store.reconcile(message.clone());
                debug!(channel_id = %message.channel_id(), ?outcome, "Message received");

                let from_self = self.local_user.is(message.author().user_id());
                if outcome == ReconcileOutcome::Appended && !from_self {
                    self.notifications.route(&message, self.focused.as_ref());
                }
            }
            SocketEvent::MessageUpdated(update) => {
                self.store
                    .apply_update(&update.id, update.channel_id.as_ref(), &update.patch);
            }
            SocketEvent::MessageDeleted(deletion) => {
                self.store
                    .apply_delete(&deletion.id, deletion.channel_id.as_ref());
            }
            SocketEvent::UserTyping(signal) => {
                self.typing.start(
                    &signal.channel_id,
                    &signal.user_id,
                    signal.username.as_deref(),
                );
            }
            SocketEvent::UserStoppedTyping(signal) => {
                self.typing.stop(&signal.channel_id, &signal.user_id);
            }
            SocketEvent::UserStatusChanged(change) => {
                self.presence.update(change.user_id, change.status);
            }
        }
    }
}
