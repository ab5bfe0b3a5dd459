//! In-memory port implementations for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::domain::entities::{ChannelId, MessageId};
use crate::domain::errors::ChatError;
use crate::domain::ports::{
    EditMessageRequest, HistoryPage, HistoryPort, HistoryQuery, IncomingMessage, SendAck,
    SendMessageRequest, SocketEvent, SocketEventKind, SocketHandler, SocketPort,
};
use crate::infrastructure::socket::ListenerRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCall {
    Join(ChannelId),
    Leave(ChannelId),
    Send(SendMessageRequest),
    Edit(EditMessageRequest),
    Delete(MessageId),
    React(MessageId, String),
    StartTyping(ChannelId),
    StopTyping(ChannelId),
}

/// Socket that records calls and hands out ids `msg-42`, `msg-43`, ...
pub struct FakeSocket {
    registry: ListenerRegistry,
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    fail_connect: AtomicBool,
    fail_outbound: AtomicBool,
    next_id: AtomicU64,
    calls: Mutex<Vec<SocketCall>>,
}

impl FakeSocket {
    pub fn new() -> Self {
        Self {
            registry: ListenerRegistry::new(),
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            fail_outbound: AtomicBool::new(false),
            next_id: AtomicU64::new(42),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_outbound(&self, fail: bool) {
        self.fail_outbound.store(fail, Ordering::SeqCst);
    }

    /// Delivers an inbound event to the registered handlers.
    pub fn emit(&self, event: SocketEvent) -> usize {
        self.registry.dispatch(&event)
    }

    pub fn listener_count(&self) -> usize {
        self.registry.count()
    }

    pub fn listeners_for(&self, kind: SocketEventKind) -> usize {
        self.registry.count_for(kind)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<SocketCall> {
        self.calls.lock().clone()
    }

    pub fn joined(&self) -> Vec<ChannelId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SocketCall::Join(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn left(&self) -> Vec<ChannelId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SocketCall::Leave(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SocketCall::Send(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SocketCall) {
        self.calls.lock().push(call);
    }

    fn outbound_result(&self) -> Result<(), ChatError> {
        if self.fail_outbound.load(Ordering::SeqCst) {
            Err(ChatError::transport("connection reset"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SocketPort for FakeSocket {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), ChatError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ChatError::transport("connection refused"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn on(&self, kind: SocketEventKind, handler: SocketHandler) {
        self.registry.on(kind, handler);
    }

    fn off(&self, kind: SocketEventKind, handler: &SocketHandler) {
        self.registry.off(kind, handler);
    }

    fn join_channel(&self, channel_id: &ChannelId) {
        self.record(SocketCall::Join(channel_id.clone()));
    }

    fn leave_channel(&self, channel_id: &ChannelId) {
        self.record(SocketCall::Leave(channel_id.clone()));
    }

    async fn send_message(&self, request: SendMessageRequest) -> Result<SendAck, ChatError> {
        let temp_id = request.temp_id.clone();
        self.record(SocketCall::Send(request));
        self.outbound_result()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(SendAck {
            temp_id,
            id: MessageId::new(format!("msg-{id}")),
        })
    }

    async fn edit_message(&self, request: EditMessageRequest) -> Result<(), ChatError> {
        self.record(SocketCall::Edit(request));
        self.outbound_result()
    }

    async fn delete_message(
        &self,
        _channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), ChatError> {
        self.record(SocketCall::Delete(message_id.clone()));
        self.outbound_result()
    }

    async fn add_reaction(
        &self,
        _channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), ChatError> {
        self.record(SocketCall::React(message_id.clone(), emoji.to_string()));
        self.outbound_result()
    }

    fn start_typing(&self, channel_id: &ChannelId) {
        self.record(SocketCall::StartTyping(channel_id.clone()));
    }

    fn stop_typing(&self, channel_id: &ChannelId) {
        self.record(SocketCall::StopTyping(channel_id.clone()));
    }
}

/// History backend serving canned pages. A gated channel blocks until its
/// gate is released.
#[derive(Default)]
pub struct FakeHistory {
    pages: Mutex<HashMap<ChannelId, HistoryPage>>,
    gates: Mutex<HashMap<ChannelId, oneshot::Receiver<()>>>,
    queries: Mutex<Vec<(ChannelId, HistoryQuery)>>,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, channel_id: &str, messages: Vec<IncomingMessage>) -> Self {
        self.pages
            .lock()
            .insert(ChannelId::from(channel_id), HistoryPage::new(messages, false));
        self
    }

    pub fn set_page(&self, channel_id: &str, page: HistoryPage) {
        self.pages.lock().insert(ChannelId::from(channel_id), page);
    }

    /// Holds the next request for `channel_id` until the sender fires.
    pub fn gate(&self, channel_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(ChannelId::from(channel_id), rx);
        tx
    }

    pub fn queries(&self) -> Vec<(ChannelId, HistoryQuery)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl HistoryPort for FakeHistory {
    async fn get_messages(
        &self,
        channel_id: &ChannelId,
        query: HistoryQuery,
    ) -> Result<HistoryPage, ChatError> {
        self.queries.lock().push((channel_id.clone(), query));

        let gate = self.gates.lock().remove(channel_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        Ok(self
            .pages
            .lock()
            .get(channel_id)
            .cloned()
            .unwrap_or_else(|| HistoryPage::new(Vec::new(), false)))
    }
}

/// Server-shaped message for fixtures.
pub fn incoming(id: &str, channel: &str, user: &str, content: &str) -> IncomingMessage {
    IncomingMessage {
        id: MessageId::from(id),
        temp_id: None,
        channel_id: Some(ChannelId::from(channel)),
        content: content.to_string(),
        user_id: user.into(),
        username: user.to_string(),
        avatar: None,
        timestamp: chrono::Utc::now(),
        edited_at: None,
        pinned: false,
        reactions: Vec::new(),
    }
}
