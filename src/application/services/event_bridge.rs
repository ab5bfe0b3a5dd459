//! Adapter between the orchestrator and the socket port.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::application::orchestrator::OrchestratorEvent;
use crate::domain::entities::{ChannelId, MessageId};
use crate::domain::errors::ChatError;
use crate::domain::ports::{
    EditMessageRequest, SendAck, SendMessageRequest, SocketEventKind, SocketHandler, SocketPort,
};

/// Owns the six inbound handlers so the exact same `Arc`s can be removed at
/// teardown.
pub struct EventBridge {
    socket: Arc<dyn SocketPort>,
    handlers: Vec<(SocketEventKind, SocketHandler)>,
}

impl EventBridge {
    #[must_use]
    pub fn new(socket: Arc<dyn SocketPort>) -> Self {
        Self {
            socket,
            handlers: Vec::new(),
        }
    }

    /// Shared socket for spawned outbound calls.
    #[must_use]
    pub fn socket(&self) -> Arc<dyn SocketPort> {
        Arc::clone(&self.socket)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.socket.is_connected()
    }

    /// Connects unless already connected.
    pub async fn connect(&self) -> Result<(), ChatError> {
        if self.socket.is_connected() {
            debug!("Socket already connected");
            return Ok(());
        }
        self.socket.connect().await?;
        info!("Socket connected");
        Ok(())
    }

    pub fn disconnect(&self) {
        self.socket.disconnect();
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Registers one handler per inbound kind, each forwarding into `sink`.
    /// Calling it again while subscribed does nothing.
    pub fn subscribe(&mut self, sink: &UnboundedSender<OrchestratorEvent>) {
        if self.is_subscribed() {
            return;
        }

        for kind in SocketEventKind::ALL {
            let sink = sink.clone();
            let handler: SocketHandler = Arc::new(move |event| {
                let _ = sink.send(OrchestratorEvent::Inbound(event));
            });
            self.socket.on(kind, Arc::clone(&handler));
            self.handlers.push((kind, handler));
        }
        debug!(count = self.handlers.len(), "Socket handlers registered");
    }

    /// Removes exactly the handlers added by [`Self::subscribe`].
    pub fn unsubscribe(&mut self) {
        for (kind, handler) in self.handlers.drain(..) {
            self.socket.off(kind, &handler);
        }
        debug!("Socket handlers removed");
    }

    pub fn join_channel(&self, channel_id: &ChannelId) {
        debug!(channel_id = %channel_id, "Joining channel");
        self.socket.join_channel(channel_id);
    }

    pub fn leave_channel(&self, channel_id: &ChannelId) {
        debug!(channel_id = %channel_id, "Leaving channel");
        self.socket.leave_channel(channel_id);
    }

    pub fn start_typing(&self, channel_id: &ChannelId) {
        self.socket.start_typing(channel_id);
    }

    pub fn stop_typing(&self, channel_id: &ChannelId) {
        self.socket.stop_typing(channel_id);
    }

    pub async fn send_message(&self, request: SendMessageRequest) -> Result<SendAck, ChatError> {
        self.socket.send_message(request).await
    }

    pub async fn edit_message(&self, request: EditMessageRequest) -> Result<(), ChatError> {
        self.socket.edit_message(request).await
    }

    pub async fn delete_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), ChatError> {
        self.socket.delete_message(channel_id, message_id).await
    }

    pub async fn add_reaction(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), ChatError> {
        self.socket.add_reaction(channel_id, message_id, emoji).await
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeSocket;
    use crate::domain::entities::UserId;
    use crate::domain::ports::{SocketEvent, TypingSignal};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_subscribe_registers_one_handler_per_kind() {
        let socket = Arc::new(FakeSocket::new());
        let mut bridge = EventBridge::new(socket.clone());
        let (tx, _rx) = mpsc::unbounded_channel();

        bridge.subscribe(&tx);
        bridge.subscribe(&tx);

        assert_eq!(socket.listener_count(), SocketEventKind::ALL.len());
        for kind in SocketEventKind::ALL {
            assert_eq!(socket.listeners_for(kind), 1);
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_same_handlers() {
        let socket = Arc::new(FakeSocket::new());
        let mut bridge = EventBridge::new(socket.clone());
        let (tx, _rx) = mpsc::unbounded_channel();

        bridge.subscribe(&tx);
        bridge.unsubscribe();

        assert_eq!(socket.listener_count(), 0);
        assert!(!bridge.is_subscribed());
    }

    #[tokio::test]
    async fn test_inbound_events_are_forwarded() {
        let socket = Arc::new(FakeSocket::new());
        let mut bridge = EventBridge::new(socket.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        bridge.subscribe(&tx);

        socket.emit(SocketEvent::UserTyping(TypingSignal {
            channel_id: ChannelId::from("general"),
            user_id: UserId::from("bob"),
            username: None,
        }));

        let event = rx.recv().await;
        assert!(matches!(
            event,
            Some(OrchestratorEvent::Inbound(SocketEvent::UserTyping(_)))
        ));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let socket = Arc::new(FakeSocket::new());
        let bridge = EventBridge::new(socket.clone());

        bridge.connect().await.unwrap();
        bridge.connect().await.unwrap();

        assert_eq!(socket.connect_calls(), 1);
        assert!(bridge.is_connected());
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let socket = Arc::new(FakeSocket::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        {
            let mut bridge = EventBridge::new(socket.clone());
            bridge.subscribe(&tx);
            assert_eq!(socket.listener_count(), 6);
        }

        assert_eq!(socket.listener_count(), 0);
    }
}
