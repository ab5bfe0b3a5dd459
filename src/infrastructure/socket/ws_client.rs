//! WebSocket implementation of the socket port.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, trace, warn};

use super::frames::{ClientFrame, ReplyFrame, ServerFrame, decode_server_frame};
use super::registry::ListenerRegistry;
use crate::domain::entities::{ChannelId, MessageId};
use crate::domain::errors::ChatError;
use crate::domain::ports::{
    EditMessageRequest, SendAck, SendMessageRequest, SocketEventKind, SocketHandler, SocketPort,
};

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

type PendingReplies = Arc<Mutex<HashMap<u64, oneshot::Sender<ReplyFrame>>>>;

/// Socket client speaking JSON frames over a WebSocket.
///
/// Requests are correlated with replies by `requestId`. A request that gets
/// no reply within the configured timeout fails with `ChatError::Timeout`.
pub struct WsSocketClient {
    url: String,
    request_timeout: Duration,
    listeners: Arc<ListenerRegistry>,
    pending: PendingReplies,
    outbound: Mutex<Option<mpsc::UnboundedSender<WsMessage>>>,
    connected: Arc<AtomicBool>,
    next_request: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WsSocketClient {
    #[must_use]
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            request_timeout,
            listeners: Arc::new(ListenerRegistry::new()),
            pending: Arc::new(Mutex::new(HashMap::new())),
            outbound: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            next_request: AtomicU64::new(1),
            tasks: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.count()
    }

    fn send_frame(&self, frame: &ClientFrame) -> Result<(), ChatError> {
        let json = frame.encode()?;
        let outbound = self.outbound.lock().clone().ok_or(ChatError::NotConnected)?;
        outbound
            .send(WsMessage::Text(json.into()))
            .map_err(|_| ChatError::NotConnected)
    }

    fn notify(&self, frame: &ClientFrame) {
        if let Err(e) = self.send_frame(frame) {
            warn!(error = %e, "Failed to send socket frame");
        }
    }

    async fn request(
        &self,
        build: impl FnOnce(u64) -> ClientFrame + Send,
    ) -> Result<ReplyFrame, ChatError> {
        let request_id = self.next_request.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(request_id, tx);

        if let Err(e) = self.send_frame(&build(request_id)) {
            self.pending.lock().remove(&request_id);
            return Err(e);
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(reply)) => reply.into_result(),
            Ok(Err(_)) => Err(ChatError::NotConnected),
            Err(_) => {
                self.pending.lock().remove(&request_id);
                Err(ChatError::Timeout {
                    timeout_ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }
}

#[async_trait]
impl SocketPort for WsSocketClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), ChatError> {
        if self.is_connected() {
            return Ok(());
        }

        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(self.url.as_str()))
            .await
            .map_err(|_| ChatError::Timeout {
                timeout_ms: u64::try_from(CONNECTION_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|e| ChatError::transport(e.to_string()))?;

        let (mut writer, mut reader) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<WsMessage>();

        let writer_task = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = writer.send(message).await {
                    warn!(error = %e, "WebSocket write failed");
                    break;
                }
            }
            let _ = writer.close().await;
            debug!("WebSocket writer stopped");
        });

        let listeners = Arc::clone(&self.listeners);
        let pending = Arc::clone(&self.pending);
        let connected = Arc::clone(&self.connected);
        let pong_tx = outbound_tx.clone();
        let reader_task = tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                match message {
                    Ok(WsMessage::Text(text)) => match decode_server_frame(&text) {
                        Ok(ServerFrame::Reply(reply)) => {
                            let waiter = pending.lock().remove(&reply.request_id);
                            match waiter {
                                Some(tx) => {
                                    let _ = tx.send(reply);
                                }
                                None => trace!(request_id = reply.request_id, "Late reply dropped"),
                            }
                        }
                        Ok(ServerFrame::Event(event)) => {
                            let handled = listeners.dispatch(&event);
                            trace!(kind = %event.kind(), handled, "Socket event dispatched");
                        }
                        Err(e) => debug!(error = %e, "Skipping undecodable frame"),
                    },
                    Ok(WsMessage::Ping(data)) => {
                        let _ = pong_tx.send(WsMessage::Pong(data));
                    }
                    Ok(WsMessage::Close(frame)) => {
                        info!(?frame, "WebSocket closed by server");
                        break;
                    }
                    Ok(WsMessage::Binary(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => {}
                    Err(e) => {
                        warn!(error = %e, "WebSocket read failed");
                        break;
                    }
                }
            }
            connected.store(false, Ordering::SeqCst);
            pending.lock().clear();
        });

        *self.outbound.lock() = Some(outbound_tx);
        {
            let mut tasks = self.tasks.lock();
            tasks.retain(|task| !task.is_finished());
            tasks.push(writer_task);
            tasks.push(reader_task);
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(url = %self.url, "WebSocket connected");
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.outbound.lock().take();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.pending.lock().clear();
        debug!("WebSocket connection closed");
    }

    fn on(&self, kind: SocketEventKind, handler: SocketHandler) {
        self.listeners.on(kind, handler);
    }

    fn off(&self, kind: SocketEventKind, handler: &SocketHandler) {
        if !self.listeners.off(kind, handler) {
            debug!(%kind, "Removing handler that was not registered");
        }
    }

    fn join_channel(&self, channel_id: &ChannelId) {
        self.notify(&ClientFrame::JoinChannel {
            channel_id: channel_id.clone(),
        });
    }

    fn leave_channel(&self, channel_id: &ChannelId) {
        self.notify(&ClientFrame::LeaveChannel {
            channel_id: channel_id.clone(),
        });
    }

    async fn send_message(&self, request: SendMessageRequest) -> Result<SendAck, ChatError> {
        let temp_id = request.temp_id.clone();
        let reply = self
            .request(move |request_id| ClientFrame::SendMessage {
                request_id,
                channel_id: request.channel_id,
                content: request.content,
                attachments: request.attachments,
                temp_id: request.temp_id,
            })
            .await?;

        let id = reply
            .id
            .ok_or_else(|| ChatError::protocol("send reply without message id"))?;
        Ok(SendAck {
            temp_id: reply.temp_id.unwrap_or(temp_id),
            id,
        })
    }

    async fn edit_message(&self, request: EditMessageRequest) -> Result<(), ChatError> {
        self.request(move |request_id| ClientFrame::EditMessage {
            request_id,
            channel_id: request.channel_id,
            message_id: request.message_id,
            content: request.content,
        })
        .await
        .map(|_| ())
    }

    async fn delete_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), ChatError> {
        let channel_id = channel_id.clone();
        let message_id = message_id.clone();
        self.request(move |request_id| ClientFrame::DeleteMessage {
            request_id,
            channel_id,
            message_id,
        })
        .await
        .map(|_| ())
    }

    async fn add_reaction(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), ChatError> {
        let channel_id = channel_id.clone();
        let message_id = message_id.clone();
        let emoji = emoji.to_string();
        self.request(move |request_id| ClientFrame::AddReaction {
            request_id,
            channel_id,
            message_id,
            emoji,
        })
        .await
        .map(|_| ())
    }

    fn start_typing(&self, channel_id: &ChannelId) {
        self.notify(&ClientFrame::TypingStart {
            channel_id: channel_id.clone(),
        });
    }

    fn stop_typing(&self, channel_id: &ChannelId) {
        self.notify(&ClientFrame::TypingStop {
            channel_id: channel_id.clone(),
        });
    }
}

impl Drop for WsSocketClient {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}
