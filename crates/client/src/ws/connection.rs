//! STOMP-over-WebSocket chat connection with fixed-delay reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use storefront_shared::{
    ChatMessage, StompCommand, StompFrame, CHAT_SEND_DESTINATION, CHAT_TOPIC,
    DEFAULT_RECONNECT_DELAY_MS,
};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::ChatError;

/// Connection state for the chat socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Reconnect behavior: a fixed pause between attempts, no backoff
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

/// Where and how to reach the broker.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Full WebSocket URL, e.g. `ws://localhost:9900/chat`.
    pub url: String,
    /// Value of the STOMP `host` header.
    pub broker_host: String,
    pub reconnect: ReconnectConfig,
}

type BrokerStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    /// Serialized `ChatMessage` body.
    Publish(String),
    Disconnect,
}

enum SessionEnd {
    Shutdown,
    Closed,
    Failed(String),
}

/// A managed chat connection. Dropping it disconnects from the broker.
pub struct ChatConnection {
    state: watch::Receiver<ConnectionState>,
    sender: UnboundedSender<Command>,
}

impl ChatConnection {
    /// Spawn the connection loop on the current tokio runtime.
    pub fn open(
        settings: ChannelSettings,
        on_message: impl Fn(ChatMessage) + Send + Sync + 'static,
    ) -> Self {
        let (sender, receiver) = unbounded();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);

        tokio::spawn(run_loop(settings, state_tx, receiver, Arc::new(on_message)));

        Self { state, sender }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    /// Receiver woken on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Send a message to the chat destination.
    ///
    /// Fails with [`ChatError::NotConnected`] unless the broker session is up;
    /// nothing is queued for later.
    pub fn publish(&self, message: &ChatMessage) -> Result<(), ChatError> {
        if !self.is_connected() {
            return Err(ChatError::NotConnected);
        }
        let body = serde_json::to_string(message).map_err(|e| ChatError::Serialize(e.to_string()))?;
        self.sender
            .unbounded_send(Command::Publish(body))
            .map_err(|_| ChatError::NotConnected)
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        let _ = self.sender.unbounded_send(Command::Disconnect);
    }
}

async fn run_loop(
    settings: ChannelSettings,
    state: watch::Sender<ConnectionState>,
    mut commands: UnboundedReceiver<Command>,
    on_message: Arc<dyn Fn(ChatMessage) + Send + Sync>,
) {
    loop {
        state.send_replace(ConnectionState::Connecting);

        let end = session(&settings, &state, &mut commands, on_message.as_ref()).await;
        state.send_replace(ConnectionState::Disconnected);

        match end {
            SessionEnd::Shutdown => {
                tracing::info!(url = %settings.url, "chat connection closed");
                break;
            }
            SessionEnd::Closed => tracing::info!(url = %settings.url, "chat connection lost"),
            SessionEnd::Failed(reason) => {
                tracing::error!(url = %settings.url, %reason, "chat connection error")
            }
        }

        tracing::info!(
            url = %settings.url,
            delay_ms = settings.reconnect.delay.as_millis() as u64,
            "reconnecting to chat"
        );
        tokio::select! {
            _ = tokio::time::sleep(settings.reconnect.delay) => {}
            _ = wait_for_disconnect(&mut commands) => break,
        }
    }
}

/// Resolve once a disconnect is requested or every handle is gone, dropping
/// any publish that arrives in the meantime.
async fn wait_for_disconnect(commands: &mut UnboundedReceiver<Command>) {
    while let Some(cmd) = commands.next().await {
        match cmd {
            Command::Publish(_) => tracing::warn!("chat message dropped: not connected"),
            Command::Disconnect => return,
        }
    }
}

/// Open the socket and complete the STOMP CONNECT/CONNECTED exchange.
async fn handshake(settings: &ChannelSettings) -> Result<BrokerStream, String> {
    let (mut ws_stream, _response) = connect_async(settings.url.as_str())
        .await
        .map_err(|e| e.to_string())?;

    let connect = StompFrame::connect(&settings.broker_host).encode();
    ws_stream
        .send(Message::Text(connect.into()))
        .await
        .map_err(|e| e.to_string())?;

    loop {
        match ws_stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let frames = StompFrame::parse_all(text.as_str()).map_err(|e| e.to_string())?;
                for frame in frames {
                    match frame.command {
                        StompCommand::Connected => return Ok(ws_stream),
                        StompCommand::Error => return Err(broker_error(&frame)),
                        _ => {}
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return Err("closed during handshake".to_string()),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.to_string()),
        }
    }
}

async fn session(
    settings: &ChannelSettings,
    state: &watch::Sender<ConnectionState>,
    commands: &mut UnboundedReceiver<Command>,
    on_message: &(dyn Fn(ChatMessage) + Send + Sync),
) -> SessionEnd {
    let ws_stream = tokio::select! {
        result = handshake(settings) => match result {
            Ok(ws_stream) => ws_stream,
            Err(reason) => return SessionEnd::Failed(reason),
        },
        _ = wait_for_disconnect(commands) => return SessionEnd::Shutdown,
    };
    let (mut write, mut read) = ws_stream.split();

    let subscription_id = format!("sub-{}", uuid::Uuid::new_v4());
    let subscribe = StompFrame::subscribe(&subscription_id, CHAT_TOPIC).encode();
    if let Err(e) = write.send(Message::Text(subscribe.into())).await {
        return SessionEnd::Failed(e.to_string());
    }

    state.send_replace(ConnectionState::Connected);
    tracing::info!(url = %settings.url, topic = CHAT_TOPIC, "chat connected");

    loop {
        tokio::select! {
            cmd = commands.next() => match cmd {
                Some(Command::Publish(body)) => {
                    let frame = StompFrame::send_json(CHAT_SEND_DESTINATION, body).encode();
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        return SessionEnd::Failed(format!("send failed: {e}"));
                    }
                }
                Some(Command::Disconnect) | None => {
                    let _ = write.send(Message::Text(StompFrame::disconnect().encode().into())).await;
                    let _ = write.close().await;
                    return SessionEnd::Shutdown;
                }
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let frames = match StompFrame::parse_all(text.as_str()) {
                        Ok(frames) => frames,
                        Err(e) => {
                            tracing::warn!(error = %e, "unparseable chat frame");
                            continue;
                        }
                    };
                    for frame in frames {
                        match frame.command {
                            StompCommand::Message => deliver(&frame, on_message),
                            StompCommand::Error => return SessionEnd::Failed(broker_error(&frame)),
                            other => tracing::debug!(command = %other, "ignoring chat frame"),
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
            },
        }
    }
}

fn deliver(frame: &StompFrame, on_message: &(dyn Fn(ChatMessage) + Send + Sync)) {
    if frame.get("destination").is_some_and(|d| d != CHAT_TOPIC) {
        return;
    }
    match serde_json::from_str::<ChatMessage>(&frame.body) {
        Ok(message) => {
            tracing::debug!(sender = %message.sender, "chat message received");
            on_message(message);
        }
        Err(e) => tracing::warn!(error = %e, body = %frame.body, "malformed chat message"),
    }
}

fn broker_error(frame: &StompFrame) -> String {
    frame
        .get("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.clone())
}
