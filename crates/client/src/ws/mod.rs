//! Realtime chat over a STOMP broker.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  subscribe()   ┌──────────────────────────────┐
//! │ chat view A  │ ─────────────▶ │         ChatManager          │
//! ├──────────────┤                │  (ref-counted, one per app)  │
//! │ chat view B  │ ─────────────▶ └──────────────────────────────┘
//! └──────────────┘                               │ first subscriber opens,
//!                                                │ last one closes
//!                                                ▼
//!                                  ┌──────────────────────────────┐
//!                                  │        ChatConnection        │
//!                                  │ CONNECT → SUBSCRIBE topic    │
//!                                  │ SEND /app/chat.send          │
//!                                  └──────────────────────────────┘
//!                                                │ MESSAGE frames
//!                                                ▼
//!                                  ┌──────────────────────────────┐
//!                                  │    Store<ChatState> (chat)   │
//!                                  └──────────────────────────────┘
//! ```
//!
//! Views read the chat store, not the socket. Holding a [`ChatSubscription`]
//! keeps the connection alive.

mod connection;
mod manager;

use thiserror::Error;

pub use connection::{ChannelSettings, ChatConnection, ConnectionState, ReconnectConfig};
pub use manager::{ChatManager, ChatSubscription};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The broker session is not up; the message was not sent.
    #[error("chat is not connected")]
    NotConnected,
    #[error("failed to encode chat message: {0}")]
    Serialize(String),
}
