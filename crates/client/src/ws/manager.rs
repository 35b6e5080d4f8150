//! Process-wide chat connection shared by every chat view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storefront_shared::ChatMessage;
use tokio::sync::watch;

use super::connection::{ChannelSettings, ChatConnection, ConnectionState};
use super::ChatError;
use crate::stores::{ChatAction, ChatState, Store};

#[derive(Default)]
struct Slot {
    connection: Option<ChatConnection>,
    subscribers: usize,
}

/// Owns at most one broker connection, opened for the first subscriber and
/// closed when the last [`ChatSubscription`] is dropped. Inbound messages are
/// appended to the chat store.
#[derive(Clone)]
pub struct ChatManager {
    slot: Arc<Mutex<Slot>>,
    settings: ChannelSettings,
    chat: Store<ChatState>,
}

impl ChatManager {
    pub fn new(settings: ChannelSettings, chat: Store<ChatState>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            settings,
            chat,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register interest in chat. Must be called inside a tokio runtime.
    pub fn subscribe(&self) -> ChatSubscription {
        let mut slot = self.lock();
        slot.subscribers += 1;

        if slot.connection.is_none() {
            tracing::info!(url = %self.settings.url, "opening chat connection");
            let chat = self.chat.clone();
            slot.connection = Some(ChatConnection::open(self.settings.clone(), move |message| {
                chat.dispatch(ChatAction::Received(message));
            }));
        }

        tracing::debug!(subscribers = slot.subscribers, "chat subscriber added");
        ChatSubscription {
            manager: self.clone(),
        }
    }

    fn release(&self) {
        let closing = {
            let mut slot = self.lock();
            slot.subscribers = slot.subscribers.saturating_sub(1);
            tracing::debug!(subscribers = slot.subscribers, "chat subscriber removed");
            if slot.subscribers == 0 {
                slot.connection.take()
            } else {
                None
            }
        };

        if closing.is_some() {
            tracing::info!(url = %self.settings.url, "last chat subscriber left, disconnecting");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers
    }

    pub fn state(&self) -> ConnectionState {
        self.lock()
            .connection
            .as_ref()
            .map(ChatConnection::state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// State updates of the live connection, if one is open.
    pub fn watch_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.lock().connection.as_ref().map(ChatConnection::watch_state)
    }

    /// Publish through the shared connection.
    pub fn publish(&self, message: &ChatMessage) -> Result<(), ChatError> {
        match self.lock().connection.as_ref() {
            Some(connection) => connection.publish(message),
            None => Err(ChatError::NotConnected),
        }
    }

    pub fn chat(&self) -> &Store<ChatState> {
        &self.chat
    }
}

/// Keeps the shared chat connection open while held.
pub struct ChatSubscription {
    manager: ChatManager,
}

impl ChatSubscription {
    pub fn manager(&self) -> &ChatManager {
        &self.manager
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn publish(&self, message: &ChatMessage) -> Result<(), ChatError> {
        self.manager.publish(message)
    }
}

impl Drop for ChatSubscription {
    fn drop(&mut self) {
        self.manager.release();
    }
}
