//! Chat transcript for the current session.

use storefront_shared::ChatMessage;

use super::Reducer;

#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    Received(ChatMessage),
}

/// Messages in arrival order. Nothing is removed or de-duplicated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatState {
    messages: Vec<ChatMessage>,
}

impl ChatState {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Reducer for ChatState {
    type Action = ChatAction;

    fn reduce(&mut self, action: ChatAction) {
        match action {
            ChatAction::Received(message) => self.messages.push(message),
        }
    }
}
