use crate::message::Message;

/// Ordered conversation as rendered, oldest first.
///
/// Only the controller mutates it, and only through the transitions below,
/// so that at most one typing placeholder exists and it is always the tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn typing_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_typing).count()
    }

    /// True when a placeholder exists, it is the only one, and it is last.
    pub fn has_typing_tail(&self) -> bool {
        self.typing_count() == 1 && self.last().is_some_and(|m| m.is_typing)
    }

    pub(crate) fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub(crate) fn append_pair(&mut self, first: Message, second: Message) {
        self.messages.reserve(2);
        self.messages.push(first);
        self.messages.push(second);
    }

    /// Swaps the tail for `message`, keeping every earlier position untouched.
    pub(crate) fn replace_last(&mut self, message: Message) {
        self.messages.pop();
        self.messages.push(message);
    }

    pub(crate) fn remove_last_two(&mut self) {
        let keep = self.messages.len().saturating_sub(2);
        self.messages.truncate(keep);
    }
}
