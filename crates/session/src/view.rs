#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Whatever renders the conversation. Told to bring the newest message into
/// view after every change to the list.
pub trait ConversationView {
    fn scroll_to_latest(&mut self, behavior: ScrollBehavior);
}

impl ConversationView for () {
    fn scroll_to_latest(&mut self, _behavior: ScrollBehavior) {}
}
