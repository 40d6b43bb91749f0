use courier_session::{ConversationView, ScrollBehavior};

/// Vertical scroll of the message pane, in rendered lines from the top.
///
/// While following the tail, a smooth request eases the offset toward the
/// bottom on each tick instead of jumping there.
#[derive(Debug, Default)]
pub struct ScrollState {
    offset: u16,
    max: u16,
    follow: bool,
    jump: bool,
}

impl ScrollState {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    /// Records the current content and pane height, returning the offset to render at.
    pub fn viewport(&mut self, total_lines: usize, height: u16) -> u16 {
        let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
        self.max = total.saturating_sub(height);
        if self.jump {
            self.offset = self.max;
            self.jump = false;
        }
        self.offset = self.offset.min(self.max);
        self.offset
    }

    /// Advances a smooth scroll by half the remaining distance. Returns whether anything moved.
    pub fn tick(&mut self) -> bool {
        if !self.follow || self.offset >= self.max {
            return false;
        }
        let remaining = self.max - self.offset;
        self.offset += remaining.div_ceil(2);
        true
    }

    pub fn page_up(&mut self, lines: u16) {
        self.follow = false;
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn page_down(&mut self, lines: u16) {
        self.offset = self.offset.saturating_add(lines).min(self.max);
        if self.offset == self.max {
            self.follow = true;
        }
    }
}

impl ConversationView for ScrollState {
    fn scroll_to_latest(&mut self, behavior: ScrollBehavior) {
        self.follow = true;
        self.jump = behavior == ScrollBehavior::Instant;
    }
}
