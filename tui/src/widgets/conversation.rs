//! Conversation Widget
//!
//! A borderless, scrollable view over laid-out conversation lines. Scrolling
//! is measured from the bottom so new nodes stay in view by default.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{StatefulWidget, Widget};

use bookchat_core::NodeId;

use crate::display::DisplayLine;
use crate::theme::{FADE_FAR, FADE_NEAR};

/// Scroll state for the conversation view
#[derive(Debug, Default)]
pub struct ConversationState {
    /// Scroll offset (lines from bottom, 0 = latest)
    pub scroll_offset: usize,
    /// Total content lines at last render
    pub total_lines: usize,
    /// Visible height at last render
    pub height: usize,
}

impl ConversationState {
    /// Scroll up (towards older lines)
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(self.height);
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    /// Scroll down (towards newer lines)
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Jump to the latest line
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Bring a node's first line into view
    ///
    /// Returns false when the node has no lines.
    pub fn scroll_to_node(&mut self, lines: &[DisplayLine], node: NodeId, height: usize) -> bool {
        let Some(first) = lines.iter().position(|l| l.node == Some(node)) else {
            return false;
        };
        let visible_end = (first + height).min(lines.len());
        self.scroll_offset = lines.len() - visible_end;
        true
    }

    /// Page size for PgUp/PgDn
    pub fn page(&self) -> usize {
        (self.height / 2).max(1)
    }
}

/// Scrollable conversation view
pub struct ConversationView<'a> {
    lines: &'a [DisplayLine],
}

impl<'a> ConversationView<'a> {
    /// View over pre-wrapped lines
    pub fn new(lines: &'a [DisplayLine]) -> Self {
        Self { lines }
    }
}

impl StatefulWidget for ConversationView<'_> {
    type State = ConversationState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let height = area.height as usize;
        state.total_lines = self.lines.len();
        state.height = height;

        // Clamp scroll
        let max_scroll = state.total_lines.saturating_sub(height);
        state.scroll_offset = state.scroll_offset.min(max_scroll);

        let visible_end = state.total_lines - state.scroll_offset;
        let visible_start = visible_end.saturating_sub(height);

        let has_content_above = visible_start > 0;
        let has_content_below = state.scroll_offset > 0;

        for (i, display_line) in self.lines[visible_start..visible_end].iter().enumerate() {
            let y = area.y + u16::try_from(i).unwrap_or(u16::MAX);
            let row = Rect::new(area.x, y, area.width, 1);

            let fade = if has_content_above && i < 2 {
                Some(if i == 0 { FADE_FAR } else { FADE_NEAR })
            } else if has_content_below && i >= height.saturating_sub(2) {
                Some(if i + 1 == height { FADE_FAR } else { FADE_NEAR })
            } else {
                None
            };

            match fade {
                Some(shade) => {
                    let text = display_line.text();
                    buf.set_stringn(
                        area.x,
                        y,
                        &text,
                        area.width as usize,
                        Style::default().fg(shade),
                    );
                }
                None => display_line.line.clone().render(row, buf),
            }
        }
    }
}
