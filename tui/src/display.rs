//! Display State Types
//!
//! Types that represent the current display state for the terminal host.
//! These are derived from [`WidgetMessage`]s and used for rendering.
//!
//! # Design Philosophy
//!
//! The host is a thin client: it renders what the widget tells it to. This
//! module is the single place where rendered nodes become terminal lines.
//!
//! - User text ([`Content::Plain`]) is shown exactly as typed
//! - Bot text ([`Content::Rich`]) is reduced to its text content
//! - Book cards become a short block of styled lines

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use bookchat_core::render::{NO_COVER, REASONING_HEADING};
use bookchat_core::{
    html_to_text, BookCard, Content, ControlState, Cover, NodeId, RenderedNode, Sender, UiState,
    WidgetMessage,
};

use crate::theme::{BOT_ACCENT, CHIP, CHIP_SELECTED, DIM_GRAY, ERROR_RED, LINK_BLUE, USER_GREEN};

/// Header title used until the widget sends its own
pub const DEFAULT_TITLE: &str = "Book Buddy";

/// A node as stored by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayEntry {
    /// Position in the conversation
    pub id: NodeId,
    /// What to render
    pub node: RenderedNode,
}

/// One terminal line and the node it belongs to
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayLine {
    /// Styled content
    pub line: Line<'static>,
    /// Source node (`None` for spacing)
    pub node: Option<NodeId>,
}

impl DisplayLine {
    fn new(line: impl Into<Line<'static>>, node: NodeId) -> Self {
        Self {
            line: line.into(),
            node: Some(node),
        }
    }

    fn blank() -> Self {
        Self {
            line: Line::default(),
            node: None,
        }
    }

    /// Plain text of the line
    pub fn text(&self) -> String {
        self.line
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect()
    }
}

/// Something the user can select with Tab
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selectable {
    /// A suggestion chip
    Chip {
        /// Message carrying the chip
        node: NodeId,
        /// Chip position in that message
        index: usize,
        /// Chip text
        text: String,
    },
    /// A book link
    Book {
        /// Book group carrying the card
        node: NodeId,
        /// Card position in the group
        card: usize,
        /// Link target
        link: String,
    },
}

/// The full display state for the terminal host
#[derive(Clone, Debug)]
pub struct DisplayState {
    /// Header title
    pub title: String,
    /// Conversation nodes in order
    pub entries: Vec<DisplayEntry>,
    /// Widget state
    pub state: UiState,
    /// Control enablement
    pub controls: ControlState,
    /// Node the widget asked to bring into view
    pub scroll_target: Option<NodeId>,
    /// Set when the widget refocused the input
    pub focus_requested: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            entries: Vec::new(),
            state: UiState::Idle,
            controls: ControlState::idle(),
            scroll_target: None,
            focus_requested: false,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a widget message
    pub fn apply_message(&mut self, msg: WidgetMessage) {
        match msg {
            WidgetMessage::NodeAppended { id, node } => {
                self.entries.push(DisplayEntry { id, node });
            }
            WidgetMessage::StateChanged { state, controls } => {
                self.state = state;
                self.controls = controls;
            }
            WidgetMessage::ScrollTo { id } => {
                self.scroll_target = Some(id);
            }
            WidgetMessage::FocusInput => {
                self.focus_requested = true;
            }
            WidgetMessage::Title { text } => {
                self.title = text;
            }
        }
    }

    /// Take the pending scroll request
    pub fn take_scroll_target(&mut self) -> Option<NodeId> {
        self.scroll_target.take()
    }

    /// Take the pending focus request
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Whether the input accepts typing
    pub fn input_enabled(&self) -> bool {
        self.controls.input_enabled
    }

    /// Items reachable with Tab
    ///
    /// Chips of the latest bot message that offered any, then linked cards of
    /// the latest book group.
    pub fn selectables(&self) -> Vec<Selectable> {
        let mut items = Vec::new();

        let chips = self.entries.iter().rev().find_map(|e| match &e.node {
            RenderedNode::Text {
                sender: Sender::Bot,
                suggestions,
                ..
            } if !suggestions.is_empty() => Some((e.id, suggestions)),
            _ => None,
        });
        if let Some((node, suggestions)) = chips {
            items.extend(suggestions.iter().enumerate().map(|(index, text)| {
                Selectable::Chip {
                    node,
                    index,
                    text: text.clone(),
                }
            }));
        }

        let books = self.entries.iter().rev().find_map(|e| match &e.node {
            RenderedNode::BookGroup { cards } => Some((e.id, cards)),
            _ => None,
        });
        if let Some((node, cards)) = books {
            items.extend(cards.iter().enumerate().filter_map(|(card, c)| {
                c.link.as_ref().map(|link| Selectable::Book {
                    node,
                    card,
                    link: link.as_str().to_string(),
                })
            }));
        }

        items
    }

    /// Lay out the conversation for a given width
    pub fn lines(&self, width: usize, selected: Option<&Selectable>) -> Vec<DisplayLine> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            lines.extend(node_lines(entry, &self.title, width, selected));
            lines.push(DisplayLine::blank());
        }
        if self.controls.loading_visible {
            lines.push(DisplayLine {
                line: Line::from(Span::styled(
                    format!("{} is looking...", self.title),
                    Style::default().fg(DIM_GRAY).add_modifier(Modifier::ITALIC),
                )),
                node: None,
            });
        }
        lines
    }
}

/// Text shown for message content
pub fn content_text(content: &Content) -> String {
    match content {
        Content::Plain(text) => text.clone(),
        Content::Rich(markup) => html_to_text(markup),
    }
}

fn wrap_into(
    lines: &mut Vec<DisplayLine>,
    text: &str,
    width: usize,
    style: Style,
    node: NodeId,
) {
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            continue;
        }
        for wrapped in textwrap::wrap(paragraph, width.max(1)) {
            lines.push(DisplayLine::new(
                Span::styled(wrapped.into_owned(), style),
                node,
            ));
        }
    }
}

fn node_lines(
    entry: &DisplayEntry,
    title: &str,
    width: usize,
    selected: Option<&Selectable>,
) -> Vec<DisplayLine> {
    let id = entry.id;
    let mut lines = Vec::new();

    match &entry.node {
        RenderedNode::Text {
            sender,
            content,
            suggestions,
        } => {
            let (prefix, style) = match sender {
                Sender::User => ("You".to_string(), Style::default().fg(USER_GREEN)),
                Sender::Bot => (title.to_string(), Style::default().fg(BOT_ACCENT)),
            };
            let text = format!("{prefix}: {}", content_text(content));
            wrap_into(&mut lines, &text, width, style, id);

            for (index, chip) in suggestions.iter().enumerate() {
                let is_selected = matches!(
                    selected,
                    Some(Selectable::Chip { node, index: i, .. }) if *node == id && *i == index
                );
                let style = if is_selected {
                    Style::default().fg(CHIP_SELECTED).add_modifier(Modifier::REVERSED)
                } else {
                    Style::default().fg(CHIP)
                };
                lines.push(DisplayLine::new(
                    Span::styled(format!("  > {chip}"), style),
                    id,
                ));
            }
        }
        RenderedNode::BookGroup { cards } => {
            for (index, card) in cards.iter().enumerate() {
                let is_selected = matches!(
                    selected,
                    Some(Selectable::Book { node, card: c, .. }) if *node == id && *c == index
                );
                card_lines(&mut lines, card, width, is_selected, id);
            }
        }
        RenderedNode::Notice { text } => {
            wrap_into(
                &mut lines,
                &format!("! {text}"),
                width,
                Style::default().fg(ERROR_RED),
                id,
            );
        }
    }

    lines
}

fn card_lines(
    lines: &mut Vec<DisplayLine>,
    card: &BookCard,
    width: usize,
    selected: bool,
    id: NodeId,
) {
    let inner = width.saturating_sub(4);
    let dim = Style::default().fg(DIM_GRAY);

    lines.push(DisplayLine::new(
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                card.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        id,
    ));
    lines.push(DisplayLine::new(
        Span::styled(format!("  {}", card.byline), dim),
        id,
    ));

    let cover = match &card.cover {
        Cover::Image { alt, .. } => format!("  [{alt}]"),
        Cover::Placeholder => format!("  [{NO_COVER}]"),
    };
    lines.push(DisplayLine::new(Span::styled(cover, dim), id));

    if let Some(ref reasoning) = card.reasoning {
        lines.push(DisplayLine::new(
            Span::styled(
                format!("  {REASONING_HEADING}"),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
            id,
        ));
        let mut block = Vec::new();
        wrap_into(&mut block, reasoning, inner, Style::default(), id);
        lines.extend(block.into_iter().map(|l| indent(l, "    ")));
    }

    let mut block = Vec::new();
    wrap_into(&mut block, &content_text(&card.description), inner, dim, id);
    lines.extend(block.into_iter().map(|l| indent(l, "  ")));

    if let Some(ref link) = card.link {
        let mut style = Style::default().fg(LINK_BLUE).add_modifier(Modifier::UNDERLINED);
        if selected {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(DisplayLine::new(
            Span::styled(format!("  Buy: {link}"), style),
            id,
        ));
    }
}

fn indent(mut line: DisplayLine, prefix: &'static str) -> DisplayLine {
    line.line.spans.insert(0, Span::raw(prefix));
    line
}
