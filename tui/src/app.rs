//! Main Application
//!
//! The App struct manages the terminal lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize)
//! - WidgetClient for the conversation
//! - DisplayState for rendering
//!
//! The App:
//! 1. Converts key presses into widget operations
//! 2. Receives WidgetMessages and updates DisplayState
//! 3. Renders based on DisplayState

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::{Frame, Terminal};

use bookchat_core::{ChatTransport, HttpTransport, NodeId, SubmitOutcome, UiState, WidgetConfig};

use crate::client::WidgetClient;
use crate::display::{DisplayLine, DisplayState, Selectable};
use crate::theme::{DIM_GRAY, ERROR_RED, HEADER, LINK_BLUE, USER_GREEN};
use crate::widgets::{ConversationState, ConversationView};

/// Input box height (lines) for text wrapping
const INPUT_HEIGHT: u16 = 4;

/// Lines moved per mouse wheel step
const WHEEL_STEP: usize = 3;

/// Main application state
pub struct App<T: ChatTransport + 'static = HttpTransport> {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Has the widget been mounted?
    mounted: bool,

    // === Widget Integration ===
    /// Client for the embedded widget
    client: WidgetClient<T>,
    /// Display state derived from WidgetMessages
    display: DisplayState,

    // === Input State ===
    /// User input buffer
    input_buffer: String,
    /// Index into the current selectables (Tab cycling)
    selection: Option<usize>,
    /// One-line note shown in the status bar
    status_note: Option<String>,

    // === Scroll State ===
    conversation: ConversationState,
    /// Node to bring into view on the next render
    pending_scroll: Option<NodeId>,
}

impl App<HttpTransport> {
    /// Create an App talking to the configured endpoint
    #[must_use]
    pub fn new(config: WidgetConfig) -> Self {
        Self::with_client(WidgetClient::from_config(config))
    }
}

impl<T: ChatTransport + 'static> App<T> {
    /// Create an App around an existing client
    pub fn with_client(client: WidgetClient<T>) -> Self {
        Self {
            running: true,
            mounted: false,
            client,
            display: DisplayState::new(),
            input_buffer: String::new(),
            selection: None,
            status_note: None,
            conversation: ConversationState::default(),
            pending_scroll: None,
        }
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let frame_duration = Duration::from_millis(50);

        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Check for terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => tracing::warn!("Terminal event error: {}", e),
                        None => self.running = false,
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(Duration::from_millis(16)) => {
                    if !self.mounted {
                        self.mounted = true;
                        self.client.mount().await;
                    }
                }
            }

            // Apply a finished response, if any
            self.client.poll_response().await;

            // Receive and process messages from the widget
            self.process_widget_messages();

            self.render(terminal)?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Process all pending messages from the widget
    fn process_widget_messages(&mut self) {
        let messages = self.client.recv_all();
        if messages.is_empty() {
            return;
        }

        for msg in messages {
            self.display.apply_message(msg);
        }

        if let Some(target) = self.display.take_scroll_target() {
            self.pending_scroll = Some(target);
        }
        if self.display.take_focus_request() {
            self.selection = None;
        }

        // Selectables may have changed underneath the cursor
        let count = self.display.selectables().len();
        if self.selection.is_some_and(|i| i >= count) {
            self.selection = None;
        }
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: event::KeyEvent) {
        match key.code {
            // Quit
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Esc => {
                if self.selection.take().is_none() {
                    self.running = false;
                }
            }

            // Chip and link selection
            KeyCode::Tab => self.cycle_selection(true),
            KeyCode::BackTab => self.cycle_selection(false),

            // Submit message or activate selection
            KeyCode::Enter => {
                if self.selection.is_some() {
                    self.activate_selection().await;
                } else {
                    self.submit_input().await;
                }
            }

            // Typing
            KeyCode::Char(c) => {
                if self.display.input_enabled() {
                    self.selection = None;
                    self.input_buffer.push(c);
                }
            }
            KeyCode::Backspace => {
                if self.display.input_enabled() {
                    self.input_buffer.pop();
                }
            }

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = self.conversation.page();
                self.conversation.scroll_up(page);
            }
            KeyCode::PageDown => {
                let page = self.conversation.page();
                self.conversation.scroll_down(page);
            }
            KeyCode::Home if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.conversation.scroll_up(usize::MAX / 2);
            }
            KeyCode::End if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.conversation.scroll_to_bottom();
            }

            _ => {}
        }
    }

    /// Handle mouse input
    fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.conversation.scroll_up(WHEEL_STEP),
            MouseEventKind::ScrollDown => self.conversation.scroll_down(WHEEL_STEP),
            _ => {}
        }
    }

    fn cycle_selection(&mut self, forward: bool) {
        let count = self.display.selectables().len();
        if count == 0 {
            self.selection = None;
            return;
        }
        self.selection = Some(match (self.selection, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        });
    }

    fn selected(&self) -> Option<Selectable> {
        let index = self.selection?;
        self.display.selectables().into_iter().nth(index)
    }

    async fn activate_selection(&mut self) {
        let Some(selected) = self.selected() else {
            self.selection = None;
            return;
        };

        match selected {
            Selectable::Chip { text, .. } => {
                if self.client.click_suggestion(&text).await == SubmitOutcome::Sent {
                    self.selection = None;
                    self.conversation.scroll_to_bottom();
                }
            }
            Selectable::Book { node, card, link } => {
                self.client.track_book_click(node, card);
                self.status_note = Some(format!("Open: {link}"));
            }
        }
    }

    async fn submit_input(&mut self) {
        if self.client.submit(&self.input_buffer).await == SubmitOutcome::Sent {
            self.input_buffer.clear();
            self.status_note = None;
            self.conversation.scroll_to_bottom();
        }
    }

    /// Draw a frame
    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let selected = self.selected();
        let width = terminal.size()?.width.saturating_sub(1) as usize;
        let lines = self.display.lines(width.max(10), selected.as_ref());

        terminal.draw(|frame| {
            let [header, body, input, status] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(1),
            ])
            .areas(frame.area());

            if let Some(target) = self.pending_scroll.take() {
                let is_latest = self.display.entries.last().map(|e| e.id) == Some(target);
                if is_latest {
                    self.conversation.scroll_to_bottom();
                } else {
                    self.conversation
                        .scroll_to_node(&lines, target, body.height as usize);
                }
            }

            render_header(frame, header, &self.display.title);
            frame.render_stateful_widget(ConversationView::new(&lines), body, &mut self.conversation);
            render_input(frame, input, &self.input_buffer, self.display.input_enabled());
            render_status(
                frame,
                status,
                self.display.state,
                self.conversation.scroll_offset,
                self.status_note.as_deref(),
            );
        })?;

        Ok(())
    }
}

fn render_header(frame: &mut Frame, area: Rect, title: &str) {
    let line = Line::from(Span::styled(
        format!(" {title}"),
        Style::default().fg(HEADER).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(line, area);
}

/// Render the input box
fn render_input(frame: &mut Frame, area: Rect, buffer: &str, enabled: bool) {
    let separator = "-".repeat(area.width as usize);
    frame.render_widget(
        Line::from(Span::styled(separator, Style::default().fg(DIM_GRAY))),
        Rect::new(area.x, area.y, area.width, 1),
    );

    let text_height = area.height.saturating_sub(1) as usize;
    let text_width = area.width.saturating_sub(1) as usize;
    if text_width < 5 || text_height < 1 {
        return;
    }

    let (full_input, style) = if enabled {
        (format!("You: {buffer}_"), Style::default().fg(USER_GREEN))
    } else {
        (format!("You: {buffer}"), Style::default().fg(DIM_GRAY))
    };
    let wrapped: Vec<DisplayLine> = textwrap::wrap(&full_input, text_width)
        .into_iter()
        .map(|s| DisplayLine {
            line: Line::from(Span::styled(s.into_owned(), style)),
            node: None,
        })
        .collect();

    // Keep the cursor end visible
    let skip = wrapped.len().saturating_sub(text_height);
    for (i, line) in wrapped.into_iter().skip(skip).enumerate() {
        let y = area.y + 1 + u16::try_from(i).unwrap_or(u16::MAX);
        if y < area.y + area.height {
            frame.render_widget(line.line, Rect::new(area.x, y, area.width, 1));
        }
    }
}

/// Render status bar
fn render_status(
    frame: &mut Frame,
    area: Rect,
    state: UiState,
    scroll_offset: usize,
    note: Option<&str>,
) {
    let status_style = match state {
        UiState::AwaitingResponse => Style::default().fg(HEADER),
        UiState::Error => Style::default().fg(ERROR_RED),
        UiState::Idle => Style::default().fg(DIM_GRAY),
    };

    let scroll_info = if scroll_offset > 0 {
        format!(" [^{scroll_offset} lines - PgDn to scroll]")
    } else {
        String::new()
    };

    let mut spans = vec![Span::styled(
        format!(
            " {} | Tab select | Enter send | Esc to quit | PgUp/PgDn scroll{}",
            state.description(),
            scroll_info
        ),
        status_style,
    )];
    if let Some(note) = note {
        spans.push(Span::styled(
            format!(" | {note}"),
            Style::default().fg(LINK_BLUE),
        ));
    }

    frame.render_widget(Line::from(spans), area);
}

/// Restore the terminal after a run
pub fn restore_terminal() -> io::Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )
}
