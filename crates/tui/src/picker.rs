//! Full-screen (or inline) list picker.
//!
//! [`PickerState`] is a pure state machine over key events so it can be
//! tested without a terminal; [`run_picker`] owns the terminal lifecycle and
//! blocks until the user picks an entry, cancels, or `cancel` fires.

use std::io::Stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerItem {
    pub label: String,
    /// Muted trailing text, e.g. an id or a warning.
    pub detail: Option<String>,
}

impl PickerItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerOutcome {
    Pending,
    Selected(usize),
    Cancelled,
}

/// How the picker occupies the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerOptions {
    pub fullscreen: bool,
    pub mouse: bool,
}

#[derive(Debug, Clone)]
pub struct PickerState {
    title: String,
    items: Vec<PickerItem>,
    list_state: ListState,
}

impl PickerState {
    pub fn new(title: impl Into<String>, items: Vec<PickerItem>) -> Self {
        let mut list_state = ListState::default();
        list_state.select((!items.is_empty()).then_some(0));
        Self {
            title: title.into(),
            items,
            list_state,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerOutcome {
        if key.kind != KeyEventKind::Press {
            return PickerOutcome::Pending;
        }
        let last = self.items.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => PickerOutcome::Cancelled,
            KeyCode::Esc | KeyCode::Char('q') => PickerOutcome::Cancelled,
            KeyCode::Enter => match self.selected() {
                Some(index) => PickerOutcome::Selected(index),
                None => PickerOutcome::Cancelled,
            },
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(index) = self.selected() {
                    self.list_state.select(Some(index.saturating_sub(1)));
                }
                PickerOutcome::Pending
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(index) = self.selected() {
                    self.list_state.select(Some((index + 1).min(last)));
                }
                PickerOutcome::Pending
            }
            KeyCode::Home => {
                self.list_state.select((!self.items.is_empty()).then_some(0));
                PickerOutcome::Pending
            }
            KeyCode::End => {
                self.list_state.select((!self.items.is_empty()).then_some(last));
                PickerOutcome::Pending
            }
            _ => PickerOutcome::Pending,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [list_area, hint_area] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                let mut spans = vec![Span::styled(item.label.clone(), theme::text_primary_style())];
                if let Some(detail) = &item.detail {
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled(detail.clone(), theme::text_muted_style()));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::border_style(true))
                    .title(Span::styled(self.title.clone(), theme::accent_emphasis_style())),
            )
            .highlight_style(theme::selection_style())
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, list_area, &mut self.list_state);

        let hints = Line::from(vec![
            Span::styled("↑/↓", theme::accent_emphasis_style()),
            Span::styled(" Move  ", theme::text_muted_style()),
            Span::styled("Enter", theme::accent_emphasis_style()),
            Span::styled(" Select  ", theme::text_muted_style()),
            Span::styled("Esc", theme::accent_emphasis_style()),
            Span::styled(" Cancel", theme::text_muted_style()),
        ]);
        frame.render_widget(Paragraph::new(hints), hint_area);
    }
}

type PickerTerminal = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal(options: PickerOptions, height: u16) -> Result<PickerTerminal> {
    enable_raw_mode()?;
    or_restore(
        || {
            let mut stdout = std::io::stdout();
            if options.fullscreen {
                execute!(stdout, EnterAlternateScreen)?;
            }
            if options.mouse {
                execute!(stdout, EnableMouseCapture)?;
            }
            let viewport = if options.fullscreen {
                Viewport::Fullscreen
            } else {
                Viewport::Inline(height)
            };
            Ok(Terminal::with_options(CrosstermBackend::new(stdout), TerminalOptions { viewport })?)
        },
        || restore_modes(options),
    )
}

/// Runs `setup`, calling `restore` if it fails.
fn or_restore<T>(setup: impl FnOnce() -> Result<T>, restore: impl FnOnce()) -> Result<T> {
    let result = setup();
    if result.is_err() {
        restore();
    }
    result
}

/// Best-effort undo of a half-finished setup.
fn restore_modes(options: PickerOptions) {
    let mut stdout = std::io::stdout();
    if options.mouse
        && let Err(err) = execute!(stdout, DisableMouseCapture)
    {
        warn!(error = %err, "Failed to disable mouse capture");
    }
    if options.fullscreen
        && let Err(err) = execute!(stdout, LeaveAlternateScreen)
    {
        warn!(error = %err, "Failed to leave the alternate screen");
    }
    if let Err(err) = disable_raw_mode() {
        warn!(error = %err, "Failed to leave raw mode");
    }
}

fn cleanup_terminal(terminal: &mut PickerTerminal, options: PickerOptions) -> Result<()> {
    disable_raw_mode()?;
    if options.mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    if options.fullscreen {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    } else {
        terminal.clear()?;
    }
    terminal.show_cursor()?;
    Ok(())
}

/// Shows the picker and returns the chosen index. Blocking; call from
/// `spawn_blocking`.
pub fn run_picker(mut state: PickerState, options: PickerOptions, cancel: CancellationToken) -> Result<Option<usize>> {
    let height = (state.items.len() as u16).saturating_add(3).min(20);
    let mut terminal = setup_terminal(options, height)?;
    let outcome = drive(&mut terminal, &mut state, &cancel);
    cleanup_terminal(&mut terminal, options)?;
    match outcome? {
        PickerOutcome::Selected(index) => Ok(Some(index)),
        PickerOutcome::Cancelled | PickerOutcome::Pending => Ok(None),
    }
}

fn drive(terminal: &mut PickerTerminal, state: &mut PickerState, cancel: &CancellationToken) -> Result<PickerOutcome> {
    loop {
        terminal.draw(|frame| state.render(frame, frame.area()))?;
        if cancel.is_cancelled() {
            return Ok(PickerOutcome::Cancelled);
        }
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match state.handle_key(key) {
                PickerOutcome::Pending => {}
                done => return Ok(done),
            }
        }
    }
}
