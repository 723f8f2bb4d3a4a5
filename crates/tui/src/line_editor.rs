//! Prompt line editor.
//!
//! In a terminal the editor runs in raw mode with Tab completion, history
//! and bracketed paste. When stdin is not a terminal it reads plain lines,
//! which keeps piped input and tests simple.

use std::io::{BufRead, IsTerminal, Stdout, Write};

use anyhow::Result;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use crossterm::{execute, queue};
use tracing::warn;

/// Editable input with a byte-index cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    pub input: String,
    pub cursor: usize, // byte index
}

impl LineBuffer {
    pub fn set(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.cursor = self.input.len();
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, text: &str) {
        self.input.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    pub fn backspace(&mut self) {
        let Some(prev) = self.input[..self.cursor].chars().last() else {
            return;
        };
        let start = self.cursor - prev.len_utf8();
        self.input.drain(start..self.cursor);
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.input.drain(self.cursor..self.cursor + next.len_utf8());
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(prev) = self.input[..self.cursor].chars().last() {
            self.cursor -= prev.len_utf8();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.input.len();
    }

    fn cursor_column(&self) -> usize {
        self.input[..self.cursor].chars().count()
    }
}

/// Entered lines, newest last, with a browsing position.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    position: Option<usize>,
}

impl History {
    pub fn push(&mut self, line: &str) {
        let line = line.trim();
        self.position = None;
        if line.is_empty() || self.entries.last().is_some_and(|last| last == line) {
            return;
        }
        self.entries.push(line.to_string());
    }

    pub fn previous(&mut self) -> Option<&str> {
        let index = match self.position {
            Some(0) => 0,
            Some(index) => index - 1,
            None => self.entries.len().checked_sub(1)?,
        };
        self.position = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Moves towards the newest entry; `None` once past it.
    pub fn next(&mut self) -> Option<&str> {
        let index = self.position? + 1;
        if index >= self.entries.len() {
            self.position = None;
            return None;
        }
        self.position = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    fn reset(&mut self) {
        self.position = None;
    }
}

/// What Tab should do with a set of full-line candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabAction {
    Nothing,
    Replace(String),
    Show(Vec<String>),
}

pub fn tab_action(input: &str, candidates: Vec<String>) -> TabAction {
    match candidates.as_slice() {
        [] => TabAction::Nothing,
        [only] => TabAction::Replace(only.clone()),
        [first, rest @ ..] => {
            let mut common = first.len();
            for candidate in rest {
                common = first
                    .char_indices()
                    .zip(candidate.chars())
                    .take_while(|((_, a), b)| a == b)
                    .last()
                    .map_or(0, |((index, a), _)| index + a.len_utf8())
                    .min(common);
            }
            let prefix = &first[..common];
            if prefix.len() > input.len() && prefix.starts_with(input) {
                TabAction::Replace(prefix.to_string())
            } else {
                TabAction::Show(candidates)
            }
        }
    }
}

pub struct LineEditor {
    history: History,
    interactive: bool,
    paste: bool,
}

/// Restores cooked mode when dropped.
struct RawModeGuard {
    paste: bool,
}

impl RawModeGuard {
    fn enable(paste: bool) -> Result<Self> {
        enable_raw_mode()?;
        if paste {
            execute!(std::io::stdout(), EnableBracketedPaste)?;
        }
        Ok(Self { paste })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.paste
            && let Err(err) = execute!(std::io::stdout(), DisableBracketedPaste)
        {
            warn!(error = %err, "Failed to disable bracketed paste");
        }
        if let Err(err) = disable_raw_mode() {
            warn!(error = %err, "Failed to leave raw mode");
        }
    }
}

impl LineEditor {
    pub fn new(paste: bool) -> Self {
        Self {
            history: History::default(),
            interactive: std::io::stdin().is_terminal() && std::io::stdout().is_terminal(),
            paste,
        }
    }

    pub fn add_history(&mut self, line: &str) {
        self.history.push(line);
    }

    /// Reads one line. `Ok(None)` means end of input.
    pub fn read_line(&mut self, prompt: &str, complete: &dyn Fn(&str) -> Vec<String>) -> Result<Option<String>> {
        if !self.interactive {
            return read_plain_line(prompt);
        }
        let _raw = RawModeGuard::enable(self.paste)?;
        let mut stdout = std::io::stdout();
        let mut buffer = LineBuffer::default();
        self.history.reset();
        redraw(&mut stdout, prompt, &buffer)?;

        loop {
            match event::read()? {
                Event::Paste(text) => buffer.insert_str(&text.replace(['\r', '\n'], " ")),
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if let Some(done) = self.handle_key(key, &mut stdout, &mut buffer, complete)? {
                        return Ok(done);
                    }
                }
                _ => continue,
            }
            redraw(&mut stdout, prompt, &buffer)?;
        }
    }

    /// `Some` ends the read with the given result.
    fn handle_key(
        &mut self,
        key: KeyEvent,
        stdout: &mut impl Write,
        buffer: &mut LineBuffer,
        complete: &dyn Fn(&str) -> Vec<String>,
    ) -> Result<Option<Option<String>>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => {
                execute!(stdout, Print("\r\n"))?;
                return Ok(Some(Some(std::mem::take(&mut buffer.input))));
            }
            KeyCode::Char('c') if ctrl => {
                execute!(stdout, Print("^C\r\n"))?;
                return Ok(Some(Some(String::new())));
            }
            KeyCode::Char('d') if ctrl && buffer.input.is_empty() => {
                execute!(stdout, Print("\r\n"))?;
                return Ok(Some(None));
            }
            KeyCode::Char('a') if ctrl => buffer.home(),
            KeyCode::Char('e') if ctrl => buffer.end(),
            KeyCode::Char('u') if ctrl => buffer.set(""),
            KeyCode::Char(c) if !ctrl => buffer.insert_char(c),
            KeyCode::Backspace => buffer.backspace(),
            KeyCode::Delete => buffer.delete(),
            KeyCode::Left => buffer.move_cursor_left(),
            KeyCode::Right => buffer.move_cursor_right(),
            KeyCode::Home => buffer.home(),
            KeyCode::End => buffer.end(),
            KeyCode::Up => {
                if let Some(entry) = self.history.previous() {
                    buffer.set(entry);
                }
            }
            KeyCode::Down => match self.history.next() {
                Some(entry) => buffer.set(entry),
                None => buffer.set(""),
            },
            KeyCode::Tab => match tab_action(&buffer.input, complete(&buffer.input)) {
                TabAction::Nothing => {}
                TabAction::Replace(line) => buffer.set(line),
                TabAction::Show(candidates) => {
                    queue!(stdout, Print("\r\n"))?;
                    for candidate in candidates {
                        queue!(stdout, Print(candidate), Print("\r\n"))?;
                    }
                    stdout.flush()?;
                }
            },
            _ => {}
        }
        Ok(None)
    }
}

fn redraw(stdout: &mut Stdout, prompt: &str, buffer: &LineBuffer) -> Result<()> {
    let column = prompt.chars().count() + buffer.cursor_column();
    queue!(
        stdout,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(prompt),
        Print(&buffer.input),
        MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX))
    )?;
    stdout.flush()?;
    Ok(())
}

fn read_plain_line(prompt: &str) -> Result<Option<String>> {
    if std::io::stdout().is_terminal() {
        print!("{prompt}");
        std::io::stdout().flush()?;
    }
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
