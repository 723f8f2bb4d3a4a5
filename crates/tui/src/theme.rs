//! Dracula palette and the handful of styles the picker uses.

use ratatui::style::{Color, Modifier, Style};

// Dracula palette (https://draculatheme.com/contribute)
pub const CURRENT_LINE: Color = Color::Rgb(0x44, 0x47, 0x5A); // #44475a
pub const FOREGROUND: Color = Color::Rgb(0xF8, 0xF8, 0xF2); // #f8f8f2
pub const COMMENT: Color = Color::Rgb(0x62, 0x72, 0xA4); // #6272a4
pub const CYAN: Color = Color::Rgb(0x8B, 0xE9, 0xFD); // #8be9fd
pub const PINK: Color = Color::Rgb(0xFF, 0x79, 0xC6); // #ff79c6

pub fn text_primary_style() -> Style {
    Style::default().fg(FOREGROUND)
}

pub fn text_muted_style() -> Style {
    Style::default().fg(COMMENT)
}

pub fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { CYAN } else { CURRENT_LINE })
}

pub fn selection_style() -> Style {
    Style::default().fg(FOREGROUND).bg(CURRENT_LINE)
}

pub fn accent_emphasis_style() -> Style {
    Style::default().fg(PINK).add_modifier(Modifier::BOLD)
}
