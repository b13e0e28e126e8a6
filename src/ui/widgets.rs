//! Dialog helpers shared by the draw functions.
//!
//! A dialog is a bordered, cleared rectangle positioned relative to the frame.

pub mod draw;

pub use draw::{
    draw_download_panel, draw_input_dialog, draw_keybind_help, draw_message_overlay,
    draw_raw_detail,
};

use crate::config::Display;

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::{Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPosition {
    Center,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogSize {
    Small,
    Custom(u16, u16),
}

pub struct DialogStyle<'a> {
    pub border_style: Style,
    pub title: Option<Span<'a>>,
}

/// Block used around every pane, following the display config.
pub fn get_pane_block(title: &str, display: &Display) -> Block<'static> {
    let mut b = Block::default()
        .borders(Borders::ALL)
        .border_type(display.border_type())
        .border_style(display.theme().border_style());
    if display.titles() {
        b = b.title(Span::styled(
            format!(" {} ", title),
            display.theme().accent_style(),
        ));
    }
    b
}

/// Computes the rectangle of a dialog inside `area`, clamped to it.
pub fn dialog_area(area: Rect, size: DialogSize, position: DialogPosition) -> Rect {
    let (w, h) = match size {
        DialogSize::Small => (area.width.saturating_sub(4).min(60), 3),
        DialogSize::Custom(w, h) => (w, h),
    };
    let w = w.min(area.width);
    let h = h.min(area.height);

    let (x, y) = match position {
        DialogPosition::Center => (
            area.x + (area.width - w) / 2,
            area.y + (area.height - h) / 2,
        ),
        // Keep the footer line visible.
        DialogPosition::BottomRight => (
            area.x + area.width - w,
            (area.y + area.height - h).saturating_sub(1).max(area.y),
        ),
    };
    Rect::new(x, y, w, h)
}

pub fn draw_dialog<'a, T>(
    frame: &mut Frame,
    rect: Rect,
    border_type: BorderType,
    style: &DialogStyle<'a>,
    content: T,
    alignment: Option<Alignment>,
) where
    T: Into<Text<'a>>,
{
    frame.render_widget(Clear, rect);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(style.border_style);
    if let Some(title) = &style.title {
        block = block.title(title.clone());
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .alignment(alignment.unwrap_or(Alignment::Left));
    frame.render_widget(paragraph, rect);
}
