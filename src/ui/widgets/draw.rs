//! Draw widget module which holds all the draw functions for the renderer to use.
//!
//! Relies on the dialog helpers of [crate::ui::widgets]. Draws the prompt input dialog,
//! the timed message overlay, the keybind help, the raw item JSON view and the download log
//! panel.

use crate::app::actions::ActionMode;
use crate::app::{AppState, NoticeLevel};
use crate::config::Display;
use crate::ui::widgets::{DialogPosition, DialogSize, DialogStyle, dialog_area, draw_dialog};

use ansi_to_tui::IntoText;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Draws the prompt the user is typing into, with the terminal cursor placed in it.
pub fn draw_input_dialog(frame: &mut Frame, app: &AppState) {
    let ActionMode::Input { prompt, .. } = app.actions().mode() else {
        return;
    };
    let display = app.config().display();

    let dialog_style = DialogStyle {
        border_style: display.theme().accent_style(),
        title: Some(Span::styled(
            format!(" {} ", prompt),
            display.theme().title_style(),
        )),
    };

    let rect = dialog_area(frame.area(), DialogSize::Small, DialogPosition::Center);
    let visible_width = rect.width.saturating_sub(2) as usize;
    let (display_input, cursor_offset) = input_field_view(
        app.actions().input_buffer(),
        app.actions().input_cursor_pos(),
        visible_width,
    );

    draw_dialog(
        frame,
        rect,
        display.border_type(),
        &dialog_style,
        display_input,
        Some(Alignment::Left),
    );

    frame.set_cursor_position((rect.x + 1 + cursor_offset as u16, rect.y + 1));
}

/// Helper function to calculate cursor offset for cursor moving
/// Handles horizontal truncation, variable width with unicode_width and clamps cursor to buffer.
fn input_field_view(input_text: &str, cursor_pos: usize, visible_width: usize) -> (&str, usize) {
    let cursor_pos = cursor_pos.min(input_text.len());
    if input_text.width() <= visible_width {
        return (input_text, input_text[..cursor_pos].width());
    }

    let mut current_w = 0;
    let mut start = 0;
    for (idx, ch) in input_text.char_indices().rev() {
        current_w += ch.width().unwrap_or(0);
        if current_w > visible_width {
            start = idx + ch.len_utf8();
            break;
        }
    }

    let cursor_offset = if cursor_pos < start {
        0
    } else {
        input_text[start..cursor_pos].width()
    };

    (&input_text[start..], cursor_offset)
}

/// Draws a simple message overlay dialog at the bottom right
/// Used for every notice: fetch failures, copy results, lookup hits and so on.
pub fn draw_message_overlay(
    frame: &mut Frame,
    app: &AppState,
    text: &str,
    level: NoticeLevel,
) {
    let display = app.config().display();
    let theme = display.theme();
    let area = frame.area();

    let (title, border_style) = match level {
        NoticeLevel::Info => (" Message ", theme.accent_style()),
        NoticeLevel::Warn => (" Warning ", theme.warning_style()),
        NoticeLevel::Error => (" Error ", theme.warning_style().add_modifier(Modifier::BOLD)),
    };

    let max_line_width = text.lines().map(|l| l.width()).max().unwrap_or(0);
    let line_count = text.lines().count().max(1);

    let min_width = 27;
    let border_pad = 2;
    let right_pad = 2;
    let max_width = (area.width as usize * 2 / 3).max(min_width + border_pad);

    let width = ((max_line_width + right_pad).max(min_width) + border_pad).min(max_width);
    let inner = width.saturating_sub(border_pad).max(1);
    // Wrapped lines need rows too.
    let wrapped: usize = text
        .lines()
        .map(|l| l.width().div_ceil(inner).max(1))
        .sum::<usize>()
        .max(line_count);
    let height = (wrapped + border_pad).min(area.height as usize);

    let rect = dialog_area(
        area,
        DialogSize::Custom(width as u16, height as u16),
        DialogPosition::BottomRight,
    );

    let dialog_style = DialogStyle {
        border_style,
        title: Some(Span::styled(title, border_style)),
    };

    draw_dialog(
        frame,
        rect,
        display.border_type(),
        &dialog_style,
        text,
        Some(Alignment::Left),
    );
}

pub fn draw_keybind_help(frame: &mut Frame, app: &AppState) {
    let keys = app.config().keys();
    let display = app.config().display();
    let area = frame.area();

    let size = DialogSize::Custom(
        area.width.saturating_sub(6).clamp(40, 80),
        area.height.saturating_sub(4).clamp(12, 30),
    );

    let fmt_keys = |list: &[String]| -> String {
        if list.is_empty() {
            "-".to_string()
        } else {
            list.join(", ")
        }
    };

    let sections: Vec<(&str, Vec<(String, &'static str)>)> = vec![
        (
            "Results and files",
            vec![
                (fmt_keys(keys.go_up()), "Move highlight up"),
                (fmt_keys(keys.go_down()), "Move highlight down"),
                (fmt_keys(keys.select()), "Open highlighted row"),
                ("0-9".to_string(), "Select by number"),
                (fmt_keys(keys.next()), "Next page"),
                (fmt_keys(keys.prev()), "Previous page"),
                (fmt_keys(keys.filter()), "Filter this list"),
                (fmt_keys(keys.reset()), "Reset filter and page"),
                (fmt_keys(keys.search()), "New search"),
                (fmt_keys(keys.back()), "Back to results"),
                (fmt_keys(keys.open()), "Open item page"),
                (fmt_keys(keys.copy()), "Copy item page link"),
            ],
        ),
        (
            "Selected file",
            vec![
                (fmt_keys(keys.download()), "Download"),
                (fmt_keys(keys.hash()), "Look up digest"),
                (fmt_keys(keys.open()), "Open file link"),
                (fmt_keys(keys.copy()), "Copy file link"),
                (fmt_keys(keys.back()), "Back to files"),
            ],
        ),
        (
            "Download",
            vec![
                (fmt_keys(keys.cancel()), "Cancel download"),
                (fmt_keys(keys.quit()), "Cancel and quit"),
            ],
        ),
        (
            "System",
            vec![
                (fmt_keys(keys.command()), "Command line"),
                (fmt_keys(keys.quit()), "Quit"),
                (fmt_keys(keys.keybind_help()), "Toggle keybind help"),
            ],
        ),
    ];

    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let key_style = display.theme().accent_style();

    let mut all_rows: Vec<Line> = Vec::new();
    for (section_name, rows) in sections {
        all_rows.push(Line::from(Span::styled(
            format!("{section_name}:"),
            header_style,
        )));
        for (k, desc) in rows {
            all_rows.push(Line::from(vec![
                Span::styled(format!("  {:<18}", k), key_style),
                Span::raw(desc),
            ]));
        }
        all_rows.push(Line::raw(""));
    }
    all_rows.pop();

    let dialog_style = DialogStyle {
        border_style: display.theme().accent_style(),
        title: Some(Span::styled(" Keybinds ", display.theme().title_style())),
    };

    draw_dialog(
        frame,
        dialog_area(area, size, DialogPosition::Center),
        display.border_type(),
        &dialog_style,
        Text::from(all_rows),
        Some(Alignment::Left),
    );
}

/// Draws an item's raw JSON in a large dialog, starting at line `scroll`.
pub fn draw_raw_detail(
    frame: &mut Frame,
    app: &AppState,
    title: &str,
    text: &str,
    scroll: usize,
) {
    let display = app.config().display();
    let theme = display.theme();
    let area = frame.area();
    let rect = dialog_area(
        area,
        DialogSize::Custom(area.width.saturating_sub(4), area.height.saturating_sub(2)),
        DialogPosition::Center,
    );

    let keys = app.config().keys();
    let hint = format!(
        " {}/{} scroll   {} close ",
        keys.go_down().join(","),
        keys.go_up().join(","),
        keys.back().join(","),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(display.border_type())
        .border_style(theme.accent_style())
        .title(Span::styled(format!(" {} (raw JSON) ", title), theme.title_style()))
        .title_bottom(Line::from(Span::styled(hint, theme.digest_style())));

    let offset = u16::try_from(scroll).unwrap_or(u16::MAX);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text.to_string()).block(block).scroll((offset, 0)),
        rect,
    );
}

/// Draws the full-screen log of a running download: a title line, the tail of the backend's
/// output (ANSI colours kept) and the interrupt keys.
pub fn draw_download_panel(
    frame: &mut Frame,
    display: &Display,
    title: &str,
    hint: &str,
    lines: &[String],
) {
    let area = frame.area();
    let theme = display.theme();

    let block = crate::ui::widgets::get_pane_block(&format!("Downloading {}", title), display);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let body = Rect {
        height: inner.height.saturating_sub(1),
        ..inner
    };
    let footer = Rect {
        y: inner.y + body.height,
        height: inner.height.min(1),
        ..inner
    };

    let visible = body.height as usize;
    let start = lines.len().saturating_sub(visible);
    let raw = lines[start..].join("\n");
    let text = raw.into_text().unwrap_or_else(|_| Text::from(raw));

    frame.render_widget(Paragraph::new(text), body);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(hint.to_string(), theme.digest_style()))),
        footer,
    );
}
