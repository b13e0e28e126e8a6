//! UI renderer implementation.
//!
//! Contains the top-level `render` entry point used by the terminal loop and the
//! layout helper that splits the body between the item panel and the active list.
//!
//! This module should stay mostly “pure rendering”: it reads state + config and
//! produces widgets, without owning any session logic.

use crate::{
    app::{AppState, View},
    ui::{
        overlays::Overlay,
        panes::{self, PaneContext},
        widgets,
    },
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Height of the item panel above the file list.
const ITEM_PANEL_HEIGHT: u16 = 9;

/// Render function which renders the entire terminal UI for iaseek on each frame.
/// Handles the header, the body of the current view, the footer and all overlays.
pub fn render(frame: &mut Frame, app: &AppState) {
    let [header, body, footer] = layout_root(frame.area());

    render_header(frame, app, header);
    render_body(frame, app, body);
    render_footer(frame, app, footer);
    render_overlays(frame, app);
}

/// Splits the frame into header, body and footer rows.
pub(crate) fn layout_root(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Returns the body areas: the list area alone, or the item panel followed by the list
/// area when an item is open.
pub(crate) fn layout_body(area: Rect, with_panel: bool) -> Vec<Rect> {
    if !with_panel {
        return vec![area];
    }
    // Tiny terminals keep the list.
    let panel = ITEM_PANEL_HEIGHT.min(area.height / 2);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(panel), Constraint::Min(0)])
        .split(area)
        .to_vec()
}

fn render_body(frame: &mut Frame, app: &AppState, area: Rect) {
    let cfg = app.config();
    let display = cfg.display();
    let session = app.session();
    let settings = session.settings();

    match session.view() {
        View::Results => {
            let window = session.results_window();
            panes::draw_results(
                frame,
                &window,
                PaneContext {
                    area,
                    block: widgets::get_pane_block("Results", display),
                    display,
                    cursor: Some(app.cursor()),
                },
            );
        }
        View::ItemFiles(item) => {
            let chunks = layout_body(area, true);
            panes::draw_item_panel(
                frame,
                item,
                settings.human_sizes,
                PaneContext {
                    area: chunks[0],
                    block: widgets::get_pane_block("Item", display),
                    display,
                    cursor: None,
                },
            );
            let window = item.files().page();
            panes::draw_files(
                frame,
                &window,
                &settings.digests,
                settings.human_sizes,
                PaneContext {
                    area: chunks[1],
                    block: widgets::get_pane_block("Files", display),
                    display,
                    cursor: Some(app.cursor()),
                },
            );
        }
        View::FileAction(item, info) => {
            let chunks = layout_body(area, true);
            panes::draw_item_panel(
                frame,
                item,
                settings.human_sizes,
                PaneContext {
                    area: chunks[0],
                    block: widgets::get_pane_block("Item", display),
                    display,
                    cursor: None,
                },
            );
            panes::draw_file_panel(
                frame,
                info,
                cfg.keys(),
                PaneContext {
                    area: chunks[1],
                    block: widgets::get_pane_block("File", display),
                    display,
                    cursor: None,
                },
            );
        }
    }
}

/// Query, view, filter and position of the current list.
fn render_header(frame: &mut Frame, app: &AppState, area: Rect) {
    let theme = app.config().display().theme();
    let session = app.session();

    let mut spans = vec![
        Span::styled("ias ", theme.accent_style()),
        Span::styled(
            format!("\"{}\"", session.query().query()),
            theme.title_style(),
        ),
        Span::raw(format!("  [{}]", session.view().name())),
    ];

    let position = match session.view() {
        View::Results => {
            let window = session.results_window();
            Some((window.page(), window.total_pages()))
        }
        View::ItemFiles(_) => session
            .files_window()
            .map(|w| (w.page(), w.total_pages())),
        View::FileAction(..) => None,
    };
    if let Some((page, pages)) = position {
        spans.push(Span::raw(format!("  page {}/{}", page, pages)));
    }

    if let Some(filter) = session.active_filter() {
        spans.push(Span::styled(
            format!("  filter: {}", filter),
            theme.digest_style(),
        ));
    }

    if matches!(session.view(), View::Results)
        && let Some(total) = session.total()
    {
        spans.push(Span::styled(
            format!("  {} found", total),
            theme.size_style(),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Key hints of the current view.
fn render_footer(frame: &mut Frame, app: &AppState, area: Rect) {
    let keys = app.config().keys();
    let theme = app.config().display().theme();

    let first = |list: &[String]| list.first().cloned().unwrap_or_else(|| "-".to_string());

    let hints: Vec<(String, &str)> = match app.session().view() {
        View::Results => vec![
            (first(keys.select()), "open"),
            (first(keys.next()), "next"),
            (first(keys.prev()), "prev"),
            (first(keys.filter()), "filter"),
            (first(keys.search()), "search"),
        ],
        View::ItemFiles(_) => vec![
            (first(keys.select()), "select"),
            (first(keys.next()), "next"),
            (first(keys.prev()), "prev"),
            (first(keys.filter()), "filter"),
            (first(keys.back()), "back"),
        ],
        View::FileAction(..) => vec![
            (first(keys.download()), "download"),
            (first(keys.hash()), "hash"),
            (first(keys.back()), "back"),
        ],
    };

    let mut spans = Vec::new();
    for (key, label) in hints
        .into_iter()
        .chain([
            (first(keys.keybind_help()), "keys"),
            (first(keys.quit()), "quit"),
        ])
    {
        spans.push(Span::styled(key, theme.accent_style()));
        spans.push(Span::raw(format!(" {}  ", label)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Renders any active overlays such as input dialogs or message boxes.
fn render_overlays(frame: &mut Frame, app: &AppState) {
    if app.actions().is_input_mode() {
        widgets::draw_input_dialog(frame, app);
    }

    for overlay in app.overlays().iter() {
        match overlay {
            Overlay::Message { text, level } => {
                widgets::draw_message_overlay(frame, app, text, *level);
            }
            Overlay::KeybindHelp => widgets::draw_keybind_help(frame, app),
            Overlay::RawDetail {
                title,
                text,
                scroll,
            } => widgets::draw_raw_detail(frame, app, title, text, *scroll),
        }
    }
}
