//! UI pane drawing module for iaseek.
//!
//! This module provides drawers for the results table, the file table and the detail panels
//! of an opened item and a selected file. Rows are plain [List] items cut into fixed columns
//! with [sanitize_to_exact_width], so wide titles never shift the columns.
//!
//! Used internally by ui::render

use crate::app::session::ItemContext;
use crate::config::{Display, Keys};
use crate::core::formatter::{
    format_optional_size, group_thousands, sanitize_to_exact_width, truncate_with_ellipsis,
};
use crate::core::model::{DigestKind, FileInfo, FileRecord, ResultRecord};
use crate::core::paging::PageWindow;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph, Wrap},
};

/// Context data for pane rendering functions
pub struct PaneContext<'a> {
    pub area: Rect,
    pub block: Block<'a>,
    pub display: &'a Display,
    pub cursor: Option<usize>,
}

/// Column widths of the results table for an inner width.
pub fn results_columns(width: usize) -> [usize; 4] {
    let index = 4;
    let downloads = 11;
    let rest = width.saturating_sub(index + downloads + 2);
    let identifier = (rest * 2 / 5).clamp(8.min(rest), 40);
    let title = rest.saturating_sub(identifier);
    [index, identifier, downloads, title]
}

/// Column widths of the file table for an inner width.
pub fn files_columns(width: usize) -> [usize; 4] {
    let index = 4;
    let size = 12;
    let rest = width.saturating_sub(index + size + 2);
    let digest = if rest >= 60 { 18 } else { 0 };
    let name = rest.saturating_sub(digest);
    [index, name, size, digest]
}

/// Draws the current results window.
pub fn draw_results(frame: &mut Frame, window: &PageWindow<'_, ResultRecord>, ctx: PaneContext) {
    if window.is_empty() {
        draw_empty(frame, ctx, "No results.");
        return;
    }

    let theme = ctx.display.theme();
    let inner_width = ctx.block.inner(ctx.area).width as usize;
    let [w_idx, w_id, w_dl, w_title] = results_columns(inner_width);

    let items: Vec<ListItem> = window
        .items()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let downloads = record
                .downloads()
                .map(group_thousands)
                .unwrap_or_else(|| "-".to_string());
            let line = Line::from(vec![
                Span::styled(
                    sanitize_to_exact_width(&format!("{:>3}", i + 1), w_idx),
                    theme.index_style(),
                ),
                Span::raw(sanitize_to_exact_width(
                    &truncate_with_ellipsis(record.identifier(), w_id),
                    w_id,
                )),
                Span::raw(" "),
                Span::styled(
                    sanitize_to_exact_width(&format!("{:>10}", downloads), w_dl),
                    theme.size_style(),
                ),
                Span::raw(" "),
                Span::styled(
                    sanitize_to_exact_width(
                        &truncate_with_ellipsis(record.title().unwrap_or_default(), w_title),
                        w_title,
                    ),
                    theme.title_style(),
                ),
            ]);
            zebra(ListItem::new(line), i, ctx.display)
        })
        .collect();

    draw_list(frame, items, ctx);
}

/// Draws the file window of an opened item.
pub fn draw_files(
    frame: &mut Frame,
    window: &PageWindow<'_, FileRecord>,
    digests: &[DigestKind],
    human: bool,
    ctx: PaneContext,
) {
    if window.is_empty() {
        draw_empty(frame, ctx, "No files match filters.");
        return;
    }

    let theme = ctx.display.theme();
    let inner_width = ctx.block.inner(ctx.area).width as usize;
    let [w_idx, w_name, w_size, w_digest] = files_columns(inner_width);

    let items: Vec<ListItem> = window
        .items()
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let mut spans = vec![
                Span::styled(
                    sanitize_to_exact_width(&format!("{:>3}", i + 1), w_idx),
                    theme.index_style(),
                ),
                Span::raw(sanitize_to_exact_width(
                    &truncate_with_ellipsis(file.name(), w_name),
                    w_name,
                )),
                Span::raw(" "),
                Span::styled(
                    sanitize_to_exact_width(
                        &format!("{:>11}", format_optional_size(file.size(), human)),
                        w_size,
                    ),
                    theme.size_style(),
                ),
            ];
            if w_digest > 0 {
                let digest = file
                    .preferred_digest(digests)
                    .map(|(kind, value)| format!("{} {}", kind.key(), value))
                    .unwrap_or_default();
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    truncate_with_ellipsis(&digest, w_digest),
                    theme.digest_style(),
                ));
            }
            zebra(ListItem::new(Line::from(spans)), i, ctx.display)
        })
        .collect();

    draw_list(frame, items, ctx);
}

/// Draws the metadata panel of an opened item.
pub fn draw_item_panel(frame: &mut Frame, item: &ItemContext, human: bool, ctx: PaneContext) {
    let theme = ctx.display.theme();
    let meta = item.meta();

    let files_count = meta
        .files_count
        .map(|n| n as usize)
        .unwrap_or(item.unrestricted_len());
    let shown = item.files().backing().len();
    let files_label = if shown == files_count {
        files_count.to_string()
    } else {
        format!("{} of {}", shown, files_count)
    };

    let lines = vec![
        Line::from(Span::styled(meta.display_title().to_string(), theme.title_style())),
        Line::raw(""),
        field("Identifier", &meta.identifier),
        field("Creator", meta.creator.as_deref().unwrap_or("-")),
        field("Date", meta.date.as_deref().unwrap_or("-")),
        field("Total size", &format_optional_size(meta.item_size, human)),
        field("Files", &files_label),
    ];

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(ctx.block),
        ctx.area,
    );
}

/// Draws the details of the selected file and the keys of the actions on it.
pub fn draw_file_panel(frame: &mut Frame, info: &FileInfo, keys: &Keys, ctx: PaneContext) {
    let theme = ctx.display.theme();

    let mut lines = vec![
        Line::from(Span::styled(info.name().to_string(), theme.title_style())),
        Line::raw(""),
        field("Size", info.size_label()),
    ];

    match info.digest() {
        Some((kind, value)) => lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", kind.label()), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(value.to_string(), theme.digest_style()),
        ])),
        None => lines.push(Line::from(Span::styled(
            "No digest in the configured families",
            theme.warning_style(),
        ))),
    }
    for (kind, value) in info.checksums() {
        if info.digest().is_some_and(|(k, _)| k == *kind) {
            continue;
        }
        lines.push(Line::from(vec![
            Span::raw(format!("{:<12}", kind.label())),
            Span::styled(value.clone(), theme.digest_style()),
        ]));
    }
    if let Some(format) = info.format() {
        lines.push(field("Format", format));
    }
    if let Some(mtime) = info.mtime() {
        lines.push(field("Modified", mtime));
    }
    if info.is_torrent() {
        lines.push(Line::from(Span::styled(
            "Torrent file: needs aria2c to download",
            theme.warning_style(),
        )));
    }
    lines.push(field("Link", info.locator().unwrap_or("-")));
    lines.push(field("Page", info.page_locator().unwrap_or("-")));
    lines.push(Line::raw(""));

    let hint = |list: &[String], label: &str| -> Vec<Span<'static>> {
        let key = list.first().cloned().unwrap_or_else(|| "-".to_string());
        vec![
            Span::styled(format!("[{}]", key), theme.accent_style()),
            Span::raw(format!(" {}  ", label)),
        ]
    };
    let mut actions = Vec::new();
    actions.extend(hint(keys.download(), "download"));
    actions.extend(hint(keys.hash(), "look up digest"));
    actions.extend(hint(keys.open(), "open link"));
    actions.extend(hint(keys.copy(), "copy link"));
    actions.extend(hint(keys.back(), "back"));
    actions.extend(hint(keys.quit(), "quit"));
    lines.push(Line::from(actions));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(ctx.block),
        ctx.area,
    );
}

fn field(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<12}", label),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value.to_string()),
    ])
}

fn zebra<'a>(item: ListItem<'a>, row: usize, display: &Display) -> ListItem<'a> {
    if display.zebra() && row % 2 == 1 {
        item.style(Style::default().add_modifier(Modifier::DIM))
    } else {
        item
    }
}

fn draw_empty(frame: &mut Frame, ctx: PaneContext, message: &str) {
    let line = Line::from(Span::styled(
        format!(" {}", message),
        ctx.display.theme().warning_style(),
    ));
    frame.render_widget(Paragraph::new(line).block(ctx.block), ctx.area);
}

fn draw_list(frame: &mut Frame, items: Vec<ListItem>, ctx: PaneContext) {
    let mut state = ListState::default();
    state.select(ctx.cursor.map(|c| c.min(items.len().saturating_sub(1))));

    frame.render_stateful_widget(
        List::new(items)
            .block(ctx.block)
            .highlight_style(ctx.display.theme().selection_style())
            .highlight_symbol(""),
        ctx.area,
        &mut state,
    );
}
