//! Display formatting helpers for catalog records.
//!
//! Sizes, counts and table cells. Everything here is a pure function of its input and is
//! shared by the table renderer and [crate::core::FileInfo].

use humansize::{DECIMAL, format_size};
use unicode_width::UnicodeWidthChar;

/// Formats a byte count into a human-readable string like `4.70 GB`.
pub fn format_file_size(size: u64) -> String {
    format_size(size, DECIMAL)
}

/// Formats a raw byte count with thousands separators, like `2,048 bytes`.
pub fn format_byte_count(size: u64) -> String {
    format!("{} bytes", group_thousands(size))
}

/// Formats an optional size for a table cell.
pub fn format_optional_size(size: Option<u64>, human: bool) -> String {
    match size {
        Some(sz) if human => format_file_size(sz),
        Some(sz) => group_thousands(sz),
        None => "-".to_string(),
    }
}

/// Inserts `,` every three digits.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Cleans a line to exactly `width` columns
/// by removing control characters, expanding tabs to 4 spaces,
/// and truncating or padding the string to fit exactly.
///
/// Newlines in catalog titles are control characters and are dropped.
pub fn sanitize_to_exact_width(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut current_w = 0;

    for char in line.chars() {
        if char == '\t' {
            let space_count = 4 - (current_w % 4);
            if current_w + space_count > width {
                break;
            }
            out.push_str(&" ".repeat(space_count));
            current_w += space_count;
            continue;
        }

        if char.is_control() {
            continue;
        }

        let w = char.width().unwrap_or(0);
        if current_w + w > width {
            break;
        }

        out.push(char);
        current_w += w;
    }

    if current_w < width {
        out.push_str(&" ".repeat(width - current_w));
    }

    out
}

/// Truncates to at most `width` columns, marking the cut with `…`.
pub fn truncate_with_ellipsis(line: &str, width: usize) -> String {
    let clean: String = line
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let total: usize = clean.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return clean;
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::with_capacity(width);
    let mut current_w = 0;
    for ch in clean.chars() {
        let w = ch.width().unwrap_or(0);
        if current_w + w > width - 1 {
            break;
        }
        out.push(ch);
        current_w += w;
    }
    out.push('…');
    out
}
