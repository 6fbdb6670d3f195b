//! Plain-text grids for terminal output: column listings, history sessions,
//! and the first rows of a transfer result.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{data::cell_display, frame::Table, history::Session};

const GAP: &str = "  ";

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    // Every column is at least as wide as its three-dash rule.
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// One line per session, numbered from 1 in ledger order.
pub fn render_sessions(sessions: &[Session]) -> String {
    let headers = ["#", "Date & Time", "Source File", "Destination File", "Output File", "Mappings"]
        .map(String::from);
    let rows = sessions
        .iter()
        .enumerate()
        .map(|(idx, session)| {
            let key = session.key();
            vec![
                (idx + 1).to_string(),
                key.timestamp.clone(),
                key.source_file.clone(),
                key.destination_file.clone(),
                key.output_file.clone(),
                session.count().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// Header plus at most `limit` rows of `table`; nulls render empty.
pub fn render_preview(table: &Table, limit: usize) -> String {
    let rows = table
        .rows()
        .take(limit)
        .map(|row| row.iter().map(cell_display).collect())
        .collect::<Vec<Vec<String>>>();
    render_table(table.columns(), &rows)
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>();
    cells.join(GAP).trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape sequences occupy no columns.
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
