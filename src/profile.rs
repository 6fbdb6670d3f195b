//! Short, scannable previews of a column's contents.
//!
//! [`sample_column`] lists the first distinct non-null values of a column in
//! order of first appearance. Long values are cut to 20 characters and marked
//! with `...`; when more distinct values exist than are shown, the whole list
//! also ends with `...`. Both markers can appear together.

use std::fmt::{self, Write as _};

use itertools::Itertools;
use log::debug;

use crate::{
    data::{Cell, Value},
    frame::Table,
};

pub const DEFAULT_MAX_SAMPLES: usize = 3;
pub const NO_DATA: &str = "No data";
pub const ALL_EMPTY: &str = "All empty";
pub const ERROR_READING: &str = "Error reading";

const MAX_VALUE_CHARS: usize = 20;
const ELLIPSIS: &str = "...";

/// Never fails: problems are reported through the returned marker text.
pub fn sample_column(table: &Table, column: &str, max_samples: usize) -> String {
    let Some(values) = table.column(column) else {
        return NO_DATA.to_string();
    };
    render_sample(values, max_samples).unwrap_or_else(|err| {
        debug!("Sampling column '{column}' failed: {err}");
        ERROR_READING.to_string()
    })
}

fn render_sample(values: &[Cell], max_samples: usize) -> Result<String, fmt::Error> {
    let distinct = values
        .iter()
        .flatten()
        .unique_by(|value| value.distinct_key())
        .collect::<Vec<_>>();
    if distinct.is_empty() {
        return Ok(ALL_EMPTY.to_string());
    }

    let mut rendered = String::new();
    for (idx, value) in distinct.iter().take(max_samples).enumerate() {
        if idx > 0 {
            rendered.push_str(", ");
        }
        write_truncated(&mut rendered, value)?;
    }
    if distinct.len() > max_samples {
        rendered.push_str(ELLIPSIS);
    }
    Ok(rendered)
}

fn write_truncated(out: &mut String, value: &Value) -> fmt::Result {
    let text = value.as_display();
    if text.chars().count() > MAX_VALUE_CHARS {
        let head = text.chars().take(MAX_VALUE_CHARS).collect::<String>();
        write!(out, "{head}{ELLIPSIS}")
    } else {
        write!(out, "{text}")
    }
}
