//! Best-effort table previews of an extraction result.
//!
//! The model chooses its own shape for line items, so this is presentation
//! only: any list that cannot be laid out as a grid falls back to raw JSON.
//!
//! Which values are previewed:
//!
//! - a top-level key whose value is an object: each non-empty list inside it
//!   (e.g. `table_data.items`);
//! - a top-level key whose value is itself a non-empty list (e.g. `items`).
//!
//! Grid rules:
//!
//! - list of objects → one column per key, in first-seen order; missing
//!   cells are empty;
//! - list of lists → positional columns `0`, `1`, …;
//! - list of scalars → a single `value` column;
//! - anything mixed → [`TablePreview::Raw`].

use crate::pipeline::response::ExtractionResult;
use serde_json::Value;

/// Rectangular view of one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TablePreview {
    Grid(Grid),
    Raw(Value),
}

/// A titled preview, e.g. `table_data › items`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedPreview {
    pub title: String,
    pub preview: TablePreview,
}

/// Collect previews for every list-shaped value in `data`.
pub fn table_previews(data: &ExtractionResult) -> Vec<NamedPreview> {
    let mut previews = Vec::new();

    for (key, value) in data {
        match value {
            Value::Object(inner) => {
                for (name, list) in inner {
                    if let Value::Array(items) = list {
                        if !items.is_empty() {
                            previews.push(NamedPreview {
                                title: format!("{key} › {name}"),
                                preview: preview_list(items),
                            });
                        }
                    }
                }
            }
            Value::Array(items) if !items.is_empty() => previews.push(NamedPreview {
                title: key.clone(),
                preview: preview_list(items),
            }),
            _ => {}
        }
    }

    previews
}

/// Lay out one list as a grid, or keep it raw.
pub fn preview_list(items: &[Value]) -> TablePreview {
    match to_grid(items) {
        Some(grid) => TablePreview::Grid(grid),
        None => TablePreview::Raw(Value::Array(items.to_vec())),
    }
}

fn to_grid(items: &[Value]) -> Option<Grid> {
    let first = items.first()?;
    match first {
        Value::Object(_) => objects_grid(items),
        Value::Array(_) => arrays_grid(items),
        _ => scalars_grid(items),
    }
}

fn objects_grid(items: &[Value]) -> Option<Grid> {
    let mut columns: Vec<String> = Vec::new();
    for item in items {
        let obj = item.as_object()?;
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Some(Grid { columns, rows })
}

fn arrays_grid(items: &[Value]) -> Option<Grid> {
    let mut width = 0;
    for item in items {
        width = width.max(item.as_array()?.len());
    }

    let rows = items
        .iter()
        .filter_map(Value::as_array)
        .map(|row| {
            (0..width)
                .map(|i| row.get(i).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Some(Grid {
        columns: (0..width).map(|i| i.to_string()).collect(),
        rows,
    })
}

fn scalars_grid(items: &[Value]) -> Option<Grid> {
    if items.iter().any(|v| v.is_object() || v.is_array()) {
        return None;
    }
    Some(Grid {
        columns: vec!["value".to_string()],
        rows: items.iter().map(|v| vec![cell_text(v)]).collect(),
    })
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
