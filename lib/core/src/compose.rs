//! Text Composer
//!
//! Flattens a [`ProductRecord`] into the single text blob handed to the
//! embedding provider. Field order is fixed so the same record always
//! yields the same text.

use crate::product::ProductRecord;
use serde_json::Value;

/// Characters of description kept per record
pub const DESCRIPTION_CHAR_LIMIT: usize = 500;

/// Build the embedding text for a record.
///
/// Parts, space-joined, in order: name, `Brand: ..`, `Category: ..`,
/// `Subcategory: ..`, the first [`DESCRIPTION_CHAR_LIMIT`] characters of the
/// description, then `key: value` for every scalar feature. Empty strings
/// count as absent. A record with nothing populated composes to `""`.
pub fn compose(record: &ProductRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(name) = present(&record.name) {
        parts.push(name.to_string());
    }
    if let Some(brand) = present(&record.brand) {
        parts.push(format!("Brand: {}", brand));
    }
    if let Some(category) = present(&record.category) {
        parts.push(format!("Category: {}", category));
    }
    if let Some(subcategory) = present(&record.subcategory) {
        parts.push(format!("Subcategory: {}", subcategory));
    }
    if let Some(description) = present(&record.description) {
        parts.push(description.chars().take(DESCRIPTION_CHAR_LIMIT).collect());
    }

    for (key, value) in &record.features {
        if let Some(rendered) = scalar_text(value) {
            parts.push(format!("{}: {}", key, rendered));
        }
    }

    parts.join(" ")
}

#[inline]
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Strings, numbers and bools; nulls and containers are skipped.
/// Bools render capitalized (`True` / `False`).
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
