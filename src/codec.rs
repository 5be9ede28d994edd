//! # Import / Export Codec
//!
//! The portable catalog document is a pretty-printed JSON array of entry
//! objects. Export is deterministic: field order follows `CatalogEntry`,
//! indentation is two spaces, so exporting the same entries twice yields the
//! same bytes.
//!
//! Import is strict. A file that is not JSON is `MalformedDocument`; JSON of
//! the wrong shape is `InvalidCatalogFormat`. Entries are never coerced.

use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::model::CatalogEntry;
use crate::reference::REQUIRED_COLUMNS;
use crate::store::{validate_entries, CodePolicy};

const OPTIONAL_TEXT_FIELDS: [&str; 4] = ["code", "partNumber", "group", "subgroup"];

/// Serialize entries to the portable JSON document.
pub fn to_portable(entries: &[CatalogEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries)
        .map_err(|e| CatalogError::InvalidCatalogFormat(format!("cannot serialize catalog: {}", e)))
}

/// Parse and validate a portable JSON document.
pub fn from_portable(text: &str) -> Result<Vec<CatalogEntry>> {
    let value: Value = serde_json::from_str(text)?;

    let items = value.as_array().ok_or_else(|| {
        CatalogError::InvalidCatalogFormat("expected a list of products".to_string())
    })?;

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            CatalogError::InvalidCatalogFormat(format!("entry {} is not an object", i))
        })?;

        for required in ["image", "description"] {
            match object.get(required) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                _ => {
                    return Err(CatalogError::InvalidCatalogFormat(format!(
                        "entry {} is missing '{}'",
                        i, required
                    )))
                }
            }
        }
        for optional in OPTIONAL_TEXT_FIELDS {
            match object.get(optional) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(CatalogError::InvalidCatalogFormat(format!(
                        "entry {} has a non-text '{}'",
                        i, optional
                    )))
                }
            }
        }

        let entry: CatalogEntry = serde_json::from_value(item.clone()).map_err(|e| {
            CatalogError::InvalidCatalogFormat(format!("entry {}: {}", i, e))
        })?;
        entries.push(entry);
    }

    validate_entries(&entries, CodePolicy::Free)?;
    Ok(entries)
}

/// The empty reference table users fill in: the header row only.
pub fn to_tabular_template() -> String {
    let mut template = REQUIRED_COLUMNS.join(",");
    template.push('\n');
    template
}
