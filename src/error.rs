//! Structured error types for the catalog engine.
//!
//! Every variant is recoverable: the failing operation is aborted and the
//! store is left exactly as it was before the call.

use thiserror::Error;

/// The unified error type returned by all public catalog API functions.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The reference table is missing one or more required columns.
    #[error("Reference table is missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// The reference table has no non-blank lines at all.
    #[error("Reference table is empty")]
    EmptyInput,

    /// An entry with this code is already in the catalog.
    #[error("A product with code '{code}' is already in the catalog")]
    DuplicateCode { code: String },

    #[error("Index {index} is out of range for a catalog of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    /// A catalog document parsed, but its shape is wrong.
    #[error("Invalid catalog format: {0}")]
    InvalidCatalogFormat(String),

    /// The catalog document is not valid JSON.
    #[error("Failed to parse catalog document: {source}{}", hint_suffix(.hint))]
    MalformedDocument {
        source: serde_json::Error,
        hint: String,
    },

    /// Required input for "add product" was not provided.
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("The catalog is empty; add some products first")]
    EmptyCatalog,

    /// The export configuration is unreadable or describes an impossible page.
    #[error("Invalid export config: {0}")]
    InvalidConfig(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the catalog schema.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the file truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        CatalogError::MalformedDocument { source: e, hint }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
