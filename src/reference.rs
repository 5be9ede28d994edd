//! # Reference Table
//!
//! Parses the imported code → description/group/subgroup table that lets a
//! field user pick a product code instead of typing metadata.
//!
//! The file is a small CSV exported from a spreadsheet. Depending on the
//! locale the spreadsheet uses `;` or `,` as separator, so the delimiter is
//! sniffed from the header line. Columns are found by name, not position.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::model::ReferenceRecord;

/// Required header names, after trimming and lowercasing.
pub const REQUIRED_COLUMNS: [&str; 4] = ["codigo", "descripcion", "grupo", "subgrupo"];

/// Lookup table built from one reference import.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: HashMap<String, ReferenceRecord>,
}

/// Pick the column delimiter from the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

impl ReferenceTable {
    /// Parse the raw text of a reference file.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
        let header_line = lines.first().ok_or(CatalogError::EmptyInput)?;
        let delimiter = detect_delimiter(header_line);
        let body = lines.join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let mut rows = reader.records();
        let headers: Vec<String> = match rows.next() {
            Some(record) => record
                .map_err(|e| CatalogError::Schema {
                    missing: vec![format!("unreadable header: {}", e)],
                })?
                .iter()
                .map(|h| h.trim().to_lowercase())
                .collect(),
            None => return Err(CatalogError::EmptyInput),
        };

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::Schema { missing });
        }

        let column = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
        let (code_col, desc_col, group_col, subgroup_col) = (
            column("codigo"),
            column("descripcion"),
            column("grupo"),
            column("subgrupo"),
        );

        let mut records = HashMap::new();
        for (line_no, row) in rows.enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    debug!(line = line_no + 2, error = %e, "skipping unreadable reference row");
                    continue;
                }
            };
            let field = |idx: usize| row.get(idx).unwrap_or("").to_string();
            let code = field(code_col);
            if code.is_empty() {
                continue;
            }
            let record = ReferenceRecord {
                code: code.clone(),
                description: field(desc_col),
                group: field(group_col),
                subgroup: field(subgroup_col),
            };
            // Later rows win.
            records.insert(code, record);
        }

        debug!(
            records = records.len(),
            delimiter = %(delimiter as char),
            "parsed reference table"
        );
        Ok(Self { records })
    }

    pub fn get(&self, code: &str) -> Option<&ReferenceRecord> {
        self.records.get(code.trim())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All codes in ascending order, for code pickers.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.records.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceRecord> {
        self.records.values()
    }
}
