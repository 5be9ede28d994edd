//! # Catalog Store
//!
//! The ordered collection of catalog entries for one session. Insertion
//! order is display order. Every mutation either succeeds completely or
//! leaves the store untouched.
//!
//! The store does no locking. Layout and rendering work on a `snapshot()`,
//! and callers must not mutate the store until that snapshot's document is
//! finished.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::model::CatalogEntry;

/// Whether entries are identified by a unique product code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodePolicy {
    /// Reference-code mode: every entry carries a code, and codes are unique.
    #[default]
    Enforced,
    /// Free-text mode: codes are optional and may repeat.
    Free,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    entries: Vec<CatalogEntry>,
    policy: CodePolicy,
}

impl CatalogStore {
    pub fn new(policy: CodePolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CodePolicy {
        self.policy
    }

    /// Append an entry, rejecting a code that is already present.
    pub fn add(&mut self, entry: CatalogEntry) -> Result<()> {
        if self.policy == CodePolicy::Enforced {
            if let Some(code) = entry.code() {
                if self.contains_code(code) {
                    return Err(CatalogError::DuplicateCode {
                        code: code.to_string(),
                    });
                }
            }
        }
        debug!(code = ?entry.code(), index = self.entries.len(), "catalog entry added");
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the entry at `index`; later entries shift down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<CatalogEntry> {
        if index >= self.entries.len() {
            return Err(CatalogError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        let removed = self.entries.remove(index);
        debug!(index, remaining = self.entries.len(), "catalog entry removed");
        Ok(removed)
    }

    /// Replace the whole collection after validating every incoming entry.
    pub fn replace_all(&mut self, entries: Vec<CatalogEntry>) -> Result<()> {
        validate_entries(&entries, self.policy)?;
        debug!(
            previous = self.entries.len(),
            loaded = entries.len(),
            "catalog replaced"
        );
        self.entries = entries;
        Ok(())
    }

    /// An owned copy of the entries in display order.
    pub fn snapshot(&self) -> Vec<CatalogEntry> {
        self.entries.clone()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.entries.iter().any(|e| e.code() == Some(code))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Structural check shared by `replace_all` and the JSON import.
pub(crate) fn validate_entries(entries: &[CatalogEntry], policy: CodePolicy) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if entry.image.trim().is_empty() {
            return Err(CatalogError::InvalidCatalogFormat(format!(
                "entry {} has no image",
                i
            )));
        }
        if entry.description.trim().is_empty() {
            return Err(CatalogError::InvalidCatalogFormat(format!(
                "entry {} has no description",
                i
            )));
        }
    }

    if policy == CodePolicy::Enforced {
        let mut seen = HashSet::new();
        for entry in entries {
            if let Some(code) = entry.code() {
                if !seen.insert(code) {
                    return Err(CatalogError::InvalidCatalogFormat(format!(
                        "code '{}' appears more than once",
                        code
                    )));
                }
            }
        }
    }
    Ok(())
}
