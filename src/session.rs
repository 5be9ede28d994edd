//! # Catalog Session
//!
//! One capture session: the store being filled, the reference table codes
//! are matched against, and the export entry points. A session is a plain
//! value; the caller owns it and passes it by reference. Nothing is global.
//!
//! The [`CodePolicy`] in the config decides how "add product" behaves:
//!
//! - `Enforced`: the user types a code, the reference table supplies the
//!   description, group and subgroup. Codes are unique.
//! - `Free`: the user types a description, the code is optional and may
//!   repeat.

use chrono::{DateTime, TimeZone};
use tracing::{debug, info};

use crate::codec;
use crate::config::ExportConfig;
use crate::error::{CatalogError, Result};
use crate::image_loader::{DataUriDecoder, ImageDecoder};
use crate::layout::{sorted_for_export, PageLayoutEngine};
use crate::model::{CatalogEntry, ReferenceRecord};
use crate::pdf::{DocumentInfo, PdfSurface};
use crate::reference::ReferenceTable;
use crate::render::{DocumentRenderer, RenderSummary};
use crate::store::{CatalogStore, CodePolicy};

/// A finished PDF export.
#[derive(Debug, Clone)]
pub struct PdfExport {
    pub bytes: Vec<u8>,
    pub summary: RenderSummary,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: ExportConfig,
    store: CatalogStore,
    reference: Option<ReferenceTable>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl Session {
    pub fn new(config: ExportConfig) -> Self {
        let store = CatalogStore::new(config.code_policy);
        Self {
            config,
            store,
            reference: None,
        }
    }

    /// Start over with an empty catalog and no reference table.
    pub fn init(&mut self) {
        self.store = CatalogStore::new(self.config.code_policy);
        self.reference = None;
        debug!("session initialized");
    }

    /// Empty the catalog and forget the reference table.
    pub fn clear(&mut self) {
        self.store.clear();
        self.reference = None;
        debug!("session cleared");
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn reference(&self) -> Option<&ReferenceTable> {
        self.reference.as_ref()
    }

    /// Replace the reference table with a freshly parsed one. On error the
    /// previous table stays in place. Returns the number of records.
    pub fn load_reference(&mut self, raw: &str) -> Result<usize> {
        let table = ReferenceTable::parse(raw)?;
        let count = table.len();
        self.reference = Some(table);
        info!(records = count, "reference table loaded");
        Ok(count)
    }

    pub fn lookup(&self, code: &str) -> Option<&ReferenceRecord> {
        self.reference.as_ref().and_then(|t| t.get(code))
    }

    /// Build an entry from user input and append it to the catalog.
    ///
    /// A typed description takes precedence over the reference record's.
    pub fn add_product(
        &mut self,
        image: &str,
        code: Option<&str>,
        description: Option<&str>,
    ) -> Result<&CatalogEntry> {
        let image = image.trim();
        if image.is_empty() {
            return Err(CatalogError::MissingInput("a product photo is required".to_string()));
        }
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        let entry = match self.config.code_policy {
            CodePolicy::Enforced => {
                let code = code.ok_or_else(|| {
                    CatalogError::MissingInput("a product code is required".to_string())
                })?;
                self.entry_from_reference(image, code, description)?
            }
            CodePolicy::Free => {
                let description = description.ok_or_else(|| {
                    CatalogError::MissingInput("a description is required".to_string())
                })?;
                let mut entry = CatalogEntry::new(image, description);
                if let Some(code) = code {
                    entry = entry.with_code(code);
                    if let Some(record) = self.lookup(code) {
                        entry.group = non_empty(&record.group);
                        entry.subgroup = non_empty(&record.subgroup);
                    }
                }
                entry
            }
        };

        self.store.add(entry)?;
        let index = self.store.len() - 1;
        self.store
            .get(index)
            .ok_or(CatalogError::IndexOutOfRange { index, len: self.store.len() })
    }

    fn entry_from_reference(
        &self,
        image: &str,
        code: &str,
        typed_description: Option<&str>,
    ) -> Result<CatalogEntry> {
        let record = self.lookup(code);
        let description = typed_description
            .map(str::to_string)
            .or_else(|| record.and_then(|r| non_empty(&r.description)))
            .ok_or_else(|| {
                CatalogError::MissingInput(format!(
                    "code '{}' is not in the reference table; type a description",
                    code
                ))
            })?;

        let mut entry = CatalogEntry::new(image, description).with_code(code);
        if let Some(record) = record {
            entry.group = non_empty(&record.group);
            entry.subgroup = non_empty(&record.subgroup);
        }
        Ok(entry)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<CatalogEntry> {
        self.store.remove_at(index)
    }

    pub fn snapshot(&self) -> Vec<CatalogEntry> {
        self.store.snapshot()
    }

    /// The catalog as a portable JSON document.
    pub fn export_json(&self) -> Result<String> {
        if self.store.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        let json = codec::to_portable(&self.store.snapshot())?;
        info!(entries = self.store.len(), bytes = json.len(), "catalog exported as JSON");
        Ok(json)
    }

    /// Replace the whole catalog with the entries of a JSON document.
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let entries = codec::from_portable(text)?;
        let count = entries.len();
        self.store.replace_all(entries)?;
        info!(entries = count, "catalog imported from JSON");
        Ok(count)
    }

    /// Render the catalog as a PDF, decoding photos from their data URIs.
    pub async fn export_pdf(&self) -> Result<Vec<u8>> {
        Ok(self.export_pdf_with(DataUriDecoder).await?.bytes)
    }

    /// Render the catalog as a PDF with a caller-supplied image decoder.
    ///
    /// Cards are printed sorted by code. The store keeps its own order.
    pub async fn export_pdf_with<D: ImageDecoder>(&self, decoder: D) -> Result<PdfExport> {
        if self.store.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        let entries = sorted_for_export(&self.store.snapshot());
        let geometry = self.config.geometry()?;
        let mut surface = PdfSurface::new(geometry.page_width, geometry.page_height);

        let layout = PageLayoutEngine::new(geometry).layout(&entries, &surface);
        let summary = DocumentRenderer::new(geometry, self.config.title.clone(), decoder)
            .render(&mut surface, &entries, &layout)
            .await;

        let bytes = surface.finish(&DocumentInfo {
            title: Some(self.config.title.clone()),
            author: self.config.author.clone(),
            subject: Some(format!("{} productos", entries.len())),
        });

        info!(
            entries = entries.len(),
            pages = summary.pages,
            failed_images = summary.failed_images,
            bytes = bytes.len(),
            "catalog exported as PDF"
        );
        Ok(PdfExport { bytes, summary })
    }
}

/// `catalogo_YYYYMMDD_HHMMSS.<ext>` for an export produced at `now`.
pub fn export_file_name<Tz>(extension: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("catalogo_{}.{}", now.format("%Y%m%d_%H%M%S"), extension)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const REFERENCE: &str = "Codigo;Descripcion;Grupo;Subgrupo\n\
                             A1;Tornillo hexagonal;Ferretería;Tornillos\n\
                             B2;Arandela plana;Ferretería;\n";

    fn enforced() -> Session {
        let mut session = Session::default();
        session.load_reference(REFERENCE).unwrap();
        session
    }

    fn free() -> Session {
        Session::new(ExportConfig {
            code_policy: CodePolicy::Free,
            ..Default::default()
        })
    }

    #[test]
    fn code_mode_fills_fields_from_reference() {
        let mut session = enforced();
        let entry = session.add_product("img", Some(" A1 "), None).unwrap();
        assert_eq!(entry.code(), Some("A1"));
        assert_eq!(entry.description, "Tornillo hexagonal");
        assert_eq!(entry.group.as_deref(), Some("Ferretería"));
        assert_eq!(entry.subgroup.as_deref(), Some("Tornillos"));

        let entry = session.add_product("img", Some("B2"), None).unwrap();
        assert_eq!(entry.subgroup, None);
    }

    #[test]
    fn typed_description_overrides_reference() {
        let mut session = enforced();
        let entry = session.add_product("img", Some("A1"), Some("Tornillo M8")).unwrap();
        assert_eq!(entry.description, "Tornillo M8");
        assert_eq!(entry.group.as_deref(), Some("Ferretería"));
    }

    #[test]
    fn code_mode_requires_image_and_code() {
        let mut session = enforced();
        assert!(matches!(
            session.add_product("  ", Some("A1"), None),
            Err(CatalogError::MissingInput(_))
        ));
        assert!(matches!(
            session.add_product("img", Some(""), Some("desc")),
            Err(CatalogError::MissingInput(_))
        ));
        assert!(session.store().is_empty());
    }

    #[test]
    fn unknown_code_needs_a_description() {
        let mut session = enforced();
        assert!(matches!(
            session.add_product("img", Some("Z9"), None),
            Err(CatalogError::MissingInput(_))
        ));
        let entry = session.add_product("img", Some("Z9"), Some("Otro")).unwrap();
        assert_eq!(entry.group, None);
    }

    #[test]
    fn duplicate_codes_rejected_in_code_mode() {
        let mut session = enforced();
        session.add_product("img", Some("A1"), None).unwrap();
        assert!(matches!(
            session.add_product("img2", Some("A1"), None),
            Err(CatalogError::DuplicateCode { .. })
        ));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn free_mode_allows_missing_and_repeated_codes() {
        let mut session = free();
        session.add_product("img", None, Some("Caja")).unwrap();
        session.add_product("img", Some("X"), Some("Caja")).unwrap();
        session.add_product("img", Some("X"), Some("Caja grande")).unwrap();
        assert_eq!(session.store().len(), 3);
        assert!(matches!(
            session.add_product("img", Some("X"), None),
            Err(CatalogError::MissingInput(_))
        ));
    }

    #[test]
    fn failed_reference_load_keeps_previous_table() {
        let mut session = enforced();
        assert!(session.load_reference("codigo,descripcion\nA,b").is_err());
        assert!(session.lookup("A1").is_some());
    }

    #[test]
    fn clear_resets_everything() {
        let mut session = enforced();
        session.add_product("img", Some("A1"), None).unwrap();
        session.clear();
        assert!(session.store().is_empty());
        assert!(session.reference().is_none());

        session.load_reference(REFERENCE).unwrap();
        session.add_product("img", Some("A1"), None).unwrap();
        session.init();
        assert!(session.store().is_empty());
        assert!(session.lookup("A1").is_none());
    }

    #[test]
    fn empty_catalog_exports_fail() {
        let session = enforced();
        assert!(matches!(session.export_json(), Err(CatalogError::EmptyCatalog)));
    }

    #[tokio::test]
    async fn empty_catalog_pdf_fails() {
        let session = enforced();
        assert!(matches!(session.export_pdf().await, Err(CatalogError::EmptyCatalog)));
    }

    #[test]
    fn json_round_trip_through_session() {
        let mut session = enforced();
        session.add_product("img-a", Some("A1"), None).unwrap();
        session.add_product("img-b", Some("B2"), None).unwrap();
        let json = session.export_json().unwrap();

        let mut other = enforced();
        assert_eq!(other.import_json(&json).unwrap(), 2);
        assert_eq!(other.snapshot(), session.snapshot());
    }

    #[test]
    fn failed_import_keeps_catalog() {
        let mut session = enforced();
        session.add_product("img", Some("A1"), None).unwrap();
        assert!(session.import_json(r#"[{"image": "x"}]"#).is_err());
        assert!(session.import_json("[").is_err());
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn file_name_carries_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(export_file_name("pdf", &now), "catalogo_20260307_090501.pdf");
        assert_eq!(export_file_name("json", &now), "catalogo_20260307_090501.json");
    }
}
