//! # Catalogo
//!
//! Turns field photos into a product catalog.
//!
//! A user photographs products, attaches a code (looked up in an imported
//! reference table) or a free description, and exports the result as a
//! portable JSON document or as a paginated PDF. The PDF side is page-native:
//! cards are measured before they are placed, rows never straddle a page
//! edge, and nothing is rasterized and sliced afterwards.
//!
//! ## Architecture
//!
//! ```text
//! reference CSV ──→ [reference]  code → description/group/subgroup
//!                        ↓
//! photo + input ──→ [session] ──→ [store]   ordered entries, unique codes
//!                        ↓
//!                   [codec]       JSON export / import
//!                        ↓
//!                   [layout]      cards → page placements
//!                        ↓
//!                   [render]      placements → drawing calls
//!                        ↓
//!                   [pdf]         PDF bytes
//! ```
//!
//! Layout and rendering only see the [`surface`] traits, so the PDF writer
//! can be swapped for any engine that measures and draws text the same way.

pub mod codec;
pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod reference;
pub mod render;
pub mod session;
pub mod store;
pub mod surface;
pub mod text;

pub use config::ExportConfig;
pub use error::{CatalogError, Result};
pub use model::{CatalogEntry, PageFormat, PageGeometry, ReferenceRecord};
pub use session::{export_file_name, PdfExport, Session};
pub use store::CodePolicy;

use image_loader::DataUriDecoder;
use layout::PageLayoutEngine;
use pdf::{DocumentInfo, PdfSurface};
use render::DocumentRenderer;

/// Render `entries` to PDF bytes in the order given.
///
/// This is the lower-level entry point: no sorting and no empty-catalog
/// check. Most callers want [`Session::export_pdf`].
///
/// Photos are decoded with [`DataUriDecoder`], which uses tokio's blocking
/// pool when called inside a tokio runtime and decodes inline otherwise.
pub async fn render_pdf(entries: &[CatalogEntry], config: &ExportConfig) -> Result<Vec<u8>> {
    let geometry = config.geometry()?;
    let mut surface = PdfSurface::new(geometry.page_width, geometry.page_height);
    let layout = PageLayoutEngine::new(geometry).layout(entries, &surface);
    DocumentRenderer::new(geometry, config.title.clone(), DataUriDecoder)
        .render(&mut surface, entries, &layout)
        .await;
    Ok(surface.finish(&DocumentInfo {
        title: Some(config.title.clone()),
        author: config.author.clone(),
        subject: None,
    }))
}

/// Parse a portable catalog document and render it, sorted by code.
pub async fn render_json(json: &str, config: &ExportConfig) -> Result<Vec<u8>> {
    let entries = codec::from_portable(json)?;
    if entries.is_empty() {
        return Err(CatalogError::EmptyCatalog);
    }
    let sorted = layout::sorted_for_export(&entries);
    render_pdf(&sorted, config).await
}
