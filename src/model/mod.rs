//! # Catalog Model
//!
//! The data the engine works on: catalog entries, reference records, and the
//! page geometry the layout engine flows cards into.
//!
//! All geometry is in PDF points (1/72 inch), with the origin at the top-left
//! of the page and y growing downward. The PDF surface flips y when it writes
//! content streams.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// One product in the catalog: a photo plus descriptive metadata.
///
/// `image` is the encoded still image as text (a `data:image/...;base64,`
/// URI or raw base64). Field order here is the key order of the portable
/// JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub image: String,
    #[serde(default, alias = "partNumber", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<String>,
}

impl CatalogEntry {
    pub fn new(image: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            code: None,
            description: description.into(),
            group: None,
            subgroup: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_subgroup(mut self, subgroup: impl Into<String>) -> Self {
        self.subgroup = Some(subgroup.into());
        self
    }

    /// The code, treating an empty string the same as no code.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.is_empty())
    }
}

/// A row of the imported reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub code: String,
    pub description: String,
    pub group: String,
    pub subgroup: String,
}

/// Page formats offered for the PDF export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageFormat {
    #[default]
    A4,
    /// Oficio / folio: 8.5 × 13 in.
    Oficio,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageFormat {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (595.28, 841.89),
            PageFormat::Oficio => (612.0, 936.0),
            PageFormat::Letter => (612.0, 792.0),
            PageFormat::Custom { width, height } => (*width, *height),
        }
    }
}

/// Fixed geometry of one export run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub cards_per_row: usize,
    /// Side of the square the photo is fitted into.
    pub image_size: f64,
    pub line_height: f64,
    pub card_padding: f64,
    pub inter_card_gap: f64,
    /// Horizontal space between the photo and the text column.
    pub text_offset: f64,
    /// Extra vertical space added once to a card's text block.
    pub field_spacing: f64,
    /// Space reserved for the title block on the first page only.
    pub title_height: f64,
    pub corner_radius: f64,
}

impl PageGeometry {
    pub fn for_format(format: PageFormat, cards_per_row: usize) -> Self {
        let (page_width, page_height) = format.dimensions();
        Self {
            page_width,
            page_height,
            cards_per_row: cards_per_row.max(1),
            ..Self::default()
        }
    }

    pub fn card_width(&self) -> f64 {
        let per_row = self.cards_per_row.max(1) as f64;
        (self.page_width - 2.0 * self.margin - self.inter_card_gap * (per_row - 1.0)) / per_row
    }

    /// Width available to the wrapped text fields of a card.
    pub fn text_max_width(&self) -> f64 {
        self.text_column_width().max(0.0)
    }

    fn text_column_width(&self) -> f64 {
        self.card_width() - self.image_size - self.card_padding * 2.0 - self.text_offset
    }

    /// Reject geometry whose cards cannot hold the photo and a text column
    /// side by side.
    pub fn validate(&self) -> Result<()> {
        let card_width = self.card_width();
        if card_width <= 0.0 {
            return Err(CatalogError::InvalidConfig(format!(
                "{} cards per row leave no room on a {:.0}pt wide page",
                self.cards_per_row, self.page_width
            )));
        }
        if self.text_column_width() <= 0.0 {
            return Err(CatalogError::InvalidConfig(format!(
                "cards are {:.2}pt wide, too narrow for a {:.2}pt photo plus padding and text \
                 ({} cards per row); use fewer cards per row or a smaller imageSize",
                card_width, self.image_size, self.cards_per_row
            )));
        }
        Ok(())
    }

    /// The lowest y a card may reach.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        let (page_width, page_height) = PageFormat::A4.dimensions();
        Self {
            page_width,
            page_height,
            margin: 28.0,
            cards_per_row: 2,
            image_size: 90.0,
            line_height: 11.0,
            card_padding: 8.0,
            inter_card_gap: 10.0,
            text_offset: 8.0,
            field_spacing: 4.0,
            title_height: 36.0,
            corner_radius: 6.0,
        }
    }
}

/// An RGB color with components in 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}
