//! # Card Layout Engine
//!
//! Flows catalog cards INTO pages. There is no tall canvas that gets sliced
//! afterwards: every row is measured first and only then committed to a page,
//! so a card is never cut by a page edge.
//!
//! The algorithm:
//!
//! 1. Measure every card. A card shows the photo on the left and its text
//!    fields (code, description, group, subgroup) wrapped in the column to
//!    the right. Line counts come from the drawing surface, not estimates.
//! 2. Chunk the cards into rows of `cards_per_row`. A row is as tall as its
//!    tallest card, and every card of the row takes that height.
//! 3. At the start of each row decide whether the whole row fits below the
//!    cursor. If not, open a new page. Mid-row cards never break.
//! 4. Emit one placement per card, then advance the cursor past the row.
//!
//! The first page reserves `title_height` below the top margin for the
//! catalog title; later pages start at the margin.

pub mod page_break;

use serde::Serialize;
use tracing::{debug, warn};

use crate::font::FontSpec;
use crate::model::{CatalogEntry, PageGeometry};
use crate::surface::TextMeasure;
use page_break::{decide_row_break, BreakDecision};

/// Where one card goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlacement {
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// The height of the card's row.
    pub height: f64,
    /// Index into the entry slice that was laid out.
    pub entry_index: usize,
}

/// Fonts for the four text fields of a card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardFonts {
    pub code: FontSpec,
    pub description: FontSpec,
    pub group: FontSpec,
    pub subgroup: FontSpec,
}

impl Default for CardFonts {
    fn default() -> Self {
        Self {
            code: FontSpec::bold(10.0),
            description: FontSpec::regular(9.0),
            group: FontSpec::regular(8.0),
            subgroup: FontSpec::regular(8.0),
        }
    }
}

/// A card's wrapped text, field by field. Absent fields have no lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardText {
    pub code: Vec<String>,
    pub description: Vec<String>,
    pub group: Vec<String>,
    pub subgroup: Vec<String>,
}

impl CardText {
    pub fn total_lines(&self) -> usize {
        self.code.len() + self.description.len() + self.group.len() + self.subgroup.len()
    }
}

/// A measured card, before it is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredCard {
    pub text: CardText,
    pub height: f64,
}

/// The result of one layout run.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    pub placements: Vec<PagePlacement>,
    /// Measured cards, parallel to the laid-out entries.
    pub cards: Vec<MeasuredCard>,
    pub page_count: usize,
}

impl CatalogLayout {
    pub fn placements_on_page(&self, page_index: usize) -> impl Iterator<Item = &PagePlacement> {
        self.placements.iter().filter(move |p| p.page_index == page_index)
    }
}

pub struct PageLayoutEngine {
    geometry: PageGeometry,
    fonts: CardFonts,
}

impl PageLayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            fonts: CardFonts::default(),
        }
    }

    pub fn with_fonts(mut self, fonts: CardFonts) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn fonts(&self) -> &CardFonts {
        &self.fonts
    }

    /// Wrap a card's fields and compute its height.
    pub fn measure_card(&self, entry: &CatalogEntry, measure: &dyn TextMeasure) -> MeasuredCard {
        let g = &self.geometry;
        let max_width = g.text_max_width();
        let wrap = |value: Option<&str>, font: FontSpec| match value {
            Some(v) => measure.wrap_text(v, max_width, font),
            None => Vec::new(),
        };

        let text = CardText {
            code: wrap(entry.code(), self.fonts.code),
            description: wrap(Some(entry.description.as_str()), self.fonts.description),
            group: wrap(entry.group.as_deref(), self.fonts.group),
            subgroup: wrap(entry.subgroup.as_deref(), self.fonts.subgroup),
        };

        let content_height = text.total_lines() as f64 * g.line_height + g.field_spacing;
        let height = (g.image_size + 2.0 * g.card_padding).max(content_height + 2.0 * g.card_padding);

        MeasuredCard { text, height }
    }

    /// Lay out `entries` in the given order.
    pub fn layout(&self, entries: &[CatalogEntry], measure: &dyn TextMeasure) -> CatalogLayout {
        let g = &self.geometry;
        let per_row = g.cards_per_row.max(1);
        let card_width = g.card_width();
        let page_top = g.margin;
        let page_bottom = g.content_bottom();

        let cards: Vec<MeasuredCard> = entries.iter().map(|e| self.measure_card(e, measure)).collect();

        let mut placements = Vec::with_capacity(entries.len());
        let mut page_index = 0;
        let mut cursor_y = g.margin + g.title_height;
        let mut rows_on_page = 0;

        for (row_index, row) in cards.chunks(per_row).enumerate() {
            let row_height = row.iter().map(|c| c.height).fold(0.0, f64::max);

            match decide_row_break(cursor_y, row_height, g.inter_card_gap, page_top, page_bottom, rows_on_page) {
                BreakDecision::Place => {}
                BreakDecision::MoveToNextPage => {
                    page_index += 1;
                    cursor_y = page_top;
                    rows_on_page = 0;
                    debug!(row = row_index, page = page_index, "row moved to new page");
                }
            }

            if cursor_y + row_height > page_bottom {
                warn!(
                    row = row_index,
                    page = page_index,
                    row_height,
                    "row is taller than the printable page; placing it anyway"
                );
            }

            for column in 0..row.len() {
                placements.push(PagePlacement {
                    page_index,
                    x: g.margin + column as f64 * (card_width + g.inter_card_gap),
                    y: cursor_y,
                    width: card_width,
                    height: row_height,
                    entry_index: row_index * per_row + column,
                });
            }

            cursor_y += row_height + g.inter_card_gap;
            rows_on_page += 1;
        }

        let page_count = placements.last().map_or(1, |p| p.page_index + 1);
        debug!(cards = cards.len(), pages = page_count, "catalog layout complete");

        CatalogLayout {
            placements,
            cards,
            page_count,
        }
    }
}

/// Sort a copy of the entries by code for the printed catalog.
///
/// The sort is stable, so entries with equal codes keep their insertion
/// order. Entries without a code come first.
pub fn sorted_for_export(entries: &[CatalogEntry]) -> Vec<CatalogEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| a.code().cmp(&b.code()));
    sorted
}
