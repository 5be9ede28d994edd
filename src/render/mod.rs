//! # Document Renderer
//!
//! Walks the placements produced by the layout engine and draws them onto a
//! [`DrawingSurface`]. Pages are opened in order as placements ask for them,
//! and every page gets its header band as soon as it opens.
//!
//! Images are decoded one at a time through an [`ImageDecoder`]. Each decode
//! is awaited before its card is drawn, so output order always matches
//! placement order. A photo that fails to decode becomes a grey placeholder;
//! it never aborts the document.

use tracing::{debug, warn};

use crate::font::FontSpec;
use crate::image_loader::{ImageDecoder, Photo};
use crate::layout::{CardFonts, CatalogLayout, MeasuredCard, PagePlacement};
use crate::model::{CatalogEntry, Color, PageGeometry};
use crate::surface::DrawingSurface;

/// Colors and fonts outside the card text fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTheme {
    pub card_background: Color,
    pub text: Color,
    /// Group and subgroup lines.
    pub muted_text: Color,
    pub image_placeholder: Color,
    pub title_font: FontSpec,
    pub header_font: FontSpec,
}

impl Default for RenderTheme {
    fn default() -> Self {
        Self {
            card_background: Color::rgb(0.95, 0.95, 0.96),
            text: Color::BLACK,
            muted_text: Color::rgb(0.35, 0.35, 0.4),
            image_placeholder: Color::rgb(0.82, 0.82, 0.82),
            title_font: FontSpec::bold(16.0),
            header_font: FontSpec::regular(8.0),
        }
    }
}

/// What a render pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    pub cards: usize,
    /// Cards drawn with a placeholder instead of their photo.
    pub failed_images: usize,
}

pub struct DocumentRenderer<D> {
    geometry: PageGeometry,
    fonts: CardFonts,
    theme: RenderTheme,
    title: String,
    decoder: D,
}

impl<D: ImageDecoder> DocumentRenderer<D> {
    pub fn new(geometry: PageGeometry, title: impl Into<String>, decoder: D) -> Self {
        Self {
            geometry,
            fonts: CardFonts::default(),
            theme: RenderTheme::default(),
            title: title.into(),
            decoder,
        }
    }

    pub fn with_fonts(mut self, fonts: CardFonts) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_theme(mut self, theme: RenderTheme) -> Self {
        self.theme = theme;
        self
    }

    /// Draw `layout` onto a fresh `surface`.
    ///
    /// `entries` must be the slice the layout was computed from.
    pub async fn render<S: DrawingSurface>(
        &self,
        surface: &mut S,
        entries: &[CatalogEntry],
        layout: &CatalogLayout,
    ) -> RenderSummary {
        let total_pages = layout.page_count.max(1);
        self.draw_page_header(surface, 0, total_pages);
        self.draw_title_block(surface, entries.len());

        let mut summary = RenderSummary {
            pages: 1,
            cards: 0,
            failed_images: 0,
        };

        for placement in &layout.placements {
            while surface.current_page() < placement.page_index {
                surface.add_page();
                let page = surface.current_page();
                self.draw_page_header(surface, page, total_pages);
                summary.pages += 1;
                debug!(page, "page opened");
            }

            let (Some(entry), Some(card)) = (
                entries.get(placement.entry_index),
                layout.cards.get(placement.entry_index),
            ) else {
                warn!(entry = placement.entry_index, "placement has no matching entry; skipped");
                continue;
            };

            self.draw_card_background(surface, placement);

            match self.decoder.decode(&entry.image).await {
                Ok(photo) => self.draw_photo(surface, placement, &photo),
                Err(e) => {
                    warn!(code = ?entry.code(), error = %e, "image decode failed; drawing placeholder");
                    summary.failed_images += 1;
                    self.draw_placeholder(surface, placement);
                }
            }

            self.draw_fields(surface, placement, card);
            summary.cards += 1;
        }

        summary
    }

    /// Title on the left and page number on the right, inside the top margin.
    fn draw_page_header<S: DrawingSurface>(&self, surface: &mut S, page: usize, total: usize) {
        let g = &self.geometry;
        let font = self.theme.header_font;
        let line_height = font.size * 1.25;
        let y = ((g.margin - line_height) / 2.0).max(0.0);

        if !self.title.is_empty() {
            surface.draw_text(
                g.margin,
                y,
                &[self.title.clone()],
                font,
                line_height,
                self.theme.muted_text,
            );
        }

        let label = format!("Página {} de {}", page + 1, total);
        let width = surface.text_width(&label, font);
        let (page_width, _) = surface.page_size();
        surface.draw_text(
            page_width - g.margin - width,
            y,
            &[label],
            font,
            line_height,
            self.theme.muted_text,
        );
    }

    /// The large title and a product count, in the band reserved on page one.
    fn draw_title_block<S: DrawingSurface>(&self, surface: &mut S, count: usize) {
        let g = &self.geometry;
        if g.title_height <= 0.0 {
            return;
        }
        let title_font = self.theme.title_font;
        let title_line = title_font.size * 1.15;
        let max_width = surface.page_size().0 - 2.0 * g.margin;

        let mut lines = surface.wrap_text(&self.title, max_width, title_font);
        lines.truncate(1);
        surface.draw_text(g.margin, g.margin, &lines, title_font, title_line, self.theme.text);

        let note = if count == 1 {
            "1 producto".to_string()
        } else {
            format!("{} productos", count)
        };
        let note_font = FontSpec::regular(9.0);
        let note_y = g.margin + lines.len() as f64 * title_line;
        if note_y + g.line_height <= g.margin + g.title_height {
            surface.draw_text(g.margin, note_y, &[note], note_font, g.line_height, self.theme.muted_text);
        }
    }

    fn draw_card_background<S: DrawingSurface>(&self, surface: &mut S, p: &PagePlacement) {
        surface.fill_rounded_rect(
            p.x,
            p.y,
            p.width,
            p.height,
            self.geometry.corner_radius,
            self.theme.card_background,
        );
    }

    /// Fit the photo inside the image square, keeping its aspect ratio.
    fn draw_photo<S: DrawingSurface>(&self, surface: &mut S, p: &PagePlacement, photo: &Photo) {
        let (x, y, w, h) = fit_contain(
            photo.width_px as f64,
            photo.height_px as f64,
            self.geometry.image_size,
        );
        let origin_x = p.x + self.geometry.card_padding;
        let origin_y = p.y + self.geometry.card_padding;
        surface.draw_image(photo, origin_x + x, origin_y + y, w, h);
    }

    fn draw_placeholder<S: DrawingSurface>(&self, surface: &mut S, p: &PagePlacement) {
        let g = &self.geometry;
        surface.fill_rounded_rect(
            p.x + g.card_padding,
            p.y + g.card_padding,
            g.image_size,
            g.image_size,
            0.0,
            self.theme.image_placeholder,
        );
    }

    /// Text fields top-aligned in the column right of the photo. The
    /// field spacing is added once, after the first field drawn.
    fn draw_fields<S: DrawingSurface>(
        &self,
        surface: &mut S,
        p: &PagePlacement,
        card: &MeasuredCard,
    ) {
        let g = &self.geometry;
        let x = p.x + g.card_padding + g.image_size + g.text_offset;
        let mut y = p.y + g.card_padding;
        let fields = [
            (&card.text.code, self.fonts.code, self.theme.text),
            (&card.text.description, self.fonts.description, self.theme.text),
            (&card.text.group, self.fonts.group, self.theme.muted_text),
            (&card.text.subgroup, self.fonts.subgroup, self.theme.muted_text),
        ];

        let mut first = true;
        for (lines, font, color) in fields {
            if lines.is_empty() {
                continue;
            }
            surface.draw_text(x, y, lines, font, g.line_height, color);
            y += lines.len() as f64 * g.line_height;
            if first {
                y += g.field_spacing;
                first = false;
            }
        }
    }
}

/// Scale a `width` × `height` image into a `side` square, centered.
/// Returns (x offset, y offset, drawn width, drawn height).
fn fit_contain(width: f64, height: f64, side: f64) -> (f64, f64, f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0, side, side);
    }
    let scale = (side / width).min(side / height);
    let w = width * scale;
    let h = height * scale;
    ((side - w) / 2.0, (side - h) / 2.0, w, h)
}
