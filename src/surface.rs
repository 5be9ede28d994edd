//! # Drawing Capabilities
//!
//! The layout engine and renderer never draw directly. They talk to a
//! document surface through these traits: one that can measure wrapped text,
//! and one that can also manage pages and place shapes, text and images at
//! absolute coordinates.
//!
//! Coordinates are points from the top-left of the current page.

use crate::font::FontSpec;
use crate::image_loader::Photo;
use crate::model::Color;

/// Text measurement as the target document engine performs it.
///
/// Line counts must come from the engine that will draw the text, because
/// its font metrics decide where lines wrap.
pub trait TextMeasure {
    /// Wrap `text` to `max_width`, returning the lines in order. Blank text
    /// yields no lines.
    fn wrap_text(&self, text: &str, max_width: f64, font: FontSpec) -> Vec<String>;

    /// Advance width of a single unwrapped line.
    fn text_width(&self, text: &str, font: FontSpec) -> f64;

    fn line_count(&self, text: &str, max_width: f64, font: FontSpec) -> usize {
        self.wrap_text(text, max_width, font).len()
    }
}

/// A paginated document that can be drawn into.
///
/// A new surface starts with page 0 open.
pub trait DrawingSurface: TextMeasure {
    /// Close the current page and open the next one.
    fn add_page(&mut self);

    /// Index of the page currently being drawn.
    fn current_page(&self) -> usize;

    fn page_size(&self) -> (f64, f64);

    fn fill_rounded_rect(&mut self, x: f64, y: f64, width: f64, height: f64, radius: f64, fill: Color);

    /// Draw lines of text. `y` is the top of the first line; each following
    /// line starts `line_height` lower.
    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        lines: &[String],
        font: FontSpec,
        line_height: f64,
        color: Color,
    );

    fn draw_image(&mut self, photo: &Photo, x: f64, y: f64, width: f64, height: f64);
}
