//! # Font Management
//!
//! Catalog cards use the standard PDF Helvetica faces, which readers ship
//! built in, so nothing is embedded. The context answers width queries with
//! the real AFM advances so wrapping matches what the reader draws.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// The standard fonts a card can be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name used in page content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "F0",
            Self::HelveticaBold => "F1",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }

    pub const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];
}

/// A font face at a size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub font: StandardFont,
    pub size: f64,
}

impl FontSpec {
    pub const fn regular(size: f64) -> Self {
        Self {
            font: StandardFont::Helvetica,
            size,
        }
    }

    pub const fn bold(size: f64) -> Self {
        Self {
            font: StandardFont::HelveticaBold,
            size,
        }
    }
}

/// Shared font context used by text measurement and the PDF surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, spec: FontSpec) -> f64 {
        spec.font.metrics().char_width(ch, spec.size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, spec: FontSpec) -> f64 {
        spec.font.metrics().measure_string(text, spec.size, 0.0)
    }
}
