//! # PDF Surface
//!
//! A [`DrawingSurface`] that writes a PDF 1.7 file directly. A catalog only
//! needs filled paths, standard-font text and image XObjects, so the raw
//! bytes are written here without a PDF library.
//!
//! Object layout of the finished file:
//!
//! ```text
//! 1        Catalog
//! 2        Pages (tree root)
//! 3, 4     Helvetica, Helvetica-Bold (Type1, WinAnsiEncoding)
//! 5..      photo XObjects (+ SMasks), in draw order
//! ..       per page: content stream, then the Page dictionary
//! last     Info dictionary
//! ```
//!
//! Callers draw in top-left coordinates; operators are written with y
//! flipped, since PDF user space grows upward from the bottom-left.

use std::fmt::Write as _;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::{FontContext, FontSpec, StandardFont};
use crate::image_loader::{Photo, PhotoPixels};
use crate::model::Color;
use crate::surface::{DrawingSurface, TextMeasure};
use crate::text::TextLayout;

const FLATE_LEVEL: u8 = 6;

/// Bezier handle length for a quarter circle of radius 1.
const KAPPA: f64 = 0.552_284_749_8;

/// Values for the Info dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// Operators of one page and the photos it uses.
#[derive(Default)]
struct PageContent {
    ops: String,
    /// (resource number, object id)
    xobjects: Vec<(usize, usize)>,
}

pub struct PdfSurface {
    width: f64,
    height: f64,
    fonts: FontContext,
    text_layout: TextLayout,
    /// Serialized bodies; index 0 is unused since object numbers start at 1.
    objects: Vec<Vec<u8>>,
    font_ids: Vec<usize>,
    photo_count: usize,
    pages: Vec<PageContent>,
}

impl PdfSurface {
    /// Start a document with pages of `width` × `height` points. Page 0 is open.
    pub fn new(width: f64, height: f64) -> Self {
        let mut surface = Self {
            width,
            height,
            fonts: FontContext::new(),
            text_layout: TextLayout::new(),
            // unused, Catalog, Pages: filled in by finish()
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            font_ids: Vec::new(),
            photo_count: 0,
            pages: vec![PageContent::default()],
        };
        for font in StandardFont::ALL {
            let id = surface.push_object(format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            ));
            surface.font_ids.push(id);
        }
        surface
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn push_object(&mut self, body: impl Into<Vec<u8>>) -> usize {
        self.objects.push(body.into());
        self.objects.len() - 1
    }

    /// Push a stream object. `entries` are the dictionary entries besides
    /// `/Length`.
    fn push_stream(&mut self, entries: &str, data: &[u8]) -> usize {
        let mut body = format!("<< {} /Length {} >>\nstream\n", entries, data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.push_object(body)
    }

    fn open_page(&mut self) -> &mut PageContent {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Embed a photo and return its XObject id.
    fn embed_photo(&mut self, photo: &Photo) -> usize {
        let size = format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} /BitsPerComponent 8",
            photo.width_px, photo.height_px
        );
        match &photo.pixels {
            PhotoPixels::Jpeg { bytes, grayscale } => {
                let space = if *grayscale { "/DeviceGray" } else { "/DeviceRGB" };
                self.push_stream(&format!("{} /ColorSpace {} /Filter /DCTDecode", size, space), bytes)
            }
            PhotoPixels::Raw { rgb, alpha } => {
                let smask = alpha.as_ref().map(|alpha| {
                    let data = compress_to_vec_zlib(alpha, FLATE_LEVEL);
                    let id = self.push_stream(
                        &format!("{} /ColorSpace /DeviceGray /Filter /FlateDecode", size),
                        &data,
                    );
                    format!(" /SMask {} 0 R", id)
                });
                let data = compress_to_vec_zlib(rgb, FLATE_LEVEL);
                self.push_stream(
                    &format!(
                        "{} /ColorSpace /DeviceRGB /Filter /FlateDecode{}",
                        size,
                        smask.unwrap_or_default()
                    ),
                    &data,
                )
            }
        }
    }

    /// Close the document and return the file bytes.
    pub fn finish(mut self, info: &DocumentInfo) -> Vec<u8> {
        let mut font_refs = String::new();
        for (font, id) in StandardFont::ALL.iter().zip(&self.font_ids) {
            let _ = write!(font_refs, "/{} {} 0 R ", font.resource_name(), id);
        }

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let ops = compress_to_vec_zlib(page.ops.as_bytes(), FLATE_LEVEL);
            let contents = self.push_stream("/Filter /FlateDecode", &ops);

            let mut resources = format!("/Font << {}>>", font_refs);
            if !page.xobjects.is_empty() {
                resources.push_str(" /XObject << ");
                for (n, id) in &page.xobjects {
                    let _ = write!(resources, "/Im{} {} 0 R ", n, id);
                }
                resources.push_str(">>");
            }

            let id = self.push_object(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                self.width, self.height, contents, resources
            ));
            kids.push(id);
        }

        self.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kid_refs: Vec<String> = kids.iter().map(|id| format!("{} 0 R", id)).collect();
        self.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kid_refs.join(" "),
            kids.len()
        )
        .into_bytes();

        let mut dict = String::from("<< ");
        let fields = [("Title", &info.title), ("Author", &info.author), ("Subject", &info.subject)];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(dict, "/{} ({}) ", key, encode_text(value));
            }
        }
        let _ = write!(dict, "/Producer (catalogo {}) >>", env!("CARGO_PKG_VERSION"));
        let info_id = self.push_object(dict);

        self.serialize(info_id)
    }

    fn serialize(&self, info_id: usize) -> Vec<u8> {
        let mut out: Vec<u8> = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (id, body) in self.objects.iter().enumerate().skip(1) {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_start = out.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", self.objects.len());
        for offset in offsets {
            let _ = write!(table, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.objects.len(),
            info_id,
            xref_start
        );
        out.extend_from_slice(table.as_bytes());
        out
    }
}

impl TextMeasure for PdfSurface {
    fn wrap_text(&self, text: &str, max_width: f64, font: FontSpec) -> Vec<String> {
        self.text_layout
            .break_into_lines(&self.fonts, text, max_width, font)
            .into_iter()
            .map(|line| line.text)
            .collect()
    }

    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        self.fonts.measure_string(text, font)
    }
}

impl DrawingSurface for PdfSurface {
    fn add_page(&mut self) {
        self.pages.push(PageContent::default());
    }

    fn current_page(&self) -> usize {
        self.pages.len() - 1
    }

    fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill_rounded_rect(&mut self, x: f64, y: f64, width: f64, height: f64, radius: f64, fill: Color) {
        let bottom = self.height - y - height;
        let ops = &mut self.open_page().ops;
        let _ = writeln!(ops, "q {:.3} {:.3} {:.3} rg", fill.r, fill.g, fill.b);
        if radius > 0.0 {
            rounded_rect_path(ops, x, bottom, width, height, radius);
        } else {
            let _ = writeln!(ops, "{:.2} {:.2} {:.2} {:.2} re", x, bottom, width, height);
        }
        ops.push_str("f Q\n");
    }

    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        lines: &[String],
        font: FontSpec,
        line_height: f64,
        color: Color,
    ) {
        if lines.is_empty() {
            return;
        }
        // First baseline, centred in the line box with room for descenders.
        let baseline = self.height - (y + (line_height - font.size) / 2.0 + font.size * 0.8);
        let ops = &mut self.open_page().ops;
        let _ = writeln!(ops, "BT {:.3} {:.3} {:.3} rg", color.r, color.g, color.b);
        let _ = writeln!(ops, "/{} {:.1} Tf {:.2} TL", font.font.resource_name(), font.size, line_height);
        let _ = writeln!(ops, "{:.2} {:.2} Td", x, baseline);
        for (i, line) in lines.iter().enumerate() {
            // T* moves down by TL before every line but the first.
            let advance = if i == 0 { "" } else { "T* " };
            let _ = writeln!(ops, "{}({}) Tj", advance, encode_text(line));
        }
        ops.push_str("ET\n");
    }

    fn draw_image(&mut self, photo: &Photo, x: f64, y: f64, width: f64, height: f64) {
        let id = self.embed_photo(photo);
        let n = self.photo_count;
        self.photo_count += 1;

        let bottom = self.height - y - height;
        let page = self.open_page();
        page.xobjects.push((n, id));
        let _ = writeln!(
            page.ops,
            "q {:.4} 0 0 {:.4} {:.2} {:.2} cm /Im{} Do Q",
            width, height, x, bottom, n
        );
    }
}

/// Append a closed rounded-rectangle path. `(x, y)` is the bottom-left
/// corner in PDF space.
fn rounded_rect_path(ops: &mut String, x: f64, y: f64, w: f64, h: f64, radius: f64) {
    let r = radius.min(w / 2.0).min(h / 2.0);
    let c = r * KAPPA;
    let (right, top) = (x + w, y + h);

    let _ = writeln!(ops, "{:.2} {:.2} m", x + r, y);
    let _ = writeln!(ops, "{:.2} {:.2} l", right - r, y);
    let _ = writeln!(
        ops,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        right - r + c, y, right, y + r - c, right, y + r
    );
    let _ = writeln!(ops, "{:.2} {:.2} l", right, top - r);
    let _ = writeln!(
        ops,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        right, top - r + c, right - r + c, top, right - r, top
    );
    let _ = writeln!(ops, "{:.2} {:.2} l", x + r, top);
    let _ = writeln!(
        ops,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x + r - c, top, x, top - r + c, x, top - r
    );
    let _ = writeln!(ops, "{:.2} {:.2} l", x, y + r);
    let _ = writeln!(
        ops,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x, y + r - c, x + r - c, y, x + r, y
    );
    ops.push_str("h\n");
}

/// Body of a PDF literal string, in WinAnsiEncoding. Characters the
/// encoding lacks become `?`.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match winansi_byte(ch).unwrap_or(b'?') {
            b @ (b'\\' | b'(' | b')') => {
                out.push('\\');
                out.push(b as char);
            }
            b @ 0x20..=0x7E => out.push(b as char),
            b => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}

/// Windows-1252 byte for `ch`. Latin-1 maps to itself; the 0x80–0x9F block
/// holds typographic punctuation.
fn winansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        ' '..='~' | '\u{A0}'..='\u{FF}' => ch as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    };
    Some(byte)
}
