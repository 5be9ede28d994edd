//! Integration tests for the catalog pipeline.
//!
//! These tests exercise the full path from user input to exported files.
//! They verify:
//! - Reference tables drive code lookup
//! - The catalog keeps codes unique and survives a JSON round trip
//! - Layout never overlaps cards or runs them off the page
//! - PDF output is structurally valid

use catalogo::codec;
use catalogo::image_loader::encode_data_uri;
use catalogo::layout::{sorted_for_export, PageLayoutEngine, PagePlacement};
use catalogo::pdf::PdfSurface;
use catalogo::reference::{detect_delimiter, ReferenceTable};
use catalogo::{CatalogEntry, CatalogError, CodePolicy, ExportConfig, PageFormat, Session};

// ─── Helpers ────────────────────────────────────────────────────

fn png_data_uri(width: u32, height: u32) -> String {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 120, 200, 255]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
        .unwrap();
    encode_data_uri(&buf).unwrap()
}

fn reference_csv(rows: usize) -> String {
    let mut csv = String::from("CODIGO;Descripcion;grupo;SubGrupo;precio\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "P{:04};Producto de prueba número {} con una descripción algo más larga;Grupo {};Sub {};{}\n",
            i,
            i,
            i % 3,
            i % 5,
            i * 10
        ));
    }
    csv
}

fn contains(bytes: &[u8], needle: &str) -> bool {
    bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
}

fn count(bytes: &[u8], needle: &str) -> usize {
    bytes.windows(needle.len()).filter(|w| *w == needle.as_bytes()).count()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(contains(bytes, "%%EOF"), "Missing %%EOF marker");
    assert!(contains(bytes, "xref"), "Missing xref table");
    assert!(contains(bytes, "trailer"), "Missing trailer");
}

fn overlaps(a: &PagePlacement, b: &PagePlacement) -> bool {
    a.page_index == b.page_index
        && a.x < b.x + b.width
        && b.x < a.x + a.width
        && a.y < b.y + b.height
        && b.y < a.y + a.height
}

// ─── Reference lookup ───────────────────────────────────────────

#[test]
fn test_mixed_case_headers_drive_lookup() {
    let mut session = Session::default();
    session
        .load_reference("CODIGO;Descripcion;grupo;SubGrupo\nA-1;Perno;Ferreteria;Pernos\n")
        .unwrap();
    let entry = session.add_product("img", Some("A-1"), None).unwrap();
    assert_eq!(entry.description, "Perno");
    assert_eq!(entry.group.as_deref(), Some("Ferreteria"));
    assert_eq!(entry.subgroup.as_deref(), Some("Pernos"));
}

#[test]
fn test_delimiter_detection() {
    assert_eq!(detect_delimiter("codigo;descripcion,grupo;subgrupo"), b';');
    assert_eq!(detect_delimiter("codigo,descripcion,grupo,subgrupo"), b',');

    let table = ReferenceTable::parse("codigo,descripcion,grupo,subgrupo\nX,\"Caja, grande\",G,S").unwrap();
    assert_eq!(table.get("X").unwrap().description, "Caja, grande");
}

#[test]
fn test_template_parses_as_empty_reference() {
    let table = ReferenceTable::parse(&codec::to_tabular_template()).unwrap();
    assert!(table.is_empty());
}

// ─── Catalog store ──────────────────────────────────────────────

#[test]
fn test_codes_stay_unique() {
    let mut session = Session::default();
    session.load_reference(&reference_csv(10)).unwrap();
    for i in 0..10 {
        session.add_product("img", Some(&format!("P{:04}", i)), None).unwrap();
    }
    for i in 0..10 {
        let result = session.add_product("img", Some(&format!("P{:04}", i)), None);
        assert!(matches!(result, Err(CatalogError::DuplicateCode { .. })));
    }
    let codes: Vec<String> = session
        .snapshot()
        .iter()
        .filter_map(|e| e.code().map(str::to_string))
        .collect();
    let mut unique = codes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(codes.len(), unique.len());
}

#[test]
fn test_remove_shifts_following_entries() {
    let mut session = Session::new(ExportConfig {
        code_policy: CodePolicy::Free,
        ..Default::default()
    });
    for name in ["A", "B", "C"] {
        session.add_product("img", Some(name), Some(name)).unwrap();
    }
    session.remove_at(1).unwrap();
    let codes: Vec<_> = session.snapshot().iter().map(|e| e.code().map(str::to_string)).collect();
    assert_eq!(codes, vec![Some("A".to_string()), Some("C".to_string())]);
    assert!(matches!(
        session.remove_at(5),
        Err(CatalogError::IndexOutOfRange { index: 5, len: 2 })
    ));
}

// ─── JSON ───────────────────────────────────────────────────────

#[test]
fn test_json_round_trip_is_byte_stable() {
    let mut session = Session::default();
    session.load_reference(&reference_csv(4)).unwrap();
    session.add_product("img-2", Some("P0002"), None).unwrap();
    session.add_product("img-0", Some("P0000"), Some("Editado")).unwrap();

    let first = session.export_json().unwrap();
    let entries = codec::from_portable(&first).unwrap();
    let second = codec::to_portable(&entries).unwrap();
    assert_eq!(first, second);
    assert_eq!(entries, session.snapshot());
}

#[test]
fn test_legacy_part_number_catalog_imports() {
    let legacy = r#"[
      { "image": "data:image/png;base64,AAAA", "partNumber": "X-1", "description": "Viejo" }
    ]"#;
    let mut session = Session::default();
    assert_eq!(session.import_json(legacy).unwrap(), 1);
    let json = session.export_json().unwrap();
    assert!(json.contains("\"code\": \"X-1\""));
    assert!(!json.contains("partNumber"));
}

// ─── Layout ─────────────────────────────────────────────────────

#[test]
fn test_layout_no_overlap_and_contained() {
    let mut entries = Vec::new();
    for i in 0..40 {
        let description = "palabra ".repeat(1 + (i * 7) % 30);
        entries.push(CatalogEntry::new("img", description).with_code(format!("C{:03}", i)));
    }
    for format in [PageFormat::A4, PageFormat::Oficio, PageFormat::Letter] {
        for per_row in 1..=3 {
            let config = ExportConfig {
                page_format: format,
                cards_per_row: per_row,
                ..Default::default()
            };
            let geometry = config.geometry().unwrap();
            let surface = PdfSurface::new(geometry.page_width, geometry.page_height);
            let layout = PageLayoutEngine::new(geometry).layout(&entries, &surface);

            assert_eq!(layout.placements.len(), entries.len());
            for (i, a) in layout.placements.iter().enumerate() {
                assert_eq!(a.entry_index, i);
                assert!(a.y >= geometry.margin);
                assert!(a.y + a.height <= geometry.page_height - geometry.margin + 1e-9);
                assert!(a.x + a.width <= geometry.page_width - geometry.margin + 1e-9);
                for b in &layout.placements[i + 1..] {
                    assert!(!overlaps(a, b), "cards {} and {} overlap", a.entry_index, b.entry_index);
                }
            }
        }
    }
}

#[test]
fn test_two_column_rows_share_height() {
    let entries = vec![
        CatalogEntry::new("img", "corto").with_code("A"),
        CatalogEntry::new("img", "descripción ".repeat(40)).with_code("B"),
        CatalogEntry::new("img", "corto").with_code("C"),
    ];
    let config = ExportConfig::default();
    let geometry = config.geometry().unwrap();
    let surface = PdfSurface::new(geometry.page_width, geometry.page_height);
    let layout = PageLayoutEngine::new(geometry).layout(&entries, &surface);

    let p = &layout.placements;
    assert_eq!(p[0].y, p[1].y);
    assert!(p[2].y > p[0].y);
    assert_eq!(p[0].height, p[1].height);
    assert_eq!(p[0].height, layout.cards[1].height);
    assert!(layout.cards[1].height > layout.cards[0].height);
    assert_eq!(p[2].x, p[0].x);
}

#[test]
fn test_export_order_is_sorted_copy() {
    let entries = vec![
        CatalogEntry::new("img", "b").with_code("B"),
        CatalogEntry::new("img", "sin código"),
        CatalogEntry::new("img", "a").with_code("A"),
    ];
    let sorted = sorted_for_export(&entries);
    let codes: Vec<_> = sorted.iter().map(|e| e.code()).collect();
    assert_eq!(codes, vec![None, Some("A"), Some("B")]);
    assert_eq!(entries[0].code(), Some("B"));
}

// ─── PDF export ─────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_catalog_export_fails() {
    let session = Session::default();
    assert!(matches!(session.export_json(), Err(CatalogError::EmptyCatalog)));
    assert!(matches!(session.export_pdf().await, Err(CatalogError::EmptyCatalog)));
}

#[tokio::test]
async fn test_pdf_export_single_page() {
    let mut session = Session::default();
    session.load_reference(&reference_csv(3)).unwrap();
    let photo = png_data_uri(4, 3);
    for i in 0..3 {
        session.add_product(&photo, Some(&format!("P{:04}", i)), None).unwrap();
    }

    let export = session
        .export_pdf_with(catalogo::image_loader::DataUriDecoder)
        .await
        .unwrap();
    assert_valid_pdf(&export.bytes);
    assert_eq!(export.summary.pages, 1);
    assert_eq!(export.summary.cards, 3);
    assert_eq!(export.summary.failed_images, 0);
    assert!(contains(&export.bytes, "/Count 1"));
    assert_eq!(count(&export.bytes, "/Subtype /Image"), 3);
}

#[tokio::test]
async fn test_pdf_export_paginates() {
    let mut session = Session::new(ExportConfig {
        page_format: PageFormat::Letter,
        ..Default::default()
    });
    session.load_reference(&reference_csv(40)).unwrap();
    let photo = png_data_uri(2, 2);
    for i in (0..40).rev() {
        session.add_product(&photo, Some(&format!("P{:04}", i)), None).unwrap();
    }

    let export = session
        .export_pdf_with(catalogo::image_loader::DataUriDecoder)
        .await
        .unwrap();
    assert_valid_pdf(&export.bytes);
    assert!(export.summary.pages > 1);
    assert!(contains(
        &export.bytes,
        &format!("/Count {}", export.summary.pages)
    ));
    // Export sorted a copy; the session still holds insertion order.
    assert_eq!(session.snapshot()[0].code(), Some("P0039"));
}

#[tokio::test]
async fn test_broken_photo_does_not_abort_export() {
    let mut session = Session::new(ExportConfig {
        code_policy: CodePolicy::Free,
        ..Default::default()
    });
    session.add_product("data:image/png;base64,AAAA", None, Some("rota")).unwrap();
    session.add_product(&png_data_uri(1, 1), None, Some("buena")).unwrap();

    let export = session
        .export_pdf_with(catalogo::image_loader::DataUriDecoder)
        .await
        .unwrap();
    assert_valid_pdf(&export.bytes);
    assert_eq!(export.summary.failed_images, 1);
    assert_eq!(export.summary.cards, 2);
}

#[tokio::test]
async fn test_render_json_entry_point() {
    let json = format!(
        r#"[{{ "image": "{}", "code": "Z", "description": "Zeta" }}]"#,
        png_data_uri(1, 1)
    );
    let config = ExportConfig {
        title: "Inventario (marzo)".to_string(),
        ..Default::default()
    };
    let bytes = catalogo::render_json(&json, &config).await.unwrap();
    assert_valid_pdf(&bytes);
    assert!(contains(&bytes, "/Title (Inventario \\(marzo\\))"));

    assert!(matches!(
        catalogo::render_json("[]", &config).await,
        Err(CatalogError::EmptyCatalog)
    ));
}

#[test]
fn test_text_column_stays_inside_card() {
    for format in [PageFormat::A4, PageFormat::Oficio, PageFormat::Letter] {
        for per_row in 1..=8 {
            let config = ExportConfig {
                page_format: format,
                cards_per_row: per_row,
                ..Default::default()
            };
            let Ok(geometry) = config.geometry() else {
                continue;
            };
            let text_x = geometry.margin + geometry.card_padding + geometry.image_size + geometry.text_offset;
            let card_right = geometry.margin + geometry.card_width();
            assert!(geometry.text_max_width() > 0.0);
            assert!(text_x + geometry.text_max_width() <= card_right + 1e-9);
        }
    }
}

#[tokio::test]
async fn test_too_many_cards_per_row_is_rejected() {
    let config = ExportConfig {
        cards_per_row: 5,
        code_policy: CodePolicy::Free,
        ..Default::default()
    };
    let mut session = Session::new(config.clone());
    session.add_product(&png_data_uri(1, 1), None, Some("uno")).unwrap();
    session.add_product(&png_data_uri(1, 1), None, Some("dos")).unwrap();

    assert!(matches!(session.export_pdf().await, Err(CatalogError::InvalidConfig(_))));
    assert_eq!(session.store().len(), 2);

    let json = session.export_json().unwrap();
    assert!(matches!(
        catalogo::render_json(&json, &config).await,
        Err(CatalogError::InvalidConfig(_))
    ));
}
