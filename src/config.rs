//! # Export Configuration
//!
//! Everything a session needs to know before the first product is added:
//! whether codes come from a reference table, and how the PDF is laid out.
//! All fields have defaults, so an empty JSON object is a valid config.
//!
//! ```json
//! {
//!   "title": "Catálogo de productos",
//!   "pageFormat": "Oficio",
//!   "cardsPerRow": 3,
//!   "codePolicy": "Free",
//!   "geometry": { "imageSize": 72, "margin": 36 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::model::{PageFormat, PageGeometry};
use crate::store::CodePolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    pub title: String,
    pub page_format: PageFormat,
    pub cards_per_row: usize,
    pub code_policy: CodePolicy,
    pub author: Option<String>,
    pub geometry: GeometryOverrides,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "Catálogo de productos".to_string(),
            page_format: PageFormat::A4,
            cards_per_row: 2,
            code_policy: CodePolicy::Enforced,
            author: None,
            geometry: GeometryOverrides::default(),
        }
    }
}

/// Optional per-field replacements for the default card geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeometryOverrides {
    pub margin: Option<f64>,
    pub image_size: Option<f64>,
    pub line_height: Option<f64>,
    pub card_padding: Option<f64>,
    pub inter_card_gap: Option<f64>,
    pub text_offset: Option<f64>,
    pub field_spacing: Option<f64>,
    pub title_height: Option<f64>,
    pub corner_radius: Option<f64>,
}

impl ExportConfig {
    /// Read a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CatalogError::InvalidConfig(e.to_string()))
    }

    /// The page geometry for this config: the page format's size, the
    /// default card metrics, then any overrides.
    ///
    /// Fails when the resulting cards are too narrow to hold the photo and
    /// a text column.
    pub fn geometry(&self) -> Result<PageGeometry> {
        let mut g = PageGeometry::for_format(self.page_format, self.cards_per_row);
        let o = &self.geometry;
        if let Some(v) = o.margin {
            g.margin = v;
        }
        if let Some(v) = o.image_size {
            g.image_size = v;
        }
        if let Some(v) = o.line_height {
            g.line_height = v;
        }
        if let Some(v) = o.card_padding {
            g.card_padding = v;
        }
        if let Some(v) = o.inter_card_gap {
            g.inter_card_gap = v;
        }
        if let Some(v) = o.text_offset {
            g.text_offset = v;
        }
        if let Some(v) = o.field_spacing {
            g.field_spacing = v;
        }
        if let Some(v) = o.title_height {
            g.title_height = v;
        }
        if let Some(v) = o.corner_radius {
            g.corner_radius = v;
        }
        g.validate()?;
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = ExportConfig::from_json("{}").unwrap();
        assert_eq!(config, ExportConfig::default());
        assert_eq!(config.geometry().unwrap(), PageGeometry::default());
    }

    #[test]
    fn overrides_apply_on_top_of_format() {
        let config = ExportConfig::from_json(
            r#"{
                "pageFormat": "Oficio",
                "cardsPerRow": 3,
                "codePolicy": "Free",
                "geometry": { "imageSize": 72, "margin": 36 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.code_policy, CodePolicy::Free);

        let g = config.geometry().unwrap();
        assert_eq!((g.page_width, g.page_height), (612.0, 936.0));
        assert_eq!(g.cards_per_row, 3);
        assert_eq!(g.image_size, 72.0);
        assert_eq!(g.margin, 36.0);
        assert_eq!(g.line_height, PageGeometry::default().line_height);
    }

    #[test]
    fn custom_page_format() {
        let config = ExportConfig::from_json(
            r#"{ "pageFormat": { "Custom": { "width": 400, "height": 500 } } }"#,
        )
        .unwrap();
        let g = config.geometry().unwrap();
        assert_eq!((g.page_width, g.page_height), (400.0, 500.0));
    }

    #[test]
    fn zero_cards_per_row_is_clamped() {
        let config = ExportConfig {
            cards_per_row: 0,
            ..Default::default()
        };
        assert_eq!(config.geometry().unwrap().cards_per_row, 1);
    }

    #[test]
    fn malformed_config_reports_config_error() {
        let err = ExportConfig::from_json("{ \"cardsPerRow\": }").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidConfig(_)));
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid export config"), "{}", msg);
        assert!(!msg.contains("catalog"), "{}", msg);

        let err = ExportConfig::from_json(r#"{ "cardsPerRow": "two" }"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidConfig(_)));
    }

    #[test]
    fn five_cards_per_row_on_a4_is_rejected() {
        let config = ExportConfig {
            cards_per_row: 5,
            ..Default::default()
        };
        assert!(matches!(config.geometry(), Err(CatalogError::InvalidConfig(_))));

        let smaller_photos = ExportConfig::from_json(
            r#"{ "cardsPerRow": 5, "geometry": { "imageSize": 40 } }"#,
        )
        .unwrap();
        let g = smaller_photos.geometry().unwrap();
        assert!(g.text_max_width() > 0.0);
    }
}
