// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression levels and the structural re-save used when pages cannot be
// re-rendered.
//
// Rendering at a reduced scale and embedding JPEG bitmaps is what actually
// shrinks a file; the re-save only strips optional structures and deflates
// streams.

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use lopdf::{Document, Object, ObjectId, dictionary};
use serde::{Deserialize, Serialize};
use salvor_core::PipelineConfig;
use salvor_core::error::{Result, SalvorError};
use salvor_render::{RenderIntent, RenderParams};
use tracing::debug;

use crate::pdf::assembler::save_document;
use crate::raster::RenderStrategy;

/// How hard to compress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
    Maximum,
}

/// What a level changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionSettings {
    /// Render scale over 72 dpi.
    pub render_scale: f32,
    /// JPEG quality, 0.0-1.0.
    pub jpeg_quality: f32,
    pub strip_metadata: bool,
    pub strip_bookmarks: bool,
    pub strip_annotations: bool,
}

impl CompressionLevel {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Maximum];

    pub fn settings(self) -> CompressionSettings {
        let (render_scale, jpeg_quality, strip_metadata, strip_bookmarks, strip_annotations) =
            match self {
                Self::Low => (1.2, 0.90, false, false, false),
                Self::Medium => (1.0, 0.75, true, false, false),
                Self::High => (0.8, 0.60, true, true, false),
                Self::Maximum => (0.6, 0.50, true, true, true),
            };
        CompressionSettings {
            render_scale,
            jpeg_quality,
            strip_metadata,
            strip_bookmarks,
            strip_annotations,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Maximum => "maximum",
        }
    }
}

impl std::fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = SalvorError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| {
                SalvorError::Config(format!(
                    "unknown compression level '{raw}' (expected low, medium, high or maximum)"
                ))
            })
    }
}

impl CompressionSettings {
    /// The single render pass used for every page at this level.
    pub fn strategy(&self, config: &PipelineConfig) -> RenderStrategy {
        RenderStrategy {
            label: "compress",
            params: RenderParams::new(
                self.render_scale,
                RenderIntent::Display,
                !self.strip_annotations,
            ),
            timeout: Duration::from_millis(config.render_timeout_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Re-save
// ---------------------------------------------------------------------------

/// Re-save `document` without rendering: strip what the level drops,
/// deflate every stream and drop unreachable objects.
pub fn resave(document: &Document, settings: &CompressionSettings) -> Result<Vec<u8>> {
    let mut document = document.clone();
    strip(&mut document, settings);
    let pruned = document.prune_objects();
    document.compress();
    debug!(pruned = pruned.len(), "document re-saved");
    save_document(&mut document)
}

fn strip(document: &mut Document, settings: &CompressionSettings) {
    if settings.strip_annotations {
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        for page_id in pages {
            if let Ok(page) = document.get_dictionary_mut(page_id) {
                page.remove(b"Annots");
            }
        }
    }

    if let Ok(catalog) = document.catalog_mut() {
        if settings.strip_bookmarks {
            catalog.remove(b"Outlines");
        }
        if settings.strip_metadata {
            catalog.remove(b"Metadata");
        }
    }

    if settings.strip_metadata {
        let stamp = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        let info_id = document.add_object(dictionary! {
            "Creator" => Object::string_literal("salvor"),
            "Producer" => Object::string_literal(concat!("salvor ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(stamp.as_str()),
            "ModDate" => Object::string_literal(stamp),
        });
        document.trailer.set("Info", info_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_pdf;
    use pretty_assertions::assert_eq;

    /// A sample document with a title, an outline and one annotation per page.
    fn decorated(pages: u32) -> Document {
        let mut document = Document::load_mem(&sample_pdf(pages)).unwrap();
        let info_id = document.add_object(dictionary! {
            "Title" => Object::string_literal("Quarterly report"),
            "Author" => Object::string_literal("Finance"),
        });
        document.trailer.set("Info", info_id);
        let outlines_id = document.add_object(dictionary! { "Type" => "Outlines", "Count" => 0 });
        document.catalog_mut().unwrap().set("Outlines", outlines_id);
        for page_id in document.get_pages().into_values().collect::<Vec<_>>() {
            let annot_id = document.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Text",
                "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
            });
            document
                .get_dictionary_mut(page_id)
                .unwrap()
                .set("Annots", vec![Object::Reference(annot_id)]);
        }
        document
    }

    fn info_title(document: &Document) -> Option<Vec<u8>> {
        let info = document.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
        let title = document.get_dictionary(info).ok()?.get(b"Title").ok()?;
        title.as_str().ok().map(<[u8]>::to_vec)
    }

    #[test]
    fn levels_get_progressively_more_aggressive() {
        let settings: Vec<CompressionSettings> =
            CompressionLevel::ALL.iter().map(|level| level.settings()).collect();
        for pair in settings.windows(2) {
            assert!(pair[0].render_scale > pair[1].render_scale);
            assert!(pair[0].jpeg_quality > pair[1].jpeg_quality);
        }
        let low = CompressionLevel::Low.settings();
        assert!(!low.strip_metadata && !low.strip_bookmarks && !low.strip_annotations);
        let max = CompressionLevel::Maximum.settings();
        assert!(max.strip_metadata && max.strip_bookmarks && max.strip_annotations);
    }

    #[test]
    fn levels_parse_from_their_names() {
        for level in CompressionLevel::ALL {
            assert_eq!(level.as_str().parse::<CompressionLevel>().unwrap(), level);
        }
        assert_eq!(" HIGH ".parse::<CompressionLevel>().unwrap(), CompressionLevel::High);
        assert!(matches!(
            "extreme".parse::<CompressionLevel>(),
            Err(SalvorError::Config(_))
        ));
    }

    #[test]
    fn annotations_stay_in_the_render_unless_stripped() {
        let config = PipelineConfig::default();
        let medium = CompressionLevel::Medium.settings().strategy(&config);
        assert!(medium.params.include_annotations);
        assert_eq!(medium.params.scale, 1.0);
        assert_eq!(medium.timeout, Duration::from_millis(config.render_timeout_ms));
        let max = CompressionLevel::Maximum.settings().strategy(&config);
        assert!(!max.params.include_annotations);
        assert_eq!(max.params.background, RenderParams::WHITE);
    }

    #[test]
    fn low_resave_keeps_structure() {
        let bytes = resave(&decorated(2), &CompressionLevel::Low.settings()).unwrap();
        let document = Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 2);
        assert_eq!(info_title(&document).as_deref(), Some(&b"Quarterly report"[..]));
        assert!(document.catalog().unwrap().has(b"Outlines"));
    }

    #[test]
    fn maximum_resave_strips_everything_optional() {
        let bytes = resave(&decorated(2), &CompressionLevel::Maximum.settings()).unwrap();
        let document = Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 2);
        assert_eq!(info_title(&document), None);
        assert!(!document.catalog().unwrap().has(b"Outlines"));
        for page_id in document.get_pages().into_values() {
            assert!(!document.get_dictionary(page_id).unwrap().has(b"Annots"));
        }
    }
}
