// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Placeholder synthesizer — vector-only substitute pages.
//
// A placeholder keeps the page count of a document intact when a page cannot
// be recovered. Everything on it is drawn with built-in Helvetica and plain
// rectangles, so it stays small and its text remains searchable.

use lopdf::Document;
use salvor_core::error::{Result, SalvorError};
use salvor_core::human_errors::format_file_size;
use salvor_core::{Classification, DocumentKind, PageSize, UNKNOWN_LABEL};
use tracing::{debug, instrument, warn};

use crate::pdf::writer::wrap_text;
use crate::pdf::{DocumentMetadata, PageAssembler, PageCanvas, PdfWriter};

/// Smallest page that fits the detailed layout.
const MIN_DETAILED_PT: f32 = 200.0;

const INK: [f32; 3] = [0.1, 0.1, 0.1];
const DARK: [f32; 3] = [0.2, 0.2, 0.2];
const MID: [f32; 3] = [0.4, 0.4, 0.4];
const SOFT: [f32; 3] = [0.55, 0.55, 0.55];
const LIGHT: [f32; 3] = [0.6, 0.6, 0.6];
const FAINT: [f32; 3] = [0.9, 0.9, 0.9];

/// What a placeholder page says about the page it replaces.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderPage<'a> {
    pub file_name: &'a str,
    /// 1-based.
    pub page_number: u32,
    pub total_pages: u32,
    /// Original page size, when known.
    pub size: Option<PageSize>,
    pub classification: Option<&'a Classification>,
}

/// Builds placeholder and info pages.
#[derive(Debug, Clone)]
pub struct PlaceholderSynthesizer {
    fallback_size: PageSize,
    writer: PdfWriter,
}

impl PlaceholderSynthesizer {
    pub fn new(fallback_size: PageSize) -> Self {
        Self {
            fallback_size,
            writer: PdfWriter::new("Placeholder"),
        }
    }

    /// Append a placeholder for `page` to `assembler`.
    ///
    /// Any problem with the detailed layout downgrades to the minimal page;
    /// only a failure of the minimal page itself is returned.
    #[instrument(skip_all, fields(file = page.file_name, page = page.page_number))]
    pub fn append_to(&self, assembler: &mut PageAssembler, page: &PlaceholderPage<'_>) -> Result<()> {
        let detailed = self
            .detailed(page)
            .and_then(|bytes| assembler.append_pdf_bytes(&bytes));
        match detailed {
            Ok(_) => {
                debug!("placeholder page added");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "detailed placeholder failed, using minimal page");
                assembler
                    .append_pdf_bytes(&self.minimal(page.page_number))
                    .map(|_| ())
            }
        }
    }

    /// The full placeholder layout as a one-page PDF.
    pub fn detailed(&self, page: &PlaceholderPage<'_>) -> Result<Vec<u8>> {
        let size = page
            .size
            .filter(PageSize::is_usable)
            .unwrap_or(self.fallback_size);
        if size.width_pt < MIN_DETAILED_PT || size.height_pt < MIN_DETAILED_PT {
            return Err(SalvorError::ImageError(format!(
                "{}x{} pt is too small for the placeholder layout",
                size.width_pt, size.height_pt
            )));
        }

        let (w, h) = (size.width_pt, size.height_pt);
        let kind = page
            .classification
            .map(|c| c.document_type)
            .unwrap_or_default();
        let institution = page
            .classification
            .map(|c| c.institution.as_str())
            .filter(|i| *i != UNKNOWN_LABEL);

        let mut canvas = PageCanvas::new(size);
        canvas.stroke_rect(30.0, 30.0, w - 60.0, h - 60.0, DARK, 4.0);
        canvas.stroke_rect(50.0, 50.0, w - 100.0, h - 100.0, LIGHT, 2.0);

        let title = if kind == DocumentKind::Unknown {
            "PROTECTED PAGE".to_owned()
        } else {
            kind.label().to_uppercase()
        };
        canvas.text_centered(h - 100.0, 26.0, INK, &title);
        if let Some(institution) = institution {
            canvas.text_centered(h - 128.0, 13.0, MID, &format!("Issued by {}", institution.to_uppercase()));
        }

        let line_width = w - 140.0;
        let name_lines = wrap_text(page.file_name, PageCanvas::chars_per_line(line_width, 14.0));
        let mut y = h - 170.0;
        for line in name_lines.iter().take(2) {
            canvas.text_centered(y, 14.0, DARK, line);
            y -= 18.0;
        }
        canvas.text_centered(
            y - 4.0,
            14.0,
            MID,
            &format!("Page {} of {}", page.page_number, page.total_pages),
        );

        let explanation = "This page could not be recovered because the original document \
                           is protected against copying. The original file is unchanged and \
                           still holds the full content.";
        let mut y = h / 2.0 + 30.0;
        for line in wrap_text(explanation, PageCanvas::chars_per_line(line_width, 12.0)) {
            canvas.text(70.0, y, 12.0, SOFT, &line);
            y -= 16.0;
        }
        if kind.is_credential_family() {
            canvas.text(70.0, y - 10.0, 10.0, LIGHT, "The original credential remains valid.");
        }

        canvas.text_centered(90.0, 22.0, FAINT, "PROTECTED CONTENT");
        Ok(self.writer.vector_page(canvas))
    }

    /// Single frame and two lines on an A4 page. Has no inputs that can fail.
    pub fn minimal(&self, page_number: u32) -> Vec<u8> {
        let size = PageSize::A4;
        let mut canvas = PageCanvas::new(size);
        canvas.stroke_rect(50.0, 50.0, size.width_pt - 100.0, size.height_pt - 100.0, LIGHT, 2.0);
        canvas.text(70.0, size.height_pt - 120.0, 16.0, DARK, &format!("Page {page_number}"));
        canvas.text(70.0, size.height_pt - 150.0, 12.0, SOFT, "This page could not be recovered.");
        self.writer.vector_page(canvas)
    }

    // -- Info document --------------------------------------------------------

    /// One-page document standing in for a file that could not be processed.
    #[instrument(skip(self))]
    pub fn info_document(&self, file_name: &str, size_bytes: u64) -> Result<Document> {
        let size = PageSize::A4;
        let mut canvas = PageCanvas::new(size);
        canvas.stroke_rect(50.0, 50.0, 495.0, 742.0, [0.5, 0.5, 0.5], 2.0);
        canvas.text_centered(750.0, 20.0, [0.3, 0.3, 0.3], "PROTECTED DOCUMENT");

        let mut y = 650.0;
        for line in wrap_text(&format!("File: {file_name}"), PageCanvas::chars_per_line(450.0, 14.0))
            .iter()
            .take(3)
        {
            canvas.text(70.0, y, 14.0, DARK, line);
            y -= 18.0;
        }
        canvas.text(70.0, y - 12.0, 12.0, MID, &format!("Size: {}", format_file_size(size_bytes)));
        canvas.text(70.0, 580.0, 12.0, MID, "This document could not be processed");
        canvas.text(70.0, 560.0, 12.0, MID, "due to advanced security restrictions.");
        canvas.text(70.0, 520.0, 11.0, SOFT, "To include this content:");
        let steps = [
            "1. Contact the issuer of the document",
            "2. Request an unprotected version",
            "3. Or use the original document separately",
        ];
        for (step, y) in steps.iter().zip([500.0, 485.0, 470.0]) {
            canvas.text(90.0, y, 10.0, SOFT, step);
        }

        let mut assembler = PageAssembler::new();
        assembler.append_pdf_bytes(&self.writer.vector_page(canvas))?;
        assembler.finish(&DocumentMetadata::new(
            format!("Protected document: {file_name}"),
            "Information page for an unprocessable protected file",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfReader;
    use crate::pdf::save_document;
    use crate::test_support::page_text;

    fn synth() -> PlaceholderSynthesizer {
        PlaceholderSynthesizer::new(PageSize::A4)
    }

    fn certificate() -> Classification {
        Classification {
            document_type: DocumentKind::Certificate,
            institution: "achs".into(),
            ..Classification::default()
        }
    }

    fn text_of(bytes: &[u8]) -> String {
        page_text(PdfReader::from_bytes(bytes, None).unwrap().document(), 1)
    }

    #[test]
    fn detailed_placeholder_names_file_page_and_kind() {
        let classification = certificate();
        let bytes = synth()
            .detailed(&PlaceholderPage {
                file_name: "curso.pdf",
                page_number: 2,
                total_pages: 3,
                size: Some(PageSize::new(612.0, 792.0)),
                classification: Some(&classification),
            })
            .unwrap();
        let text = text_of(&bytes);
        assert!(text.contains("CERTIFICATE"));
        assert!(text.contains("curso.pdf"));
        assert!(text.contains("Page 2 of 3"));
        assert!(text.contains("PROTECTED CONTENT"));
    }

    #[test]
    fn placeholder_keeps_original_page_size() {
        let size = PageSize::new(842.0, 595.0);
        let mut assembler = PageAssembler::new();
        synth()
            .append_to(
                &mut assembler,
                &PlaceholderPage {
                    file_name: "landscape.pdf",
                    page_number: 1,
                    total_pages: 1,
                    size: Some(size),
                    classification: None,
                },
            )
            .unwrap();
        let document = assembler.finish(&DocumentMetadata::new("t", "t")).unwrap();
        let page_id = document.get_pages()[&1];
        let got = crate::pdf::reader::page_size(&document, page_id).unwrap();
        assert!((got.width_pt - 842.0).abs() < 1.0);
        assert!((got.height_pt - 595.0).abs() < 1.0);
    }

    #[test]
    fn tiny_pages_downgrade_to_minimal() {
        let mut assembler = PageAssembler::new();
        synth()
            .append_to(
                &mut assembler,
                &PlaceholderPage {
                    file_name: "stamp.pdf",
                    page_number: 4,
                    total_pages: 9,
                    size: Some(PageSize::new(100.0, 100.0)),
                    classification: None,
                },
            )
            .unwrap();
        assert_eq!(assembler.page_count(), 1);
        let bytes = assembler
            .finish_bytes(&DocumentMetadata::new("t", "t"))
            .unwrap();
        assert!(text_of(&bytes).contains("Page 4"));
    }

    #[test]
    fn info_document_is_one_page_with_guidance() {
        let mut document = synth().info_document("sealed.pdf", 1536).unwrap();
        assert_eq!(document.get_pages().len(), 1);
        let bytes = save_document(&mut document).unwrap();
        let text = text_of(&bytes);
        assert!(text.contains("PROTECTED DOCUMENT"));
        assert!(text.contains("sealed.pdf"));
        assert!(text.contains("1.5 KB"));
        assert!(text.contains("Request an unprotected version"));
    }
}
