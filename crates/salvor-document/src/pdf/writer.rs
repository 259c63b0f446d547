// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — single-page PDFs built with `printpdf` 0.8.
//
// Two kinds of page are produced: a full-bleed bitmap (a rasterized page of a
// protected document) and a vector page drawn through `PageCanvas` (the
// placeholder and information pages). Each call yields a standalone one-page
// PDF that the assembler then copies into the output document.

use image::RgbImage;
use printpdf::{
    BuiltinFont, Color, ImageCompression, ImageOptimizationOptions, Line, LinePoint, Mm, Op,
    PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage, RawImageData,
    RawImageFormat, Rgb, TextItem, XObjectTransform,
};
use salvor_core::PageSize;
use salvor_core::error::SalvorError;
use tracing::{debug, instrument};

/// Average Helvetica glyph advance as a fraction of the font size.
const HELVETICA_AVG_ADVANCE: f32 = 0.5;

/// Builds one-page PDFs.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    title: String,
    /// JPEG quality (0.0-1.0) for embedded bitmaps; `None` keeps them lossless.
    jpeg_quality: Option<f32>,
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            jpeg_quality: None,
        }
    }

    /// Encode bitmaps as JPEG at `quality` instead of losslessly.
    pub fn with_jpeg_quality(mut self, quality: f32) -> Self {
        self.jpeg_quality = Some(quality.clamp(0.05, 1.0));
        self
    }

    // -- Bitmap pages ---------------------------------------------------------

    /// A page of `size` fully covered by `image`.
    ///
    /// The image DPI is chosen so its width matches the page width exactly;
    /// the vertical scale absorbs any rounding in the rendered height.
    #[instrument(skip(self, image), fields(px_w = image.width(), px_h = image.height()))]
    pub fn bitmap_page(&self, image: &RgbImage, size: PageSize) -> Result<Vec<u8>, SalvorError> {
        let (px_w, px_h) = image.dimensions();
        if px_w == 0 || px_h == 0 {
            return Err(SalvorError::ImageError("cannot place an empty bitmap".into()));
        }
        if !size.is_usable() {
            return Err(SalvorError::ImageError(format!(
                "unusable page size {}x{} pt",
                size.width_pt, size.height_pt
            )));
        }

        let raw = RawImage {
            pixels: RawImageData::U8(image.as_raw().clone()),
            width: px_w as usize,
            height: px_h as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(&self.title);
        let xobject_id = doc.add_image(&raw);

        let dpi = px_w as f32 * 72.0 / size.width_pt;
        let natural_h_pt = px_h as f32 * 72.0 / dpi;
        let scale_y = size.height_pt / natural_h_pt;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(scale_y),
                dpi: Some(dpi),
                rotate: None,
            },
        }];

        debug!(dpi, scale_y, "bitmap placed on page");
        Ok(self.save(vec![PdfPage::new(
            Mm(size.width_mm()),
            Mm(size.height_mm()),
            ops,
        )]))
    }

    // -- Vector pages ---------------------------------------------------------

    /// A page drawn from a finished canvas.
    pub fn vector_page(&self, canvas: PageCanvas) -> Vec<u8> {
        let PageCanvas { size, ops } = canvas;
        self.save(vec![PdfPage::new(
            Mm(size.width_mm()),
            Mm(size.height_mm()),
            ops,
        )])
    }

    fn save(&self, pages: Vec<PdfPage>) -> Vec<u8> {
        let mut doc = PdfDocument::new(&self.title);
        doc.with_pages(pages);
        // printpdf would otherwise shrink bitmaps past 2 MB on its own.
        let images = match self.jpeg_quality {
            Some(quality) => ImageOptimizationOptions {
                quality: Some(quality),
                format: Some(ImageCompression::Jpeg),
                max_image_size: None,
                auto_optimize: Some(false),
                ..ImageOptimizationOptions::default()
            },
            None => ImageOptimizationOptions {
                format: Some(ImageCompression::Flate),
                max_image_size: None,
                ..ImageOptimizationOptions::default()
            },
        };
        let options = PdfSaveOptions {
            image_optimization: Some(images),
            ..PdfSaveOptions::default()
        };
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&options, &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "printpdf reported warnings");
        }
        output
    }
}

// -- Canvas -------------------------------------------------------------------

/// Drawing surface in PDF points with the origin at the bottom-left.
#[derive(Debug, Clone)]
pub struct PageCanvas {
    size: PageSize,
    ops: Vec<Op>,
}

impl PageCanvas {
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            ops: Vec::new(),
        }
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    /// Outline a rectangle whose bottom-left corner is `(x, y)`.
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rgb: [f32; 3], width: f32) {
        self.ops.push(Op::SaveGraphicsState);
        self.ops.push(Op::SetOutlineColor { col: color(rgb) });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(width) });
        self.ops.push(Op::DrawLine {
            line: Line {
                points: rect_points(x, y, w, h),
                is_closed: true,
            },
        });
        self.ops.push(Op::RestoreGraphicsState);
    }

    /// Left-aligned text with its baseline at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, size: f32, rgb: [f32; 3], text: &str) {
        let font = BuiltinFont::Helvetica;
        self.ops.push(Op::SaveGraphicsState);
        self.ops.push(Op::SetFillColor { col: color(rgb) });
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(y) },
        });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size),
            font,
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(winansi_safe(text))],
            font,
        });
        self.ops.push(Op::EndTextSection);
        self.ops.push(Op::RestoreGraphicsState);
    }

    /// Text horizontally centred on the page, using an estimated width.
    pub fn text_centered(&mut self, y: f32, size: f32, rgb: [f32; 3], text: &str) {
        let width = estimated_width(text, size);
        let x = ((self.size.width_pt - width) / 2.0).max(0.0);
        self.text(x, y, size, rgb, text);
    }

    /// How many characters fit across `width` points at `size`.
    pub fn chars_per_line(width: f32, size: f32) -> usize {
        ((width / (HELVETICA_AVG_ADVANCE * size)) as usize).max(1)
    }
}

fn color([r, g, b]: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r,
        g,
        b,
        icc_profile: None,
    })
}

fn rect_points(x: f32, y: f32, w: f32, h: f32) -> Vec<LinePoint> {
    [(x, y), (x + w, y), (x + w, y + h), (x, y + h)]
        .into_iter()
        .map(|(px, py)| LinePoint {
            p: Point {
                x: Pt(px),
                y: Pt(py),
            },
            bezier: false,
        })
        .collect()
}

fn estimated_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * HELVETICA_AVG_ADVANCE * size
}

// -- Text helpers -------------------------------------------------------------

/// Replace characters the built-in fonts cannot show with `?`.
///
/// Built-in fonts use WinAnsi encoding; anything past Latin-1 would otherwise
/// come out as garbage glyphs.
pub fn winansi_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            c if c.is_control() => ' ',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph. Words
/// longer than `max_width` are force-broken on character boundaries.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0usize;

        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() > max_width {
                if line_len > 0 {
                    result.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    if chunks.peek().is_some() {
                        result.push(chunk.iter().collect());
                    } else {
                        line = chunk.iter().collect();
                        line_len = chunk.len();
                    }
                }
            } else if line_len == 0 {
                line.push_str(word);
                line_len = chars.len();
            } else if line_len + 1 + chars.len() <= max_width {
                line.push(' ');
                line.push_str(word);
                line_len += 1 + chars.len();
            } else {
                result.push(std::mem::replace(&mut line, word.to_owned()));
                line_len = chars.len();
            }
        }

        result.push(line);
    }

    result
}
