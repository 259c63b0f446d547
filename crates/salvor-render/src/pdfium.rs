// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium-backed renderer.
//
// PDFium document handles borrow the library bindings and the byte slice, so
// they cannot outlive a single call. The backend keeps the bytes and reopens
// the document for each render; page sizes are read once at open time.

use std::sync::Arc;

use pdfium_render::prelude::*;
use salvor_core::error::{Result, SalvorError};
use salvor_core::PageSize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::surface::Surface;
use crate::traits::{RasterBackend, RasterDocument, RenderIntent, RenderParams};

/// Renderer bound to a PDFium shared library.
pub struct PdfiumBackend {
    pdfium: Arc<Pdfium>,
}

impl PdfiumBackend {
    /// Bind PDFium from the working directory, then from the system library path.
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| SalvorError::RendererUnavailable(format!("cannot bind PDFium: {err}")))?;
        info!("PDFium bound");
        Ok(Self {
            pdfium: Arc::new(Pdfium::new(bindings)),
        })
    }
}

impl RasterBackend for PdfiumBackend {
    fn backend_name(&self) -> &str {
        "pdfium"
    }

    fn open(&self, bytes: Arc<[u8]>, password: Option<&str>) -> Result<Arc<dyn RasterDocument>> {
        let sizes = {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(&bytes, password)
                .map_err(map_open_error)?;
            document
                .pages()
                .iter()
                .map(|page| PageSize::new(page.width().value, page.height().value))
                .collect::<Vec<_>>()
        };
        debug!(pages = sizes.len(), "PDFium opened document");

        Ok(Arc::new(PdfiumDocument {
            pdfium: Arc::clone(&self.pdfium),
            bytes,
            password: password.map(str::to_owned),
            sizes,
        }))
    }
}

struct PdfiumDocument {
    pdfium: Arc<Pdfium>,
    bytes: Arc<[u8]>,
    password: Option<String>,
    sizes: Vec<PageSize>,
}

impl RasterDocument for PdfiumDocument {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn page_size(&self, page_index: u32) -> Result<PageSize> {
        self.sizes.get(page_index as usize).copied().ok_or_else(|| {
            SalvorError::Render(format!(
                "page index {page_index} out of range (document has {} pages)",
                self.sizes.len()
            ))
        })
    }

    fn render(
        &self,
        page_index: u32,
        params: &RenderParams,
        surface: &mut Surface,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (width, height) = params.target_size(self.page_size(page_index)?);
        let index = u16::try_from(page_index)
            .map_err(|_| SalvorError::Render(format!("page index {page_index} too large")))?;

        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&self.bytes, self.password.as_deref())
            .map_err(map_open_error)?;
        let page = document
            .pages()
            .get(index)
            .map_err(|err| SalvorError::Render(format!("cannot load page {page_index}: {err}")))?;

        if cancel.is_cancelled() {
            return Err(SalvorError::RenderCancelled);
        }

        let [r, g, b] = params.background;
        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .set_clear_color(PdfColor::new(r, g, b, 255))
            .render_annotations(params.include_annotations)
            .render_form_data(params.include_forms)
            .use_print_quality(params.intent == RenderIntent::Print);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| SalvorError::Render(format!("PDFium render failed: {err}")))?;
        let image = bitmap.as_image().to_rgba8();

        if cancel.is_cancelled() {
            return Err(SalvorError::RenderCancelled);
        }

        surface.prepare(image.width(), image.height(), params.background);
        surface.composite(&image);
        Ok(())
    }
}

fn map_open_error(err: PdfiumError) -> SalvorError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            SalvorError::PasswordRequired
        }
        other => SalvorError::PdfError(format!("PDFium could not open document: {other}")),
    }
}
