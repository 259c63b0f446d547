// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Salvor — page renderer abstractions.
//
// The recovery pipeline treats the PDF renderer as an opaque capability
// provider: "parse bytes into page handles" and "render a page at viewport
// parameters into a pixel buffer". This crate defines those seams, the
// off-screen surface they draw into, and the available backends.

pub mod stub;
pub mod surface;
pub mod traits;

#[cfg(feature = "pdfium")]
pub mod pdfium;

#[cfg(any(test, feature = "scripted"))]
pub mod scripted;

use std::sync::Arc;

pub use surface::Surface;
pub use traits::{
    FixedPrompt, PasswordPrompt, RasterBackend, RasterDocument, RenderIntent, RenderParams,
};

/// Pick the best renderer this build can offer.
///
/// With the `pdfium` feature the PDFium library is bound at runtime (next to
/// the executable first, then system-wide). Without it, or when binding fails,
/// the unavailable backend is returned and every rasterization attempt falls
/// through to placeholder synthesis.
pub fn default_backend() -> Arc<dyn RasterBackend> {
    #[cfg(feature = "pdfium")]
    {
        match pdfium::PdfiumBackend::bind() {
            Ok(backend) => return Arc::new(backend),
            Err(err) => tracing::warn!(error = %err, "PDFium unavailable, rasterization disabled"),
        }
    }
    Arc::new(stub::UnavailableBackend)
}
