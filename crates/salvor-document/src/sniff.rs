// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input files and PDF recognition.
//
// Content wins: a `%PDF-` header near the start makes a file a PDF whatever it
// is called. Without one, the declared MIME type and then the extension are
// consulted, so that damaged PDFs still reach the recovery path.

use std::path::Path;
use std::sync::Arc;

use salvor_core::error::Result;
use tracing::debug;

/// How far into the file a PDF header may appear.
const HEADER_WINDOW: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MIME: &str = "application/pdf";

/// One uploaded file, held in memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    /// MIME type reported by whoever supplied the file, if any.
    pub declared_mime: Option<String>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            declared_mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    /// Read a file from disk; the name is the path's final component.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = file_name_of(path);
        debug!(file = %name, size = bytes.len(), "input read");
        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn has_pdf_header(&self) -> bool {
        let window = &self.bytes[..self.bytes.len().min(HEADER_WINDOW)];
        window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
    }

    pub fn is_pdf(&self) -> bool {
        self.has_pdf_header()
            || self
                .declared_mime
                .as_deref()
                .is_some_and(|mime| mime.eq_ignore_ascii_case(PDF_MIME))
            || Path::new(&self.name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }
}

/// Display name for a path: its final component, or the whole path when
/// there is none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
