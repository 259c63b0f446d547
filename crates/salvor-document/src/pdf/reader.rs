// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — the direct-load strategy. Parses a PDF with `lopdf` without
// rendering anything, so pages can later be copied structurally.

use lopdf::{Dictionary, Document, Object, ObjectId};
use salvor_core::PageSize;
use salvor_core::error::SalvorError;
use tracing::{debug, instrument};

/// Attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree we are willing to walk.
const MAX_TREE_DEPTH: usize = 64;

/// A parsed, copyable PDF.
#[derive(Debug)]
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Parse PDF bytes, decrypting with `password` (or the empty password)
    /// when the document is encrypted.
    ///
    /// Fails with `SalvorError::Encrypted` when encryption blocks parsing or
    /// decryption, and `SalvorError::PdfError` for any other structural fault.
    #[instrument(skip_all, fields(bytes_len = data.len(), with_password = password.is_some()))]
    pub fn from_bytes(data: &[u8], password: Option<&str>) -> Result<Self, SalvorError> {
        let mut document = Document::load_mem(data).map_err(|err| {
            if mentions_encryption(data) {
                SalvorError::Encrypted(format!("parse failed on encrypted document: {err}"))
            } else {
                SalvorError::PdfError(format!("failed to load PDF from memory: {err}"))
            }
        })?;

        if document.is_encrypted() {
            document.decrypt(password.unwrap_or("")).map_err(|err| {
                let detail = if password.is_some() {
                    "password rejected"
                } else {
                    "user password required"
                };
                SalvorError::Encrypted(format!("{detail}: {err}"))
            })?;
            debug!("document decrypted");
        }

        let pages = document.get_pages().len();
        if pages == 0 {
            return Err(SalvorError::PdfError("document has no pages".into()));
        }
        debug!(pages, "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Physical size of a page from its (possibly inherited) MediaBox.
pub fn page_size(document: &Document, page_id: ObjectId) -> Option<PageSize> {
    let page = document.get_dictionary(page_id).ok()?;
    let media_box = match page.get(b"MediaBox") {
        Ok(object) => object.clone(),
        Err(_) => inherited_attribute(document, page, b"MediaBox")?,
    };
    let values = resolve(document, &media_box).as_array().ok()?.clone();
    if values.len() != 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(&values) {
        *slot = number(resolve(document, value))?;
    }
    let size = PageSize::new(
        (coords[2] - coords[0]).abs(),
        (coords[3] - coords[1]).abs(),
    );
    size.is_usable().then_some(size)
}

/// Walk `/Parent` links looking for an inheritable attribute.
pub(crate) fn inherited_attribute(
    document: &Document,
    page: &Dictionary,
    key: &[u8],
) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = document.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn mentions_encryption(data: &[u8]) -> bool {
    data.windows(8).any(|w| w.eq_ignore_ascii_case(b"/encrypt"))
}
