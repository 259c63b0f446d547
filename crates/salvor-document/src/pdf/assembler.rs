// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page assembler — builds one output document by structurally copying pages
// out of other documents.
//
// Each copied page drags along everything it references (content streams,
// fonts, images, annotations). A per-source `CopyMemo` maps source object ids
// to target ids, so resources shared by several pages of one source are copied
// only once. Page-tree nodes are never followed: a page's `/Parent` is
// replaced and references to other, uncopied pages become `null`.

use std::collections::HashMap;

use chrono::Utc;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use salvor_core::error::SalvorError;
use tracing::{debug, instrument, warn};

use super::reader::{INHERITABLE, PdfReader, inherited_attribute};

/// Nesting limit for copied object graphs.
const MAX_COPY_DEPTH: usize = 256;

/// Source-to-target object id map for one source document.
#[derive(Debug, Clone, Default)]
pub struct CopyMemo {
    ids: HashMap<ObjectId, ObjectId>,
}

impl CopyMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Document-level metadata written to the `/Info` dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub subject: String,
}

impl DocumentMetadata {
    pub fn new(title: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subject: subject.into(),
        }
    }
}

/// Accumulates pages into a fresh document.
#[derive(Debug)]
pub struct PageAssembler {
    target: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call copy state; staged objects are committed only on success.
struct CopyRun<'a> {
    source: &'a Document,
    memo: &'a mut CopyMemo,
    fresh: Vec<ObjectId>,
    staged: Vec<(ObjectId, Object)>,
}

impl PageAssembler {
    pub fn new() -> Self {
        let mut target = Document::with_version("1.7");
        let pages_id = target.new_object_id();
        Self {
            target,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.kids.len() as u32
    }

    // -- Appending ------------------------------------------------------------

    /// Copy one page of `source` to the end of the output.
    ///
    /// On failure the output and `memo` are left exactly as they were.
    pub fn append_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        memo: &mut CopyMemo,
    ) -> Result<(), SalvorError> {
        let page = source.get_dictionary(page_id).map_err(|err| {
            SalvorError::PdfError(format!("cannot read page object {page_id:?}: {err}"))
        })?;
        check_contents(source, page)?;

        let mut run = CopyRun {
            source,
            memo,
            fresh: Vec::new(),
            staged: Vec::new(),
        };

        let new_page_id = self.target.new_object_id();
        run.memo.ids.insert(page_id, new_page_id);
        run.fresh.push(page_id);

        match self.copy_page_dict(page, &mut run) {
            Ok(mut dict) => {
                dict.set("Parent", Object::Reference(self.pages_id));
                run.staged.push((new_page_id, Object::Dictionary(dict)));
                let copied = run.staged.len();
                for (id, object) in run.staged {
                    self.target.objects.insert(id, object);
                }
                self.kids.push(Object::Reference(new_page_id));
                debug!(?page_id, ?new_page_id, copied, "page copied");
                Ok(())
            }
            Err(err) => {
                for id in &run.fresh {
                    run.memo.ids.remove(id);
                }
                Err(err)
            }
        }
    }

    /// Copy every page of an in-memory PDF, returning how many were added.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn append_pdf_bytes(&mut self, bytes: &[u8]) -> Result<u32, SalvorError> {
        let reader = PdfReader::from_bytes(bytes, None)?;
        self.append_document(reader.document())
    }

    /// Copy every page of `source` in page order.
    pub fn append_document(&mut self, source: &Document) -> Result<u32, SalvorError> {
        let mut memo = CopyMemo::new();
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        for page_id in &page_ids {
            self.append_page(source, *page_id, &mut memo)?;
        }
        Ok(page_ids.len() as u32)
    }

    // -- Finishing ------------------------------------------------------------

    /// Close the page tree, write metadata and drop unreachable objects.
    pub fn finish(mut self, metadata: &DocumentMetadata) -> Result<Document, SalvorError> {
        if self.kids.is_empty() {
            return Err(SalvorError::InvalidPages(
                "cannot build a document without pages".into(),
            ));
        }

        let count = self.kids.len() as i64;
        self.target.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.target.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let stamp = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        let info_id = self.target.add_object(dictionary! {
            "Title" => Object::string_literal(metadata.title.as_str()),
            "Subject" => Object::string_literal(metadata.subject.as_str()),
            "Creator" => Object::string_literal("salvor"),
            "Producer" => Object::string_literal(concat!("salvor ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(stamp),
        });
        self.target.trailer.set("Root", catalog_id);
        self.target.trailer.set("Info", info_id);

        let pruned = self.target.prune_objects();
        debug!(pages = count, pruned = pruned.len(), "document assembled");
        Ok(self.target)
    }

    /// [`finish`](Self::finish) and serialise.
    pub fn finish_bytes(self, metadata: &DocumentMetadata) -> Result<Vec<u8>, SalvorError> {
        let mut document = self.finish(metadata)?;
        save_document(&mut document)
    }

    // -- Copying --------------------------------------------------------------

    fn copy_page_dict(&mut self, page: &Dictionary, run: &mut CopyRun<'_>) -> Result<Dictionary, SalvorError> {
        let mut dict = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            dict.set(key.clone(), self.copy_object(value, run, 0)?);
        }
        for key in INHERITABLE {
            if !dict.has(key)
                && let Some(value) = inherited_attribute(run.source, page, key)
            {
                dict.set(key.to_vec(), self.copy_object(&value, run, 0)?);
            }
        }
        Ok(dict)
    }

    fn copy_object(&mut self, object: &Object, run: &mut CopyRun<'_>, depth: usize) -> Result<Object, SalvorError> {
        if depth > MAX_COPY_DEPTH {
            return Err(SalvorError::PdfError("object graph nested too deeply".into()));
        }
        Ok(match object {
            Object::Reference(id) => self.copy_reference(*id, run, depth + 1)?,
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(item, run, depth + 1))
                    .collect::<Result<_, _>>()?,
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(dict, run, depth)?),
            Object::Stream(stream) => {
                let mut copy = Stream::new(self.copy_dict(&stream.dict, run, depth)?, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        })
    }

    fn copy_dict(&mut self, dict: &Dictionary, run: &mut CopyRun<'_>, depth: usize) -> Result<Dictionary, SalvorError> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_object(value, run, depth + 1)?);
        }
        Ok(copy)
    }

    fn copy_reference(&mut self, id: ObjectId, run: &mut CopyRun<'_>, depth: usize) -> Result<Object, SalvorError> {
        if let Some(mapped) = run.memo.ids.get(&id) {
            return Ok(Object::Reference(*mapped));
        }
        let object = match run.source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "dangling reference replaced with null");
                return Ok(Object::Null);
            }
        };
        if is_page_tree_node(object) {
            return Ok(Object::Null);
        }

        let new_id = self.target.new_object_id();
        run.memo.ids.insert(id, new_id);
        run.fresh.push(id);
        let copied = self.copy_object(object, run, depth)?;
        run.staged.push((new_id, copied));
        Ok(Object::Reference(new_id))
    }
}

/// Serialise a document to bytes.
pub fn save_document(document: &mut Document) -> Result<Vec<u8>, SalvorError> {
    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|err| SalvorError::PdfError(format!("failed to serialise PDF: {err}")))?;
    Ok(output)
}

fn is_page_tree_node(object: &Object) -> bool {
    matches!(
        object
            .as_dict()
            .and_then(|dict| dict.get(b"Type"))
            .and_then(Object::as_name),
        Ok(b"Page" | b"Pages")
    )
}

/// A page whose content stream cannot be resolved is not copyable.
fn check_contents(source: &Document, page: &Dictionary) -> Result<(), SalvorError> {
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(());
    };
    let ids: Vec<ObjectId> = match contents {
        Object::Reference(id) => match source.get_object(*id) {
            Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
            Ok(_) => Vec::new(),
            Err(err) => {
                return Err(SalvorError::PdfError(format!(
                    "page content stream {id:?} unreadable: {err}"
                )));
            }
        },
        Object::Array(items) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => Vec::new(),
    };
    for id in ids {
        source.get_object(id).map_err(|err| {
            SalvorError::PdfError(format!("page content stream {id:?} unreadable: {err}"))
        })?;
    }
    Ok(())
}
