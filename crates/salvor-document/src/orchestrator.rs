// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge, split, reorder and compress over processed documents.
//
// The first three copy pages out of `ProcessingResult`s into a fresh
// assembler. A page that refuses to copy is rendered on its own with the
// protected strategy table, and replaced by a placeholder if that fails too,
// so one bad page never costs the rest of its file. Compression re-renders
// every page instead of copying it.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use salvor_core::error::{Result, SalvorError};
use salvor_core::{
    PartialCopyIssue, ProcessingMethod, ProgressEvent, ProgressObserver, ProgressStage,
    SkipReason, SkippedFile,
};
use salvor_render::RasterDocument;
use tracing::{debug, info, instrument, warn};

use crate::compress::{self, CompressionLevel};
use crate::pdf::{CopyMemo, DocumentMetadata, PageAssembler, PdfWriter, reader, save_document};
use crate::pipeline::{DocumentPipeline, ProcessingResult};
use crate::placeholder::PlaceholderPage;
use crate::raster::{RecoveryRequest, StrategyFamily, StrategyTable};
use crate::sniff::{InputFile, file_name_of};

/// Largest page span a single range token may name.
const MAX_RANGE_SPAN: u32 = 10_000;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// One file as it went into a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludedFile {
    pub file_name: String,
    pub method: ProcessingMethod,
    pub pages: u32,
    pub placeholder_pages: u32,
}

/// Everything a caller needs to explain a merge to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub included: Vec<IncludedFile>,
    pub skipped: Vec<SkippedFile>,
    pub partial_copies: Vec<PartialCopyIssue>,
    pub certificate_count: usize,
    pub protected_count: usize,
    /// Pairs of file names with identical content.
    pub duplicates: Vec<(String, String)>,
    pub total_pages: u32,
}

#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub bytes: Vec<u8>,
    pub report: MergeReport,
}

#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub bytes: Vec<u8>,
    pub pages: Vec<u32>,
    /// Requested page numbers outside the document.
    pub ignored_pages: Vec<u32>,
    pub substituted_pages: Vec<u32>,
}

/// How a compressed file was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMethod {
    /// Every page re-rendered as a JPEG bitmap.
    Rendered,
    /// No renderer could open the file; structure stripped and re-saved.
    Resaved,
}

#[derive(Debug, Clone)]
pub struct CompressOutput {
    pub bytes: Vec<u8>,
    pub level: CompressionLevel,
    pub method: CompressionMethod,
    pub original_size: u64,
    /// Pages that failed to render and carry a placeholder instead.
    pub error_pages: Vec<u32>,
}

impl CompressOutput {
    pub fn compressed_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Percentage saved against the original, never negative.
    pub fn saved_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        let saved = self.original_size as f64 - self.compressed_size() as f64;
        (saved / self.original_size as f64 * 100.0).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Multi-document operations on top of a [`DocumentPipeline`].
#[derive(Clone)]
pub struct Orchestrator {
    pipeline: DocumentPipeline,
}

impl Orchestrator {
    pub fn new(pipeline: DocumentPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &DocumentPipeline {
        &self.pipeline
    }

    /// Process every input in order, then merge whatever survived.
    #[instrument(skip_all, fields(files = inputs.len()))]
    pub async fn merge_files(
        &self,
        inputs: &[InputFile],
        progress: &dyn ProgressObserver,
    ) -> Result<MergeOutput> {
        let mut results = Vec::with_capacity(inputs.len());
        let mut skipped = Vec::new();
        for input in inputs {
            self.process_into(input, progress, &mut results, &mut skipped)
                .await;
        }
        self.merge(&results, skipped, progress).await
    }

    /// [`merge_files`](Self::merge_files) straight from disk. A file that
    /// cannot be read is skipped as unreadable, in its input position.
    #[instrument(skip_all, fields(files = paths.len()))]
    pub async fn merge_paths(
        &self,
        paths: &[PathBuf],
        progress: &dyn ProgressObserver,
    ) -> Result<MergeOutput> {
        let mut results = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        for path in paths {
            match InputFile::from_path(path).await {
                Ok(input) => {
                    self.process_into(&input, progress, &mut results, &mut skipped)
                        .await;
                }
                Err(err) => {
                    let file_name = file_name_of(path);
                    warn!(file = %file_name, error = %err, "file could not be read");
                    skipped.push(SkippedFile::new(
                        file_name,
                        SkipReason::Unreadable(err.to_string()),
                    ));
                }
            }
        }
        self.merge(&results, skipped, progress).await
    }

    async fn process_into(
        &self,
        input: &InputFile,
        progress: &dyn ProgressObserver,
        results: &mut Vec<ProcessingResult>,
        skipped: &mut Vec<SkippedFile>,
    ) {
        match self.pipeline.process(input, progress).await {
            Ok(result) => results.push(result),
            Err(SalvorError::Skipped { file_name, reason }) => {
                info!(file = %file_name, %reason, "file skipped");
                skipped.push(SkippedFile::new(file_name, reason));
            }
            Err(err) => {
                warn!(file = %input.name, error = %err, "file could not be processed");
                skipped.push(SkippedFile::new(
                    &input.name,
                    SkipReason::Unreadable(err.to_string()),
                ));
            }
        }
    }

    /// Concatenate processed documents in the given order.
    #[instrument(skip_all, fields(documents = results.len(), skipped = skipped.len()))]
    pub async fn merge(
        &self,
        results: &[ProcessingResult],
        skipped: Vec<SkippedFile>,
        progress: &dyn ProgressObserver,
    ) -> Result<MergeOutput> {
        if results.is_empty() {
            return Err(SalvorError::BatchFailed { skipped });
        }

        let mut assembler = PageAssembler::new();
        let mut report = MergeReport {
            skipped,
            ..MergeReport::default()
        };
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for (done, result) in results.iter().enumerate() {
            let pages: Vec<u32> = (1..=result.page_count()).collect();
            let substituted = self.copy_pages(&mut assembler, result, &pages).await?;

            if result.analysis.classification().document_type.is_credential_family() {
                report.certificate_count += 1;
            }
            if result.original_was_protected {
                report.protected_count += 1;
            }
            let sha = result.analysis.sha256.as_str();
            if !sha.is_empty() {
                if let Some(first) = seen.get(sha) {
                    warn!(file = %result.file_name, same_as = %first, "duplicate input");
                    report
                        .duplicates
                        .push(((*first).to_owned(), result.file_name.clone()));
                } else {
                    seen.insert(sha, &result.file_name);
                }
            }
            if !substituted.is_empty() {
                report.partial_copies.push(PartialCopyIssue {
                    file_name: result.file_name.clone(),
                    substituted_pages: substituted.clone(),
                    total_pages: result.page_count(),
                });
            }
            report.included.push(IncludedFile {
                file_name: result.file_name.clone(),
                method: result.method,
                pages: result.page_count(),
                placeholder_pages: result.tally.placeholder_pages + substituted.len() as u32,
            });

            progress.on_progress(&ProgressEvent::new(
                ProgressStage::Merging,
                done + 1,
                results.len(),
                format!("merged {}", result.file_name),
            ));
        }

        report.total_pages = assembler.page_count();
        let metadata = DocumentMetadata::new(
            "Merged Document",
            format!(
                "Merged from {} document(s): {} certificate(s), {} protected",
                results.len(),
                report.certificate_count,
                report.protected_count
            ),
        );
        let bytes = assembler.finish_bytes(&metadata)?;
        info!(
            pages = report.total_pages,
            included = report.included.len(),
            skipped = report.skipped.len(),
            partial = report.partial_copies.len(),
            "merge finished"
        );
        Ok(MergeOutput { bytes, report })
    }

    /// Extract the selected pages, in ascending order. Page numbers outside
    /// the document are ignored; an empty valid selection is an error.
    #[instrument(skip_all, fields(file = %result.file_name, requested = pages.len()))]
    pub async fn split(&self, result: &ProcessingResult, pages: &BTreeSet<u32>) -> Result<SplitOutput> {
        let count = result.page_count();
        let (valid, ignored): (Vec<u32>, Vec<u32>) =
            pages.iter().copied().partition(|page| (1..=count).contains(page));
        if valid.is_empty() {
            return Err(SalvorError::InvalidPages(format!(
                "none of the selected pages exist in a {count}-page document"
            )));
        }
        if !ignored.is_empty() {
            debug!(?ignored, "ignoring pages outside the document");
        }

        let mut assembler = PageAssembler::new();
        let substituted = self.copy_pages(&mut assembler, result, &valid).await?;
        let bytes = assembler.finish_bytes(&DocumentMetadata::new(
            &result.file_name,
            format!("Pages {} of {}", describe(&valid), result.file_name),
        ))?;
        Ok(SplitOutput {
            bytes,
            pages: valid,
            ignored_pages: ignored,
            substituted_pages: substituted,
        })
    }

    /// Emit pages in `order`. Every entry must name an existing page; nothing
    /// is produced if any does not.
    #[instrument(skip_all, fields(file = %result.file_name, pages = order.len()))]
    pub async fn reorder(&self, result: &ProcessingResult, order: &[u32]) -> Result<Vec<u8>> {
        let count = result.page_count();
        if order.is_empty() {
            return Err(SalvorError::InvalidPages("the new order is empty".into()));
        }
        let invalid: BTreeSet<u32> = order
            .iter()
            .copied()
            .filter(|page| !(1..=count).contains(page))
            .collect();
        if !invalid.is_empty() {
            let listed: Vec<String> = invalid.iter().map(u32::to_string).collect();
            return Err(SalvorError::InvalidPages(format!(
                "pages {} are outside 1-{count}",
                listed.join(", ")
            )));
        }

        let mut assembler = PageAssembler::new();
        self.copy_pages(&mut assembler, result, order).await?;
        assembler.finish_bytes(&DocumentMetadata::new(
            &result.file_name,
            format!("Reordered {}", result.file_name),
        ))
    }

    /// Shrink a document by re-rendering every page at the level's scale
    /// and JPEG quality. When the renderer cannot open the source at all,
    /// the processed document is stripped and re-saved instead.
    #[instrument(skip_all, fields(file = %result.file_name, %level))]
    pub async fn compress(
        &self,
        result: &ProcessingResult,
        level: CompressionLevel,
        progress: &dyn ProgressObserver,
    ) -> Result<CompressOutput> {
        let settings = level.settings();
        let strategy = settings.strategy(self.pipeline.config());
        let writer = PdfWriter::new("Compressed page").with_jpeg_quality(settings.jpeg_quality);
        let metadata = if settings.strip_metadata {
            DocumentMetadata::new("", "")
        } else {
            DocumentMetadata::new(
                &result.file_name,
                format!("{level} compression of {}", result.file_name),
            )
        };
        let request = RecoveryRequest {
            file_name: &result.file_name,
            bytes: Arc::clone(result.source()),
            password: result.password(),
            classification: result.analysis.classification(),
        };

        let rendered = self
            .pipeline
            .engine()
            .rerender(&request, &strategy, &writer, &metadata, progress)
            .await;
        let (bytes, method, error_pages) = match rendered {
            Ok(mut rendered) => (
                save_document(&mut rendered.document)?,
                CompressionMethod::Rendered,
                rendered.substituted,
            ),
            Err(err) => {
                warn!(error = %err, "pages cannot be rendered, re-saving instead");
                (
                    compress::resave(&result.document, &settings)?,
                    CompressionMethod::Resaved,
                    Vec::new(),
                )
            }
        };

        let output = CompressOutput {
            bytes,
            level,
            method,
            original_size: result.source().len() as u64,
            error_pages,
        };
        info!(
            ?method,
            original = output.original_size,
            compressed = output.compressed_size(),
            saved_percent = output.saved_percent(),
            "compression finished"
        );
        Ok(output)
    }

    /// Append `pages` (1-based, already validated) of `result` and return
    /// the ones that had to be replaced by placeholders.
    async fn copy_pages(
        &self,
        assembler: &mut PageAssembler,
        result: &ProcessingResult,
        pages: &[u32],
    ) -> Result<Vec<u32>> {
        let page_ids = result.document.get_pages();
        let mut memo = CopyMemo::new();
        let mut renderer: Option<Option<Arc<dyn RasterDocument>>> = None;
        let mut substituted = Vec::new();

        for &page_number in pages {
            let Some(&page_id) = page_ids.get(&page_number) else {
                return Err(SalvorError::InvalidPages(format!(
                    "page {page_number} does not exist"
                )));
            };
            let err = match assembler.append_page(&result.document, page_id, &mut memo) {
                Ok(()) => continue,
                Err(err) => err,
            };
            warn!(file = %result.file_name, page = page_number, error = %err, "page copy failed");

            let size = reader::page_size(&result.document, page_id);
            // Rendering only helps when the page still comes from the source.
            if result.method == ProcessingMethod::DirectLoad {
                let document = match &renderer {
                    Some(document) => document.clone(),
                    None => {
                        let opened = self
                            .pipeline
                            .engine()
                            .open(Arc::clone(result.source()), result.password())
                            .await
                            .inspect_err(|err| debug!(error = %err, "renderer could not open source"))
                            .ok();
                        renderer = Some(opened.clone());
                        opened
                    }
                };
                if let Some(document) = document
                    && self
                        .render_single(assembler, result, &document, page_number, size)
                        .await
                {
                    continue;
                }
            }

            self.pipeline.engine().placeholders().append_to(
                assembler,
                &PlaceholderPage {
                    file_name: &result.file_name,
                    page_number,
                    total_pages: result.page_count(),
                    size,
                    classification: Some(result.analysis.classification()),
                },
            )?;
            substituted.push(page_number);
        }
        Ok(substituted)
    }

    async fn render_single(
        &self,
        assembler: &mut PageAssembler,
        result: &ProcessingResult,
        document: &Arc<dyn RasterDocument>,
        page_number: u32,
        size: Option<salvor_core::PageSize>,
    ) -> bool {
        let engine = self.pipeline.engine();
        let config = self.pipeline.config();
        let table = StrategyTable::for_family(
            StrategyFamily::Protected,
            result.analysis.classification().institution_family,
            config,
        );
        let size = size.unwrap_or(config.fallback_page_size);
        match engine.recover_page(document, page_number - 1, size, &table).await {
            Some(page) => match assembler.append_pdf_bytes(&page.pdf) {
                Ok(_) => {
                    info!(page = page_number, strategy = page.strategy, "page recovered by rendering");
                    true
                }
                Err(err) => {
                    warn!(page = page_number, error = %err, "rendered page could not be embedded");
                    false
                }
            },
            None => false,
        }
    }
}

/// Parse a selection like `"1-3, 5, 9-7"`. Reversed ranges run backwards.
pub fn parse_page_ranges(input: &str) -> Result<Vec<u32>> {
    let mut pages = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| SalvorError::InvalidPages(format!("'{raw}' is not a page number")))
        };
        match token.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start.abs_diff(end) >= MAX_RANGE_SPAN {
                    return Err(SalvorError::InvalidPages(format!(
                        "range {start}-{end} is too long"
                    )));
                }
                if start <= end {
                    pages.extend(start..=end);
                } else {
                    pages.extend((end..=start).rev());
                }
            }
            None => pages.push(parse(token)?),
        }
    }
    if pages.is_empty() {
        return Err(SalvorError::InvalidPages("no pages given".into()));
    }
    Ok(pages)
}

/// Compact `1-3, 5` form of a sorted page list.
fn describe(pages: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = pages.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{start}-{end}")
        });
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_text, sample_pdf, sealed_pdf};
    use lopdf::Document;
    use pretty_assertions::assert_eq;
    use salvor_core::{NoProgress, PasswordDecision, PipelineConfig};
    use salvor_render::scripted::{PageScript, ScriptedBackend, ScriptedDocument};
    use salvor_render::stub::UnavailableBackend;
    use salvor_render::{FixedPrompt, RasterBackend};

    fn orchestrator(backend: impl RasterBackend + 'static) -> Orchestrator {
        let config = PipelineConfig {
            render_timeout_ms: 1_000,
            certificate_render_timeout_ms: 1_000,
            max_surface_pixels: 200 * 300,
            ..PipelineConfig::default()
        };
        Orchestrator::new(DocumentPipeline::new(
            config,
            Arc::new(backend),
            Arc::new(FixedPrompt(PasswordDecision::Skip)),
        ))
    }

    async fn processed(orchestrator: &Orchestrator, name: &str, bytes: Vec<u8>) -> ProcessingResult {
        orchestrator
            .pipeline()
            .process(&InputFile::new(name, bytes), &NoProgress)
            .await
            .unwrap()
    }

    fn texts(bytes: &[u8]) -> Vec<String> {
        let document = Document::load_mem(bytes).unwrap();
        (1..=document.get_pages().len() as u32)
            .map(|n| page_text(&document, n).trim_end().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn merge_skips_the_locked_file_and_keeps_the_rest() {
        let backend = ScriptedBackend::new().with_document(
            "locked",
            ScriptedDocument::uniform(1, PageScript::Content(0.3)).with_password("pw"),
        );
        let orchestrator = orchestrator(backend);
        let inputs = vec![
            InputFile::new("a.pdf", sample_pdf(2)),
            InputFile::new("locked.pdf", sealed_pdf("locked", "")),
            InputFile::new("c.pdf", sample_pdf(3)),
        ];

        let output = orchestrator.merge_files(&inputs, &NoProgress).await.unwrap();
        assert_eq!(output.report.total_pages, 5);
        assert_eq!(
            output.report.skipped,
            vec![SkippedFile::new("locked.pdf", SkipReason::UserDeclinedPassword)]
        );
        assert_eq!(output.report.included.len(), 2);
        assert_eq!(
            texts(&output.bytes),
            ["Page 1", "Page 2", "Page 1", "Page 2", "Page 3"]
        );
        let merged = Document::load_mem(&output.bytes).unwrap();
        let info = merged.trailer.get(b"Info").and_then(|o| o.as_reference()).unwrap();
        let title = merged.get_dictionary(info).unwrap().get(b"Title").unwrap();
        assert_eq!(title.as_str().unwrap(), b"Merged Document");
    }

    #[tokio::test]
    async fn unreadable_paths_are_skipped_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.pdf");
        std::fs::write(&good, sample_pdf(2)).unwrap();
        let folder = dir.path().join("folder.pdf");
        std::fs::create_dir(&folder).unwrap();
        let missing = dir.path().join("missing.pdf");

        let orchestrator = orchestrator(UnavailableBackend);
        let output = orchestrator
            .merge_paths(&[folder, good, missing], &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.report.total_pages, 2);
        assert_eq!(texts(&output.bytes), ["Page 1", "Page 2"]);
        let skipped: Vec<&str> = output
            .report
            .skipped
            .iter()
            .map(|skip| skip.file_name.as_str())
            .collect();
        assert_eq!(skipped, ["folder.pdf", "missing.pdf"]);
        assert!(output
            .report
            .skipped
            .iter()
            .all(|skip| matches!(skip.reason, SkipReason::Unreadable(_))));
    }

    #[tokio::test]
    async fn only_unreadable_paths_fail_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(UnavailableBackend);
        let err = orchestrator
            .merge_paths(&[dir.path().join("gone.pdf")], &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SalvorError::BatchFailed { ref skipped } if skipped.len() == 1));
    }

    #[tokio::test]
    async fn encrypted_certificate_keeps_its_page_count() {
        let backend = ScriptedBackend::new()
            .with_document("cert", ScriptedDocument::uniform(2, PageScript::Content(0.3)));
        let orchestrator = orchestrator(backend);
        let body = "(CERTIFICATE OF COMPLETION) Tj (This is to hereby certify) Tj";
        let inputs = vec![
            InputFile::new("course.pdf", sealed_pdf("cert", body)),
            InputFile::new("notes.pdf", sample_pdf(1)),
        ];

        let output = orchestrator.merge_files(&inputs, &NoProgress).await.unwrap();
        assert_eq!(output.report.total_pages, 3);
        assert_eq!(output.report.included[0].method, ProcessingMethod::SpecializedProtected);
        assert_eq!(output.report.certificate_count, 1);
        assert_eq!(output.report.protected_count, 1);
    }

    #[tokio::test]
    async fn nothing_processable_is_a_batch_failure() {
        let orchestrator = orchestrator(UnavailableBackend);
        let inputs = vec![InputFile::new("a.txt", b"plain".to_vec())];
        let err = orchestrator.merge_files(&inputs, &NoProgress).await.unwrap_err();
        match err {
            SalvorError::BatchFailed { skipped } => {
                assert_eq!(skipped, vec![SkippedFile::new("a.txt", SkipReason::NotAPdf)]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test]
    async fn duplicates_are_reported() {
        let orchestrator = orchestrator(UnavailableBackend);
        let inputs = vec![
            InputFile::new("a.pdf", sample_pdf(1)),
            InputFile::new("copy of a.pdf", sample_pdf(1)),
        ];
        let output = orchestrator.merge_files(&inputs, &NoProgress).await.unwrap();
        assert_eq!(
            output.report.duplicates,
            vec![("a.pdf".to_owned(), "copy of a.pdf".to_owned())]
        );
        assert_eq!(output.report.total_pages, 2);
    }

    #[tokio::test]
    async fn broken_page_is_rendered_on_its_own() {
        let backend = ScriptedBackend::new()
            .with_document("broken-page", ScriptedDocument::uniform(2, PageScript::Content(0.3)));
        let orchestrator = orchestrator(backend);
        let mut result = processed(
            &orchestrator,
            "doc.pdf",
            crate::test_support::sample_pdf_with(2, "broken-page"),
        )
        .await;
        // Point page 2 at a content stream that does not exist.
        let page_id = result.document.get_pages()[&2];
        result
            .document
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())
            .unwrap()
            .set("Contents", lopdf::Object::Reference((9_999, 0)));

        let output = orchestrator
            .merge(std::slice::from_ref(&result), Vec::new(), &NoProgress)
            .await
            .unwrap();
        assert_eq!(output.report.total_pages, 2);
        assert!(output.report.partial_copies.is_empty());
    }

    #[tokio::test]
    async fn unrenderable_broken_page_becomes_a_placeholder() {
        let orchestrator = orchestrator(UnavailableBackend);
        let mut result = processed(&orchestrator, "doc.pdf", sample_pdf(3)).await;
        let page_id = result.document.get_pages()[&2];
        result
            .document
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())
            .unwrap()
            .set("Contents", lopdf::Object::Reference((9_999, 0)));

        let output = orchestrator
            .merge(std::slice::from_ref(&result), Vec::new(), &NoProgress)
            .await
            .unwrap();
        assert_eq!(output.report.total_pages, 3);
        assert_eq!(
            output.report.partial_copies,
            vec![PartialCopyIssue {
                file_name: "doc.pdf".into(),
                substituted_pages: vec![2],
                total_pages: 3,
            }]
        );
        let pages = texts(&output.bytes);
        assert_eq!(pages[0], "Page 1");
        assert_eq!(pages[2], "Page 3");
    }

    #[tokio::test]
    async fn single_page_split_round_trips() {
        let orchestrator = orchestrator(UnavailableBackend);
        let result = processed(&orchestrator, "doc.pdf", sample_pdf(4)).await;

        let output = orchestrator
            .split(&result, &BTreeSet::from([3, 7]))
            .await
            .unwrap();
        assert_eq!(output.pages, vec![3]);
        assert_eq!(output.ignored_pages, vec![7]);
        assert_eq!(texts(&output.bytes), ["Page 3"]);
    }

    #[tokio::test]
    async fn split_with_no_valid_pages_fails() {
        let orchestrator = orchestrator(UnavailableBackend);
        let result = processed(&orchestrator, "doc.pdf", sample_pdf(2)).await;
        let err = orchestrator
            .split(&result, &BTreeSet::from([0, 9]))
            .await
            .unwrap_err();
        assert!(matches!(err, SalvorError::InvalidPages(_)));
    }

    #[tokio::test]
    async fn reorder_follows_the_given_order() {
        let orchestrator = orchestrator(UnavailableBackend);
        let result = processed(&orchestrator, "doc.pdf", sample_pdf(3)).await;
        let bytes = orchestrator.reorder(&result, &[3, 1, 2]).await.unwrap();
        assert_eq!(texts(&bytes), ["Page 3", "Page 1", "Page 2"]);
    }

    #[tokio::test]
    async fn reorder_is_all_or_nothing() {
        let orchestrator = orchestrator(UnavailableBackend);
        let result = processed(&orchestrator, "doc.pdf", sample_pdf(3)).await;
        let err = orchestrator.reorder(&result, &[2, 5, 1, 0]).await.unwrap_err();
        match err {
            SalvorError::InvalidPages(detail) => assert!(detail.contains("0, 5"), "{detail}"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test]
    async fn merging_is_deterministic_in_page_content() {
        let orchestrator = orchestrator(UnavailableBackend);
        let inputs = vec![
            InputFile::new("a.pdf", sample_pdf(2)),
            InputFile::new("b.pdf", sample_pdf(1)),
        ];
        let first = orchestrator.merge_files(&inputs, &NoProgress).await.unwrap();
        let second = orchestrator.merge_files(&inputs, &NoProgress).await.unwrap();
        assert_eq!(texts(&first.bytes), texts(&second.bytes));
        assert_eq!(first.report, second.report);
    }

    #[tokio::test]
    async fn compression_renders_every_page() {
        let backend = ScriptedBackend::new().with_document(
            "squeeze",
            ScriptedDocument::with_pages(vec![
                (salvor_core::PageSize::A4, PageScript::Content(0.4)),
                (salvor_core::PageSize::A4, PageScript::Blank),
                (salvor_core::PageSize::A4, PageScript::Fail),
            ]),
        );
        let orchestrator = orchestrator(backend.clone());
        let result = processed(
            &orchestrator,
            "scan.pdf",
            crate::test_support::sample_pdf_with(3, "squeeze"),
        )
        .await;
        assert_eq!(result.method, ProcessingMethod::DirectLoad);

        let output = orchestrator
            .compress(&result, CompressionLevel::High, &NoProgress)
            .await
            .unwrap();
        assert_eq!(output.method, CompressionMethod::Rendered);
        assert_eq!(output.level, CompressionLevel::High);
        assert_eq!(output.error_pages, vec![3]);
        assert_eq!(output.original_size, result.source().len() as u64);
        assert_eq!(backend.calls().len(), 3);

        let compressed = Document::load_mem(&output.bytes).unwrap();
        assert_eq!(compressed.get_pages().len(), 3);
        let info = compressed.trailer.get(b"Info").and_then(|o| o.as_reference()).unwrap();
        let title = compressed.get_dictionary(info).unwrap().get(b"Title").unwrap();
        assert_eq!(title.as_str().unwrap(), b"");
    }

    #[tokio::test]
    async fn compression_without_a_renderer_resaves() {
        let orchestrator = orchestrator(UnavailableBackend);
        let result = processed(&orchestrator, "doc.pdf", sample_pdf(2)).await;
        let output = orchestrator
            .compress(&result, CompressionLevel::Medium, &NoProgress)
            .await
            .unwrap();
        assert_eq!(output.method, CompressionMethod::Resaved);
        assert!(output.error_pages.is_empty());
        assert_eq!(texts(&output.bytes), ["Page 1", "Page 2"]);
    }

    #[test]
    fn savings_are_never_negative() {
        let output = |original_size: u64, len: usize| CompressOutput {
            bytes: vec![0; len],
            level: CompressionLevel::Low,
            method: CompressionMethod::Resaved,
            original_size,
            error_pages: Vec::new(),
        };
        assert_eq!(output(200, 50).saved_percent(), 75.0);
        assert_eq!(output(10, 20).saved_percent(), 0.0);
        assert_eq!(output(0, 20).saved_percent(), 0.0);
    }

    #[test]
    fn page_ranges() {
        assert_eq!(parse_page_ranges("1-3, 5").unwrap(), vec![1, 2, 3, 5]);
        assert_eq!(parse_page_ranges("4-2").unwrap(), vec![4, 3, 2]);
        assert_eq!(parse_page_ranges(" 7 ,, 7").unwrap(), vec![7, 7]);
        assert!(parse_page_ranges("a-3").is_err());
        assert!(parse_page_ranges("").is_err());
        assert!(parse_page_ranges("1-50000").is_err());
    }

    #[test]
    fn page_lists_are_described_compactly() {
        assert_eq!(describe(&[1, 2, 3, 5, 7, 8]), "1-3, 5, 7-8");
        assert_eq!(describe(&[4]), "4");
    }
}
