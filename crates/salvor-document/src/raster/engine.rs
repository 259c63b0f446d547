// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterization recovery engine.
//
// Per page, one retry loop walks the strategy table:
//
//   render (bounded by the strategy timeout)
//     ├─ error / timeout ──────────────> next strategy
//     └─ ok ─> blank check ─ blank ────> next strategy
//                          └ content ──> embed bitmap, done
//   table exhausted ───────────────────> placeholder page, done
//
// Renders run on the blocking pool while holding the single surface lease.
// Every page ends up either recovered or substituted, so the output always
// has as many pages as the renderer reported.

use std::sync::Arc;

use lopdf::Document;
use salvor_core::error::{Result, SalvorError};
use salvor_core::{
    BlankDetection, Classification, PageSize, PageTally, PipelineConfig, ProgressEvent,
    ProgressObserver, ProgressStage,
};
use salvor_render::{RasterBackend, RasterDocument, RenderParams};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::blank::ContentAssessment;
use super::pool::SurfacePool;
use super::strategy::{RenderStrategy, StrategyFamily, StrategyTable};
use crate::image::ImageProcessor;
use crate::pdf::{DocumentMetadata, PageAssembler, PdfWriter};
use crate::placeholder::{PlaceholderPage, PlaceholderSynthesizer};

/// What to recover.
#[derive(Debug, Clone)]
pub struct RecoveryRequest<'a> {
    pub file_name: &'a str,
    pub bytes: Arc<[u8]>,
    pub password: Option<&'a str>,
    pub classification: &'a Classification,
}

/// A document rebuilt from rendered and substituted pages.
#[derive(Debug)]
pub struct Recovered {
    pub document: Document,
    pub tally: PageTally,
    /// 1-based numbers of the pages replaced by placeholders.
    pub substituted: Vec<u32>,
}

/// One accepted render, already embedded in a one-page PDF.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub pdf: Vec<u8>,
    pub assessment: ContentAssessment,
    pub strategy: &'static str,
}

/// Outcome of a single strategy attempt.
enum Attempt {
    Accepted(Vec<u8>, ContentAssessment),
    Blank(ContentAssessment),
}

/// Renders pages through a [`RasterBackend`] and rebuilds documents.
#[derive(Clone)]
pub struct RecoveryEngine {
    backend: Arc<dyn RasterBackend>,
    pool: SurfacePool,
    config: PipelineConfig,
    writer: PdfWriter,
    placeholders: PlaceholderSynthesizer,
}

impl RecoveryEngine {
    pub fn new(backend: Arc<dyn RasterBackend>, config: &PipelineConfig) -> Self {
        Self {
            backend,
            pool: SurfacePool::new(),
            config: config.clone(),
            writer: PdfWriter::new("Recovered page"),
            placeholders: PlaceholderSynthesizer::new(config.fallback_page_size),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    pub fn pool(&self) -> &SurfacePool {
        &self.pool
    }

    pub fn placeholders(&self) -> &PlaceholderSynthesizer {
        &self.placeholders
    }

    /// Parse `bytes` with the renderer off the async threads.
    pub async fn open(
        &self,
        bytes: Arc<[u8]>,
        password: Option<&str>,
    ) -> Result<Arc<dyn RasterDocument>> {
        let backend = Arc::clone(&self.backend);
        let password = password.map(str::to_owned);
        tokio::task::spawn_blocking(move || backend.open(bytes, password.as_deref()))
            .await
            .map_err(|err| SalvorError::Render(format!("renderer open task failed: {err}")))?
    }

    // -- Whole documents ------------------------------------------------------

    /// Rasterize every page of a document with the `family` strategy table.
    ///
    /// Fails only when the renderer cannot open the document at all; page
    /// failures become placeholders.
    #[instrument(skip_all, fields(file = request.file_name, %family, backend = self.backend_name()))]
    pub async fn recover(
        &self,
        request: &RecoveryRequest<'_>,
        family: StrategyFamily,
        progress: &dyn ProgressObserver,
    ) -> Result<Recovered> {
        let document = self
            .open(Arc::clone(&request.bytes), request.password)
            .await?;
        let table = StrategyTable::for_family(
            family,
            request.classification.institution_family,
            &self.config,
        );
        let metadata = DocumentMetadata::new(
            request.file_name,
            format!("Recovered by {family} rasterization"),
        );

        let (source, table) = (&document, &table);
        let recovered = self
            .rebuild(request, &document, &metadata, progress, move |index, size| async move {
                self.recover_page(source, index, size, table)
                    .await
                    .map(|page| page.pdf)
            })
            .await?;
        info!(
            pages = recovered.tally.page_count,
            recovered = recovered.tally.successful_pages,
            placeholders = recovered.tally.placeholder_pages,
            "rasterization finished"
        );
        Ok(recovered)
    }

    /// Render every page once with `strategy` and embed it through `writer`.
    ///
    /// Unlike [`recover`](Self::recover) there is no blank check: a blank
    /// page is kept as it is. Pages that fail to render become placeholders.
    #[instrument(skip_all, fields(file = request.file_name, strategy = strategy.label))]
    pub async fn rerender(
        &self,
        request: &RecoveryRequest<'_>,
        strategy: &RenderStrategy,
        writer: &PdfWriter,
        metadata: &DocumentMetadata,
        progress: &dyn ProgressObserver,
    ) -> Result<Recovered> {
        let document = self
            .open(Arc::clone(&request.bytes), request.password)
            .await?;
        let source = &document;
        self.rebuild(request, &document, metadata, progress, move |index, size| async move {
            match self.attempt(source, index, size, strategy, writer, true).await {
                Ok(Attempt::Accepted(pdf, assessment)) => {
                    debug!(page = index + 1, quality = assessment.quality(), "page re-rendered");
                    Some(pdf)
                }
                Ok(Attempt::Blank(_)) => None,
                Err(err) => {
                    warn!(page = index + 1, error = %err, "page could not be re-rendered");
                    None
                }
            }
        })
        .await
    }

    /// Build a document page by page from `render_page`, which yields a
    /// one-page PDF or `None` for a placeholder.
    async fn rebuild<F, Fut>(
        &self,
        request: &RecoveryRequest<'_>,
        document: &Arc<dyn RasterDocument>,
        metadata: &DocumentMetadata,
        progress: &dyn ProgressObserver,
        mut render_page: F,
    ) -> Result<Recovered>
    where
        F: FnMut(u32, PageSize) -> Fut,
        Fut: Future<Output = Option<Vec<u8>>>,
    {
        let total = document.page_count();
        if total == 0 {
            return Err(SalvorError::PdfError("renderer found no pages".into()));
        }

        let mut assembler = PageAssembler::new();
        let mut tally = PageTally::default();
        let mut substituted = Vec::new();

        for page_index in 0..total {
            let page_number = page_index + 1;
            let size = document
                .page_size(page_index)
                .ok()
                .filter(PageSize::is_usable);

            let rendered = render_page(page_index, size.unwrap_or(self.config.fallback_page_size)).await;
            let embedded = match rendered {
                Some(pdf) => match assembler.append_pdf_bytes(&pdf) {
                    Ok(_) => true,
                    Err(err) => {
                        warn!(page = page_number, error = %err, "rendered page could not be embedded");
                        false
                    }
                },
                None => false,
            };

            if embedded {
                tally.record_success();
            } else {
                self.placeholders.append_to(
                    &mut assembler,
                    &PlaceholderPage {
                        file_name: request.file_name,
                        page_number,
                        total_pages: total,
                        size,
                        classification: Some(request.classification),
                    },
                )?;
                tally.record_placeholder();
                substituted.push(page_number);
            }

            progress.on_progress(&ProgressEvent::new(
                ProgressStage::Rasterizing,
                page_number as usize,
                total as usize,
                format!("{} page {page_number}/{total}", request.file_name),
            ));
        }

        debug_assert!(tally.is_consistent());
        debug_assert_eq!(tally.page_count, total);

        let document = assembler.finish(metadata)?;
        Ok(Recovered {
            document,
            tally,
            substituted,
        })
    }

    // -- Single pages ---------------------------------------------------------

    /// Walk `table` for one page. `None` means every strategy failed.
    pub async fn recover_page(
        &self,
        document: &Arc<dyn RasterDocument>,
        page_index: u32,
        size: PageSize,
        table: &StrategyTable,
    ) -> Option<RenderedPage> {
        for strategy in table.iter() {
            match self.attempt(document, page_index, size, strategy, &self.writer, false).await {
                Ok(Attempt::Accepted(pdf, assessment)) => {
                    debug!(
                        page = page_index + 1,
                        strategy = strategy.label,
                        quality = assessment.quality(),
                        content = assessment.content_ratio(),
                        "render accepted"
                    );
                    return Some(RenderedPage {
                        pdf,
                        assessment,
                        strategy: strategy.label,
                    });
                }
                Ok(Attempt::Blank(assessment)) => {
                    debug!(
                        page = page_index + 1,
                        strategy = strategy.label,
                        content = assessment.content_ratio(),
                        "render blank, trying next strategy"
                    );
                }
                Err(err) => {
                    debug!(
                        page = page_index + 1,
                        strategy = strategy.label,
                        error = %err,
                        "render failed, trying next strategy"
                    );
                }
            }
        }
        warn!(page = page_index + 1, strategies = table.len(), "all render strategies exhausted");
        None
    }

    async fn attempt(
        &self,
        document: &Arc<dyn RasterDocument>,
        page_index: u32,
        size: PageSize,
        strategy: &RenderStrategy,
        writer: &PdfWriter,
        keep_blank: bool,
    ) -> Result<Attempt> {
        let params = strategy.params_for(size, self.config.max_surface_pixels);
        if self.pool.is_busy() {
            debug!(page = page_index + 1, "waiting for the render surface");
        }
        let lease = self.pool.acquire_within(strategy.timeout).await?;
        let cancel = CancellationToken::new();

        let task = {
            let document = Arc::clone(document);
            let cancel = cancel.clone();
            let writer = writer.clone();
            let detection = self.config.blank_detection;
            tokio::task::spawn_blocking(move || {
                render_and_embed(
                    lease, &*document, page_index, size, &params, &detection, keep_blank, &writer,
                    &cancel,
                )
            })
        };

        match tokio::time::timeout(strategy.timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => Err(SalvorError::Render(format!("render task failed: {join_err}"))),
            Err(_) => {
                cancel.cancel();
                Err(SalvorError::RenderTimeout {
                    page: page_index + 1,
                    budget_ms: strategy.timeout.as_millis() as u64,
                })
            }
        }
    }
}

/// Runs on the blocking pool. The lease is released as soon as the pixels
/// have been copied out, before the slower image embedding.
#[allow(clippy::too_many_arguments)]
fn render_and_embed(
    mut lease: super::pool::SurfaceLease,
    document: &dyn RasterDocument,
    page_index: u32,
    size: PageSize,
    params: &RenderParams,
    detection: &BlankDetection,
    keep_blank: bool,
    writer: &PdfWriter,
    cancel: &CancellationToken,
) -> Result<Attempt> {
    document.render(page_index, params, &mut lease, cancel)?;
    if cancel.is_cancelled() {
        return Err(SalvorError::RenderCancelled);
    }

    let assessment = ContentAssessment::of(lease.pixels(), detection);
    if !keep_blank && assessment.is_blank() {
        return Ok(Attempt::Blank(assessment));
    }
    let pixels = lease.pixels().clone();
    drop(lease);

    let rgb = ImageProcessor::from_rgba(pixels)
        .flatten(params.background)
        .into_rgb8();
    let pdf = writer.bitmap_page(&rgb, size)?;
    Ok(Attempt::Accepted(pdf, assessment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvor_core::{InstitutionFamily, NoProgress};
    use salvor_render::scripted::{PageScript, ScriptedBackend, ScriptedDocument};
    use std::sync::Mutex;

    fn config() -> PipelineConfig {
        PipelineConfig {
            render_timeout_ms: 1_000,
            certificate_render_timeout_ms: 1_000,
            // Keep scripted surfaces small.
            max_surface_pixels: 200 * 300,
            ..PipelineConfig::default()
        }
    }

    fn engine(backend: ScriptedBackend) -> RecoveryEngine {
        RecoveryEngine::new(Arc::new(backend), &config())
    }

    fn request<'a>(bytes: &str, classification: &'a Classification) -> RecoveryRequest<'a> {
        RecoveryRequest {
            file_name: "doc.pdf",
            bytes: Arc::from(bytes.as_bytes()),
            password: None,
            classification,
        }
    }

    #[tokio::test]
    async fn every_page_is_recovered_or_substituted() {
        let backend = ScriptedBackend::new().with_document(
            "mixed",
            ScriptedDocument::with_pages(vec![
                (PageSize::A4, PageScript::Content(0.3)),
                (PageSize::A4, PageScript::Blank),
                (PageSize::new(842.0, 595.0), PageScript::Fail),
                (PageSize::A4, PageScript::Content(0.1)),
            ]),
        );
        let classification = Classification::default();
        let recovered = engine(backend)
            .recover(&request("mixed", &classification), StrategyFamily::Protected, &NoProgress)
            .await
            .unwrap();

        assert_eq!(recovered.tally.page_count, 4);
        assert_eq!(recovered.tally.successful_pages, 2);
        assert_eq!(recovered.tally.placeholder_pages, 2);
        assert_eq!(recovered.substituted, vec![2, 3]);
        assert!(recovered.tally.is_consistent());
        assert_eq!(recovered.document.get_pages().len(), 4);
    }

    #[tokio::test]
    async fn fallback_tier_recovers_after_primary_failures() {
        let backend = ScriptedBackend::new().with_document(
            "stubborn",
            ScriptedDocument::uniform(
                1,
                PageScript::Attempts(vec![
                    PageScript::Fail,
                    PageScript::Blank,
                    PageScript::Content(0.2),
                ]),
            ),
        );
        let engine = engine(backend.clone());
        let classification = Classification::default();
        let recovered = engine
            .recover(&request("stubborn", &classification), StrategyFamily::Certificate, &NoProgress)
            .await
            .unwrap();

        assert_eq!(recovered.tally.successful_pages, 1);
        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        // Second attempt is the display tier, third the annotated print tier.
        assert_eq!(calls[1].params.intent, salvor_render::RenderIntent::Display);
        assert!(!calls[1].params.include_annotations);
        assert_eq!(calls[2].params.intent, salvor_render::RenderIntent::Print);
        assert!(calls[2].params.include_annotations);
    }

    #[tokio::test]
    async fn hung_render_times_out_and_falls_through() {
        let backend = ScriptedBackend::new().with_document(
            "slow",
            ScriptedDocument::uniform(
                1,
                PageScript::Attempts(vec![PageScript::Hang, PageScript::Content(0.5)]),
            ),
        );
        let classification = Classification::default();
        let recovered = engine(backend.clone())
            .recover(&request("slow", &classification), StrategyFamily::Protected, &NoProgress)
            .await
            .unwrap();
        assert_eq!(recovered.tally.successful_pages, 1);
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_table_uses_exactly_five_attempts() {
        let backend = ScriptedBackend::new()
            .with_document("dead", ScriptedDocument::uniform(1, PageScript::Fail));
        let classification = Classification {
            institution_family: InstitutionFamily::SafetyMutual,
            ..Classification::default()
        };
        let recovered = engine(backend.clone())
            .recover(&request("dead", &classification), StrategyFamily::Tcpdf, &NoProgress)
            .await
            .unwrap();
        assert_eq!(recovered.tally.placeholder_pages, 1);
        assert_eq!(backend.calls().len(), 5);
    }

    #[tokio::test]
    async fn unopenable_document_is_an_error() {
        let backend = ScriptedBackend::new();
        let classification = Classification::default();
        let err = engine(backend)
            .recover(&request("nothing", &classification), StrategyFamily::Emergency, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SalvorError::PdfError(_)));
    }

    #[tokio::test]
    async fn rerender_keeps_blank_pages_and_substitutes_failures() {
        let backend = ScriptedBackend::new().with_document(
            "plain",
            ScriptedDocument::with_pages(vec![
                (PageSize::A4, PageScript::Content(0.3)),
                (PageSize::A4, PageScript::Blank),
                (PageSize::A4, PageScript::Fail),
            ]),
        );
        let engine = engine(backend.clone());
        let classification = Classification::default();
        let strategy = RenderStrategy {
            label: "compress",
            params: RenderParams::new(0.8, salvor_render::RenderIntent::Display, false),
            timeout: std::time::Duration::from_millis(1_000),
        };
        let recovered = engine
            .rerender(
                &request("plain", &classification),
                &strategy,
                &PdfWriter::new("t").with_jpeg_quality(0.6),
                &DocumentMetadata::new("", ""),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(recovered.tally.successful_pages, 2);
        assert_eq!(recovered.substituted, vec![3]);
        assert_eq!(recovered.document.get_pages().len(), 3);
        // One attempt per page, no fallback tiers.
        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|call| {
            call.params.intent == salvor_render::RenderIntent::Display
                && !call.params.include_annotations
                && call.params.scale <= 0.8
        }));
    }

    #[tokio::test]
    async fn progress_is_reported_per_page() {
        let backend = ScriptedBackend::new()
            .with_document("three", ScriptedDocument::uniform(3, PageScript::Content(0.2)));
        let seen = Mutex::new(Vec::new());
        let observer = |event: &ProgressEvent| seen.lock().unwrap().push(event.fraction);
        let classification = Classification::default();
        engine(backend)
            .recover(&request("three", &classification), StrategyFamily::Emergency, &observer)
            .await
            .unwrap();
        let fractions = seen.into_inner().unwrap();
        assert_eq!(fractions.len(), 3);
        assert_eq!(fractions.last().copied(), Some(1.0));
    }
}
