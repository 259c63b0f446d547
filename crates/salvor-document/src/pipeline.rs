// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-file processing: classify, then walk the recovery cascade until some
// stage yields a document.
//
//   recommendation          cascade
//   normal / careful        direct ─> protected raster ─> emergency raster
//   certificate             direct ─> certificate raster ─> emergency raster
//   tcpdf                   tcpdf raster ─> emergency raster
//   protected               protected raster ─> emergency raster
//
// A raster pass that recovers no page at all escalates like a failure. When
// every stage is exhausted the file is represented by an info document, so a
// processed file always contributes at least one page.

use std::sync::Arc;

use lopdf::Document;
use salvor_core::error::{Result, SalvorError};
use salvor_core::{
    AnalysisRecord, DocumentId, PageTally, PasswordDecision, PipelineConfig, ProcessingMethod,
    ProcessingRecommendation, ProgressEvent, ProgressObserver, ProgressStage, SkipReason,
};
use salvor_render::{PasswordPrompt, RasterBackend};
use tracing::{debug, info, instrument, warn};

use crate::analysis::DocumentClassifier;
use crate::pdf::PdfReader;
use crate::raster::{Recovered, RecoveryEngine, RecoveryRequest, StrategyFamily};
use crate::sniff::InputFile;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A file that made it through the pipeline, ready to be merged or split.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub id: DocumentId,
    pub file_name: String,
    pub analysis: AnalysisRecord,
    pub document: Document,
    pub method: ProcessingMethod,
    pub tally: PageTally,
    pub original_was_protected: bool,
    source: Arc<[u8]>,
    password: Option<String>,
}

impl ProcessingResult {
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Whether the pages were rendered or synthesized instead of copied.
    pub fn is_converted(&self) -> bool {
        self.method.is_converted()
    }

    /// The bytes the document was produced from.
    pub fn source(&self) -> &Arc<[u8]> {
        &self.source
    }

    /// Password that unlocked the source, if one was needed.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

// -- Cascade --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Direct,
    Raster(StrategyFamily),
}

fn cascade(recommendation: ProcessingRecommendation) -> &'static [Stage] {
    use ProcessingRecommendation as R;
    use StrategyFamily as F;
    match recommendation {
        R::Normal | R::CarefulProcessing => {
            &[Stage::Direct, Stage::Raster(F::Protected), Stage::Raster(F::Emergency)]
        }
        R::SpecializedCertificate => {
            &[Stage::Direct, Stage::Raster(F::Certificate), Stage::Raster(F::Emergency)]
        }
        R::SpecializedTcpdf => &[Stage::Raster(F::Tcpdf), Stage::Raster(F::Emergency)],
        R::SpecializedProtected => &[Stage::Raster(F::Protected), Stage::Raster(F::Emergency)],
    }
}

/// Password state for one file.
#[derive(Debug, Default)]
struct Unlock {
    password: Option<String>,
    supplied: u32,
    waived: bool,
}

enum Next {
    Restart,
    Continue,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Turns input files into [`ProcessingResult`]s.
#[derive(Clone)]
pub struct DocumentPipeline {
    config: PipelineConfig,
    classifier: DocumentClassifier,
    engine: RecoveryEngine,
    prompt: Arc<dyn PasswordPrompt>,
}

impl DocumentPipeline {
    pub fn new(
        config: PipelineConfig,
        backend: Arc<dyn RasterBackend>,
        prompt: Arc<dyn PasswordPrompt>,
    ) -> Self {
        Self {
            classifier: DocumentClassifier::new(&config),
            engine: RecoveryEngine::new(backend, &config),
            config,
            prompt,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn engine(&self) -> &RecoveryEngine {
        &self.engine
    }

    /// Classify without processing.
    pub fn analyze(&self, input: &InputFile) -> AnalysisRecord {
        self.classifier.classify(&input.name, &input.bytes)
    }

    /// Run one file through classification and the recovery cascade.
    ///
    /// Errors are either `Skipped` (the file is left out of its batch) or a
    /// failure of the runtime itself.
    #[instrument(skip_all, fields(file = %input.name, size = input.size()))]
    pub async fn process(
        &self,
        input: &InputFile,
        progress: &dyn ProgressObserver,
    ) -> Result<ProcessingResult> {
        if input.size() > self.config.max_file_bytes {
            return Err(SalvorError::skipped(
                &input.name,
                SkipReason::TooLarge {
                    size_bytes: input.size(),
                    limit_bytes: self.config.max_file_bytes,
                },
            ));
        }
        if !input.is_pdf() {
            return Err(SalvorError::skipped(&input.name, SkipReason::NotAPdf));
        }

        let analysis = {
            let classifier = self.classifier.clone();
            let name = input.name.clone();
            let bytes = Arc::clone(&input.bytes);
            tokio::task::spawn_blocking(move || classifier.classify(&name, &bytes))
                .await
                .map_err(|err| SalvorError::TaskFailed(format!("classification task failed: {err}")))?
        };
        progress.on_progress(&ProgressEvent::new(
            ProgressStage::Analyzing,
            1,
            1,
            format!("analyzed {}", input.name),
        ));

        let stages = cascade(analysis.processing_recommendation());
        let mut unlock = Unlock::default();
        let mut last_resort: Option<(Recovered, StrategyFamily)> = None;
        let mut index = 0;

        while let Some(&stage) = stages.get(index) {
            index += 1;
            let outcome = match stage {
                Stage::Direct => self.direct(input, unlock.password.as_deref()).await,
                Stage::Raster(family) => {
                    self.raster(input, &analysis, family, unlock.password.as_deref(), progress)
                        .await
                }
            };

            match outcome {
                Ok((recovered, method)) if recovered.tally.successful_pages > 0 => {
                    return Ok(self.finish(input, analysis, recovered, method, unlock.password));
                }
                Ok((recovered, _)) => {
                    debug!(?stage, pages = recovered.tally.page_count, "no page recovered, escalating");
                    if let Stage::Raster(family) = stage {
                        last_resort = Some((recovered, family));
                    }
                }
                Err(SalvorError::PasswordRequired) => {
                    match self.ask_password(&input.name, &mut unlock).await? {
                        Next::Restart => index = 0,
                        Next::Continue => {}
                    }
                }
                Err(err) => {
                    debug!(?stage, error = %err, "stage failed, escalating");
                }
            }
        }

        if let Some((recovered, family)) = last_resort {
            warn!("every page became a placeholder");
            return Ok(self.finish(input, analysis, recovered, family.method(), unlock.password));
        }

        warn!("all recovery stages failed, emitting info document");
        let document = self
            .engine
            .placeholders()
            .info_document(&input.name, input.size())?;
        let tally = PageTally {
            page_count: 1,
            successful_pages: 0,
            placeholder_pages: 1,
        };
        Ok(self.finish(
            input,
            analysis,
            Recovered {
                document,
                tally,
                substituted: vec![1],
            },
            ProcessingMethod::InfoDocument,
            unlock.password,
        ))
    }

    async fn direct(
        &self,
        input: &InputFile,
        password: Option<&str>,
    ) -> Result<(Recovered, ProcessingMethod)> {
        let bytes = Arc::clone(&input.bytes);
        let password = password.map(str::to_owned);
        let reader = tokio::task::spawn_blocking(move || {
            PdfReader::from_bytes(&bytes, password.as_deref())
        })
        .await
        .map_err(|err| SalvorError::TaskFailed(format!("direct load task failed: {err}")))??;

        let tally = PageTally::direct(reader.page_count());
        Ok((
            Recovered {
                document: reader.into_document(),
                tally,
                substituted: Vec::new(),
            },
            ProcessingMethod::DirectLoad,
        ))
    }

    async fn raster(
        &self,
        input: &InputFile,
        analysis: &AnalysisRecord,
        family: StrategyFamily,
        password: Option<&str>,
        progress: &dyn ProgressObserver,
    ) -> Result<(Recovered, ProcessingMethod)> {
        let request = RecoveryRequest {
            file_name: &input.name,
            bytes: Arc::clone(&input.bytes),
            password,
            classification: analysis.classification(),
        };
        let recovered = self.engine.recover(&request, family, progress).await?;
        Ok((recovered, family.method()))
    }

    /// Consult the prompt after the renderer asked for a password.
    async fn ask_password(&self, file_name: &str, unlock: &mut Unlock) -> Result<Next> {
        if unlock.waived {
            return Ok(Next::Continue);
        }
        if unlock.supplied >= self.config.max_password_attempts {
            warn!(attempts = unlock.supplied, "password attempts exhausted");
            return Err(SalvorError::skipped(
                file_name,
                SkipReason::PasswordAttemptsExhausted,
            ));
        }

        let attempt = unlock.supplied + 1;
        let decision = {
            let prompt = Arc::clone(&self.prompt);
            let name = file_name.to_owned();
            tokio::task::spawn_blocking(move || prompt.request_password(&name, attempt))
                .await
                .map_err(|err| SalvorError::TaskFailed(format!("password prompt failed: {err}")))?
        };

        match decision {
            PasswordDecision::Supply(password) => {
                debug!(attempt, "retrying with supplied password");
                unlock.password = Some(password);
                unlock.supplied += 1;
                Ok(Next::Restart)
            }
            PasswordDecision::RasterizeWithout => {
                info!("continuing without a password");
                unlock.waived = true;
                Ok(Next::Continue)
            }
            PasswordDecision::Skip => Err(SalvorError::skipped(
                file_name,
                SkipReason::UserDeclinedPassword,
            )),
        }
    }

    fn finish(
        &self,
        input: &InputFile,
        analysis: AnalysisRecord,
        recovered: Recovered,
        method: ProcessingMethod,
        password: Option<String>,
    ) -> ProcessingResult {
        info!(
            %method,
            pages = recovered.tally.page_count,
            recovered = recovered.tally.successful_pages,
            placeholders = recovered.tally.placeholder_pages,
            "file processed"
        );
        ProcessingResult {
            id: DocumentId::new(),
            file_name: input.name.clone(),
            original_was_protected: analysis.is_protected() || method.is_converted(),
            analysis,
            document: recovered.document,
            method,
            tally: recovered.tally,
            source: Arc::clone(&input.bytes),
            password,
        }
    }
}
