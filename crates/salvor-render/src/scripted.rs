// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deterministic in-process renderer for tests and benchmarks.
//
// Documents are registered under a marker string; `open` picks the first
// registration whose marker occurs in the input bytes. Each page follows a
// script describing what successive render attempts produce.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use image::Rgba;
use salvor_core::error::{Result, SalvorError};
use salvor_core::PageSize;
use tokio_util::sync::CancellationToken;

use crate::surface::Surface;
use crate::traits::{RasterBackend, RasterDocument, RenderParams};

/// Longest a `Hang` script will block if nobody cancels it.
const HANG_LIMIT: Duration = Duration::from_secs(10);

/// What a render attempt produces.
#[derive(Debug, Clone, PartialEq)]
pub enum PageScript {
    /// Dark rows covering this fraction of the page height, from the top.
    Content(f32),
    /// An untouched white page.
    Blank,
    /// The renderer reports an error.
    Fail,
    /// The renderer blocks until cancelled.
    Hang,
    /// Attempt n follows entry n; the last entry repeats.
    Attempts(Vec<PageScript>),
}

/// A scripted document.
#[derive(Debug, Clone)]
pub struct ScriptedDocument {
    pages: Vec<(PageSize, PageScript)>,
    password: Option<String>,
}

impl ScriptedDocument {
    /// `count` A4 pages that all follow `script`.
    pub fn uniform(count: u32, script: PageScript) -> Self {
        Self {
            pages: (0..count).map(|_| (PageSize::A4, script.clone())).collect(),
            password: None,
        }
    }

    pub fn with_pages(pages: Vec<(PageSize, PageScript)>) -> Self {
        Self {
            pages,
            password: None,
        }
    }

    /// Require this user password to open.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// One render call observed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub page_index: u32,
    pub params: RenderParams,
}

#[derive(Default)]
struct Ledger {
    attempts: HashMap<(usize, u32), usize>,
    calls: Vec<RenderCall>,
    opens: usize,
}

/// Backend serving registered scripted documents.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    documents: Vec<(Vec<u8>, ScriptedDocument)>,
    ledger: Arc<Mutex<Ledger>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` for any input containing `marker`.
    pub fn with_document(mut self, marker: &str, document: ScriptedDocument) -> Self {
        self.documents.push((marker.as_bytes().to_vec(), document));
        self
    }

    /// Every render call made so far, in order.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.ledger.lock().map(|l| l.calls.clone()).unwrap_or_default()
    }

    /// How many times `open` succeeded.
    pub fn opens(&self) -> usize {
        self.ledger.lock().map(|l| l.opens).unwrap_or_default()
    }
}

impl RasterBackend for ScriptedBackend {
    fn backend_name(&self) -> &str {
        "scripted"
    }

    fn open(&self, bytes: Arc<[u8]>, password: Option<&str>) -> Result<Arc<dyn RasterDocument>> {
        let (slot, document) = self
            .documents
            .iter()
            .enumerate()
            .find(|(_, (marker, _))| contains(&bytes, marker))
            .map(|(slot, (_, document))| (slot, document.clone()))
            .ok_or_else(|| SalvorError::PdfError("scripted backend: unknown document".into()))?;

        if let Some(expected) = &document.password
            && password != Some(expected.as_str())
        {
            return Err(SalvorError::PasswordRequired);
        }

        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.opens += 1;
        }
        Ok(Arc::new(OpenScriptedDocument {
            slot,
            document,
            ledger: Arc::clone(&self.ledger),
        }))
    }
}

struct OpenScriptedDocument {
    slot: usize,
    document: ScriptedDocument,
    ledger: Arc<Mutex<Ledger>>,
}

impl RasterDocument for OpenScriptedDocument {
    fn page_count(&self) -> u32 {
        self.document.pages.len() as u32
    }

    fn page_size(&self, page_index: u32) -> Result<PageSize> {
        self.document
            .pages
            .get(page_index as usize)
            .map(|(size, _)| *size)
            .ok_or_else(|| SalvorError::Render(format!("no page {page_index}")))
    }

    fn render(
        &self,
        page_index: u32,
        params: &RenderParams,
        surface: &mut Surface,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (size, script) = self
            .document
            .pages
            .get(page_index as usize)
            .ok_or_else(|| SalvorError::Render(format!("no page {page_index}")))?;

        let attempt = {
            let mut ledger = self
                .ledger
                .lock()
                .map_err(|_| SalvorError::Render("scripted ledger poisoned".into()))?;
            ledger.calls.push(RenderCall {
                page_index,
                params: *params,
            });
            let counter = ledger.attempts.entry((self.slot, page_index)).or_insert(0);
            let attempt = *counter;
            *counter += 1;
            attempt
        };

        let (width, height) = params.target_size(*size);
        surface.prepare(width, height, params.background);
        run_script(script.resolve(attempt), surface, cancel)
    }
}

impl PageScript {
    fn resolve(&self, attempt: usize) -> &PageScript {
        match self {
            Self::Attempts(steps) => match steps.get(attempt).or_else(|| steps.last()) {
                Some(step) => step.resolve(0),
                None => &PageScript::Blank,
            },
            other => other,
        }
    }
}

fn run_script(script: &PageScript, surface: &mut Surface, cancel: &CancellationToken) -> Result<()> {
    match script {
        PageScript::Content(coverage) => {
            let (width, height) = surface.dimensions();
            let rows = ((height as f32) * coverage.clamp(0.0, 1.0)).ceil() as u32;
            let pixels = surface.pixels_mut();
            for y in 0..rows.min(height) {
                for x in 0..width {
                    pixels.put_pixel(x, y, Rgba([20, 20, 20, 255]));
                }
            }
            Ok(())
        }
        PageScript::Blank | PageScript::Attempts(_) => Ok(()),
        PageScript::Fail => Err(SalvorError::Render("scripted render failure".into())),
        PageScript::Hang => {
            let started = Instant::now();
            while !cancel.is_cancelled() && started.elapsed() < HANG_LIMIT {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(SalvorError::RenderCancelled)
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
