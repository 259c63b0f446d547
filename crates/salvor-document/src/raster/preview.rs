// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview renderer — page renders for one viewing context.
//
// Only the most recent request matters. Starting a render cancels the one in
// flight, and a superseded render returns `None` instead of its (stale)
// pixels.

use std::sync::{Arc, Mutex};

use salvor_core::error::{Result, SalvorError};
use salvor_render::{RasterDocument, RenderIntent, RenderParams};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::pool::SurfacePool;
use crate::image::ImageProcessor;

/// A finished preview, encoded as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub page_index: u32,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Renders previews of one document, newest request wins.
pub struct PreviewRenderer {
    document: Arc<dyn RasterDocument>,
    pool: SurfacePool,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl PreviewRenderer {
    pub fn new(document: Arc<dyn RasterDocument>, pool: SurfacePool) -> Self {
        Self {
            document,
            pool,
            in_flight: Mutex::new(None),
        }
    }

    /// Render `page_index` at `scale`, shrunk to fit `max_edge` pixels.
    ///
    /// Returns `Ok(None)` when a newer request superseded this one.
    pub async fn render(&self, page_index: u32, scale: f32, max_edge: u32) -> Result<Option<Preview>> {
        let token = self.supersede();

        let mut lease = tokio::select! {
            lease = self.pool.acquire() => lease,
            _ = token.cancelled() => return Ok(None),
        };
        if token.is_cancelled() {
            return Ok(None);
        }

        let document = Arc::clone(&self.document);
        let task_token = token.clone();
        let params = RenderParams::new(scale, RenderIntent::Display, true);
        let outcome = tokio::task::spawn_blocking(move || -> Result<Option<Preview>> {
            match document.render(page_index, &params, &mut lease, &task_token) {
                Ok(()) => {}
                Err(SalvorError::RenderCancelled) => return Ok(None),
                Err(err) => return Err(err),
            }
            if task_token.is_cancelled() {
                return Ok(None);
            }
            let pixels = lease.pixels().clone();
            drop(lease);
            let processor = ImageProcessor::from_rgba(pixels)
                .flatten(params.background)
                .fit_within(max_edge, max_edge);
            Ok(Some(Preview {
                page_index,
                width: processor.width(),
                height: processor.height(),
                png: processor.to_png_bytes()?,
            }))
        })
        .await
        .map_err(|err| SalvorError::Render(format!("preview task failed: {err}")))??;

        if token.is_cancelled() {
            debug!(page = page_index + 1, "preview superseded");
            return Ok(None);
        }
        Ok(outcome)
    }

    /// Cancel whatever is in flight and register a fresh token.
    fn supersede(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = match self.in_flight.lock() {
            Ok(mut slot) => slot.replace(token.clone()),
            Err(poisoned) => poisoned.into_inner().replace(token.clone()),
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }
}
