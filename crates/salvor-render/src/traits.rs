// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer-agnostic trait definitions.
//
// Backends parse bytes into page handles and draw a page into a caller-owned
// `Surface`. The recovery engine never talks to a concrete renderer.

use std::sync::Arc;

use salvor_core::error::Result;
use salvor_core::{PageSize, PasswordDecision};
use tokio_util::sync::CancellationToken;

use crate::surface::Surface;

/// Whether a render targets printing or on-screen display. Print intent
/// composites annotation appearance streams meant for paper output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderIntent {
    Print,
    Display,
}

/// Viewport parameters for one render attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Resolution multiplier over 72 dpi.
    pub scale: f32,
    pub intent: RenderIntent,
    /// Composite annotation layers.
    pub include_annotations: bool,
    /// Composite interactive form field appearances.
    pub include_forms: bool,
    /// Opaque fill painted before the page. Always white in practice;
    /// surfaces must never carry transparency into the flattened bitmap.
    pub background: [u8; 3],
}

impl RenderParams {
    pub const WHITE: [u8; 3] = [255, 255, 255];

    pub fn new(scale: f32, intent: RenderIntent, include_annotations: bool) -> Self {
        Self {
            scale,
            intent,
            include_annotations,
            include_forms: include_annotations,
            background: Self::WHITE,
        }
    }

    /// Pixel dimensions of a page rendered with these parameters.
    pub fn target_size(&self, page: PageSize) -> (u32, u32) {
        let px = |pt: f32| ((pt * self.scale).round() as u32).max(1);
        (px(page.width_pt), px(page.height_pt))
    }
}

/// A renderer able to parse PDF bytes.
pub trait RasterBackend: Send + Sync {
    /// Short name for logs ("pdfium", "unavailable", ...).
    fn backend_name(&self) -> &str;

    /// Parse the document. Returns `SalvorError::PasswordRequired` when the
    /// document needs a user password that was not supplied or was wrong.
    fn open(&self, bytes: Arc<[u8]>, password: Option<&str>) -> Result<Arc<dyn RasterDocument>>;
}

/// A parsed document whose pages can be rendered.
///
/// `render` is synchronous and CPU-bound; async callers run it on the
/// blocking pool. Implementations should poll `cancel` between expensive
/// steps and return `SalvorError::RenderCancelled` once it fires.
pub trait RasterDocument: Send + Sync {
    fn page_count(&self) -> u32;

    /// Physical size of a 0-based page.
    fn page_size(&self, page_index: u32) -> Result<PageSize>;

    /// Draw a 0-based page into `surface`, resizing it as needed.
    fn render(
        &self,
        page_index: u32,
        params: &RenderParams,
        surface: &mut Surface,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Interactive collaborator consulted when a document needs a password.
pub trait PasswordPrompt: Send + Sync {
    /// `attempt` starts at 1 and grows after each rejected password.
    fn request_password(&self, file_name: &str, attempt: u32) -> PasswordDecision;
}

/// Prompt that answers every request the same way.
#[derive(Debug, Clone)]
pub struct FixedPrompt(pub PasswordDecision);

impl PasswordPrompt for FixedPrompt {
    fn request_password(&self, file_name: &str, attempt: u32) -> PasswordDecision {
        tracing::debug!(file = file_name, attempt, decision = ?self.0, "fixed password decision");
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_size_scales_points() {
        let params = RenderParams::new(2.0, RenderIntent::Print, true);
        assert_eq!(params.target_size(PageSize::A4), (1190, 1684));
    }

    #[test]
    fn target_size_never_collapses_to_zero() {
        let params = RenderParams::new(0.001, RenderIntent::Display, false);
        assert_eq!(params.target_size(PageSize::new(10.0, 10.0)), (1, 1));
    }

    #[test]
    fn fixed_prompt_repeats_decision() {
        let prompt = FixedPrompt(PasswordDecision::Skip);
        assert_eq!(prompt.request_password("a.pdf", 1), PasswordDecision::Skip);
        assert_eq!(prompt.request_password("a.pdf", 2), PasswordDecision::Skip);
    }
}
