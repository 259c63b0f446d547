// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Salvor, plus the failure-scope taxonomy that decides
// how far an error is allowed to travel.

use thiserror::Error;

use crate::types::{SkipReason, SkippedFile};

/// Top-level error type for all Salvor operations.
#[derive(Debug, Error)]
pub enum SalvorError {
    // -- Document errors --
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("document is encrypted: {0}")]
    Encrypted(String),

    #[error("a password is required to open this document")]
    PasswordRequired,

    #[error("invalid page selection: {0}")]
    InvalidPages(String),

    #[error("file is {size_bytes} bytes, limit is {limit_bytes} bytes")]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Rendering --
    #[error("page render failed: {0}")]
    Render(String),

    #[error("render of page {page} exceeded its {budget_ms} ms budget")]
    RenderTimeout { page: u32, budget_ms: u64 },

    #[error("render was cancelled")]
    RenderCancelled,

    #[error("no page renderer is available: {0}")]
    RendererUnavailable(String),

    // -- Batch outcomes --
    #[error("skipped {file_name}: {reason}")]
    Skipped { file_name: String, reason: SkipReason },

    #[error("no input produced usable output ({} file(s) skipped)", skipped.len())]
    BatchFailed { skipped: Vec<SkippedFile> },

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    TaskFailed(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SalvorError>;

/// How far an error may propagate before something must absorb it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// A single page render or copy. Absorbed by the fallback cascade or a
    /// placeholder page; never shown to the user.
    PageLevel,
    /// The whole document resisted parsing. Absorbed by rasterization, or by
    /// an info document when rasterization fails too.
    DocumentRecoverable,
    /// The file is excluded from the batch and listed in the skip report.
    DocumentUnrecoverable,
    /// Nothing in the batch produced output.
    BatchFatal,
    /// The caller asked for something impossible (bad page numbers, bad config).
    Request,
}

impl SalvorError {
    /// Classify this error onto the failure taxonomy.
    pub fn scope(&self) -> FailureScope {
        match self {
            Self::Render(_)
            | Self::RenderTimeout { .. }
            | Self::RenderCancelled
            | Self::ImageError(_) => FailureScope::PageLevel,

            Self::Encrypted(_)
            | Self::PasswordRequired
            | Self::PdfError(_)
            | Self::RendererUnavailable(_) => FailureScope::DocumentRecoverable,

            Self::Skipped { .. } | Self::UnsupportedDocument(_) | Self::FileTooLarge { .. } => {
                FailureScope::DocumentUnrecoverable
            }

            Self::BatchFailed { .. } | Self::TaskFailed(_) => FailureScope::BatchFatal,

            Self::InvalidPages(_) | Self::Config(_) | Self::Io(_) | Self::Serialization(_) => {
                FailureScope::Request
            }
        }
    }

    /// Convenience constructor for a skip.
    pub fn skipped(file_name: impl Into<String>, reason: SkipReason) -> Self {
        Self::Skipped {
            file_name: file_name.into(),
            reason,
        }
    }
}
