// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// salvor-document — Detection and recovery of copy-resistant PDFs.
//
// Classifies inputs from their leading bytes, loads what can be loaded
// directly, rasterizes what cannot, substitutes placeholders for pages that
// resist every strategy, and merges, splits, reorders or compresses the
// results.

pub mod analysis;
pub mod compress;
pub mod image;
pub mod naming;
pub mod orchestrator;
pub mod pdf;
pub mod pipeline;
pub mod placeholder;
pub mod raster;
pub mod sniff;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the primary structs so callers can use `salvor_document::Orchestrator` etc.
pub use analysis::DocumentClassifier;
pub use compress::CompressionLevel;
pub use crate::image::ImageProcessor;
pub use orchestrator::{
    CompressOutput, CompressionMethod, MergeOutput, MergeReport, Orchestrator, SplitOutput,
    parse_page_ranges,
};
pub use pdf::{PageAssembler, PdfReader, PdfWriter};
pub use pipeline::{DocumentPipeline, ProcessingResult};
pub use placeholder::PlaceholderSynthesizer;
pub use raster::{PreviewRenderer, RecoveryEngine, StrategyFamily};
pub use sniff::{InputFile, file_name_of};
