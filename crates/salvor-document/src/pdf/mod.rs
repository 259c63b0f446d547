// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — direct loading, page assembly and page synthesis.

pub mod assembler;
pub mod reader;
pub mod writer;

pub use assembler::{CopyMemo, DocumentMetadata, PageAssembler, save_document};
pub use reader::PdfReader;
pub use writer::{PageCanvas, PdfWriter};
