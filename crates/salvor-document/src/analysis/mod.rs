// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis — byte-prefix scanning and heuristic document classification.

pub mod classifier;
pub mod fingerprint;
pub mod patterns;
pub mod scanner;

pub use classifier::DocumentClassifier;
pub use patterns::Lexicon;
pub use scanner::{ScanText, SignalSet};
