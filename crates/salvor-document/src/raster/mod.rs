// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — recovery of copy-resistant pages by rendering them.

pub mod blank;
pub mod engine;
pub mod pool;
pub mod preview;
pub mod strategy;

pub use blank::ContentAssessment;
pub use engine::{Recovered, RecoveryEngine, RecoveryRequest, RenderedPage};
pub use pool::{SurfaceLease, SurfacePool};
pub use preview::{Preview, PreviewRenderer};
pub use strategy::{RenderStrategy, StrategyFamily, StrategyTable};
