// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fallback backend for builds without a page renderer.
//
// Opening always fails with `RendererUnavailable`; the pipeline treats that as
// a document-level recoverable error and degrades to an info document.

use std::sync::Arc;

use salvor_core::error::{Result, SalvorError};

use crate::traits::{RasterBackend, RasterDocument};

/// Backend returned when no real renderer could be bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl RasterBackend for UnavailableBackend {
    fn backend_name(&self) -> &str {
        "unavailable"
    }

    fn open(&self, bytes: Arc<[u8]>, _password: Option<&str>) -> Result<Arc<dyn RasterDocument>> {
        tracing::warn!(size = bytes.len(), "RasterBackend::open called on unavailable backend");
        Err(SalvorError::RendererUnavailable(
            "built without a page renderer".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvor_core::FailureScope;

    #[test]
    fn open_is_a_recoverable_failure() {
        let err = UnavailableBackend
            .open(Arc::from(&b"%PDF-1.7"[..]), None)
            .err()
            .unwrap();
        assert_eq!(err.scope(), FailureScope::DocumentRecoverable);
    }
}
