// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Surface pool — a pool of exactly one off-screen bitmap.
//
// Every render holds the surface through a `SurfaceLease`; the lease releases
// the surface when dropped, whether the render succeeded, failed or panicked.
// A lease can be moved into a blocking task, so a render abandoned after a
// timeout keeps the surface until the renderer actually returns.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use salvor_core::error::{Result, SalvorError};
use salvor_render::Surface;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Shared handle to the single rendering surface.
#[derive(Clone, Default)]
pub struct SurfacePool {
    slot: Arc<Mutex<Surface>>,
}

/// Exclusive use of the surface until dropped.
pub struct SurfaceLease {
    guard: OwnedMutexGuard<Surface>,
}

impl SurfacePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the surface is free.
    pub async fn acquire(&self) -> SurfaceLease {
        SurfaceLease {
            guard: Arc::clone(&self.slot).lock_owned().await,
        }
    }

    /// Wait at most `budget` for the surface.
    pub async fn acquire_within(&self, budget: Duration) -> Result<SurfaceLease> {
        match tokio::time::timeout(budget, self.acquire()).await {
            Ok(lease) => Ok(lease),
            Err(_) => {
                debug!(budget_ms = budget.as_millis() as u64, "surface still held by an earlier render");
                Err(SalvorError::Render(
                    "rendering surface is still held by an abandoned render".into(),
                ))
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.slot.try_lock().is_err()
    }
}

impl Deref for SurfaceLease {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        &self.guard
    }
}

impl DerefMut for SurfaceLease {
    fn deref_mut(&mut self) -> &mut Surface {
        &mut self.guard
    }
}
