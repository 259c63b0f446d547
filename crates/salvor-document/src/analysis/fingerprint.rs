// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input fingerprinting — SHA-256 over the full file bytes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 of `data` as a lowercase hex string.
///
/// Recorded on every analysis record and used by the orchestrator to notice
/// the same file being merged twice.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// First 12 hex digits, for log lines.
pub fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
