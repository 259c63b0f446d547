// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// Every heuristic constant lives here so it can be tuned without code changes.
// The defaults are empirical, not derived.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SalvorError};
use crate::types::PageSize;

/// Smallest prefix the byte scanner will look at.
pub const MIN_SCAN_PREFIX: usize = 8 * 1024;
/// Largest prefix the byte scanner will look at.
pub const MAX_SCAN_PREFIX: usize = 32 * 1024;

/// Tunables for the detection and recovery pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of leading bytes the scanner decodes. Clamped to 8–32 KiB.
    pub scan_prefix_bytes: usize,
    /// Inputs larger than this are skipped.
    pub max_file_bytes: u64,
    /// Confidence a credential must exceed to get specialized processing.
    pub confidence_threshold: u32,
    /// Blank-render heuristic parameters.
    pub blank_detection: BlankDetection,
    /// Per-strategy render budget for generic and emergency rendering.
    pub render_timeout_ms: u64,
    /// Per-strategy render budget for certificate and TCPDF rendering.
    pub certificate_render_timeout_ms: u64,
    /// Upper bound on surface size; strategies scale down to stay under it.
    pub max_surface_pixels: u64,
    /// Page size for placeholders when the original size is unknown.
    pub fallback_page_size: PageSize,
    /// How many times a password prompt may be answered with a wrong password.
    pub max_password_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scan_prefix_bytes: 16 * 1024,
            max_file_bytes: 100 * 1024 * 1024,
            confidence_threshold: 30,
            blank_detection: BlankDetection::default(),
            render_timeout_ms: 15_000,
            certificate_render_timeout_ms: 30_000,
            max_surface_pixels: 4096 * 4096 * 2,
            fallback_page_size: PageSize::A4,
            max_password_attempts: 3,
        }
    }
}

/// Parameters of the stride-sampled blank check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlankDetection {
    /// Sample every n-th pixel in row-major order.
    pub sample_stride: usize,
    /// A channel at or above this value counts as white.
    pub near_white: u8,
    /// Renders whose non-white fraction is below this are blank.
    pub min_content_ratio: f32,
}

impl Default for BlankDetection {
    fn default() -> Self {
        Self {
            sample_stride: 4,
            near_white: 250,
            min_content_ratio: 0.01,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.blank_detection.sample_stride == 0 {
            return Err(SalvorError::Config("sample_stride must be at least 1".into()));
        }
        let ratio = self.blank_detection.min_content_ratio;
        if !(0.0..1.0).contains(&ratio) {
            return Err(SalvorError::Config(format!(
                "min_content_ratio must be in [0, 1), got {ratio}"
            )));
        }
        if self.render_timeout_ms == 0 || self.certificate_render_timeout_ms == 0 {
            return Err(SalvorError::Config("render timeouts must be non-zero".into()));
        }
        if self.max_surface_pixels == 0 {
            return Err(SalvorError::Config("max_surface_pixels must be non-zero".into()));
        }
        if !self.fallback_page_size.is_usable() {
            return Err(SalvorError::Config(format!(
                "fallback page size {:?} is not usable",
                self.fallback_page_size
            )));
        }
        Ok(())
    }

    /// The scan prefix length actually used.
    pub fn effective_scan_prefix(&self) -> usize {
        self.scan_prefix_bytes.clamp(MIN_SCAN_PREFIX, MAX_SCAN_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.confidence_threshold, 30);
        assert_eq!(config.blank_detection.min_content_ratio, 0.01);
    }

    #[test]
    fn prefix_is_clamped() {
        let config = PipelineConfig {
            scan_prefix_bytes: 1,
            ..PipelineConfig::default()
        };
        assert_eq!(config.effective_scan_prefix(), MIN_SCAN_PREFIX);
        let config = PipelineConfig {
            scan_prefix_bytes: usize::MAX,
            ..PipelineConfig::default()
        };
        assert_eq!(config.effective_scan_prefix(), MAX_SCAN_PREFIX);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "confidence_threshold": 40, "blank_detection": {{ "sample_stride": 2 }} }}"#
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.confidence_threshold, 40);
        assert_eq!(config.blank_detection.sample_stride, 2);
        assert_eq!(config.blank_detection.near_white, 250);
        assert_eq!(config.render_timeout_ms, 15_000);
    }

    #[test]
    fn zero_stride_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "blank_detection": {{ "sample_stride": 0 }} }}"#).unwrap();
        let err = PipelineConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, SalvorError::Config(_)));
    }
}
