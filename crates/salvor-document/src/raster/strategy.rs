// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strategy table — the ordered render configurations tried for each page.
//
// A table is one primary strategy, picked from the strategy family and the
// issuing institution, followed by four fallback tiers derived from the
// primary scale. The emergency family has a single strategy and no tiers.

use std::time::Duration;

use salvor_core::{InstitutionFamily, PageSize, PipelineConfig, ProcessingMethod};
use salvor_render::{RenderIntent, RenderParams};

/// Which recovery path a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyFamily {
    /// Documents produced by the TCPDF generator.
    Tcpdf,
    /// Credentials without strong encryption.
    Certificate,
    /// Strongly protected or copy-resistant documents.
    Protected,
    /// Last resort before an info document.
    Emergency,
}

impl StrategyFamily {
    /// The processing method recorded when this family recovers a document.
    pub fn method(&self) -> ProcessingMethod {
        match self {
            Self::Tcpdf => ProcessingMethod::SpecializedTcpdf,
            Self::Certificate => ProcessingMethod::SpecializedCertificate,
            Self::Protected => ProcessingMethod::SpecializedProtected,
            Self::Emergency => ProcessingMethod::EmergencyFallback,
        }
    }

    fn timeout(&self, config: &PipelineConfig) -> Duration {
        let ms = match self {
            Self::Tcpdf | Self::Certificate => config.certificate_render_timeout_ms,
            Self::Protected | Self::Emergency => config.render_timeout_ms,
        };
        Duration::from_millis(ms)
    }
}

impl std::fmt::Display for StrategyFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Tcpdf => "tcpdf",
            Self::Certificate => "certificate",
            Self::Protected => "protected",
            Self::Emergency => "emergency",
        })
    }
}

/// One render configuration with its time budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStrategy {
    pub label: &'static str,
    pub params: RenderParams,
    pub timeout: Duration,
}

impl RenderStrategy {
    /// Parameters for `page`, with the scale reduced so the surface stays
    /// within `max_pixels`.
    pub fn params_for(&self, page: PageSize, max_pixels: u64) -> RenderParams {
        let area = f64::from(page.width_pt) * f64::from(page.height_pt);
        let mut params = self.params;
        if area > 0.0 {
            let limit = ((max_pixels as f64) / area).sqrt() as f32;
            if params.scale > limit {
                params.scale = limit;
            }
        }
        params
    }
}

/// Ordered strategies for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyTable {
    family: StrategyFamily,
    strategies: Vec<RenderStrategy>,
}

impl StrategyTable {
    pub fn for_family(
        family: StrategyFamily,
        institution: InstitutionFamily,
        config: &PipelineConfig,
    ) -> Self {
        let timeout = family.timeout(config);
        let strategy = |label, scale, intent, annotations| RenderStrategy {
            label,
            params: RenderParams::new(scale, intent, annotations),
            timeout,
        };

        let primary = match (family, institution) {
            (StrategyFamily::Emergency, _) => {
                return Self {
                    family,
                    strategies: vec![strategy("emergency", 2.0, RenderIntent::Display, false)],
                };
            }
            (StrategyFamily::Tcpdf, InstitutionFamily::SafetyMutual) => {
                strategy("tcpdf-safety-mutual", 4.0, RenderIntent::Print, true)
            }
            (StrategyFamily::Tcpdf, _) => strategy("tcpdf", 3.5, RenderIntent::Print, true),
            (StrategyFamily::Certificate, InstitutionFamily::SafetyMutual) => {
                strategy("certificate-safety-mutual", 4.0, RenderIntent::Print, true)
            }
            (StrategyFamily::Certificate, InstitutionFamily::Mining) => {
                strategy("certificate-mining", 3.5, RenderIntent::Print, true)
            }
            (StrategyFamily::Certificate, InstitutionFamily::University) => {
                strategy("certificate-university", 3.0, RenderIntent::Display, false)
            }
            (StrategyFamily::Certificate, _) => {
                strategy("certificate", 3.0, RenderIntent::Print, true)
            }
            (StrategyFamily::Protected, _) => {
                let mut protected = strategy("protected", 2.5, RenderIntent::Print, false);
                protected.params.include_forms = false;
                protected
            }
        };

        let base = primary.params.scale;
        let strategies = vec![
            primary,
            strategy("fallback-display", base * 0.8, RenderIntent::Display, false),
            strategy("fallback-print-annotated", base * 0.6, RenderIntent::Print, true),
            strategy("fallback-upscaled", base * 1.2, RenderIntent::Display, true),
            strategy("fallback-fixed", 2.0, RenderIntent::Print, false),
        ];
        Self { family, strategies }
    }

    pub fn family(&self) -> StrategyFamily {
        self.family
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderStrategy> {
        self.strategies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(family: StrategyFamily, institution: InstitutionFamily) -> StrategyTable {
        StrategyTable::for_family(family, institution, &PipelineConfig::default())
    }

    #[test]
    fn specialized_tables_have_primary_plus_four_tiers() {
        let t = table(StrategyFamily::Certificate, InstitutionFamily::Other);
        let scales: Vec<f32> = t.iter().map(|s| s.params.scale).collect();
        assert_eq!(t.len(), 5);
        assert_eq!(scales, vec![3.0, 3.0 * 0.8, 3.0 * 0.6, 3.0 * 1.2, 2.0]);

        let intents: Vec<RenderIntent> = t.iter().map(|s| s.params.intent).collect();
        assert_eq!(
            intents,
            vec![
                RenderIntent::Print,
                RenderIntent::Display,
                RenderIntent::Print,
                RenderIntent::Display,
                RenderIntent::Print,
            ]
        );
    }

    #[test]
    fn institution_changes_primary() {
        let mutual = table(StrategyFamily::Tcpdf, InstitutionFamily::SafetyMutual);
        assert_eq!(mutual.iter().next().unwrap().params.scale, 4.0);

        let university = table(StrategyFamily::Certificate, InstitutionFamily::University);
        let primary = university.iter().next().unwrap();
        assert_eq!(primary.params.intent, RenderIntent::Display);
        assert!(!primary.params.include_annotations);
    }

    #[test]
    fn emergency_is_a_single_display_strategy() {
        let t = table(StrategyFamily::Emergency, InstitutionFamily::Other);
        assert_eq!(t.len(), 1);
        let only = t.iter().next().unwrap();
        assert_eq!(only.params.scale, 2.0);
        assert_eq!(only.params.intent, RenderIntent::Display);
    }

    #[test]
    fn timeouts_follow_family() {
        let config = PipelineConfig::default();
        let cert = table(StrategyFamily::Certificate, InstitutionFamily::Other);
        let prot = table(StrategyFamily::Protected, InstitutionFamily::Other);
        assert!(cert
            .iter()
            .all(|s| s.timeout == Duration::from_millis(config.certificate_render_timeout_ms)));
        assert!(prot
            .iter()
            .all(|s| s.timeout == Duration::from_millis(config.render_timeout_ms)));
    }

    #[test]
    fn backgrounds_are_opaque_white() {
        for family in [
            StrategyFamily::Tcpdf,
            StrategyFamily::Certificate,
            StrategyFamily::Protected,
            StrategyFamily::Emergency,
        ] {
            assert!(table(family, InstitutionFamily::Other)
                .iter()
                .all(|s| s.params.background == RenderParams::WHITE));
        }
    }

    #[test]
    fn scale_is_capped_by_pixel_budget() {
        let t = table(StrategyFamily::Tcpdf, InstitutionFamily::SafetyMutual);
        let primary = t.iter().next().unwrap();
        let huge = PageSize::new(2000.0, 2000.0);
        let params = primary.params_for(huge, 4_000_000);
        assert!((params.scale - 1.0).abs() < 1e-4);
        assert_eq!(primary.params_for(PageSize::A4, 1 << 40).scale, 4.0);
    }
}
