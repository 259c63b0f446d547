// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document classifier — turns analyzer signals into an analysis record.
//
// Scoring:
//   * 10 points per body keyword hit (per language list it appears in)
//   * 15 points per file-name hint
//   *  5 points per structural protection marker
//
// The classifier never fails. Internal errors produce a fail-open record
// whose recommendation is `normal`, so a misclassification costs at most one
// extra fallback attempt.

use std::collections::BTreeSet;

use salvor_core::error::{Result, SalvorError};
use salvor_core::{
    AnalysisRecord, Classification, DocumentKind, InstitutionFamily, Language, PipelineConfig,
    ProtectionLevel, UNKNOWN_LABEL,
};
use tracing::{debug, instrument, warn};

use super::fingerprint::fingerprint;
use super::patterns::Lexicon;
use super::scanner::{ScanText, SignalSet, scan};

const BODY_KEYWORD_WEIGHT: u32 = 10;
const FILENAME_HINT_WEIGHT: u32 = 15;
const PROTECTION_MARKER_WEIGHT: u32 = 5;

/// Combines analyzer output into an [`AnalysisRecord`].
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    lexicon: &'static Lexicon,
    prefix_len: usize,
    confidence_threshold: u32,
}

impl DocumentClassifier {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            lexicon: Lexicon::builtin(),
            prefix_len: config.effective_scan_prefix(),
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub fn confidence_threshold(&self) -> u32 {
        self.confidence_threshold
    }

    /// Classify a file. Same bytes and name always give the same record.
    #[instrument(skip_all, fields(file = file_name, size = bytes.len()))]
    pub fn classify(&self, file_name: &str, bytes: &[u8]) -> AnalysisRecord {
        match self.try_classify(file_name, bytes) {
            Ok(record) => {
                let c = record.classification();
                debug!(
                    language = ?c.detected_language,
                    kind = ?c.document_type,
                    technology = %c.technology,
                    institution = %c.institution,
                    protection = ?c.protection_level,
                    confidence = c.confidence,
                    recommendation = ?record.processing_recommendation(),
                    "classified"
                );
                record
            }
            Err(err) => {
                warn!(error = %err, "classification failed, defaulting to normal processing");
                AnalysisRecord::fail_open(file_name, bytes.len() as u64)
            }
        }
    }

    fn try_classify(&self, file_name: &str, bytes: &[u8]) -> Result<AnalysisRecord> {
        if bytes.is_empty() {
            return Err(SalvorError::UnsupportedDocument("empty input".into()));
        }
        let text = ScanText::from_bytes(bytes, self.prefix_len);
        let signals = scan(&text, file_name, self.lexicon);
        Ok(AnalysisRecord::new(
            file_name,
            bytes.len() as u64,
            fingerprint(bytes),
            self.classify_signals(&signals),
            self.confidence_threshold,
        ))
    }

    /// Derive a classification from already-scanned signals.
    pub fn classify_signals(&self, signals: &SignalSet) -> Classification {
        let (document_type, kind_confidence) = detect_kind(signals, self.lexicon);
        let (protection_level, protection_reasons) = assess_protection(signals);
        let (institution, institution_family) = detect_institution(signals);

        let confidence = kind_confidence
            + PROTECTION_MARKER_WEIGHT * protection_reasons.len() as u32;

        Classification {
            detected_language: detect_language(signals),
            document_type,
            technology: detect_technology(signals, self.lexicon),
            institution,
            institution_family,
            protection_level,
            protection_reasons,
            confidence,
            keywords_possibly_hidden: signals.compressed_streams && signals.keyword_hits() == 0,
        }
    }
}

// -- Individual detectors -----------------------------------------------------

/// Language with the largest summed keyword length. Ties go to the language
/// listed first; no hits at all means unknown.
fn detect_language(signals: &SignalSet) -> Language {
    let mut best = (Language::Unknown, 0usize);
    for (language, hits) in &signals.keywords {
        let score: usize = hits.iter().map(|k| k.chars().count()).sum();
        if score > best.1 {
            best = (*language, score);
        }
    }
    best.0
}

fn detect_kind(signals: &SignalSet, lexicon: &Lexicon) -> (DocumentKind, u32) {
    let mut confidence = 0;
    let mut kind = DocumentKind::Unknown;

    let hits = signals.keyword_hits() as u32;
    if hits > 0 {
        confidence += hits * BODY_KEYWORD_WEIGHT;
        let any_of = |terms: &[&str]| signals.all_keywords().any(|k| terms.contains(&k));
        kind = if any_of(lexicon.diploma_terms) {
            DocumentKind::Diploma
        } else if any_of(lexicon.certificate_terms) {
            DocumentKind::Certificate
        } else if any_of(lexicon.license_terms) {
            DocumentKind::License
        } else {
            DocumentKind::Credential
        };
    }

    if let Some((_, hinted)) = signals.filename_hints.first() {
        confidence += signals.filename_hints.len() as u32 * FILENAME_HINT_WEIGHT;
        if kind == DocumentKind::Unknown {
            kind = *hinted;
        }
    }

    (kind, confidence)
}

/// Authoring-library matches win; otherwise the first technology listed.
fn detect_technology(signals: &SignalSet, lexicon: &Lexicon) -> String {
    signals
        .technologies
        .iter()
        .find(|m| lexicon.priority_technologies.iter().any(|t| m.contains(t)))
        .or_else(|| signals.technologies.first())
        .map(|m| (*m).to_owned())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_owned())
}

fn detect_institution(signals: &SignalSet) -> (String, InstitutionFamily) {
    signals
        .institutions
        .first()
        .map(|(label, family)| ((*label).to_owned(), *family))
        .unwrap_or_else(|| (UNKNOWN_LABEL.to_owned(), InstitutionFamily::Other))
}

fn assess_protection(signals: &SignalSet) -> (ProtectionLevel, BTreeSet<String>) {
    let reasons: BTreeSet<String> = signals
        .protection_markers()
        .into_iter()
        .map(str::to_owned)
        .collect();

    let level = if reasons.is_empty() {
        ProtectionLevel::None
    } else if signals.has_encryption() && !signals.strong_cipher.is_empty() {
        ProtectionLevel::High
    } else if signals.has_encryption() && !signals.medium_cipher.is_empty() {
        ProtectionLevel::Medium
    } else {
        ProtectionLevel::Low
    };
    (level, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use salvor_core::ProcessingRecommendation;

    fn classifier() -> DocumentClassifier {
        DocumentClassifier::new(&PipelineConfig::default())
    }

    const STRONG_ENCRYPTION: &str = "%PDF-1.7\n\
        1 0 obj << /Filter /Standard /V 5 /R 6 /Length 256 /P -3904 \
        /O (owner) /U (user) /StmF /StdCF >> endobj\n\
        trailer << /Encrypt 1 0 R >>\n";

    #[test]
    fn encrypted_certificate_is_specialized_protected() {
        let body = format!(
            "{STRONG_ENCRYPTION}(CERTIFICATE OF COMPLETION) Tj (This is to hereby certify) Tj"
        );
        let record = classifier().classify("course.pdf", body.as_bytes());
        let c = record.classification();

        assert_eq!(c.document_type, DocumentKind::Certificate);
        assert_eq!(c.protection_level, ProtectionLevel::High);
        assert!(c.confidence > 30, "confidence was {}", c.confidence);
        assert_eq!(
            record.processing_recommendation(),
            ProcessingRecommendation::SpecializedProtected
        );
    }

    #[test]
    fn tcpdf_certificate_routes_to_tcpdf() {
        let body = "%PDF-1.4 /Producer (TCPDF 6.2.13 \\(http://www.tcpdf.org\\)) \
                    (Certificado) Tj (Se certifica que) Tj (ACHS) Tj";
        let record = classifier().classify("certificado_achs.pdf", body.as_bytes());
        let c = record.classification();

        assert_eq!(c.detected_language, Language::Spanish);
        assert_eq!(c.technology, "tcpdf");
        assert_eq!(c.institution, "achs");
        assert_eq!(c.institution_family, InstitutionFamily::SafetyMutual);
        assert_eq!(
            record.processing_recommendation(),
            ProcessingRecommendation::SpecializedTcpdf
        );
    }

    #[test]
    fn diploma_beats_certificate_keywords() {
        let record = classifier().classify(
            "x.pdf",
            b"(Certificate) Tj (Diploma) Tj (Bachelor degree) Tj",
        );
        assert_eq!(record.classification().document_type, DocumentKind::Diploma);
    }

    #[test]
    fn certificate_beats_license_keywords() {
        let record = classifier().classify("x.pdf", b"(Licencia de conducir) (Certificado)");
        assert_eq!(
            record.classification().document_type,
            DocumentKind::Certificate
        );
    }

    #[test]
    fn filename_alone_sets_kind_and_weighs_more() {
        let record = classifier().classify("licencia_2024.pdf", b"%PDF-1.4 nothing here");
        let c = record.classification();
        assert_eq!(c.document_type, DocumentKind::License);
        assert_eq!(c.confidence, FILENAME_HINT_WEIGHT);
    }

    #[test]
    fn language_ties_go_to_first_declared() {
        // "diploma" is in the Spanish, English, Portuguese and Italian lists.
        let record = classifier().classify("x.pdf", b"(diploma)");
        assert_eq!(
            record.classification().detected_language,
            Language::Spanish
        );
    }

    #[test]
    fn plain_document_is_normal() {
        let record = classifier().classify("report.pdf", b"%PDF-1.4\n(Quarterly figures) Tj");
        let c = record.classification();
        assert_eq!(c.detected_language, Language::Unknown);
        assert_eq!(c.document_type, DocumentKind::Unknown);
        assert_eq!(c.protection_level, ProtectionLevel::None);
        assert_eq!(c.technology, UNKNOWN_LABEL);
        assert_eq!(
            record.processing_recommendation(),
            ProcessingRecommendation::Normal
        );
    }

    #[test]
    fn signature_only_is_low_protection() {
        let record = classifier().classify(
            "contract.pdf",
            b"<< /Type /Sig /Filter /Adobe.PPKLite /ByteRange [0 10 20 30] >>",
        );
        let c = record.classification();
        assert_eq!(c.protection_level, ProtectionLevel::Low);
        assert!(c.protection_reasons.contains("/byterange"));
        assert_eq!(
            record.processing_recommendation(),
            ProcessingRecommendation::CarefulProcessing
        );
    }

    #[test]
    fn medium_cipher_is_medium() {
        let record = classifier().classify(
            "x.pdf",
            b"<< /Encrypt 4 0 R >> << /Filter /Standard /V 2 /R 3 /Length 128 >>",
        );
        assert_eq!(
            record.classification().protection_level,
            ProtectionLevel::Medium
        );
    }

    #[test]
    fn hidden_keywords_are_surfaced_as_low_confidence() {
        let record = classifier().classify(
            "scan.pdf",
            b"%PDF-1.5 << /Filter /FlateDecode /Length 4000 >> stream xx",
        );
        assert!(record.classification().keywords_possibly_hidden);
        assert!(record.is_low_confidence(classifier().confidence_threshold()));
    }

    #[test]
    fn empty_input_fails_open() {
        let record = classifier().classify("empty.pdf", b"");
        assert_eq!(
            record.processing_recommendation(),
            ProcessingRecommendation::Normal
        );
        assert_eq!(record.file_size_bytes, 0);
    }

    #[test]
    fn classification_is_deterministic() {
        let body = format!("{STRONG_ENCRYPTION}(Diploma) (Universidad de Chile)");
        let a = classifier().classify("d.pdf", body.as_bytes());
        let b = classifier().classify("d.pdf", body.as_bytes());
        assert_eq!(a, b);
    }
}
