// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Salvor recovery pipeline.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a processed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Classification vocabulary
// ---------------------------------------------------------------------------

/// Languages the keyword scanner can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Spanish,
    English,
    Portuguese,
    French,
    German,
    Italian,
    #[default]
    Unknown,
}

impl Language {
    /// Every detectable language, in tie-breaking order.
    pub const DETECTABLE: [Language; 6] = [
        Language::Spanish,
        Language::English,
        Language::Portuguese,
        Language::French,
        Language::German,
        Language::Italian,
    ];
}

/// Broad category of the document, as far as the keywords reveal it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Diploma,
    Certificate,
    License,
    Credential,
    #[default]
    Unknown,
}

impl DocumentKind {
    /// Diplomas, certificates and licenses are eligible for specialized handling.
    pub fn is_credential_family(&self) -> bool {
        matches!(self, Self::Diploma | Self::Certificate | Self::License)
    }

    /// Title-case label used on placeholder pages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Diploma => "Diploma",
            Self::Certificate => "Certificate",
            Self::License => "License",
            Self::Credential => "Credential",
            Self::Unknown => "Document",
        }
    }
}

/// How strongly the file appears to be protected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// Coarse grouping of issuing institutions. Drives rendering strategy choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionFamily {
    /// Occupational-safety mutuals (ACHS, IST, ISL, Mutual de Seguridad).
    SafetyMutual,
    /// State mining companies and mining contractors.
    Mining,
    Government,
    University,
    ProfessionalBody,
    CertificationBody,
    #[default]
    Other,
}

/// The classifier's decision on which recovery path to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingRecommendation {
    #[default]
    Normal,
    CarefulProcessing,
    SpecializedCertificate,
    SpecializedTcpdf,
    SpecializedProtected,
}

impl ProcessingRecommendation {
    /// Derive the recommendation from the classification signals.
    ///
    /// This is the only way a recommendation is produced; it depends on
    /// nothing but its arguments.
    pub fn decide(
        confidence: u32,
        kind: DocumentKind,
        technology: &str,
        protection: ProtectionLevel,
        threshold: u32,
    ) -> Self {
        if confidence > threshold && kind.is_credential_family() {
            if technology.to_ascii_lowercase().contains("tcpdf") {
                Self::SpecializedTcpdf
            } else if protection == ProtectionLevel::High {
                Self::SpecializedProtected
            } else {
                Self::SpecializedCertificate
            }
        } else if protection == ProtectionLevel::High {
            Self::SpecializedProtected
        } else if protection != ProtectionLevel::None {
            Self::CarefulProcessing
        } else {
            Self::Normal
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis record
// ---------------------------------------------------------------------------

/// The signals the classifier extracted from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub detected_language: Language,
    pub document_type: DocumentKind,
    /// Authoring toolchain label, or `"unknown"`.
    pub technology: String,
    /// Issuing institution label, or `"unknown"`.
    pub institution: String,
    pub institution_family: InstitutionFamily,
    pub protection_level: ProtectionLevel,
    /// Structural markers that contributed to the protection verdict.
    pub protection_reasons: BTreeSet<String>,
    pub confidence: u32,
    /// The prefix holds compressed streams but no keywords matched, so the
    /// classification may be missing text the scanner could not see.
    pub keywords_possibly_hidden: bool,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            detected_language: Language::Unknown,
            document_type: DocumentKind::Unknown,
            technology: UNKNOWN_LABEL.into(),
            institution: UNKNOWN_LABEL.into(),
            institution_family: InstitutionFamily::Other,
            protection_level: ProtectionLevel::None,
            protection_reasons: BTreeSet::new(),
            confidence: 0,
            keywords_possibly_hidden: false,
        }
    }
}

/// Label used for technology and institution when nothing matched.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Produced once per input file by the classifier.
///
/// The recommendation is derived in [`AnalysisRecord::new`] and cannot be set
/// independently of the classification it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRecord {
    pub file_name: String,
    pub file_size_bytes: u64,
    /// Hex SHA-256 of the full input, for diagnostics and de-duplication.
    pub sha256: String,
    #[serde(flatten)]
    classification: Classification,
    processing_recommendation: ProcessingRecommendation,
}

impl AnalysisRecord {
    pub fn new(
        file_name: impl Into<String>,
        file_size_bytes: u64,
        sha256: impl Into<String>,
        classification: Classification,
        confidence_threshold: u32,
    ) -> Self {
        let processing_recommendation = ProcessingRecommendation::decide(
            classification.confidence,
            classification.document_type,
            &classification.technology,
            classification.protection_level,
            confidence_threshold,
        );
        Self {
            file_name: file_name.into(),
            file_size_bytes,
            sha256: sha256.into(),
            classification,
            processing_recommendation,
        }
    }

    /// Record used when classification itself went wrong: nothing detected,
    /// cheapest processing path.
    pub fn fail_open(file_name: impl Into<String>, file_size_bytes: u64) -> Self {
        Self::new(
            file_name,
            file_size_bytes,
            String::new(),
            Classification::default(),
            0,
        )
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn processing_recommendation(&self) -> ProcessingRecommendation {
        self.processing_recommendation
    }

    pub fn is_protected(&self) -> bool {
        self.classification.protection_level != ProtectionLevel::None
    }

    /// Whether the classification is too weak to trust on its own. Callers
    /// should present it as uncertain rather than as a finding.
    pub fn is_low_confidence(&self, confidence_threshold: u32) -> bool {
        self.classification.confidence <= confidence_threshold
            && (self.classification.document_type == DocumentKind::Unknown
                || self.classification.keywords_possibly_hidden)
    }
}

// ---------------------------------------------------------------------------
// Processing outcomes
// ---------------------------------------------------------------------------

/// Which strategy ultimately produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    DirectLoad,
    SpecializedTcpdf,
    SpecializedCertificate,
    SpecializedProtected,
    EmergencyFallback,
    InfoDocument,
}

impl ProcessingMethod {
    /// Whether the pages were rasterized (or synthesized) rather than copied.
    pub fn is_converted(&self) -> bool {
        !matches!(self, Self::DirectLoad)
    }
}

impl std::fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::DirectLoad => "direct_load",
            Self::SpecializedTcpdf => "specialized_tcpdf",
            Self::SpecializedCertificate => "specialized_certificate",
            Self::SpecializedProtected => "specialized_protected",
            Self::EmergencyFallback => "emergency_fallback",
            Self::InfoDocument => "info_document",
        };
        f.write_str(label)
    }
}

/// Partition of a document's pages into recovered and substituted pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageTally {
    pub page_count: u32,
    pub successful_pages: u32,
    pub placeholder_pages: u32,
}

impl PageTally {
    /// Tally for a document whose pages were all copied directly.
    pub fn direct(page_count: u32) -> Self {
        Self {
            page_count,
            successful_pages: page_count,
            placeholder_pages: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.page_count += 1;
        self.successful_pages += 1;
    }

    pub fn record_placeholder(&mut self) {
        self.page_count += 1;
        self.placeholder_pages += 1;
    }

    /// Recovered and substituted pages account for every page.
    pub fn is_consistent(&self) -> bool {
        self.successful_pages + self.placeholder_pages == self.page_count
    }
}

/// Physical page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize {
        width_pt: 595.0,
        height_pt: 842.0,
    };

    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
        }
    }

    /// Positive, finite and no larger than the PDF user-space limit.
    pub fn is_usable(&self) -> bool {
        let ok = |v: f32| v.is_finite() && v > 1.0 && v <= 14_400.0;
        ok(self.width_pt) && ok(self.height_pt)
    }

    pub fn width_mm(&self) -> f32 {
        self.width_pt * 25.4 / 72.0
    }

    pub fn height_mm(&self) -> f32 {
        self.height_pt * 25.4 / 72.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

// ---------------------------------------------------------------------------
// Skips and partial copies
// ---------------------------------------------------------------------------

/// Why a file was left out of a batch entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum SkipReason {
    UserDeclinedPassword,
    PasswordAttemptsExhausted,
    NotAPdf,
    TooLarge { size_bytes: u64, limit_bytes: u64 },
    Unreadable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserDeclinedPassword => f.write_str("user declined password"),
            Self::PasswordAttemptsExhausted => f.write_str("password attempts exhausted"),
            Self::NotAPdf => f.write_str("not a PDF file"),
            Self::TooLarge {
                size_bytes,
                limit_bytes,
            } => write!(f, "file too large ({size_bytes} bytes, limit {limit_bytes})"),
            Self::Unreadable(detail) => write!(f, "unreadable: {detail}"),
        }
    }
}

/// A file excluded from a batch, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: SkipReason,
}

impl SkippedFile {
    pub fn new(file_name: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            file_name: file_name.into(),
            reason,
        }
    }
}

/// Pages substituted mid-copy inside an otherwise successful file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialCopyIssue {
    pub file_name: String,
    /// 1-based page numbers that were replaced by placeholders.
    pub substituted_pages: Vec<u32>,
    pub total_pages: u32,
}

/// Resolution of an interactive password prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordDecision {
    /// Retry opening the document with this password.
    Supply(String),
    /// Continue without a password and recover what rendering allows.
    RasterizeWithout,
    /// Leave the file out of the batch.
    Skip,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Which long-running stage is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Analyzing,
    Rasterizing,
    Merging,
    Splitting,
    Reordering,
}

/// Best-effort progress notification. Carries no correctness meaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    /// Completed fraction in `[0.0, 1.0]`.
    pub fraction: f32,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(stage: ProgressStage, done: usize, total: usize, message: impl Into<String>) -> Self {
        let fraction = if total == 0 {
            1.0
        } else {
            (done as f32 / total as f32).clamp(0.0, 1.0)
        };
        Self {
            stage,
            fraction,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Receives progress events from long-running operations.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
