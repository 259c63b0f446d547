// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-pattern analyzer.
//
// Decodes a bounded prefix of the raw file as Latin-1 (one byte per char),
// lower-cases it and runs plain substring searches against the lexicon. Only
// literal, uncompressed text and structure is visible: keywords inside
// Flate-compressed content streams are not found. That is a known limitation
// of prefix scanning, surfaced through `SignalSet::compressed_streams`.

use salvor_core::{DocumentKind, InstitutionFamily, Language};

use super::patterns::{COMPRESSED_STREAM_MARKER, Lexicon};

/// Lower-cased Latin-1 view of a file prefix.
#[derive(Debug, Clone)]
pub struct ScanText {
    text: String,
    scanned_bytes: usize,
}

impl ScanText {
    /// Decode at most `prefix_len` leading bytes.
    pub fn from_bytes(bytes: &[u8], prefix_len: usize) -> Self {
        let prefix = &bytes[..bytes.len().min(prefix_len)];
        let decoded: String = prefix.iter().map(|&b| char::from(b)).collect();
        Self {
            text: decoded.to_lowercase(),
            scanned_bytes: prefix.len(),
        }
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.text.contains(pattern)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn scanned_bytes(&self) -> usize {
        self.scanned_bytes
    }
}

/// Everything the analyzer found, grouped by category. Matches keep table
/// order so first-match-wins decisions are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet {
    /// Matched certificate keywords per language, in lexicon order.
    pub keywords: Vec<(Language, Vec<&'static str>)>,
    pub technologies: Vec<&'static str>,
    pub institutions: Vec<(&'static str, InstitutionFamily)>,
    pub encryption: Vec<&'static str>,
    pub signatures: Vec<&'static str>,
    pub permissions: Vec<&'static str>,
    pub forms: Vec<&'static str>,
    pub strong_cipher: Vec<&'static str>,
    pub medium_cipher: Vec<&'static str>,
    pub weak_cipher: Vec<&'static str>,
    pub filename_hints: Vec<(&'static str, DocumentKind)>,
    pub compressed_streams: bool,
}

impl SignalSet {
    pub fn has_encryption(&self) -> bool {
        !self.encryption.is_empty()
    }

    /// Total keyword hits across all languages. A keyword shared by several
    /// languages counts once per language.
    pub fn keyword_hits(&self) -> usize {
        self.keywords.iter().map(|(_, hits)| hits.len()).sum()
    }

    /// All keyword hits, flattened in language order.
    pub fn all_keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keywords.iter().flat_map(|(_, hits)| hits.iter().copied())
    }

    /// Structural markers that count toward protection. Cipher indicators are
    /// included only when an encryption marker is present, since lengths and
    /// versions also occur in unrelated dictionaries.
    pub fn protection_markers(&self) -> Vec<&'static str> {
        let mut markers: Vec<&'static str> = Vec::new();
        markers.extend(&self.encryption);
        if self.has_encryption() {
            markers.extend(&self.strong_cipher);
            markers.extend(&self.medium_cipher);
            markers.extend(&self.weak_cipher);
        }
        markers.extend(&self.permissions);
        markers.extend(&self.signatures);
        markers.extend(&self.forms);
        markers
    }
}

/// Run every lexicon table over `text` and the file name.
pub fn scan(text: &ScanText, file_name: &str, lexicon: &Lexicon) -> SignalSet {
    let matching = |table: &'static [&'static str]| -> Vec<&'static str> {
        table.iter().copied().filter(|p| text.contains(p)).collect()
    };

    let keywords = lexicon
        .languages
        .iter()
        .map(|lang| (lang.language, matching(lang.keywords)))
        .collect();

    let institutions = lexicon
        .institutions
        .iter()
        .copied()
        .filter(|(pattern, _)| text.contains(pattern))
        .collect();

    let lowered_name = file_name.to_lowercase();
    let filename_hints = lexicon
        .filename_hints
        .iter()
        .copied()
        .filter(|(pattern, _)| lowered_name.contains(pattern))
        .collect();

    SignalSet {
        keywords,
        technologies: matching(lexicon.technologies),
        institutions,
        encryption: matching(lexicon.encryption_markers),
        signatures: matching(lexicon.signature_markers),
        permissions: matching(lexicon.permission_markers),
        forms: matching(lexicon.form_markers),
        strong_cipher: matching(lexicon.strong_cipher),
        medium_cipher: matching(lexicon.medium_cipher),
        weak_cipher: matching(lexicon.weak_cipher),
        filename_hints,
        compressed_streams: text.contains(COMPRESSED_STREAM_MARKER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_str(body: &str, name: &str) -> SignalSet {
        scan(
            &ScanText::from_bytes(body.as_bytes(), 32 * 1024),
            name,
            Lexicon::builtin(),
        )
    }

    #[test]
    fn decoding_is_latin1_and_lowercase() {
        // 0xCD is 'Í' in Latin-1.
        let text = ScanText::from_bytes(b"T\xCDTULO /ENCRYPT", 1024);
        assert_eq!(text.as_str(), "título /encrypt");
    }

    #[test]
    fn prefix_bounds_the_scan() {
        let mut body = vec![b' '; 100];
        body.extend_from_slice(b"/Encrypt");
        let text = ScanText::from_bytes(&body, 64);
        assert_eq!(text.scanned_bytes(), 64);
        assert!(!text.contains("/encrypt"));
    }

    #[test]
    fn structural_markers_are_categorised() {
        let signals = scan_str(
            "<< /Encrypt 5 0 R >> << /Filter /Standard /V 5 /R 6 /Length 256 /P -3904 >> \
             << /AcroForm << /SigFlags 3 >> >> << /Type /Sig /ByteRange [0 1 2 3] >>",
            "x.pdf",
        );
        assert!(signals.has_encryption());
        assert!(!signals.permissions.is_empty());
        assert!(!signals.forms.is_empty());
        assert!(!signals.signatures.is_empty());
        assert!(signals.strong_cipher.contains(&"/v 5"));
        assert!(signals.protection_markers().contains(&"/length 256"));
    }

    #[test]
    fn cipher_hints_without_encryption_are_ignored() {
        let signals = scan_str("<< /Length 128 >> stream", "x.pdf");
        assert!(!signals.has_encryption());
        assert_eq!(signals.medium_cipher, vec!["/length 128"]);
        assert!(signals.protection_markers().is_empty());
    }

    #[test]
    fn keywords_are_grouped_by_language() {
        let signals = scan_str("(Se certifica que) Tj (Certificado) Tj", "x.pdf");
        let spanish = &signals.keywords[0];
        assert_eq!(spanish.0, Language::Spanish);
        assert!(spanish.1.contains(&"certificado"));
        assert!(spanish.1.contains(&"se certifica que"));
        // "certificado" is Portuguese vocabulary too.
        assert!(signals.keywords[2].1.contains(&"certificado"));
    }

    #[test]
    fn filename_hints_are_case_insensitive() {
        let signals = scan_str("", "Diploma_Curso_2024.PDF");
        let hints: Vec<&str> = signals.filename_hints.iter().map(|(p, _)| *p).collect();
        assert_eq!(hints, vec!["diploma", "curso"]);
    }

    #[test]
    fn compressed_streams_are_flagged() {
        let signals = scan_str("<< /Filter /FlateDecode /Length 900 >>", "x.pdf");
        assert!(signals.compressed_streams);
        assert_eq!(signals.keyword_hits(), 0);
    }
}
