// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// The user never sees a raw internal error string. Every error and every skip
// reason is mapped to plain English with a suggestion of what to do next.

use crate::error::SalvorError;
use crate::types::{SkipReason, SkippedFile};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something went wrong internally but was worked around.
    Transient,
    /// User must do something (supply a password, pick another file).
    ActionRequired,
    /// Cannot be fixed by retrying.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying again could help.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `SalvorError` into a `HumanError`.
pub fn humanize_error(err: &SalvorError) -> HumanError {
    match err {
        // -- Document errors --
        SalvorError::UnsupportedDocument(_) => HumanError {
            message: "This file isn't a PDF.".into(),
            suggestion: "Only PDF files can be merged, split or reordered. Save the file as a PDF first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SalvorError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer first to check it works.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SalvorError::Encrypted(_) | SalvorError::PasswordRequired => HumanError {
            message: "This PDF is protected.".into(),
            suggestion: "If you know the password, enter it when asked. Otherwise the pages will be recovered as images where possible.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        SalvorError::InvalidPages(detail) => HumanError {
            message: "Some of those page numbers don't exist.".into(),
            suggestion: format!("Check the page numbers and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SalvorError::FileTooLarge { limit_bytes, .. } => HumanError {
            message: "This file is too large.".into(),
            suggestion: format!(
                "Files up to {} can be processed. Try splitting the file first.",
                format_file_size(*limit_bytes)
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        SalvorError::ImageError(_) => HumanError {
            message: "A page image couldn't be processed.".into(),
            suggestion: "The page was replaced by a placeholder. Try again, or open the original file to check that page.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Rendering --
        SalvorError::Render(_)
        | SalvorError::RenderTimeout { .. }
        | SalvorError::RenderCancelled => HumanError {
            message: "A page couldn't be recovered.".into(),
            suggestion: "A placeholder page was inserted so the page count stays the same.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SalvorError::RendererUnavailable(_) => HumanError {
            message: "Protected pages can't be recovered on this system.".into(),
            suggestion: "Install the PDF rendering library, or process unprotected files only.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Batch outcomes --
        SalvorError::Skipped { reason, .. } => humanize_skip(reason),

        SalvorError::BatchFailed { skipped } => HumanError {
            message: "None of the files could be processed.".into(),
            suggestion: format!(
                "{} file(s) were skipped. Check the skip list for the reason behind each one.",
                skipped.len()
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Configuration / persistence --
        SalvorError::Config(detail) => HumanError {
            message: "The settings file has a problem.".into(),
            suggestion: format!("Fix the setting or remove the file to use defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SalvorError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Salvor doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        SalvorError::Serialization(_) | SalvorError::TaskFailed(_) => HumanError {
            message: "Salvor had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

/// Plain-English explanation of why a file was left out of a batch.
pub fn humanize_skip(reason: &SkipReason) -> HumanError {
    match reason {
        SkipReason::UserDeclinedPassword => HumanError {
            message: "Skipped because no password was given.".into(),
            suggestion: "Add the file again and enter its password to include it.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },
        SkipReason::PasswordAttemptsExhausted => HumanError {
            message: "Skipped after too many wrong passwords.".into(),
            suggestion: "Check the password with whoever sent you the file.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },
        SkipReason::NotAPdf => HumanError {
            message: "Skipped because it isn't a PDF.".into(),
            suggestion: "Save the file as a PDF first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        SkipReason::TooLarge { limit_bytes, .. } => HumanError {
            message: "Skipped because it is too large.".into(),
            suggestion: format!("Files up to {} can be processed.", format_file_size(*limit_bytes)),
            retriable: false,
            severity: Severity::Permanent,
        },
        SkipReason::Unreadable(_) => HumanError {
            message: "Skipped because it couldn't be read.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Multi-line outcome of a batch: what went in, what was patched up and
/// what was left out, each skip with its explanation.
pub fn batch_summary(included: usize, partial: usize, skipped: &[SkippedFile]) -> String {
    let mut out = format!("Combined {included} file(s).");
    if partial > 0 {
        out.push_str(&format!(
            " {partial} of them had pages that could not be copied and were replaced by placeholders."
        ));
    }
    if !skipped.is_empty() {
        out.push_str(&format!("\nLeft out {} file(s):", skipped.len()));
        for file in skipped {
            let human = humanize_skip(&file.reason);
            out.push_str(&format!(
                "\n  - {}: {} {}",
                file.file_name, human.message, human.suggestion
            ));
        }
    }
    out
}

/// Format a byte count for display (`"1.5 MB"`).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declined_password_is_action_required() {
        let human = humanize_skip(&SkipReason::UserDeclinedPassword);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.retriable);
    }

    #[test]
    fn skipped_error_delegates_to_skip_reason() {
        let err = SalvorError::skipped("x.docx", SkipReason::NotAPdf);
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.message.contains("isn't a PDF"));
    }

    #[test]
    fn render_failures_are_transient() {
        let human = humanize_error(&SalvorError::RenderTimeout {
            page: 1,
            budget_ms: 30_000,
        });
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn internal_detail_does_not_leak_into_message() {
        let human = humanize_error(&SalvorError::PdfError("xref offset 0x1f invalid".into()));
        assert!(!human.message.contains("xref"));
        assert!(!human.suggestion.contains("xref"));
    }

    #[test]
    fn batch_summary_lists_each_skip() {
        let skipped = [
            SkippedFile::new("locked.pdf", SkipReason::UserDeclinedPassword),
            SkippedFile::new("notes.txt", SkipReason::NotAPdf),
        ];
        let summary = batch_summary(2, 1, &skipped);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Combined 2 file(s). 1 of them"));
        assert!(lines[2].contains("locked.pdf: Skipped because no password was given."));
        assert!(lines[3].contains("notes.txt"));
    }

    #[test]
    fn clean_batch_is_one_line() {
        assert_eq!(batch_summary(3, 0, &[]), "Combined 3 file(s).");
    }

    #[test]
    fn file_sizes_use_binary_units() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(100 * 1024 * 1024), "100 MB");
    }
}
