// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output file names per operation.

/// Longest stem kept from a source file name.
const MAX_STEM: usize = 60;

/// `merged_<first>_and_<n>_more.pdf`, or `merged_<first>.pdf` for one input.
pub fn merged_name(sources: &[&str]) -> String {
    match sources {
        [] => "merged.pdf".into(),
        [only] => format!("merged_{}.pdf", stem(only)),
        [first, rest @ ..] => format!("merged_{}_and_{}_more.pdf", stem(first), rest.len()),
    }
}

/// `<name>_pages_<selection>.pdf`.
pub fn split_name(source: &str, selection: &str) -> String {
    format!("{}_pages_{}.pdf", stem(source), sanitize(selection))
}

/// `<name>_reordered.pdf`.
pub fn reordered_name(source: &str) -> String {
    format!("{}_reordered.pdf", stem(source))
}

/// `<name>_compressed_<level>.pdf`.
pub fn compressed_name(source: &str, level: &str) -> String {
    format!("{}_compressed_{}.pdf", stem(source), sanitize(level))
}

/// File name without a trailing `.pdf`, sanitised and shortened.
fn stem(name: &str) -> String {
    let trimmed = name
        .len()
        .checked_sub(4)
        .filter(|&cut| name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf"))
        .map_or(name, |cut| &name[..cut]);
    let clean = sanitize(trimmed);
    let short: String = clean.chars().take(MAX_STEM).collect();
    if short.is_empty() { "document".into() } else { short }
}

/// Keep `[A-Za-z0-9._-]`, turn everything else into `_`, collapse runs of
/// `_` and trim them from both ends.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_owned()
}
