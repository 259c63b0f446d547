// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password prompt on the controlling terminal.

use std::io::{self, BufRead, Write};

use salvor_core::PasswordDecision;
use salvor_render::PasswordPrompt;
use tracing::warn;

/// Reads the answer from stdin. An empty line skips the file, a lone `-`
/// rasterizes without a password.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn request_password(&self, file_name: &str, attempt: u32) -> PasswordDecision {
        let mut stderr = io::stderr().lock();
        let retry = if attempt > 1 { " (that password was rejected)" } else { "" };
        // The prompt is best effort; a closed stderr should not stop the answer being read.
        let _ = write!(
            stderr,
            "{file_name} is password protected{retry}.\n\
             Password (empty to skip, '-' to recover without it): "
        );
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => decide(&line),
            Err(err) => {
                warn!(error = %err, "could not read password, skipping file");
                PasswordDecision::Skip
            }
        }
    }
}

fn decide(line: &str) -> PasswordDecision {
    match line.trim_end_matches(['\r', '\n']) {
        "" => PasswordDecision::Skip,
        "-" => PasswordDecision::RasterizeWithout,
        password => PasswordDecision::Supply(password.to_owned()),
    }
}
