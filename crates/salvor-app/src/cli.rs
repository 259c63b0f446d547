// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use salvor_core::PasswordDecision;
use salvor_document::CompressionLevel;
use salvor_render::{FixedPrompt, PasswordPrompt};

use crate::prompt::TerminalPrompt;

#[derive(Parser, Debug)]
#[command(name = "salvor")]
#[command(about = "Detect copy-protected PDFs and recover them by rendering")]
#[command(version)]
pub struct Cli {
    /// Pipeline settings as JSON (missing keys keep their defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// What to do when a file needs a password
    #[arg(long, value_enum, default_value_t = OnPassword::Prompt, global = true)]
    pub on_password: OnPassword,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify files and print their analysis records as JSON
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Combine files into one PDF, recovering protected ones
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output path (default: merged_<first>_and_<n>_more.pdf next to the first input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also print the merge report as JSON
        #[arg(long)]
        report: bool,
    },

    /// Extract pages, e.g. --pages "1-3, 5"
    Split {
        file: PathBuf,
        #[arg(short, long)]
        pages: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a file with its pages in a new order, e.g. --order "3,1,2"
    Reorder {
        file: PathBuf,
        #[arg(long)]
        order: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Shrink a file by re-rendering its pages as JPEG
    Compress {
        file: PathBuf,
        /// low, medium, high or maximum
        #[arg(short, long, default_value_t = CompressionLevel::Medium)]
        level: CompressionLevel,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnPassword {
    /// Ask on the terminal
    Prompt,
    /// Leave the file out
    Skip,
    /// Carry on without one and recover what rendering allows
    Rasterize,
}

impl OnPassword {
    pub fn prompt(self) -> Arc<dyn PasswordPrompt> {
        match self {
            Self::Prompt => Arc::new(TerminalPrompt),
            Self::Skip => Arc::new(FixedPrompt(PasswordDecision::Skip)),
            Self::Rasterize => Arc::new(FixedPrompt(PasswordDecision::RasterizeWithout)),
        }
    }
}
