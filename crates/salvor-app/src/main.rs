// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Salvor — protected PDF detection and recovery
//
// Entry point. Initialises logging, loads the pipeline configuration, binds a
// page renderer and dispatches the subcommand.

mod cli;
mod prompt;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use salvor_core::error::{Result, SalvorError};
use salvor_core::human_errors::{batch_summary, format_file_size, humanize_error};
use salvor_core::{AnalysisRecord, PipelineConfig, ProgressEvent};
use salvor_document::{
    CompressionLevel, CompressionMethod, DocumentPipeline, InputFile, Orchestrator,
    ProcessingResult, file_name_of, naming, parse_page_ranges,
};
use tracing::{debug, info, warn};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = %err, "command failed");
            let human = humanize_error(&err);
            if let SalvorError::Skipped { file_name, .. } = &err {
                eprint!("{file_name}: ");
            }
            eprintln!("{}\n{}", human.message, human.suggestion);
            if let SalvorError::BatchFailed { skipped } = &err {
                eprintln!("{}", batch_summary(0, 0, skipped));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let backend = salvor_render::default_backend();
    info!(backend = backend.backend_name(), "Salvor starting");
    let orchestrator = Orchestrator::new(DocumentPipeline::new(
        config,
        backend,
        cli.on_password.prompt(),
    ));

    match cli.command {
        Commands::Analyze { files } => analyze(&orchestrator, &files).await,
        Commands::Merge {
            files,
            output,
            report,
        } => merge(&orchestrator, &files, output, report).await,
        Commands::Split {
            file,
            pages,
            output,
        } => split(&orchestrator, &file, &pages, output).await,
        Commands::Reorder {
            file,
            order,
            output,
        } => reorder(&orchestrator, &file, &order, output).await,
        Commands::Compress {
            file,
            level,
            output,
        } => compress(&orchestrator, &file, level, output).await,
    }
}

// -- Commands --

#[derive(Serialize)]
#[serde(untagged)]
enum AnalyzeEntry {
    Analyzed {
        #[serde(flatten)]
        record: AnalysisRecord,
        recommendation: salvor_core::ProcessingRecommendation,
        low_confidence: bool,
    },
    Unreadable {
        file_name: String,
        error: String,
    },
}

async fn analyze(orchestrator: &Orchestrator, files: &[PathBuf]) -> Result<()> {
    let entries = analyze_entries(orchestrator, files).await;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// One entry per path, in order. Files that cannot be read get an error
/// entry rather than ending the run.
async fn analyze_entries(orchestrator: &Orchestrator, files: &[PathBuf]) -> Vec<AnalyzeEntry> {
    let pipeline = orchestrator.pipeline();
    let threshold = pipeline.config().confidence_threshold;
    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let entry = match InputFile::from_path(path).await {
            Ok(input) => {
                let record = pipeline.analyze(&input);
                AnalyzeEntry::Analyzed {
                    recommendation: record.processing_recommendation(),
                    low_confidence: record.is_low_confidence(threshold),
                    record,
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "file could not be read");
                AnalyzeEntry::Unreadable {
                    file_name: file_name_of(path),
                    error: err.to_string(),
                }
            }
        };
        entries.push(entry);
    }
    entries
}

async fn merge(
    orchestrator: &Orchestrator,
    files: &[PathBuf],
    output: Option<PathBuf>,
    print_report: bool,
) -> Result<()> {
    let output = match (output, files.first()) {
        (Some(output), _) => output,
        (None, Some(first)) => {
            let names: Vec<String> = files.iter().map(|path| file_name_of(path)).collect();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            beside(first, naming::merged_name(&names))
        }
        (None, None) => PathBuf::from(naming::merged_name(&[])),
    };

    let merged = orchestrator.merge_paths(files, &log_progress).await?;
    tokio::fs::write(&output, &merged.bytes).await?;

    let report = &merged.report;
    println!(
        "{}",
        batch_summary(report.included.len(), report.partial_copies.len(), &report.skipped)
    );
    if report.certificate_count > 0 || report.protected_count > 0 {
        println!(
            "{} certificate(s), {} protected file(s) recovered by rendering where needed.",
            report.certificate_count, report.protected_count
        );
    }
    for (first, second) in &report.duplicates {
        println!("Note: {second} has the same content as {first}.");
    }
    println!("Wrote {} page(s) to {}", report.total_pages, output.display());
    if print_report {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

async fn split(
    orchestrator: &Orchestrator,
    file: &Path,
    pages: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let selection: BTreeSet<u32> = parse_page_ranges(pages)?.into_iter().collect();
    let result = process_one(orchestrator, file).await?;
    let split = orchestrator.split(&result, &selection).await?;

    let output = output.unwrap_or_else(|| beside(file, naming::split_name(&result.file_name, pages)));
    tokio::fs::write(&output, &split.bytes).await?;
    if !split.ignored_pages.is_empty() {
        println!(
            "Ignored page(s) {:?}: the document has {} page(s).",
            split.ignored_pages,
            result.page_count()
        );
    }
    if !split.substituted_pages.is_empty() {
        println!(
            "Page(s) {:?} could not be copied and were replaced by placeholders.",
            split.substituted_pages
        );
    }
    println!("Wrote {} page(s) to {}", split.pages.len(), output.display());
    Ok(())
}

async fn reorder(
    orchestrator: &Orchestrator,
    file: &Path,
    order: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let order = parse_page_ranges(order)?;
    let result = process_one(orchestrator, file).await?;
    let bytes = orchestrator.reorder(&result, &order).await?;

    let output = output.unwrap_or_else(|| beside(file, naming::reordered_name(&result.file_name)));
    tokio::fs::write(&output, &bytes).await?;
    println!("Wrote {} page(s) to {}", order.len(), output.display());
    Ok(())
}

async fn compress(
    orchestrator: &Orchestrator,
    file: &Path,
    level: CompressionLevel,
    output: Option<PathBuf>,
) -> Result<()> {
    let result = process_one(orchestrator, file).await?;
    let compressed = orchestrator.compress(&result, level, &log_progress).await?;

    let output = output.unwrap_or_else(|| {
        beside(file, naming::compressed_name(&result.file_name, level.as_str()))
    });
    tokio::fs::write(&output, &compressed.bytes).await?;

    if compressed.method == CompressionMethod::Resaved {
        println!("Pages could not be rendered; the file was only cleaned up and re-saved.");
    }
    if !compressed.error_pages.is_empty() {
        println!(
            "Page(s) {:?} could not be rendered and were replaced by placeholders.",
            compressed.error_pages
        );
    }
    if compressed.compressed_size() < compressed.original_size {
        println!(
            "Original: {}, compressed: {}, saved {:.1}% ({level} compression).",
            format_file_size(compressed.original_size),
            format_file_size(compressed.compressed_size()),
            compressed.saved_percent()
        );
    } else {
        println!(
            "Size: {}. The file was already well optimised.",
            format_file_size(compressed.compressed_size())
        );
    }
    println!("Wrote {}", output.display());
    Ok(())
}

// -- Helpers --

/// Run a single file through the pipeline.
async fn process_one(orchestrator: &Orchestrator, path: &Path) -> Result<ProcessingResult> {
    let input = InputFile::from_path(path).await?;
    let result = orchestrator.pipeline().process(&input, &log_progress).await?;
    if result.is_converted() {
        println!(
            "{} was recovered by {} ({} of {} page(s) rendered).",
            result.file_name, result.method, result.tally.successful_pages, result.tally.page_count
        );
    }
    Ok(result)
}

fn log_progress(event: &ProgressEvent) {
    debug!(stage = ?event.stage, fraction = event.fraction, "{}", event.message);
}

fn beside(input: &Path, name: String) -> PathBuf {
    input.with_file_name(name)
}
