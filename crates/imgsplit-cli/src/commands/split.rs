use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};
use imgsplit_core::codecs;
use imgsplit_core::{
    load_config, run_batch, BatchOptions, BatchSummary, FileStatus, OutputWriter, PathResolver,
};

use crate::args::SplitArgs;

/// Resolve inputs, split every image and optionally write a JSON report.
///
/// Errors returned here are fatal for the whole run. Problems with single
/// files are recorded in the summary instead.
pub fn cmd_split(
    args: &SplitArgs,
    config_dir: Option<&Path>,
    cancel: &AtomicBool,
) -> Result<BatchSummary> {
    let run_start = Instant::now();

    let handle = load_config(config_dir);
    for warning in &handle.warnings {
        log::warn!("{}", warning);
    }
    match &handle.source {
        Some(source) => log::debug!("Using config from {}", source.display()),
        None => log::debug!("Using built-in config defaults"),
    }

    let mut config = handle.config;
    if let Some(plan) = args.grid {
        config.grid = plan;
    }
    if let Some(format) = &args.format {
        config.output_format = format.clone();
    }
    if let Some(recursive) = args.recursive_override() {
        config.recursive = recursive;
    }

    codecs::validate_output_format(&config.output_format)?;
    for ext in codecs::undecodable_extensions(&config.allowed_extensions) {
        log::warn!("No decoder for allowed extension '{}'; such files will fail", ext);
    }

    let resolution = PathResolver::new(&config)
        .resolve(&args.inputs, args.output.as_deref())
        .context("Could not resolve inputs")?;

    let options = BatchOptions {
        plan: config.grid,
        threads: args.threads,
    };
    let writer = OutputWriter::new(config.output_format.clone());
    let summary = run_batch(&resolution, &options, &writer, cancel)
        .context("Failed to start worker threads")?;

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize run report")?;
        fs::write(report_path, json)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        log::debug!("Report saved to {}", report_path.display());
    }

    log::debug!("Run finished in {:.2}s", run_start.elapsed().as_secs_f64());
    Ok(summary)
}

/// Print the end-of-run counts; reasons are listed only when `verbose`.
pub fn print_summary(summary: &BatchSummary, verbose: bool) {
    println!(
        "Split {} file(s) into {} tile(s) in {}",
        summary.succeeded,
        summary.tiles_written(),
        summary.output_dir.display()
    );
    if summary.skipped > 0 || summary.failed > 0 {
        println!("  Skipped: {}", summary.skipped);
        println!("  Failed:  {}", summary.failed);
    }

    if verbose {
        for file in &summary.files {
            match &file.status {
                FileStatus::Success { .. } => {}
                FileStatus::Skipped { reason } => println!("  skipped {}: {}", file.source, reason),
                FileStatus::Failed { reason } => println!("  failed  {}: {}", file.source, reason),
            }
        }
    }
}

/// 0 for a clean run, 1 if any file was skipped or failed.
pub fn exit_status(summary: &BatchSummary) -> u8 {
    u8::from(summary.has_problems())
}
