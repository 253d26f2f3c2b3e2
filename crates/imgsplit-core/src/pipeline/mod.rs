//! Batch driver: decode, split and write every work item.
//!
//! Items are independent, so they run on a bounded rayon pool. The only
//! shared state is the writer's name lock and the cancellation flag, which is
//! checked before each item starts; items already running are allowed to
//! finish.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuildError;

use crate::codecs;
use crate::error::SplitError;
use crate::models::{BatchSummary, FileReport, FileStatus, SplitPlan, WorkItem};
use crate::resolver::Resolution;
use crate::split::split_image;
use crate::writer::OutputWriter;

/// Reason recorded for items never started because of an interrupt.
pub const CANCELLED: &str = "cancelled";

/// Settings shared by every item of a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub plan: SplitPlan,
    /// Worker count; `None` uses one per logical CPU
    pub threads: Option<usize>,
}

/// Decode, split and write a single item.
pub fn process_item(item: &WorkItem, plan: SplitPlan, writer: &OutputWriter) -> FileStatus {
    let image = match codecs::decode_file(&item.source_file) {
        Ok(image) => image,
        Err(err) => return split_failure(err),
    };

    let tiles = match split_image(image, plan, &item.source_file) {
        Ok(tiles) => tiles,
        Err(err) => return split_failure(err),
    };

    let mut outputs = Vec::with_capacity(tiles.len());
    for tile in tiles {
        match writer.write(&tile, item) {
            Ok(path) => outputs.push(path),
            Err(err) => return FileStatus::failed(err.to_string()),
        }
    }
    FileStatus::Success { outputs }
}

fn split_failure(err: SplitError) -> FileStatus {
    if err.is_skip() {
        FileStatus::skipped(err.to_string())
    } else {
        FileStatus::failed(err.to_string())
    }
}

/// Process every resolved item and collect a summary.
///
/// Reports follow work-list order, then one `Skipped` entry per unresolved
/// input token.
pub fn run_batch(
    resolution: &Resolution,
    options: &BatchOptions,
    writer: &OutputWriter,
    cancel: &AtomicBool,
) -> Result<BatchSummary, ThreadPoolBuildError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or(0))
        .thread_name(|index| format!("imgsplit-worker-{}", index))
        .build()?;

    let items = &resolution.work_items;
    let total = items.len();
    let processed = AtomicUsize::new(0);
    let batch_start = Instant::now();

    log::info!(
        "Splitting {} image(s) on a {} grid with {} thread(s)",
        total,
        options.plan,
        pool.current_num_threads()
    );

    let statuses: Vec<FileStatus> = pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                if cancel.load(Ordering::SeqCst) {
                    return FileStatus::skipped(CANCELLED);
                }

                let file_start = Instant::now();
                let status = process_item(item, options.plan, writer);
                let count = processed.fetch_add(1, Ordering::SeqCst) + 1;

                match &status {
                    FileStatus::Success { outputs } => log::info!(
                        "[{}/{}] {} -> {} tile(s) ({:.2}s)",
                        count,
                        total,
                        item.source_file.display(),
                        outputs.len(),
                        file_start.elapsed().as_secs_f64()
                    ),
                    FileStatus::Skipped { reason } => log::warn!(
                        "[{}/{}] skipped {}: {}",
                        count,
                        total,
                        item.source_file.display(),
                        reason
                    ),
                    FileStatus::Failed { reason } => log::error!(
                        "[{}/{}] failed {}: {}",
                        count,
                        total,
                        item.source_file.display(),
                        reason
                    ),
                }
                status
            })
            .collect()
    });

    let mut files: Vec<FileReport> = items
        .iter()
        .zip(statuses)
        .map(|(item, status)| FileReport {
            source: item.source_file.display().to_string(),
            status,
        })
        .collect();

    files.extend(resolution.unresolved.iter().map(|unresolved| FileReport {
        source: unresolved.token.clone(),
        status: FileStatus::skipped(unresolved.reason.clone()),
    }));

    log::debug!(
        "Batch finished in {:.2}s",
        batch_start.elapsed().as_secs_f64()
    );

    Ok(BatchSummary::new(resolution.output_dir.clone(), files))
}

#[cfg(test)]
mod tests;
