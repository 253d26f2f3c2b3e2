//! Data model shared by the resolver, split engine, writer and pipeline.

use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::Serialize;

/// What a command-line input token turned out to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Directory,
}

/// A classified input token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub kind: InputKind,
}

impl InputSpec {
    /// Classify an existing path. Returns `None` for paths that do not exist
    /// or are neither a regular file nor a directory.
    pub fn classify(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        let kind = if metadata.is_dir() {
            InputKind::Directory
        } else if metadata.is_file() {
            InputKind::File
        } else {
            return None;
        };
        Some(Self {
            path: path.to_path_buf(),
            kind,
        })
    }
}

/// One discovered image queued for splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source_file: PathBuf,
    pub output_dir: PathBuf,
}

/// Grid geometry applied to every image of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    pub rows: NonZeroU32,
    pub cols: NonZeroU32,
}

impl SplitPlan {
    /// Two rows by two columns.
    pub const QUADRANTS: SplitPlan = SplitPlan {
        rows: NonZeroU32::MIN.saturating_add(1),
        cols: NonZeroU32::MIN.saturating_add(1),
    };

    pub fn new(rows: u32, cols: u32) -> Option<Self> {
        Some(Self {
            rows: NonZeroU32::new(rows)?,
            cols: NonZeroU32::new(cols)?,
        })
    }

    /// Parse `RxC`, `R,C` or `R C` (case-insensitive `x`).
    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_ascii_lowercase();
        let mut parts = lowered
            .split(|c: char| c == 'x' || c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty());
        let rows = parts.next()?.parse().ok()?;
        let cols = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Self::new(rows, cols)
    }

    pub fn is_single(&self) -> bool {
        self.rows.get() == 1 && self.cols.get() == 1
    }

    pub fn cell_count(&self) -> usize {
        self.rows.get() as usize * self.cols.get() as usize
    }
}

impl Default for SplitPlan {
    fn default() -> Self {
        Self::QUADRANTS
    }
}

impl fmt::Display for SplitPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Zero-based grid coordinates of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellIndex {
    pub row: u32,
    pub col: u32,
}

/// One tile cut from a source image. Consumed by the writer and dropped.
#[derive(Debug)]
pub struct SubImage<'a> {
    pub pixels: DynamicImage,
    pub origin: CellIndex,
    pub source_file: &'a Path,
}

/// Output extension policy for a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Reuse each source file's own extension
    #[default]
    Preserve,
    /// Force every tile to this extension (lowercase, no dot)
    Override(String),
}

impl OutputFormat {
    /// Sentinel spelling that selects [`OutputFormat::Preserve`].
    pub const DEFAULT_SENTINEL: &'static str = "default";

    /// Parse a single token. Returns `None` for an empty token.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().trim_start_matches('.').to_ascii_lowercase();
        if token.is_empty() {
            None
        } else if token == Self::DEFAULT_SENTINEL {
            Some(Self::Preserve)
        } else {
            Some(Self::Override(token))
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Preserve => f.write_str(Self::DEFAULT_SENTINEL),
            OutputFormat::Override(ext) => f.write_str(ext),
        }
    }
}

/// Final state of one input after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    Success { outputs: Vec<PathBuf> },
    Skipped { reason: String },
    Failed { reason: String },
}

impl FileStatus {
    pub fn skipped(reason: impl Into<String>) -> Self {
        FileStatus::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        FileStatus::Failed {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            FileStatus::Success { .. } => None,
            FileStatus::Skipped { reason } | FileStatus::Failed { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub source: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Per-file results of a run, in work-list order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub output_dir: PathBuf,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

impl BatchSummary {
    pub fn new(output_dir: PathBuf, files: Vec<FileReport>) -> Self {
        let mut summary = Self {
            output_dir,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            files,
        };
        for report in &summary.files {
            match report.status {
                FileStatus::Success { .. } => summary.succeeded += 1,
                FileStatus::Skipped { .. } => summary.skipped += 1,
                FileStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// Whether any input was skipped or failed.
    pub fn has_problems(&self) -> bool {
        self.skipped > 0 || self.failed > 0
    }

    pub fn tiles_written(&self) -> usize {
        self.files
            .iter()
            .map(|report| match &report.status {
                FileStatus::Success { outputs } => outputs.len(),
                _ => 0,
            })
            .sum()
    }
}
