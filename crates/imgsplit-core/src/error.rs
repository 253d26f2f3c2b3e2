//! Error taxonomy for configuration, resolution, splitting and writing.
//!
//! Only [`ResolutionError`] is fatal for a run. Configuration errors are
//! recovered with defaults, split and write errors are recorded per file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A malformed configuration value. Always recovered by falling back to the
/// setting's default; surfaced as a warning.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{setting}: file is empty")]
    Empty { setting: &'static str },

    #[error("{setting}: invalid recursion policy {value:?} (expected true, false, yes or no)")]
    InvalidBool { setting: &'static str, value: String },

    #[error("{setting}: invalid grid {value:?} (expected ROWSxCOLS with both at least 1)")]
    InvalidGrid { setting: &'static str, value: String },

    #[error("{setting}: invalid extension {value:?}")]
    InvalidExtension { setting: &'static str, value: String },

    #[error("no configuration directory found; using built-in defaults")]
    NoConfigDir,
}

/// The output directory could not be established. Aborts the run.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no input paths given")]
    NoInputs,

    #[error("output path {} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("output directory {} is not writable: {source}", .path.display())]
    ReadOnly {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A source image could not be split. Recorded against that file only.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported image format {0:?}")]
    UnsupportedFormat(String),

    #[error("image is {width}x{height} but the grid is {rows}x{cols}")]
    GridTooLarge {
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
    },
}

/// A tile could not be written. Recorded against its source file.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("unsupported output format {0:?}")]
    UnsupportedFormat(String),

    #[error("source {} has no extension to reuse", .0.display())]
    MissingExtension(PathBuf),

    #[error("failed to encode tile as {format}: {source}")]
    Encode {
        format: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no free file name left for {}", .0.display())]
    NoFreeName(PathBuf),
}

impl SplitError {
    /// Whether the file should be reported as skipped rather than failed.
    pub fn is_skip(&self) -> bool {
        matches!(self, SplitError::GridTooLarge { .. })
    }
}
