//! imgsplit core library
//!
//! Resolves input paths into a work list, splits each image into a grid of
//! tiles and writes the tiles next to each other in an output directory.

pub mod codecs;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod resolver;
pub mod split;
pub mod writer;

// Re-export commonly used types
pub use config::{load_config, Config, ConfigHandle};
pub use error::{ConfigError, ResolutionError, SplitError, WriteError};
pub use models::{
    BatchSummary, CellIndex, FileReport, FileStatus, InputKind, InputSpec, OutputFormat,
    SplitPlan, SubImage, WorkItem,
};
pub use pipeline::{process_item, run_batch, BatchOptions};
pub use resolver::{PathResolver, Resolution, Unresolved};
pub use split::{cell_rects, split_image, CellRect};
pub use writer::OutputWriter;
