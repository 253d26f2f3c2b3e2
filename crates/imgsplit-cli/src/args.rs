//! Command line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use imgsplit_core::{OutputFormat, SplitPlan};

use crate::parsers::{parse_format, parse_grid, parse_threads};

#[derive(Parser, Debug)]
#[command(name = "imgsplit")]
#[command(version, about = "Split images into a grid of tiles", long_about = None)]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub split: SplitArgs,

    /// Show debug logging and the reason for every skipped or failed file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the setting files
    #[arg(short = 'c', long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the default setting files into the config directory
    Init {
        /// Overwrite setting files that already exist
        #[arg(long)]
        force: bool,
    },
}

/// Arguments of the default split run.
#[derive(Args, Debug, Clone, Default)]
pub struct SplitArgs {
    /// Input files or directories (or URLs with the `net` feature).
    /// Without -o, a leading existing directory is used as the output directory
    #[arg(value_name = "PATH", required = true)]
    pub inputs: Vec<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Grid to split each image into, overriding grid.txt
    #[arg(short, long, value_name = "RxC", value_parser = parse_grid)]
    pub grid: Option<SplitPlan>,

    /// Output format extension, or "default" to keep the source format
    #[arg(short, long, value_name = "EXT", value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Descend into subdirectories of input directories
    #[arg(long, overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Only read the top level of input directories
    #[arg(long, overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Number of parallel threads
    #[arg(short = 'j', long, value_name = "N", value_parser = parse_threads)]
    pub threads: Option<usize>,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl SplitArgs {
    /// Recursion override from the command line, if any.
    pub fn recursive_override(&self) -> Option<bool> {
        if self.recursive {
            Some(true)
        } else if self.no_recursive {
            Some(false)
        } else {
            None
        }
    }
}
