//! Shared pieces of the imgsplit command line
//!
//! Argument definitions, value parsers and the command implementations live
//! here so they can be exercised without spawning the binary.

pub mod args;
pub mod commands;
pub mod parsers;

pub use args::{Cli, Command, SplitArgs};
pub use commands::{cmd_init, cmd_split, exit_status, print_summary};
pub use parsers::{parse_format, parse_grid, parse_threads};
