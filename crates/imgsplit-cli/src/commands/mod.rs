//! Command implementations for the imgsplit CLI.

mod init;
mod split;

pub use init::cmd_init;
pub use split::{cmd_split, exit_status, print_summary};
