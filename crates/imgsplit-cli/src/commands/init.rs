use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use imgsplit_core::config::{default_config_dir, write_default_config, InitAction};

/// Write the default setting files.
///
/// Uses `config_dir` when given, otherwise the per-user config directory.
/// Safe to run multiple times - existing files are kept unless `force` is true.
pub fn cmd_init(config_dir: Option<&Path>, force: bool) -> Result<Vec<InitAction>> {
    let dir: PathBuf = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_config_dir().context("Could not determine the user config directory")?,
    };

    println!("Initializing imgsplit configuration in: {}", dir.display());

    let actions = write_default_config(&dir, force)
        .with_context(|| format!("Failed to write default config into {}", dir.display()))?;

    for action in &actions {
        match action {
            InitAction::Created(path) => println!("  Created: {}", file_label(path)),
            InitAction::Overwritten(path) => println!("  Overwrote: {}", file_label(path)),
            InitAction::Kept(path) => println!(
                "  Skipped: {} (already exists, use --force to overwrite)",
                file_label(path)
            ),
        }
    }

    Ok(actions)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
