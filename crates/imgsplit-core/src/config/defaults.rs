//! Built-in setting values and the default config files written by `init`.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions accepted when `extensions.txt` is absent or unusable.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub(crate) fn default_extensions() -> BTreeSet<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

pub(crate) fn default_download_location() -> PathBuf {
    std::env::temp_dir()
}

pub(crate) fn default_output_location() -> PathBuf {
    PathBuf::from(".")
}

/// File name and initial contents of every setting file.
pub const DEFAULT_FILES: &[(&str, &str)] = &[
    (super::EXTENSIONS_FILE, "png\njpg\njpeg\n"),
    (super::OUTPUT_FORMAT_FILE, "default\n"),
    (super::RECURSIVE_FILE, "false\n"),
    (super::OUTPUT_LOCATION_FILE, "default\n"),
    (super::DOWNLOAD_LOCATION_FILE, "default\n"),
    (super::GRID_FILE, "2x2\n"),
];

/// Outcome for one file written by [`write_default_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitAction {
    Created(PathBuf),
    Overwritten(PathBuf),
    Kept(PathBuf),
}

/// Write the default setting files into `dir`, creating it if needed.
///
/// Existing files are left alone unless `force` is set.
pub fn write_default_config(dir: &Path, force: bool) -> io::Result<Vec<InitAction>> {
    fs::create_dir_all(dir)?;

    let mut actions = Vec::with_capacity(DEFAULT_FILES.len());
    for (name, contents) in DEFAULT_FILES {
        let path = dir.join(name);
        let existed = path.exists();
        if existed && !force {
            actions.push(InitAction::Kept(path));
            continue;
        }
        fs::write(&path, contents)?;
        actions.push(if existed {
            InitAction::Overwritten(path)
        } else {
            InitAction::Created(path)
        });
    }
    Ok(actions)
}
