//! Tile naming and collision-safe persistence.
//!
//! Tiles are named `<stem>_<row>_<col>.<ext>`. An existing file is never
//! replaced: the writer appends `_1`, `_2`, ... before the extension until a
//! free name is found. Bytes are written to a temporary file inside the
//! destination directory first and only linked into place once complete.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::{Builder, NamedTempFile};

use crate::codecs;
use crate::error::WriteError;
use crate::models::{CellIndex, OutputFormat, SubImage, WorkItem};

/// Upper bound on `_N` disambiguators tried for one tile.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Writes tiles for a whole run. Shared between workers.
#[derive(Debug)]
pub struct OutputWriter {
    format: OutputFormat,
    // Serialises the pick-a-free-name-then-persist step across workers
    name_lock: Mutex<()>,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            name_lock: Mutex::new(()),
        }
    }

    pub fn format(&self) -> &OutputFormat {
        &self.format
    }

    /// Extension for tiles cut from `source` under this writer's policy.
    pub fn target_extension(&self, source: &Path) -> Result<String, WriteError> {
        match &self.format {
            OutputFormat::Override(ext) => Ok(ext.clone()),
            OutputFormat::Preserve => source
                .extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext| !ext.is_empty())
                .map(str::to_string)
                .ok_or_else(|| WriteError::MissingExtension(source.to_path_buf())),
        }
    }

    /// Encode and persist one tile, returning the path it was written to.
    pub fn write(&self, tile: &SubImage<'_>, item: &WorkItem) -> Result<PathBuf, WriteError> {
        let ext = self.target_extension(tile.source_file)?;
        let bytes = codecs::encode_image(&tile.pixels, &ext)?;

        std::fs::create_dir_all(&item.output_dir).map_err(|source| WriteError::CreateDir {
            path: item.output_dir.clone(),
            source,
        })?;

        let temp = stage_bytes(&item.output_dir, &bytes)?;
        let stem = tile
            .source_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        self.persist_unique(temp, &item.output_dir, &stem, tile.origin, &ext)
    }

    fn persist_unique(
        &self,
        mut temp: NamedTempFile,
        dir: &Path,
        stem: &str,
        index: CellIndex,
        ext: &str,
    ) -> Result<PathBuf, WriteError> {
        let _guard = self.name_lock.lock().unwrap_or_else(PoisonError::into_inner);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = dir.join(tile_file_name(stem, index, ext, attempt));
            if candidate.exists() {
                continue;
            }
            // persist_noclobber also guards against other processes racing us
            match temp.persist_noclobber(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => temp = err.file,
                Err(err) => {
                    return Err(WriteError::Io {
                        path: candidate,
                        source: err.error,
                    })
                }
            }
        }

        Err(WriteError::NoFreeName(
            dir.join(tile_file_name(stem, index, ext, 0)),
        ))
    }
}

/// Write `bytes` to a hidden temporary file in `dir`.
fn stage_bytes(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile, WriteError> {
    let io_err = |source| WriteError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut temp = Builder::new()
        .prefix(".imgsplit-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(io_err)?;
    temp.write_all(bytes).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    Ok(temp)
}

/// `<stem>_<row>_<col>.<ext>`, with `_<attempt>` before the extension when
/// `attempt` is non-zero.
pub fn tile_file_name(stem: &str, index: CellIndex, ext: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}_{}_{}.{}", stem, index.row, index.col, ext)
    } else {
        format!("{}_{}_{}_{}.{}", stem, index.row, index.col, attempt, ext)
    }
}
