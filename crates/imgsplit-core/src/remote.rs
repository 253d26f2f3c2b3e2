//! Remote inputs given as http(s) URLs.
//!
//! Downloading needs the `net` feature. Without it remote tokens are still
//! recognised, and reported as unresolved instead of being treated as paths.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Upper bound on `_N` disambiguators tried for one download.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote inputs need imgsplit built with the `net` feature: {0}")]
    Disabled(String),

    #[error("cannot derive a file name from {0}")]
    NoFileName(String),

    #[cfg(feature = "net")]
    #[error("failed to download {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to save download to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no free file name left for {}", .0.display())]
    NoFreeName(PathBuf),
}

/// Whether a command-line token is an http(s) URL.
pub fn is_remote(token: &str) -> bool {
    let lowered = token.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// Last path segment of a URL with query and fragment removed.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let (_, path) = without_scheme.split_once('/')?;
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Download `url` into `dir`. See [`save_download`] for naming.
#[cfg(feature = "net")]
pub fn download(url: &str, dir: &Path) -> Result<PathBuf, RemoteError> {
    let name = file_name_from_url(url).ok_or_else(|| RemoteError::NoFileName(url.to_string()))?;
    let http_err = |source| RemoteError::Http {
        url: url.to_string(),
        source,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .map_err(http_err)?;
    let bytes = response.bytes().map_err(http_err)?;

    let path = save_download(dir, &name, &bytes)?;
    log::debug!("Downloaded {} ({} bytes) to {}", url, bytes.len(), path.display());
    Ok(path)
}

/// Store downloaded bytes as `name` inside `dir`, creating `dir` if needed.
///
/// Nothing already in `dir` is replaced: a taken name gets `_1`, `_2`, ...
/// before its extension. The bytes only appear under their final name once
/// fully written.
pub fn save_download(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, RemoteError> {
    let io_err = |source| RemoteError::Io {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let mut temp = tempfile::Builder::new()
        .prefix(".imgsplit-download-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(io_err)?;
    temp.write_all(bytes).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = dir.join(numbered_name(name, attempt));
        if candidate.exists() {
            continue;
        }
        match temp.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => temp = err.file,
            Err(err) => {
                return Err(RemoteError::Io {
                    path: candidate,
                    source: err.error,
                })
            }
        }
    }

    Err(RemoteError::NoFreeName(dir.join(name)))
}

/// `photo.png` -> `photo_<attempt>.png`; unchanged for attempt 0.
fn numbered_name(name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, attempt, ext),
        _ => format!("{}_{}", name, attempt),
    }
}

#[cfg(not(feature = "net"))]
pub fn download(url: &str, _dir: &Path) -> Result<PathBuf, RemoteError> {
    Err(RemoteError::Disabled(url.to_string()))
}
