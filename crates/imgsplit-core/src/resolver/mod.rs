//! Turn command-line tokens into an output directory and a work list.
//!
//! Calling conventions:
//! - `-o DIR` names the output directory; every token is an input.
//! - Otherwise, with two or more tokens, an existing directory in first
//!   position is the output directory.
//! - Otherwise the configured output location is used.
//!
//! Missing paths and failed downloads are collected as [`Unresolved`] and do
//! not stop resolution. The only fatal error is an unusable output directory.

mod walk;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::ResolutionError;
use crate::models::{InputKind, InputSpec, WorkItem};
use crate::remote;

pub use walk::{CandidateIter, Candidates};

/// An input token that produced no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub token: String,
    pub reason: String,
}

/// Output of [`PathResolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub output_dir: PathBuf,
    pub work_items: Vec<WorkItem>,
    pub unresolved: Vec<Unresolved>,
}

pub struct PathResolver<'a> {
    config: &'a Config,
}

/// Accumulates work items, dropping files already queued under another name.
struct WorkList<'o> {
    output_dir: &'o Path,
    seen: HashSet<PathBuf>,
    items: Vec<WorkItem>,
}

impl WorkList<'_> {
    fn push(&mut self, source_file: PathBuf) {
        let key = fs::canonicalize(&source_file).unwrap_or_else(|_| source_file.clone());
        if self.seen.insert(key) {
            self.items.push(WorkItem {
                source_file,
                output_dir: self.output_dir.to_path_buf(),
            });
        } else {
            log::debug!("Ignoring duplicate input {}", source_file.display());
        }
    }
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Resolve `tokens` into a work list, creating the output directory.
    pub fn resolve(
        &self,
        tokens: &[String],
        explicit_output: Option<&Path>,
    ) -> Result<Resolution, ResolutionError> {
        if tokens.is_empty() {
            return Err(ResolutionError::NoInputs);
        }

        let (output_dir, inputs) = self.choose_output_dir(tokens, explicit_output);
        ensure_output_dir(&output_dir)?;

        let mut work = WorkList {
            output_dir: &output_dir,
            seen: HashSet::new(),
            items: Vec::new(),
        };
        let mut unresolved = Vec::new();

        for token in inputs {
            if let Err(reason) = self.expand_token(token, &mut work) {
                log::warn!("Skipping {}: {}", token, reason);
                unresolved.push(Unresolved {
                    token: token.clone(),
                    reason,
                });
            }
        }

        log::info!(
            "Resolved {} image(s) from {} input(s) into {}",
            work.items.len(),
            inputs.len(),
            output_dir.display()
        );

        let work_items = work.items;
        Ok(Resolution {
            output_dir,
            work_items,
            unresolved,
        })
    }

    /// Pick the output directory and the slice of tokens that are inputs.
    pub fn choose_output_dir<'t>(
        &self,
        tokens: &'t [String],
        explicit_output: Option<&Path>,
    ) -> (PathBuf, &'t [String]) {
        if let Some(dir) = explicit_output {
            return (dir.to_path_buf(), tokens);
        }

        if let [first, rest @ ..] = tokens {
            let first_path = Path::new(first);
            if !rest.is_empty() && !remote::is_remote(first) && first_path.is_dir() {
                return (first_path.to_path_buf(), rest);
            }
        }

        (self.config.output_location.clone(), tokens)
    }

    fn expand_token(&self, token: &str, work: &mut WorkList<'_>) -> Result<(), String> {
        if remote::is_remote(token) {
            let path = remote::download(token, &self.config.download_location)
                .map_err(|err| err.to_string())?;
            self.push_file(path, work);
            return Ok(());
        }

        let spec = InputSpec::classify(Path::new(token))
            .ok_or_else(|| "no such file or directory".to_string())?;

        match spec.kind {
            InputKind::File => self.push_file(spec.path, work),
            InputKind::Directory => {
                for path in &Candidates::new(&spec.path, self.config) {
                    work.push(path);
                }
            }
        }
        Ok(())
    }

    fn push_file(&self, path: PathBuf, work: &mut WorkList<'_>) {
        if self.config.allows(&path) {
            work.push(path);
        } else {
            log::debug!("Ignoring {}: extension not allowed", path.display());
        }
    }
}

/// Make sure `dir` exists as a writable directory, creating it if needed.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ResolutionError> {
    match fs::metadata(dir) {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(ResolutionError::NotADirectory(dir.to_path_buf()))
        }
        Ok(_) => {}
        Err(_) => {
            fs::create_dir_all(dir).map_err(|source| ResolutionError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            log::debug!("Created output directory {}", dir.display());
        }
    }

    check_writable(dir)
}

/// Permission bits ignore ownership and ACLs, so create (and drop) a real
/// temporary file instead.
fn check_writable(dir: &Path) -> Result<(), ResolutionError> {
    tempfile::tempfile_in(dir)
        .map(drop)
        .map_err(|source| ResolutionError::ReadOnly {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests;
