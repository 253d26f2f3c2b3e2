//! Lazy directory expansion.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;

/// Image files below a directory that match the configured extensions.
///
/// Iterating twice walks the directory twice. Entries within each directory
/// are visited by file name, so the sequence is ordered lexicographically by
/// path component (as `Path`'s `Ord` does), not by the raw path string: with
/// recursion on, `b/x.png` comes before `b.png`. Symlinks are followed;
/// cycles are reported and skipped.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    root: PathBuf,
    recursive: bool,
    config: &'a Config,
}

impl<'a> Candidates<'a> {
    pub fn new(root: &Path, config: &'a Config) -> Self {
        Self {
            root: root.to_path_buf(),
            recursive: config.recursive,
            config,
        }
    }

    /// Override the recursion policy for this walk.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn iter(&self) -> CandidateIter<'_> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        CandidateIter {
            walker,
            root: &self.root,
            config: self.config,
        }
    }
}

impl<'c> IntoIterator for &'c Candidates<'_> {
    type Item = PathBuf;
    type IntoIter = CandidateIter<'c>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`Candidates::iter`].
pub struct CandidateIter<'c> {
    walker: walkdir::IntoIter,
    root: &'c Path,
    config: &'c Config,
}

impl Iterator for CandidateIter<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    // Filter on the entry before allocating its path
                    if entry.file_type().is_file() && self.config.allows(entry.path()) {
                        return Some(entry.into_path());
                    }
                }
                Err(err) => {
                    log::warn!("Skipping unreadable entry under {}: {}", self.root.display(), err);
                }
            }
        }
    }
}
