//! Environment file discovery.
//!
//! Walks from a starting directory toward the filesystem root looking
//! for the conventional environment-definition file. Absence is a
//! normal outcome, never an error.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::ENV_FILENAME;

/// Search the current working directory and its ancestors for `.env`.
///
/// Returns the first match, or `None` when no ancestor holds one (or
/// the working directory itself cannot be resolved).
pub fn find() -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    find_named(&cwd, ENV_FILENAME)
}

/// Search `dir` and its ancestors for `.env`.
pub fn find_from(dir: &Path) -> Option<PathBuf> {
    find_named(dir, ENV_FILENAME)
}

/// Search `dir` and its ancestors for a file with the given name.
///
/// Ancestors are visited nearest first, up to and including the
/// filesystem root. Only a regular file matches; a directory carrying
/// the name is skipped and the walk continues. Discovery reads nothing
/// and mutates nothing.
pub fn find_named(dir: &Path, filename: &str) -> Option<PathBuf> {
    for ancestor in dir.ancestors() {
        let candidate = ancestor.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
