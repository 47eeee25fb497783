//! Loading an environment file into an environment table.
//!
//! `Loader` ties discovery, parsing, and injection together. Injection
//! is strictly additive: a variable already present in the target
//! environment is never overwritten, so values injected by the hosting
//! platform always win over the file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::ENV_FILENAME;
use crate::errors::{EnvError, EnvResult};
use crate::finder;
use crate::parser;
use crate::source::{EnvSource, StdEnv};

/// Summary of one load.
///
/// Informational only; the observable effect of a load is the mutation
/// of the target environment itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// The file that was loaded, or `None` when discovery found nothing.
    pub path: Option<PathBuf>,
    /// Variables written to the environment.
    pub applied: usize,
    /// Bindings dropped because the variable was already set.
    pub skipped_existing: usize,
    /// Lines dropped as malformed.
    pub skipped_malformed: usize,
}

/// Builder for one environment-file load.
///
/// The defaults match the convention: a file named `.env`, discovered
/// from the current working directory upward, injected into the real
/// process environment.
pub struct Loader {
    filename: String,
    dir: Option<PathBuf>,
    source: Arc<dyn EnvSource>,
}

impl Loader {
    /// Loader with the conventional defaults.
    pub fn new() -> Self {
        Self {
            filename: ENV_FILENAME.to_string(),
            dir: None,
            source: Arc::new(StdEnv),
        }
    }

    /// Look for a different file name (e.g. `.env.test`).
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Start discovery from an explicit directory instead of the
    /// current working directory.
    pub fn from_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Inject into a different environment table.
    pub fn with_source(mut self, source: Arc<dyn EnvSource>) -> Self {
        self.source = source;
        self
    }

    /// Discover, parse, and inject.
    ///
    /// No file anywhere in the ancestor chain is a successful no-op
    /// with an empty report. A file that exists but cannot be read
    /// surfaces as [`EnvError::Io`].
    pub fn load(&self) -> EnvResult<LoadReport> {
        let Some(path) = self.discover() else {
            tracing::debug!(filename = %self.filename, "No environment file found");
            return Ok(LoadReport::default());
        };
        match self.read(&path) {
            Ok(contents) => Ok(self.inject(&path, &contents)),
            // The file vanished between discovery and read; absent
            // means a clean no-op.
            Err(e) if e.is_not_found() => Ok(LoadReport::default()),
            Err(e) => Err(e),
        }
    }

    /// Load an explicit file, skipping discovery.
    ///
    /// Unlike [`Loader::load`], the caller named this path on purpose,
    /// so a file that is missing or unreadable is an error.
    pub fn load_path(&self, path: impl AsRef<Path>) -> EnvResult<LoadReport> {
        let path = path.as_ref();
        if path.exists() && !path.is_file() {
            return Err(EnvError::invalid_path(path));
        }
        let contents = self.read(path)?;
        Ok(self.inject(path, &contents))
    }

    /// Parse and expand the discovered file without touching the
    /// environment.
    ///
    /// References still resolve against the source environment; only
    /// injection is skipped. No file means an empty map.
    pub fn values(&self) -> EnvResult<HashMap<String, String>> {
        let Some(path) = self.discover() else {
            return Ok(HashMap::new());
        };
        let contents = match self.read(&path) {
            Ok(contents) => contents,
            Err(e) if e.is_not_found() => return Ok(HashMap::new()),
            Err(e) => return Err(e),
        };
        let parsed = parser::parse(&contents);
        let bindings = parser::expand(&parsed.entries, |key| self.source.var(key));
        Ok(bindings.into_iter().collect())
    }

    fn discover(&self) -> Option<PathBuf> {
        match &self.dir {
            Some(dir) => finder::find_named(dir, &self.filename),
            None => {
                let cwd = std::env::current_dir().ok()?;
                finder::find_named(&cwd, &self.filename)
            }
        }
    }

    fn read(&self, path: &Path) -> EnvResult<String> {
        fs::read_to_string(path).map_err(|e| EnvError::io(path, e))
    }

    fn inject(&self, path: &Path, contents: &str) -> LoadReport {
        let parsed = parser::parse(contents);
        let bindings = parser::expand(&parsed.entries, |key| self.source.var(key));

        let mut applied = 0;
        let mut skipped_existing = 0;
        for (key, value) in &bindings {
            // `contains`, not `var`: a variable whose value cannot be
            // decoded is still set and keeps its value.
            if self.source.contains(key) {
                skipped_existing += 1;
            } else {
                self.source.set_var(key, value);
                applied += 1;
            }
        }

        tracing::debug!(
            path = %path.display(),
            applied,
            skipped_existing,
            skipped_malformed = parsed.malformed,
            "Environment file loaded"
        );

        LoadReport {
            path: Some(path.to_path_buf()),
            applied,
            skipped_existing,
            skipped_malformed: parsed.malformed,
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemoryEnv, MockEnvSource};
    use std::fs;
    use tempfile::TempDir;

    fn write_env(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    fn loader(dir: &TempDir, name: &str, env: Arc<MemoryEnv>) -> Loader {
        Loader::new()
            .with_filename(name)
            .from_dir(dir.path())
            .with_source(env)
    }

    #[test]
    fn test_load_applies_fresh_bindings() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "A=1\nB=2\n");
        let env = Arc::new(MemoryEnv::new());

        let report = loader(&dir, ".env.test", env.clone()).load().unwrap();

        assert_eq!(env.var("A"), Some("1".to_string()));
        assert_eq!(env.var("B"), Some("2".to_string()));
        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped_existing, 0);
        assert_eq!(report.path, Some(dir.path().join(".env.test")));
    }

    #[test]
    fn test_load_never_overwrites_existing_variables() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "PRESET=from-file\nFRESH=from-file\n");
        let env = Arc::new(MemoryEnv::with_vars([("PRESET", "from-env")]));

        let report = loader(&dir, ".env.test", env.clone()).load().unwrap();

        assert_eq!(env.var("PRESET"), Some("from-env".to_string()));
        assert_eq!(env.var("FRESH"), Some("from-file".to_string()));
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped_existing, 1);
    }

    #[test]
    fn test_load_without_a_file_is_a_clean_no_op() {
        let dir = TempDir::new().unwrap();
        let env = Arc::new(MemoryEnv::new());

        let report = loader(&dir, ".env.loader-absent", env.clone())
            .load()
            .unwrap();

        assert_eq!(report, LoadReport::default());
        assert!(env.is_empty());
    }

    #[test]
    fn test_load_counts_malformed_lines() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "GOOD=1\nbad line\nALSO_GOOD=2\n");
        let env = Arc::new(MemoryEnv::new());

        let report = loader(&dir, ".env.test", env.clone()).load().unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped_malformed, 1);
        assert_eq!(env.var("ALSO_GOOD"), Some("2".to_string()));
    }

    #[test]
    fn test_load_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "ONCE=first\n");
        let env = Arc::new(MemoryEnv::new());
        let loader = loader(&dir, ".env.test", env.clone());

        let first = loader.load().unwrap();
        let second = loader.load().unwrap();

        assert_eq!(first.applied, 1);
        assert_eq!(second.applied, 0);
        assert_eq!(second.skipped_existing, 1);
        assert_eq!(env.var("ONCE"), Some("first".to_string()));
    }

    #[test]
    fn test_references_resolve_against_the_source() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "BASE=/from-file\nBIN=${BASE}/bin\n");
        let env = Arc::new(MemoryEnv::with_vars([("BASE", "/from-env")]));

        loader(&dir, ".env.test", env.clone()).load().unwrap();

        // The reference resolved from the environment, and the existing
        // variable itself stayed untouched.
        assert_eq!(env.var("BIN"), Some("/from-env/bin".to_string()));
        assert_eq!(env.var("BASE"), Some("/from-env".to_string()));
    }

    #[test]
    fn test_load_path_on_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let env = Arc::new(MemoryEnv::new());

        let err = Loader::new()
            .with_source(env)
            .load_path(dir.path().join("nope.env"))
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_path_on_a_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let env = Arc::new(MemoryEnv::new());

        let err = Loader::new()
            .with_source(env)
            .load_path(dir.path())
            .unwrap_err();

        assert!(matches!(err, EnvError::InvalidPath { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unreadable_file_surfaces_as_io_error() {
        let dir = TempDir::new().unwrap();
        // Invalid UTF-8 makes the read itself fail, without depending
        // on filesystem permissions.
        fs::write(dir.path().join(".env.test"), b"BIN_KEY=\xff\xfe\n").unwrap();
        let env = Arc::new(MemoryEnv::new());

        let err = loader(&dir, ".env.test", env.clone()).load().unwrap_err();

        assert!(matches!(err, EnvError::Io { .. }));
        assert!(!err.is_not_found());
        assert!(env.is_empty());
    }

    #[test]
    fn test_values_reads_without_mutating() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "A=1\nA=overridden\nB=2\n");
        let env = Arc::new(MemoryEnv::new());

        let values = loader(&dir, ".env.test", env.clone()).values().unwrap();

        assert_eq!(values.get("A"), Some(&"overridden".to_string()));
        assert_eq!(values.get("B"), Some(&"2".to_string()));
        assert_eq!(values.len(), 2);
        assert!(env.is_empty());
    }

    #[test]
    fn test_values_without_a_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let env = Arc::new(MemoryEnv::new());

        let values = loader(&dir, ".env.loader-absent", env).values().unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_existing_variable_is_never_written_through_the_seam() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "PRESET=from-file\nFRESH=from-file\n");

        let mut source = MockEnvSource::new();
        source.expect_contains().returning(|key| key == "PRESET");
        // Any `set_var` call for PRESET has no matching expectation and
        // fails the test.
        source
            .expect_set_var()
            .withf(|key, value| key == "FRESH" && value == "from-file")
            .times(1)
            .return_const(());

        let report = Loader::new()
            .with_filename(".env.test")
            .from_dir(dir.path())
            .with_source(Arc::new(source))
            .load()
            .unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped_existing, 1);
    }

    #[test]
    fn test_presence_wins_even_when_the_value_reads_as_unset() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, ".env.test", "RAW_PRESET=from-file\n");

        // A set variable whose value cannot be read is still set, so
        // `set_var` gets no expectation at all: any write fails the test.
        let mut source = MockEnvSource::new();
        source.expect_var().returning(|_| None);
        source.expect_contains().returning(|_| true);

        let report = Loader::new()
            .with_filename(".env.test")
            .from_dir(dir.path())
            .with_source(Arc::new(source))
            .load()
            .unwrap();

        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped_existing, 1);
    }

    #[test]
    fn test_report_serializes_without_surprises() {
        let report = LoadReport {
            path: Some(PathBuf::from("/srv/app/.env")),
            applied: 3,
            skipped_existing: 1,
            skipped_malformed: 0,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], "/srv/app/.env");
        assert_eq!(json["applied"], 3);
        assert_eq!(json["skipped_existing"], 1);
    }
}
