//! Process environment access.
//!
//! `EnvSource` isolates reads and writes of the environment variable
//! table behind a trait, so the loading pipeline can run against the
//! real process environment in production and an in-memory table in
//! tests and embedded hosts.

use std::collections::HashMap;
use std::env;
use std::sync::{Mutex, PoisonError};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Read/write access to an environment variable table.
///
/// `None` means the variable is not set. An empty string is a present
/// value; the two states are never conflated.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait EnvSource: Send + Sync {
    /// Get the value of a variable, or `None` when it is unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Set a variable for the remainder of the table's lifetime.
    fn set_var(&self, key: &str, value: &str);

    /// True when the variable is set at all.
    ///
    /// Presence is independent of readability: a value that `var`
    /// cannot decode still counts as present.
    fn contains(&self, key: &str) -> bool {
        self.var(key).is_some()
    }
}

/// The real process environment.
///
/// Mutations live for the process lifetime and are visible to every
/// thread and to child processes spawned afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        // A value that is not valid unicode reads as unset.
        env::var(key).ok()
    }

    fn set_var(&self, key: &str, value: &str) {
        env::set_var(key, value);
    }

    fn contains(&self, key: &str) -> bool {
        env::var_os(key).is_some()
    }
}

/// In-memory environment table with the same contract as [`StdEnv`].
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table seeded with the given variables.
    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: Mutex::new(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of variables currently set.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no variables are set.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.vars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EnvSource for MemoryEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_var(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }
}

/// Read a variable from the process environment.
///
/// Returns `None` when the variable is unset; an empty string comes
/// back as `Some("")`.
pub fn var(key: &str) -> Option<String> {
    StdEnv.var(key)
}
