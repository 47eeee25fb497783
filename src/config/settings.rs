//! Application settings read from the environment at startup.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Serialize;

use super::constants::OPENAI_API_KEY_ENV;
use crate::loader::Loader;
use crate::source::{EnvSource, StdEnv};

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Application configuration captured once at startup.
///
/// Construct it with [`Settings::load`] and pass it by reference to
/// whatever needs the credential; consumers never reach into the
/// process environment themselves.
#[derive(Clone, Serialize)]
pub struct Settings {
    /// `None` when the variable is unset. An empty string is a present
    /// value; the two states stay distinct.
    #[serde(skip_serializing)]
    openai_api_key: Option<String>,
    /// The environment file injected during the load, if one was found.
    env_file: Option<PathBuf>,
}

// Don't expose the credential in debug output (security)
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("env_file", &self.env_file)
            .finish()
    }
}

impl Settings {
    /// Inject the conventional environment file, then read the settings
    /// from the process environment.
    ///
    /// Startup never fails on this path: an unreadable file is logged
    /// at `warn` and the variables are read from the environment as it
    /// stands.
    pub fn load() -> Self {
        let env_file = match Loader::new().load() {
            Ok(report) => report.path,
            Err(e) => {
                tracing::warn!(error = %e, "Environment file load failed, continuing without it");
                None
            }
        };

        let mut settings = Self::from_source(&StdEnv);
        settings.env_file = env_file;
        settings
    }

    /// Read the settings from the process environment as it stands,
    /// with no file loading. For hosts whose platform injects the
    /// variables itself.
    pub fn from_env() -> Self {
        Self::from_source(&StdEnv)
    }

    /// Read the settings from an arbitrary environment table.
    pub fn from_source(source: &dyn EnvSource) -> Self {
        Self {
            openai_api_key: source.var(OPENAI_API_KEY_ENV),
            env_file: None,
        }
    }

    /// The OpenAI API credential, or `None` when it was never provided.
    ///
    /// Whether a missing credential is fatal is the consumer's call,
    /// never this crate's.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref()
    }

    /// The environment file the load injected, if discovery found one.
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }
}

/// Load the settings once and reuse them for the process lifetime.
///
/// The first call runs [`Settings::load`]; every later call returns the
/// same instance. The captured values never change after that, even if
/// the process environment does.
pub fn init() -> &'static Settings {
    SETTINGS.get_or_init(Settings::load)
}
