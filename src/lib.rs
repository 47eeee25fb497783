//! envseed - environment bootstrap for an API credential
//!
//! Locates the conventional `.env` file by walking up from the working
//! directory, injects its `KEY=VALUE` bindings into the process
//! environment without overwriting variables that are already set, and
//! exposes the result through a read-once [`Settings`] surface.
//!
//! # Architecture Layers
//!
//! - **config**: Settings surface and application constants
//! - **errors**: Centralized error handling
//! - **finder**: Ancestor-directory discovery of the environment file
//! - **loader**: Parsing plus injection into an environment table
//! - **parser**: The `KEY=VALUE` file format
//! - **source**: Trait seam over the process environment
//!
//! # Usage
//!
//! Call [`init`] once at startup, before any concurrent activity:
//!
//! ```no_run
//! let settings = envseed::init();
//! if settings.openai_api_key().is_none() {
//!     eprintln!("OPENAI_API_KEY is not configured");
//! }
//! ```
//!
//! A missing file, a missing variable, and a malformed line are all
//! tolerated silently; deciding whether an absent credential is fatal
//! belongs to the consumer.

pub mod config;
pub mod errors;
pub mod finder;
pub mod loader;
pub mod parser;
pub mod source;

// Re-export commonly used types at crate root
pub use config::{init, Settings};
pub use errors::{EnvError, EnvResult};
pub use loader::{LoadReport, Loader};
pub use source::{var, EnvSource, MemoryEnv, StdEnv};
