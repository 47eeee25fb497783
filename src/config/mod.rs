//! Application configuration module
//!
//! The environment file name, the credential variable name, and the
//! settings surface built on top of the loader.

mod constants;
mod settings;

pub use constants::*;
pub use settings::{init, Settings};
