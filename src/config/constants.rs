//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Environment file
// =============================================================================

/// Conventional name of the environment-definition file
pub const ENV_FILENAME: &str = ".env";

// =============================================================================
// Credentials
// =============================================================================

/// Environment variable holding the OpenAI API credential
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
