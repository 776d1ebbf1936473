//! Configuration management for artigen
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `ARTIGEN_PLACEHOLDER_SEPARATOR`: Text placed between placeholder contributions -
//!   default: newline. `\n` and `\t` escapes are expanded.
//! - `ARTIGEN_ABORT_ON_WRITE_FAILURE`: Abort a run when persistence fails (true|false) -
//!   default: "false"
//! - `ARTIGEN_DELIVERY_POLICY`: Bus error policy (fail-fast|collect-all) - default: "fail-fast"
//! - `ARTIGEN_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use artigen::ArtigenConfig;
//!
//! let config = ArtigenConfig::default();
//! config.validate().expect("Invalid configuration");
//!
//! let generation = config.generation().expect("Invalid configuration");
//! assert_eq!(generation.placeholder_separator, config.placeholder_separator);
//! ```

use crate::bus::DeliveryPolicy;
use crate::generation::{GenerationConfig, DEFAULT_PLACEHOLDER_SEPARATOR};
use std::env;
use std::fmt;
use thiserror::Error;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DELIVERY_POLICY: &str = "fail-fast";
const DEFAULT_ABORT_ON_WRITE_FAILURE: &str = "false";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Main configuration structure for artigen
///
/// `Default::default()` loads from environment variables, falling back to
/// defaults for anything unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtigenConfig {
    /// Separator between aggregated placeholder contributions
    pub placeholder_separator: String,

    /// Abort the run on the first persistence error (true, false)
    pub abort_on_write_failure: String,

    /// Bus error policy (fail-fast, collect-all)
    pub delivery_policy: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ArtigenConfig {
    fn default() -> Self {
        let placeholder_separator = env::var("ARTIGEN_PLACEHOLDER_SEPARATOR")
            .map(|v| unescape(&v))
            .unwrap_or_else(|_| DEFAULT_PLACEHOLDER_SEPARATOR.to_string());

        let abort_on_write_failure = env::var("ARTIGEN_ABORT_ON_WRITE_FAILURE")
            .unwrap_or_else(|_| DEFAULT_ABORT_ON_WRITE_FAILURE.to_string())
            .to_lowercase();

        let delivery_policy = env::var("ARTIGEN_DELIVERY_POLICY")
            .unwrap_or_else(|_| DEFAULT_DELIVERY_POLICY.to_string())
            .to_lowercase();

        let log_level = env::var("ARTIGEN_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            placeholder_separator,
            abort_on_write_failure,
            delivery_policy,
            log_level,
        }
    }
}

/// Expands `\n`, `\t` and `\\` so separators can be given on one shell line
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl ArtigenConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the log level, delivery policy or write-failure
    /// flag is not recognized
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        self.delivery_policy()?;
        self.abort_on_write_failure()?;
        Ok(())
    }

    /// Parsed write-failure policy
    pub fn abort_on_write_failure(&self) -> Result<bool, ConfigError> {
        self.abort_on_write_failure
            .trim()
            .parse::<bool>()
            .map_err(|_| ConfigError::ParseError {
                field: "ARTIGEN_ABORT_ON_WRITE_FAILURE".to_string(),
                error: format!(
                    "expected true or false, got '{}'",
                    self.abort_on_write_failure
                ),
            })
    }

    /// Parsed bus delivery policy
    pub fn delivery_policy(&self) -> Result<DeliveryPolicy, ConfigError> {
        self.delivery_policy
            .parse()
            .map_err(|error| ConfigError::ParseError {
                field: "ARTIGEN_DELIVERY_POLICY".to_string(),
                error,
            })
    }

    /// Orchestrator settings derived from this configuration
    pub fn generation(&self) -> Result<GenerationConfig, ConfigError> {
        Ok(GenerationConfig {
            placeholder_separator: self.placeholder_separator.clone(),
            abort_on_write_failure: self.abort_on_write_failure()?,
            solution_name: None,
        })
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();

        map.insert(
            "placeholder_separator".to_string(),
            format!("{:?}", self.placeholder_separator),
        );
        map.insert(
            "abort_on_write_failure".to_string(),
            self.abort_on_write_failure.clone(),
        );
        map.insert("delivery_policy".to_string(), self.delivery_policy.clone());
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for ArtigenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Artigen Configuration:")?;
        writeln!(f, "  Placeholder Separator: {:?}", self.placeholder_separator)?;
        writeln!(f, "  Abort On Write Failure: {}", self.abort_on_write_failure)?;
        writeln!(f, "  Delivery Policy: {}", self.delivery_policy)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
