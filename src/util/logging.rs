//! Structured logging setup for artigen
//!
//! One `tracing` subscriber per process, writing to stderr so that reports on
//! stdout stay machine-readable. `RUST_LOG` directives are layered on top of
//! the configured level.
//!
//! ```no_run
//! use artigen::util::{init_logging, LoggingConfig};
//!
//! // ARTIGEN_LOG_LEVEL=debug ARTIGEN_LOG_FORMAT=json
//! init_logging(LoggingConfig::from_env());
//!
//! tracing::info!(phase = "CreatingSolution", "Generation started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static INIT: Once = Once::new();

const LEVEL_VAR: &str = "ARTIGEN_LOG_LEVEL";
const FORMAT_VAR: &str = "ARTIGEN_LOG_FORMAT";

/// Rendering of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `json` (or `true`) selects JSON, anything else plain text
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" | "true" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for `artigen` targets
    pub level: Level,
    pub format: LogFormat,
    /// Include the module target (e.g. `artigen::generation`)
    pub include_target: bool,
    /// Include file and line number
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// ```
    /// use artigen::util::LoggingConfig;
    /// use tracing::Level;
    ///
    /// let config = LoggingConfig::with_level(Level::DEBUG);
    /// assert_eq!(config.level, Level::DEBUG);
    /// ```
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Reads `ARTIGEN_LOG_LEVEL` and `ARTIGEN_LOG_FORMAT`
    pub fn from_env() -> Self {
        let level = env::var(LEVEL_VAR)
            .map(|v| parse_level(&v))
            .unwrap_or(Level::INFO);
        let format = env::var(FORMAT_VAR)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        Self {
            level,
            format,
            // Location is only useful when logs are shipped somewhere
            include_location: format == LogFormat::Json,
            ..Default::default()
        }
    }
}

/// Parses a log level, falling back to `INFO` for unknown values
///
/// ```
/// use artigen::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(value: &str) -> Level {
    value.trim().parse::<Level>().unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
            value
        );
        Level::INFO
    })
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = format!("artigen={}", config.level).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }

        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location);
        let output = match config.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Text => base.boxed(),
        };

        tracing_subscriber::registry()
            .with(output)
            .with(filter)
            .init();
    });
}
