//! Logging setup for the analysis binary and library.
//!
//! Logs are structured `tracing` events written to stderr, so the plain-text
//! report printed on stdout stays unchanged regardless of verbosity.

use tracing::Level;

/// Configuration for the logging setup.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for dependencies (DataFusion, Arrow, ...)
    pub level: Level,
    /// Log level for this crate specifically
    pub crate_level: Level,
    /// Whether to use JSON output format
    pub json_format: bool,
    /// Environment filter override
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            crate_level: Level::INFO,
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Creates a configuration for development use.
    pub fn development() -> Self {
        Self {
            level: Level::INFO,
            crate_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }

    /// Creates a configuration for structured (JSON) logging.
    pub fn structured() -> Self {
        Self {
            json_format: true,
            ..Self::default()
        }
    }

    /// Sets the log level for dependencies.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the log level for this crate.
    pub fn with_crate_level(mut self, level: Level) -> Self {
        self.crate_level = level;
        self
    }

    /// Sets whether to use JSON output format.
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// Sets a custom environment filter.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Builds the environment filter string.
    pub fn env_filter(&self) -> String {
        if let Some(ref filter) = self.env_filter {
            filter.clone()
        } else {
            format!(
                "{},hospital_eda={}",
                self.level.as_str().to_lowercase(),
                self.crate_level.as_str().to_lowercase()
            )
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter when set.
///
/// # Examples
///
/// ```rust,no_run
/// use hospital_eda::logging::{init_logging, LoggingConfig};
///
/// init_logging(LoggingConfig::default().with_json_format(true)).unwrap();
/// ```
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

    let fmt_layer = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Truncates a string to the maximum field length if needed.
///
/// Used when logging cell values, which can be arbitrarily long.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.chars().count() <= max_length {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(max_length).collect();
        format!("{truncated}...(truncated)")
    }
}
