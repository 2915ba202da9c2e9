//! Tracing subscriber setup
//!
//! The pipeline logs through `tracing` under the `inference_stream` target
//! family (`inference_stream::http`, `inference_stream::stream`). Applications
//! that already install a subscriber need nothing from this module; the helpers
//! here are for binaries and tests that want a sensible default.
//!
//! ```rust,ignore
//! use inference_stream::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use crate::error::LlmError;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const ENV_LOG_LEVEL: &str = "INFERENCE_STREAM_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "INFERENCE_STREAM_LOG_FORMAT";
pub const ENV_LOG_FILE: &str = "INFERENCE_STREAM_LOG_FILE";

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format
    Json,
    /// Compact JSON format
    JsonCompact,
}

impl FromStr for OutputFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(LlmError::ConfigurationError(format!(
                "Invalid log format: {s}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stdout when no log file is set.
    pub enable_console: bool,
    /// Log file path. Takes precedence over console output.
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Debug-level text output on the console
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Build a configuration from `INFERENCE_STREAM_LOG_*` style variables
    /// resolved through `lookup`. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            builder = builder.output_format(format.parse()?);
        }
        if let Some(path) = lookup(ENV_LOG_FILE) {
            builder = builder.log_file(PathBuf::from(path));
        }
        Ok(builder.build())
    }

    /// Filter directive enabling the pipeline's targets at the configured level.
    pub fn filter_directive(&self) -> String {
        format!("inference_stream={}", level_name(self.log_level))
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                return Err(LlmError::ConfigurationError(format!(
                    "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

fn level_name(level: tracing::Level) -> &'static str {
    match level {
        tracing::Level::TRACE => "trace",
        tracing::Level::DEBUG => "debug",
        tracing::Level::INFO => "info",
        tracing::Level::WARN => "warn",
        tracing::Level::ERROR => "error",
    }
}

fn make_writer(config: &SubscriberConfig) -> Result<(BoxMakeWriter, Option<WorkerGuard>), LlmError> {
    if let Some(path) = &config.log_file {
        let file_name = path.file_name().ok_or_else(|| {
            LlmError::ConfigurationError(format!("Invalid log file path: {}", path.display()))
        })?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| {
            LlmError::ConfigurationError(format!("Cannot create log directory {}: {e}", dir.display()))
        })?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        return Ok((BoxMakeWriter::new(writer), Some(guard)));
    }
    if config.enable_console {
        Ok((BoxMakeWriter::new(std::io::stdout), None))
    } else {
        Ok((BoxMakeWriter::new(std::io::sink), None))
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns the file writer's guard when logging to a file; keep it alive for
/// as long as logs should be flushed. An already-installed global subscriber
/// is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let filter = EnvFilter::try_new(config.filter_directive())
        .map_err(|e| LlmError::ConfigurationError(format!("Invalid log filter: {e}")))?;
    let (writer, guard) = make_writer(&config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let init_result = match config.output_format {
        OutputFormat::Json => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .flatten_event(true)
            .try_init(),
        OutputFormat::Text => builder.try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("has already been set")
                || error_msg.contains("already initialized")
            {
                Ok(None)
            } else {
                Err(LlmError::ConfigurationError(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        }
    }
}

pub fn init_default() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::default())
}

pub fn init_debug() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::debug())
}

/// Initialize from `INFERENCE_STREAM_LOG_LEVEL` (trace..error),
/// `INFERENCE_STREAM_LOG_FORMAT` (text, json, json-compact) and
/// `INFERENCE_STREAM_LOG_FILE`.
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    let config = SubscriberConfig::from_lookup(|key| std::env::var(key).ok())?;
    init_subscriber(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn builder_defaults() {
        let config = SubscriberConfig::builder().build();
        assert_eq!(config.log_level, tracing::Level::INFO);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert!(config.enable_console);
        assert_eq!(config.filter_directive(), "inference_stream=info");
    }

    #[test]
    fn config_from_variables() {
        let config = SubscriberConfig::from_lookup(lookup(&[
            (ENV_LOG_LEVEL, "DEBUG"),
            (ENV_LOG_FORMAT, "json-compact"),
            (ENV_LOG_FILE, "/tmp/inference.log"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/inference.log")));
    }

    #[test]
    fn invalid_variables_are_rejected() {
        let err = SubscriberConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
        let err = SubscriberConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[test]
    fn file_writer_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pipeline.log");
        let config = SubscriberConfig::builder().log_file(path).build();
        let (_writer, guard) = make_writer(&config).unwrap();
        assert!(guard.is_some());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn repeated_init_is_tolerated() {
        let _first = init_default();
        assert!(init_debug().is_ok());
    }
}
