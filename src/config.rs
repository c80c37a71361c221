//! Environment configuration.
//!
//! vcsgrep takes its command line verbatim from the user, so its own knobs
//! live in environment variables:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `VCSGREP_VCS` | `hg`, `git` | from the program name |
//! | `VCSGREP_LOG` | `trace`, `debug`, `info`, `warn`, `error` | `warn` |
//! | `VCSGREP_LOG_FORMAT` | `text`, `json` | `text` |
//! | `VCSGREP_OUTPUT` | `text`, `json` (for `--explain`) | `text` |
//! | `VCSGREP_GREP` | grep executable | `grep` |
//! | `VCSGREP_BATCH_BYTES` | positive integer | 131072 |
//! | `VCSGREP_EDITOR` | executable run in place of `vim`/`gvim` | the selected editor |
//!
//! `RUST_LOG`, when set, overrides `VCSGREP_LOG`.

use std::io;

use clap::ValueEnum;

use vcsgrep_core::error::VcsgrepError;
use vcsgrep_core::plan::{DEFAULT_BATCH_BYTES, DEFAULT_GREP};

use crate::vcs::Vcs;

pub const ENV_VCS: &str = "VCSGREP_VCS";
pub const ENV_LOG: &str = "VCSGREP_LOG";
pub const ENV_LOG_FORMAT: &str = "VCSGREP_LOG_FORMAT";
pub const ENV_OUTPUT: &str = "VCSGREP_OUTPUT";
pub const ENV_GREP: &str = "VCSGREP_GREP";
pub const ENV_BATCH_BYTES: &str = "VCSGREP_BATCH_BYTES";
pub const ENV_EDITOR: &str = "VCSGREP_EDITOR";

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Output format for `--explain`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report (default).
    #[default]
    Text,
    /// JSON document.
    Json,
}

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Version control system, when the program name does not decide it.
    pub vcs: Option<Vcs>,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    pub output: OutputFormat,
    /// Grep executable.
    pub grep: String,
    /// Byte budget for the file names of one grep invocation.
    pub batch_bytes: usize,
    /// Executable run by `--vim`/`--gvim` instead of the editor itself.
    pub editor: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            vcs: None,
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
            output: OutputFormat::default(),
            grep: DEFAULT_GREP.to_string(),
            batch_bytes: DEFAULT_BATCH_BYTES,
            editor: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, VcsgrepError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset and empty values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, VcsgrepError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(value) = get(ENV_VCS) {
            settings.vcs = Some(parse_enum(ENV_VCS, &value)?);
        }
        if let Some(value) = get(ENV_LOG) {
            settings.log_level = parse_enum(ENV_LOG, &value)?;
        }
        if let Some(value) = get(ENV_LOG_FORMAT) {
            settings.log_format = parse_enum(ENV_LOG_FORMAT, &value)?;
        }
        if let Some(value) = get(ENV_OUTPUT) {
            settings.output = parse_enum(ENV_OUTPUT, &value)?;
        }
        if let Some(value) = get(ENV_GREP) {
            settings.grep = value;
        }
        if let Some(value) = get(ENV_EDITOR) {
            settings.editor = Some(value);
        }
        if let Some(value) = get(ENV_BATCH_BYTES) {
            settings.batch_bytes = match value.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(VcsgrepError::invalid_config(
                        ENV_BATCH_BYTES,
                        value,
                        "expected a positive integer",
                    ))
                }
            };
        }
        Ok(settings)
    }
}

/// Parse an enum setting, case-insensitively.
fn parse_enum<T: ValueEnum>(key: &str, value: &str) -> Result<T, VcsgrepError> {
    T::from_str(value.trim(), true).map_err(|_| {
        let names: Vec<String> = T::value_variants()
            .iter()
            .filter_map(|variant| variant.to_possible_value())
            .map(|possible| possible.get_name().to_string())
            .collect();
        VcsgrepError::invalid_config(key, value, format!("expected one of {}", names.join(", ")))
    })
}

/// Initialize the tracing subscriber on stderr.
pub fn init_tracing(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    // try_init: a subscriber may already be set (tests, embedding)
    let _ = match settings.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
