//! Structured, sanitizing logging for spend attempts
//!
//! All records go through the `log` facade; [`init`] installs an `env_logger`
//! backend once per process. Helpers tag each record with the stage of the
//! spend it belongs to and truncate values that could link wallet addresses
//! or transaction ids to a log file.
//!
//! - NEVER log private keys or signed transaction bodies
//! - Parameters named `address`, `txid`, `outpoint` and the like pass through
//!   [`sanitize_for_logging`]
//!
//! # Usage
//!
//! ```
//! use coinspend_common::logging::{self, LogConfig, LogLevel};
//! use serde_json::json;
//!
//! logging::init(&LogConfig::default()).expect("Failed to initialize logging");
//!
//! logging::log_selection(
//!     LogLevel::Debug,
//!     "selection_started",
//!     Some(json!({ "candidates": 3 })),
//! );
//! ```

use chrono::Local;
use env_logger::fmt::Formatter;
use log::{debug, Record};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Once;

/// Parameter keys whose string values are truncated before logging
const SENSITIVE_KEYS: &[&str] = &["address", "change_address", "outpoint", "tx_hash", "txid"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Stage of the spend a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogContext {
    Selection,
    Transaction,
    Signing,
    /// Unspent fetch and submission
    Network,
    /// Wallet-state side effects
    Storage,
}

/// `[logging]` section of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: LogLevel,
    /// Append to this file instead of writing to stderr
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_true")]
    pub include_timestamps: bool,
    #[serde(default = "default_true")]
    pub include_source_location: bool,
    /// One JSON object per line
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_file: None,
            include_timestamps: true,
            include_source_location: true,
            json_format: false,
        }
    }
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

fn default_true() -> bool {
    true
}

fn write_record(
    buf: &mut Formatter,
    record: &Record<'_>,
    config: &LogConfig,
) -> io::Result<()> {
    let timestamp = config
        .include_timestamps
        .then(|| Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string());
    let location = config.include_source_location.then(|| {
        format!(
            "{}:{}",
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0)
        )
    });

    if config.json_format {
        let line = json!({
            "timestamp": timestamp,
            "level": record.level().to_string(),
            "target": record.target(),
            "location": location,
            "message": record.args().to_string(),
        });
        return writeln!(buf, "{}", line);
    }

    if let Some(timestamp) = timestamp {
        write!(buf, "{} ", timestamp)?;
    }
    let mut style = buf.style();
    style.set_bold(true);
    write!(buf, "[{}", style.value(record.level()))?;
    if let Some(location) = location {
        write!(buf, " {}", location)?;
    }
    writeln!(buf, "] {}", record.args())
}

static LOGGING_INIT: Once = Once::new();

/// Install the process-wide logger
///
/// Only the first call has any effect. If another logger is already
/// installed (a test harness, the embedding application) it is kept.
///
/// Fails only when `log_file` cannot be opened.
pub fn init(config: &LogConfig) -> Result<(), String> {
    let mut result = Ok(());

    LOGGING_INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(log::Level::from(config.level).to_level_filter());

        if let Some(path) = &config.log_file {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => {
                    result = Err(format!("Failed to open log file {}: {}", path, e));
                    return;
                }
            }
        }

        let format_config = config.clone();
        builder.format(move |buf, record| write_record(buf, record, &format_config));

        if let Err(e) = builder.try_init() {
            debug!("Keeping existing logger: {}", e);
        }
    });

    result
}

/// Truncate an address, txid or similar identifier for logging
///
/// Keeps the first and last four characters; short values are masked
/// entirely.
pub fn sanitize_for_logging(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    match chars.len() {
        0 => String::new(),
        1..=8 => "*****".to_string(),
        n => format!(
            "{}...{}",
            chars[..4].iter().collect::<String>(),
            chars[n - 4..].iter().collect::<String>()
        ),
    }
}

fn sanitize_params(params: Value) -> Value {
    match params {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| match value {
                    Value::String(s) if SENSITIVE_KEYS.contains(&key.as_str()) => {
                        let masked = sanitize_for_logging(&s);
                        (key, Value::String(masked))
                    }
                    other => (key, other),
                })
                .collect(),
        ),
        other => other,
    }
}

fn log_with_context(level: LogLevel, context: LogContext, message: &str, params: Option<Value>) {
    match params.map(sanitize_params) {
        Some(p) => log::log!(log::Level::from(level), "[{:?}] {} {}", context, message, p),
        None => log::log!(log::Level::from(level), "[{:?}] {}", context, message),
    }
}

/// Log a selection event
pub fn log_selection(level: LogLevel, message: &str, params: Option<Value>) {
    log_with_context(level, LogContext::Selection, message, params);
}

/// Log a transaction assembly event
pub fn log_transaction(level: LogLevel, message: &str, params: Option<Value>) {
    log_with_context(level, LogContext::Transaction, message, params);
}

/// Log a signing event
pub fn log_signing(level: LogLevel, message: &str, params: Option<Value>) {
    log_with_context(level, LogContext::Signing, message, params);
}

/// Log a network event
pub fn log_network(level: LogLevel, message: &str, params: Option<Value>) {
    log_with_context(level, LogContext::Network, message, params);
}

/// Log a wallet-state event
pub fn log_storage(level: LogLevel, message: &str, params: Option<Value>) {
    log_with_context(level, LogContext::Storage, message, params);
}
