// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Backend for the `log` facade shared by the nodecheck binaries.
//!
//! Lines are written to stderr by default so stdout stays reserved for
//! program output, in the agent's pipe-separated format:
//!
//! ```text
//! 2026-08-21 09:15:04 UTC | INFO | (nodecheck::checker) | [node1] checking tcp://10.0.0.1:11010
//! ```

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Environment variable consulted by [`level_from_env`].
pub const LOG_LEVEL_ENV: &str = "NODECHECK_LOG_LEVEL";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

enum Output {
    Stderr,
    File(Mutex<File>),
}

/// A plain line-oriented logger for short-lived command-line processes.
pub struct Logger {
    level: LevelFilter,
    output: Output,
}

impl Logger {
    /// A logger that writes to stderr.
    pub fn new(level: LevelFilter) -> Self {
        Logger {
            level,
            output: Output::Stderr,
        }
    }

    /// A logger that appends to the file at `path`, creating it if needed.
    pub fn to_file(level: LevelFilter, path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Logger {
            level,
            output: Output::File(Mutex::new(file)),
        })
    }

    /// Installs this logger as the global `log` backend.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    fn write_line(&self, line: &str) {
        match &self.output {
            Output::Stderr => {
                let _ = writeln!(io::stderr().lock(), "{line}");
            }
            Output::File(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{line}");
                }
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.write_line(&format_line(record));
    }

    fn flush(&self) {
        match &self.output {
            Output::Stderr => {
                let _ = io::stderr().flush();
            }
            Output::File(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.flush();
                }
            }
        }
    }
}

/// Installs a stderr logger at `level`.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    Logger::new(level).install()
}

/// Installs a logger at `level` that appends to the file at `path`.
pub fn init_to_file(level: LevelFilter, path: &Path) -> io::Result<()> {
    Logger::to_file(level, path)?
        .install()
        .map_err(io::Error::other)
}

/// The level named by `NODECHECK_LOG_LEVEL`, or `info` when the variable is
/// unset or does not name a level.
pub fn level_from_env() -> LevelFilter {
    match env::var(LOG_LEVEL_ENV) {
        Ok(value) => level_from_str(&value).unwrap_or(DEFAULT_LEVEL),
        Err(_) => DEFAULT_LEVEL,
    }
}

/// Parses a level name ("off", "error", "warn", "info", "debug", "trace"),
/// case-insensitively.
pub fn level_from_str(value: &str) -> Option<LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn format_line(record: &Record) -> String {
    let timestamp = OffsetDateTime::now_utc()
        .format(&TIMESTAMP_FORMAT)
        .unwrap_or_default();
    format!(
        "{timestamp} UTC | {} | ({}) | {}",
        record.level(),
        record.target(),
        record.args()
    )
}
