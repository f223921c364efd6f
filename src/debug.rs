// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Logging and Diagnostics
//!
//! Thin layer over the `log` facade. The `log_*!` macros keep the names
//! used across the code base; `init` installs `env_logger` as the sink.
//!
//! # Usage
//!
//! ```rust,ignore
//! debug::init(LogLevel::Info);
//! log_info!("page_size is {}", page_size);
//! ```

use log::LevelFilter;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Every serviced fault
    Trace,

    /// Per-step detail
    Debug,

    /// Major steps
    Info,

    /// Recoverable problems
    Warning,

    /// Failures only
    Error,
}

impl LogLevel {
    /// Pick a level from the `-v` count and `-q` flag
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Equivalent `log` filter
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// Install the console logger
///
/// Writes plain lines to stderr. `RUST_LOG` takes precedence over
/// `level` when set. Later calls are ignored.
pub fn init(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.as_filter())
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .try_init();
}

/// Log a trace message
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        ::log::trace!($($arg)*)
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        ::log::debug!($($arg)*)
    };
}

/// Log an info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ::log::info!($($arg)*)
    };
}

/// Log a warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        ::log::warn!($($arg)*)
    };
}

/// Log an error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        ::log::error!($($arg)*)
    };
}
