//! Logging seam for library components.
//!
//! The packer and interleaver never call `tracing` directly. They hold an
//! `Arc<dyn Logger>` and report progress through the `log_*!` macros, so the
//! CLI can route messages to `tracing` while tests capture or discard them.
//!
//! ```
//! use std::sync::Arc;
//! use tarzoom::log::{Logger, MemoryLogger};
//! use tarzoom::log_info;
//!
//! let logger = Arc::new(MemoryLogger::new());
//! log_info!(logger, "packed {} tiles", 21);
//! assert!(logger.contains("packed 21 tiles"));
//! ```

mod memory;
mod tracing_adapter;

use std::fmt::Arguments;

pub use memory::{MemoryLogger, NoOpLogger};
pub use tracing_adapter::TracingLogger;

/// Severity of a log message, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Sink for progress and diagnostic messages.
///
/// Logging is informational only: nothing a logger does may change the
/// outcome of a packing or interleaving run.
pub trait Logger: Send + Sync {
    /// Record one message.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_macros_route_to_level() {
        let logger = MemoryLogger::new();
        log_debug!(logger, "level {}", 3);
        log_warn!(logger, "hole at {}_{}", 1, 0);

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (LogLevel::Debug, "level 3".to_string()));
        assert_eq!(entries[1], (LogLevel::Warn, "hole at 1_0".to_string()));
    }
}
