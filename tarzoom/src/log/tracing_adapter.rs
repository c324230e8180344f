//! Bridge from the [`Logger`] seam to the `tracing` crate.

use std::fmt::Arguments;

use super::{LogLevel, Logger};

/// Logger that forwards every message to `tracing` under the `tarzoom` target.
///
/// Output only appears once a subscriber is installed, which the CLI does in
/// `logging::init_logging`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "tarzoom", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "tarzoom", "{}", args),
            LogLevel::Info => tracing::info!(target: "tarzoom", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "tarzoom", "{}", args),
            LogLevel::Error => tracing::error!(target: "tarzoom", "{}", args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger: Box<dyn Logger> = Box::new(TracingLogger);
        logger.info(format_args!("no subscriber installed"));
        logger.trace(format_args!("still fine"));
    }
}
