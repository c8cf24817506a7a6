//! User-facing log sink.
//!
//! Resolution and SSR loading report warnings (missing built-ins, circular
//! imports) and recovered errors (evaluation failures) through [`Logger`] so a
//! dev server can route them to its own terminal output. [`TracingLogger`]
//! forwards everything to `tracing`.

/// Presentation hints attached to a log message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Prefix the message with a timestamp.
    pub timestamp: bool,
    /// Clear the screen before printing.
    pub clear: bool,
}

impl LogOptions {
    /// Timestamped, screen-clearing output used for SSR evaluation errors.
    #[must_use]
    pub fn prominent() -> Self {
        Self {
            timestamp: true,
            clear: true,
        }
    }
}

/// Sink for user-facing messages.
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str, opts: LogOptions);
    fn warn(&self, msg: &str, opts: LogOptions);
    fn error(&self, msg: &str, opts: LogOptions);
}

/// Logger backed by `tracing` events under the `ridge` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, msg: &str, opts: LogOptions) {
        tracing::info!(target: "ridge", timestamp = opts.timestamp, clear = opts.clear, "{msg}");
    }

    fn warn(&self, msg: &str, opts: LogOptions) {
        tracing::warn!(target: "ridge", timestamp = opts.timestamp, clear = opts.clear, "{msg}");
    }

    fn error(&self, msg: &str, opts: LogOptions) {
        tracing::error!(target: "ridge", timestamp = opts.timestamp, clear = opts.clear, "{msg}");
    }
}
