//! Diagnostic sessions
//!
//! User-facing diagnostics (a malformed easing curve, a singular transform
//! during a gesture) are written to a [`Session`]. Hosts route them to their
//! own console; the default [`TracingSession`] forwards to `tracing`.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a session message
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Sink for user-facing diagnostics
pub trait Session: Send + Sync {
    fn write(&self, level: LogLevel, message: &str);

    fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }
}

pub type SharedSession = Arc<dyn Session>;

/// Session that forwards every message to `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSession;

impl TracingSession {
    pub fn shared() -> SharedSession {
        Arc::new(TracingSession)
    }
}

impl Session for TracingSession {
    fn write(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "motive::session", "{}", message),
            LogLevel::Info => tracing::info!(target: "motive::session", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "motive::session", "{}", message),
            LogLevel::Error => tracing::error!(target: "motive::session", "{}", message),
        }
    }
}

/// Session that keeps every message, for inspection in tests and tools
#[derive(Debug, Default)]
pub struct CapturingSession {
    messages: Mutex<Vec<(LogLevel, String)>>,
}

impl CapturingSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Drain captured messages, returning whether any were present
    pub fn check_and_clear(&self) -> bool {
        let mut messages = self.messages.lock().unwrap();
        let had_any = !messages.is_empty();
        messages.clear();
        had_any
    }
}

impl Session for CapturingSession {
    fn write(&self, level: LogLevel, message: &str) {
        tracing::debug!(%level, "{}", message);
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
