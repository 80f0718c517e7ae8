//! Leveled logging gated by a per-communicator debug level
//!
//! Communicators report through a [`LogSink`] with five calls: `print`
//! (diagnostic chatter), `notice`, `warning`, `error` and `exception`. A
//! [`DebugLevel`] decides which of those reach the sink. The default sink,
//! [`TracingSink`], forwards everything to `tracing`, so the usual subscriber
//! setup applies:
//!
//! ```no_run
//! use tracing_subscriber::EnvFilter;
//!
//! tracing_subscriber::fmt()
//!     .with_env_filter(EnvFilter::new("xsig_link=debug"))
//!     .init();
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Verbosity tiers
///
/// | Level | print | notice / warning / error / exception |
/// |---|---|---|
/// | `Disabled` (0) | - | - |
/// | `LoggingEnabled` (1) | - | yes |
/// | `DebugEnabled` (2) | yes | - |
/// | `AllEnabled` (3) | yes | yes |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u8)]
pub enum DebugLevel {
    /// Nothing is emitted
    #[default]
    Disabled = 0,
    /// Notices, warnings, errors and exceptions
    LoggingEnabled = 1,
    /// Diagnostic prints only
    DebugEnabled = 2,
    /// Everything
    AllEnabled = 3,
}

impl DebugLevel {
    /// Whether diagnostic prints pass this level
    pub fn prints(self) -> bool {
        matches!(self, DebugLevel::DebugEnabled | DebugLevel::AllEnabled)
    }

    /// Whether notices, warnings, errors and exceptions pass this level
    pub fn logs(self) -> bool {
        matches!(self, DebugLevel::LoggingEnabled | DebugLevel::AllEnabled)
    }
}

impl TryFrom<u16> for DebugLevel {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DebugLevel::Disabled),
            1 => Ok(DebugLevel::LoggingEnabled),
            2 => Ok(DebugLevel::DebugEnabled),
            3 => Ok(DebugLevel::AllEnabled),
            other => Err(format!("debug level must be 0..=3, got {}", other)),
        }
    }
}

impl From<DebugLevel> for u16 {
    fn from(level: DebugLevel) -> Self {
        level as u16
    }
}

/// Destination for communicator log output
///
/// Calls arrive already filtered by the communicator's [`DebugLevel`].
///
/// Sinks are invoked while the communicator holds its state lock. A sink must
/// not call back into the communicator that owns it; doing so deadlocks.
/// Hand the line off (channel, `tracing`, a buffer) and return.
pub trait LogSink: Send + Sync {
    /// Diagnostic output
    fn print(&self, id: &str, message: &str);

    /// Notable but normal event
    fn notice(&self, id: &str, message: &str);

    /// Unexpected but recoverable condition
    fn warning(&self, id: &str, message: &str);

    /// Failed operation
    fn error(&self, id: &str, message: &str);

    /// Failed operation with its underlying error
    fn exception(&self, id: &str, err: &(dyn StdError + 'static), message: &str);
}

/// [`LogSink`] that forwards to `tracing`
///
/// `print` maps to `debug!`, `notice` to `info!`, `warning` to `warn!`,
/// `error` and `exception` to `error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn print(&self, id: &str, message: &str) {
        debug!(communicator = id, "{}", message);
    }

    fn notice(&self, id: &str, message: &str) {
        info!(communicator = id, "{}", message);
    }

    fn warning(&self, id: &str, message: &str) {
        warn!(communicator = id, "{}", message);
    }

    fn error(&self, id: &str, message: &str) {
        error!(communicator = id, "{}", message);
    }

    fn exception(&self, id: &str, err: &(dyn StdError + 'static), message: &str) {
        let mut chain = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        error!(communicator = id, error = %err, causes = %chain, "{}", message);
    }
}

/// Debug-level gate in front of a [`LogSink`]
pub(crate) struct Logger {
    id: String,
    level: AtomicU8,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub(crate) fn new(id: String, level: DebugLevel, sink: Arc<dyn LogSink>) -> Self {
        Self {
            id,
            level: AtomicU8::new(level as u8),
            sink,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn level(&self) -> DebugLevel {
        match self.level.load(Ordering::Relaxed) {
            1 => DebugLevel::LoggingEnabled,
            2 => DebugLevel::DebugEnabled,
            3 => DebugLevel::AllEnabled,
            _ => DebugLevel::Disabled,
        }
    }

    pub(crate) fn set_level(&self, level: DebugLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub(crate) fn print(&self, args: fmt::Arguments<'_>) {
        if self.level().prints() {
            self.sink.print(&self.id, &args.to_string());
        }
    }

    pub(crate) fn notice(&self, args: fmt::Arguments<'_>) {
        if self.level().logs() {
            self.sink.notice(&self.id, &args.to_string());
        }
    }

    pub(crate) fn warning(&self, args: fmt::Arguments<'_>) {
        if self.level().logs() {
            self.sink.warning(&self.id, &args.to_string());
        }
    }

    pub(crate) fn error(&self, args: fmt::Arguments<'_>) {
        if self.level().logs() {
            self.sink.error(&self.id, &args.to_string());
        }
    }

    pub(crate) fn exception(&self, err: &(dyn StdError + 'static), args: fmt::Arguments<'_>) {
        if self.level().logs() {
            self.sink.exception(&self.id, err, &args.to_string());
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("id", &self.id)
            .field("level", &self.level())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Sink that records `(call, message)` pairs
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) lines: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingSink {
        pub(crate) fn calls(&self, kind: &str) -> Vec<String> {
            self.lines
                .lock()
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl LogSink for RecordingSink {
        fn print(&self, _id: &str, message: &str) {
            self.lines.lock().push(("print", message.to_string()));
        }
        fn notice(&self, _id: &str, message: &str) {
            self.lines.lock().push(("notice", message.to_string()));
        }
        fn warning(&self, _id: &str, message: &str) {
            self.lines.lock().push(("warning", message.to_string()));
        }
        fn error(&self, _id: &str, message: &str) {
            self.lines.lock().push(("error", message.to_string()));
        }
        fn exception(&self, _id: &str, err: &(dyn StdError + 'static), message: &str) {
            self.lines
                .lock()
                .push(("exception", format!("{}: {}", message, err)));
        }
    }

    #[test]
    fn test_level_conversion() {
        assert_eq!(DebugLevel::try_from(2), Ok(DebugLevel::DebugEnabled));
        assert!(DebugLevel::try_from(4).is_err());
        assert_eq!(u16::from(DebugLevel::AllEnabled), 3);
    }

    #[test]
    fn test_gating_matrix() {
        let sink = Arc::new(RecordingSink::default());
        let logger = Logger::new("t".into(), DebugLevel::Disabled, sink.clone());

        logger.print(format_args!("p0"));
        logger.notice(format_args!("n0"));
        assert!(sink.lines.lock().is_empty());

        logger.set_level(DebugLevel::LoggingEnabled);
        logger.print(format_args!("p1"));
        logger.notice(format_args!("n1"));
        assert_eq!(sink.calls("print"), Vec::<String>::new());
        assert_eq!(sink.calls("notice"), vec!["n1"]);

        logger.set_level(DebugLevel::DebugEnabled);
        logger.print(format_args!("p2"));
        logger.error(format_args!("e2"));
        assert_eq!(sink.calls("print"), vec!["p2"]);
        assert!(sink.calls("error").is_empty());

        logger.set_level(DebugLevel::AllEnabled);
        logger.warning(format_args!("w3"));
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        logger.exception(&err, format_args!("x3"));
        assert_eq!(sink.calls("warning"), vec!["w3"]);
        assert_eq!(sink.calls("exception"), vec!["x3: boom"]);
    }

    #[test]
    fn test_debug_level_deserializes_from_number() {
        let level: DebugLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, DebugLevel::AllEnabled);
        assert!(serde_json::from_str::<DebugLevel>("7").is_err());
    }
}
