//! Communicator configuration
//!
//! [`CommunicatorConfig`] is the externally settable state of a communicator.
//! It deserializes from any serde format with every field optional, so a host
//! can keep it next to the rest of its settings.

use crate::logging::DebugLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay between a failed or dropped connection and the next attempt
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2500);

/// Receive buffer size, matching the 64 KiB buffer of control-system TCP clients
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 65535;

/// Configuration for a [`TcpCommunicator`](crate::io::TcpCommunicator)
///
/// # Examples
///
/// ```
/// use xsig_link::config::CommunicatorConfig;
/// use std::time::Duration;
///
/// let config = CommunicatorConfig::new("10.0.0.20", 1702);
/// assert_eq!(config.retry_delay, Duration::from_millis(2500));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicatorConfig {
    /// Identifier used as the log prefix (generated when `None`)
    pub id: Option<String>,
    /// Remote host name or address; empty disables connecting
    pub host: String,
    /// Remote TCP port; 0 disables connecting
    pub port: u16,
    /// Log verbosity
    pub debug_level: DebugLevel,
    /// Fixed delay before each reconnect attempt
    #[serde(with = "duration_ms", rename = "retry_delay_ms")]
    pub retry_delay: Duration,
    /// Size of the buffer each read fills before a response is dispatched
    pub receive_buffer_size: usize,
    /// Disable Nagle's algorithm on the socket
    pub nodelay: bool,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            id: None,
            host: String::new(),
            port: 0,
            debug_level: DebugLevel::Disabled,
            retry_delay: DEFAULT_RETRY_DELAY,
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            nodelay: true,
        }
    }
}

impl CommunicatorConfig {
    /// Config for `host:port` with defaults for everything else
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
