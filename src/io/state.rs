//! Connection state and endpoint types

use std::fmt;

/// Lifecycle state of a communicator's connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection requested, or an explicit disconnect completed
    #[default]
    Idle,
    /// Open in progress
    Connecting,
    /// Session established
    Connected,
    /// Session is being closed on request
    ///
    /// Transient: `disconnect` passes through it and settles at `Idle` before
    /// returning, so `state()` never reports it.
    Disconnecting,
    /// Connection failed or dropped; a retry is scheduled
    Reconnecting,
    /// Torn down for good; no further transitions
    Disposed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Disposed => write!(f, "Disposed"),
        }
    }
}

/// Remote host and port
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Endpoint {
    /// Host name or address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Whether a connection can be attempted (non-empty host, non-zero port)
    pub fn is_valid(&self) -> bool {
        !self.host.trim().is_empty() && self.port != 0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
