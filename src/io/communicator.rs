//! Communicator capability traits
//!
//! [`Communicator`] covers what every device link has: an identity, a debug
//! level and a lifecycle. [`SocketCommunicator`] adds the socket-shaped
//! surface: an endpoint, connection control, command sending and event
//! subscription.

use crate::error::Result;
use crate::io::events::EventReceiver;
use crate::logging::DebugLevel;
use crate::protocol::latin1;
use crate::protocol::status::SocketStatus;
use crate::protocol::xsig::{self, Signal};

/// Identity, logging and lifecycle shared by all communicators
pub trait Communicator: Send + Sync {
    /// Identifier used as the log prefix
    fn id(&self) -> &str;

    /// Current log verbosity
    fn debug_level(&self) -> DebugLevel;

    /// Set log verbosity from its numeric form
    ///
    /// Values outside `0..=3` are ignored and the current level is kept.
    fn set_debug_level(&self, level: u16) -> Result<()>;

    /// Whether [`Communicator::dispose`] has run
    fn is_disposed(&self) -> bool;

    /// Release the connection, the retry timer and all subscribers
    ///
    /// Idempotent. Every later operation fails with
    /// [`CommError::Disposed`](crate::error::CommError::Disposed).
    fn dispose(&self);

    /// Host-process shutdown hook
    fn shutdown(&self) {
        self.dispose();
    }
}

/// Socket-style communicator: endpoint, connection control, sending, events
pub trait SocketCommunicator: Communicator {
    /// Whether a session is established
    fn is_connected(&self) -> bool;

    /// Last status reported by the transport
    fn connection_status(&self) -> SocketStatus;

    /// Configured remote host
    fn host(&self) -> String;

    /// Change the remote host, reconnecting if a connection was requested
    fn set_host(&self, host: &str) -> Result<()>;

    /// Configured remote port
    fn port(&self) -> u16;

    /// Change the remote port, reconnecting if a connection was requested
    fn set_port(&self, port: u16) -> Result<()>;

    /// Connect to the configured endpoint
    fn connect(&self) -> Result<()>;

    /// Store a new endpoint and connect to it
    fn connect_to(&self, host: &str, port: u16) -> Result<()>;

    /// Close the session and stop retrying
    fn disconnect(&self) -> Result<()>;

    /// Send raw bytes; dropped when not connected
    fn send_bytes(&self, command: &[u8]) -> Result<()>;

    /// Send text, one byte per character
    fn send_str(&self, command: &str) -> Result<()> {
        self.send_bytes(&latin1::encode(command))
    }

    /// Send characters, one byte per character
    fn send_chars(&self, command: &[char]) -> Result<()> {
        self.send_bytes(&latin1::encode_chars(command.iter().copied()))
    }

    /// Encode one signal change and send the frame
    ///
    /// The index is checked before anything is sent.
    fn send_signal(&self, index: i32, signal: &Signal) -> Result<()> {
        let frame = xsig::encode(index, signal)?;
        self.send_bytes(&frame)
    }

    /// Register for connectivity, status and response events
    fn subscribe(&self) -> Result<EventReceiver>;
}
