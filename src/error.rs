//! Error types for communicator and signal codec operations
//!
//! Network faults are normally absorbed by the communicator's retry policy and
//! only surface as status events. The variants here that reach a caller are
//! argument faults (bad signal index, bad configuration) and lifecycle faults
//! (use after dispose, no runtime to drive the transport).

use crate::protocol::status::SocketStatus;
use crate::protocol::xsig::SignalKind;
use thiserror::Error;

/// Communicator and codec error types
#[derive(Error, Debug)]
pub enum CommError {
    /// Signal index outside the address range of its signal type
    ///
    /// Raised by every encode function before any byte is produced.
    ///
    /// # Example
    /// ```
    /// # use xsig_link::error::CommError;
    /// # use xsig_link::protocol::xsig::SignalKind;
    /// let err = CommError::InvalidIndex { kind: SignalKind::Digital, index: 4096, max: 4095 };
    /// assert_eq!(err.to_string(), "Invalid digital index 4096 (valid range 0..=4095)");
    /// ```
    #[error("Invalid {kind} index {index} (valid range 0..={max})")]
    InvalidIndex {
        /// Signal type whose address space was violated
        kind: SignalKind,
        /// Offending index
        index: i32,
        /// Highest valid index for `kind`
        max: i32,
    },

    /// The communicator has been disposed
    ///
    /// Every public operation except `dispose` itself fails with this error
    /// once the communicator reached the `Disposed` state.
    #[error("Communicator {id} used after dispose")]
    Disposed {
        /// Identifier of the disposed communicator
        id: String,
    },

    /// No tokio runtime was available to drive the transport
    ///
    /// Occurs when a communicator is built outside a runtime context and no
    /// explicit handle was supplied to the builder.
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    /// Host name resolution failed
    #[error("DNS lookup failed for {host}: {source}")]
    Dns {
        /// Host that failed to resolve
        host: String,
        /// Underlying resolver error
        #[source]
        source: std::io::Error,
    },

    /// TCP connect to a resolved address failed
    #[error("Connect to {addr} failed: {source}")]
    Connect {
        /// Address the connect was attempted against
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// I/O error during an established session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration rejected by the builder
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CommError {
    /// Transport status reported for this error when it ends a connection attempt
    ///
    /// Argument and lifecycle errors have no transport meaning and map to
    /// [`SocketStatus::NoConnect`].
    pub fn status(&self) -> SocketStatus {
        match self {
            CommError::Dns { .. } => SocketStatus::DnsFailed,
            CommError::Connect { .. } => SocketStatus::ConnectFailed,
            CommError::Io(_) => SocketStatus::LinkLost,
            _ => SocketStatus::NoConnect,
        }
    }
}

/// Result type alias for communicator and codec operations
pub type Result<T> = std::result::Result<T, CommError>;
