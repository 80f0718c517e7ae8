//! Wire-level vocabulary
//!
//! - [`xsig`] - binary signal frames (digital, analog, serial) and the
//!   single-byte control frames
//! - [`latin1`] - one byte per character text mapping used for commands,
//!   responses and serial payloads
//! - [`status`] - transport status codes reported by a communicator

pub mod latin1;
pub mod status;
pub mod xsig;

pub use status::SocketStatus;
pub use xsig::{Signal, SignalKind};
