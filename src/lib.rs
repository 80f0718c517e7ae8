//! Control-system TCP links and XSig signal frames
//!
//! This crate keeps a persistent TCP connection to a control processor and
//! encodes the compact binary "XSig" frames used to drive its digital, analog
//! and serial signals.
//!
//! # Quick Start
//!
//! ```no_run
//! use xsig_link::io::{CommEvent, CommunicatorBuilder, SocketCommunicator};
//! use xsig_link::protocol::xsig::Signal;
//!
//! # async fn example() -> xsig_link::Result<()> {
//! let comm = CommunicatorBuilder::new().tcp("10.0.0.20:1702")?.build()?;
//! let mut events = comm.subscribe()?;
//! comm.connect()?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         CommEvent::ConnectedChanged(true) => comm.send_signal(12, &Signal::Analog(32768))?,
//!         CommEvent::Response(text) => println!("<- {:?}", text),
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Encoding frames without a connection
//!
//! ```
//! use xsig_link::protocol::xsig;
//!
//! let frame = xsig::encode_digital(4095, false)?;
//! assert_eq!(&frame[..], &[0xBF, 0x7E]);
//! # Ok::<(), xsig_link::CommError>(())
//! ```
//!
//! # Architecture
//!
//! - **`protocol`** - XSig codec, Latin-1 text mapping, socket status codes
//! - **`io`** - `TcpCommunicator`, its builder, events, and the transport seam
//! - **`config`** - serde-friendly `CommunicatorConfig`
//! - **`logging`** - debug-level gate in front of a `LogSink` (tracing by default)
//! - **`error`** - `CommError` and the `Result` alias
//!
//! # Connection lifecycle
//!
//! Once `connect` is called the communicator keeps trying: a failed open or a
//! dropped session schedules one retry after a fixed delay (2.5 s by
//! default). `disconnect` stops retrying; `dispose` (or dropping the
//! communicator) releases everything and ends all event streams.

pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod protocol;

pub use error::{CommError, Result};
