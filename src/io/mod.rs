//! Connection management for control-system links
//!
//! [`TcpCommunicator`] owns one self-healing TCP connection: it connects on
//! request, retries on a fixed delay after failures, dispatches every received
//! chunk as a response event and writes commands byte-for-byte.

pub mod builder;
pub mod communicator;
pub mod events;
mod retry;
mod session;
pub mod state;
pub mod tcp_client;
pub mod transport;

pub use builder::CommunicatorBuilder;
pub use communicator::{Communicator, SocketCommunicator};
pub use events::{CommEvent, EventReceiver, StatusChange};
pub use state::{ConnectionState, Endpoint};
pub use tcp_client::TcpCommunicator;
pub use transport::{ConnectFuture, Connector, TcpConnector};
