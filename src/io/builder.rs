//! Fluent builder for communicators
//!
//! Collects a [`CommunicatorConfig`], an optional log sink and an optional
//! runtime handle, validates them, and produces a [`TcpCommunicator`].
//!
//! # Examples
//!
//! ```no_run
//! use xsig_link::io::builder::CommunicatorBuilder;
//! use xsig_link::logging::DebugLevel;
//! use std::time::Duration;
//!
//! # async fn example() -> xsig_link::Result<()> {
//! let comm = CommunicatorBuilder::new()
//!     .id("rack-a")
//!     .tcp("10.0.0.20:1702")?
//!     .debug_level(DebugLevel::LoggingEnabled)
//!     .retry_delay(Duration::from_secs(5))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::config::CommunicatorConfig;
use crate::error::{CommError, Result};
use crate::io::tcp_client::TcpCommunicator;
use crate::io::transport::{Connector, TcpConnector};
use crate::logging::{DebugLevel, LogSink, Logger, TracingSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use uuid::Uuid;

/// Builder for [`TcpCommunicator`]
pub struct CommunicatorBuilder {
    config: CommunicatorConfig,
    sink: Option<Arc<dyn LogSink>>,
    runtime: Option<Handle>,
}

impl CommunicatorBuilder {
    /// Builder with default configuration and no endpoint
    pub fn new() -> Self {
        Self::from_config(CommunicatorConfig::default())
    }

    /// Builder seeded from an existing configuration
    pub fn from_config(config: CommunicatorConfig) -> Self {
        Self {
            config,
            sink: None,
            runtime: None,
        }
    }

    /// Identifier used as the log prefix
    ///
    /// A random UUID is generated when none is set.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = Some(id.into());
        self
    }

    /// Remote host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Remote port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Remote endpoint as `"host:port"`
    ///
    /// # Errors
    ///
    /// [`CommError::InvalidConfig`] when the address has no port, an empty
    /// host or a non-numeric port.
    pub fn tcp(mut self, addr: &str) -> Result<Self> {
        let (host, port) = parse_addr(addr)?;
        self.config.host = host;
        self.config.port = port;
        Ok(self)
    }

    /// Log verbosity
    pub fn debug_level(mut self, level: DebugLevel) -> Self {
        self.config.debug_level = level;
        self
    }

    /// Delay between a failure and the next attempt
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Size of each read before a response is dispatched
    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.config.receive_buffer_size = size;
        self
    }

    /// `TCP_NODELAY` on the socket
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Destination for log output (default: [`TracingSink`])
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runtime that drives the transport (default: the current runtime)
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build a TCP communicator
    ///
    /// # Errors
    ///
    /// - [`CommError::InvalidConfig`] for a zero retry delay or buffer size
    /// - [`CommError::NoRuntime`] outside a tokio runtime when no handle was given
    pub fn build(self) -> Result<TcpCommunicator> {
        let connector = TcpConnector::new()
            .nodelay(self.config.nodelay)
            .recv_buffer_size(self.config.receive_buffer_size);
        self.build_with_connector(connector)
    }

    /// Build a communicator over a custom transport
    pub fn build_with_connector<C: Connector>(self, connector: C) -> Result<TcpCommunicator<C>> {
        if self.config.retry_delay.is_zero() {
            return Err(CommError::InvalidConfig(
                "retry delay must be non-zero".to_string(),
            ));
        }
        if self.config.receive_buffer_size == 0 {
            return Err(CommError::InvalidConfig(
                "receive buffer size must be non-zero".to_string(),
            ));
        }

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| CommError::NoRuntime(e.to_string()))?,
        };

        let id = self
            .config
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        let logger = Logger::new(id, self.config.debug_level, sink);

        Ok(TcpCommunicator::from_parts(
            logger,
            &self.config,
            connector,
            runtime,
        ))
    }
}

impl Default for CommunicatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `"host:port"`, taking the last colon as the separator
fn parse_addr(addr: &str) -> Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| CommError::InvalidConfig(format!("Invalid address format: {}", addr)))?;

    let port = port
        .parse::<u16>()
        .map_err(|e| CommError::InvalidConfig(format!("Invalid port number: {}", e)))?;

    if host.is_empty() {
        return Err(CommError::InvalidConfig(
            "Hostname cannot be empty".to_string(),
        ));
    }

    Ok((host.to_string(), port))
}
