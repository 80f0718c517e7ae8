//! Transport abstraction
//!
//! A [`Connector`] opens a byte stream to an [`Endpoint`]. The communicator
//! drives it on its runtime and owns the resulting stream for the life of the
//! session. [`TcpConnector`] is the production implementation; tests plug in
//! in-memory streams.

use crate::error::{CommError, Result};
use crate::io::state::Endpoint;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info, warn};

/// Future returned by [`Connector::connect`]
pub type ConnectFuture<S> = Pin<Box<dyn Future<Output = Result<S>> + Send + 'static>>;

/// Opens transport sessions
///
/// Failures should be reported as [`CommError::Dns`] or
/// [`CommError::Connect`] so the communicator can publish the matching
/// socket status.
pub trait Connector: Send + Sync + 'static {
    /// Stream type of an established session
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Begin opening a session to `endpoint`
    fn connect(&self, endpoint: &Endpoint) -> ConnectFuture<Self::Stream>;
}

/// Plain TCP connector
///
/// Resolves the host, tries each resolved address in order, and applies
/// socket options to the first stream that connects.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    nodelay: bool,
    recv_buffer_size: Option<usize>,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            nodelay: true,
            recv_buffer_size: None,
        }
    }
}

impl TcpConnector {
    /// Connector with `TCP_NODELAY` on and the OS default receive buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable `TCP_NODELAY`
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Request a receive buffer size (`SO_RCVBUF`)
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    async fn resolve(endpoint: &Endpoint) -> Result<Vec<SocketAddr>> {
        debug!(host = %endpoint.host, port = endpoint.port, "Resolving host");
        let addrs: Vec<SocketAddr> = lookup_host((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|source| CommError::Dns {
                host: endpoint.host.clone(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(CommError::Dns {
                host: endpoint.host.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "host resolved to no addresses",
                ),
            });
        }
        Ok(addrs)
    }

    fn configure(stream: &TcpStream, nodelay: bool, recv_buffer_size: Option<usize>) {
        if let Err(e) = stream.set_nodelay(nodelay) {
            warn!(error = %e, "Failed to set TCP_NODELAY");
        }
        if let Some(size) = recv_buffer_size {
            if let Err(e) = set_recv_buffer_size(stream, size) {
                warn!(error = %e, size = size, "Failed to set SO_RCVBUF");
            }
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, endpoint: &Endpoint) -> ConnectFuture<TcpStream> {
        let endpoint = endpoint.clone();
        let nodelay = self.nodelay;
        let recv_buffer_size = self.recv_buffer_size;

        Box::pin(async move {
            let addrs = Self::resolve(&endpoint).await?;
            let mut last_err = None;

            for addr in addrs {
                match TcpStream::connect(addr).await {
                    Ok(stream) => {
                        Self::configure(&stream, nodelay, recv_buffer_size);
                        info!(
                            remote_addr = %addr,
                            local_addr = ?stream.local_addr().ok(),
                            "TCP connection established"
                        );
                        return Ok(stream);
                    }
                    Err(source) => {
                        debug!(remote_addr = %addr, error = %source, "Connect attempt failed");
                        last_err = Some(CommError::Connect {
                            addr: addr.to_string(),
                            source,
                        });
                    }
                }
            }

            Err(last_err.unwrap_or_else(|| CommError::Connect {
                addr: endpoint.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no address to connect to",
                ),
            }))
        })
    }
}

#[cfg(unix)]
fn set_recv_buffer_size(stream: &TcpStream, size: usize) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let fd = stream.as_raw_fd();
    let size = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);

    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &size as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };

    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_recv_buffer_size(_stream: &TcpStream, _size: usize) -> std::io::Result<()> {
    Ok(())
}
