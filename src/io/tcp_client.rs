//! Self-healing TCP communicator
//!
//! [`TcpCommunicator`] keeps one logical connection to a control system. Once
//! a connection has been requested it stays requested: failed opens and
//! dropped sessions are retried after a fixed delay until
//! [`disconnect`](SocketCommunicator::disconnect) or
//! [`dispose`](Communicator::dispose).
//!
//! All state lives behind one lock that is never held across an `.await`.
//! Connect attempts, sessions and the retry timer are tasks on the runtime
//! captured at construction; each attempt gets a generation number and
//! callbacks carrying an older generation are ignored.
//!
//! # Examples
//!
//! ```no_run
//! use xsig_link::io::{CommEvent, SocketCommunicator, TcpCommunicator};
//! use xsig_link::config::CommunicatorConfig;
//!
//! # async fn example() -> xsig_link::Result<()> {
//! let comm = TcpCommunicator::new(CommunicatorConfig::new("10.0.0.20", 1702))?;
//! let mut events = comm.subscribe()?;
//! comm.connect()?;
//!
//! while let Some(event) = events.recv().await {
//!     if let CommEvent::ConnectedChanged(true) = event {
//!         comm.send_str("status\r")?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::CommunicatorConfig;
use crate::error::{CommError, Result};
use crate::io::builder::CommunicatorBuilder;
use crate::io::communicator::{Communicator, SocketCommunicator};
use crate::io::events::{CommEvent, EventBus, EventReceiver};
use crate::io::retry::{RetryTimer, RetryToken};
use crate::io::session::{self, SessionEvents, SessionHandle};
use crate::io::state::{ConnectionState, Endpoint};
use crate::io::transport::{Connector, TcpConnector};
use crate::logging::{DebugLevel, Logger};
use crate::protocol::latin1;
use crate::protocol::status::SocketStatus;
use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// TCP communicator with automatic reconnection
pub struct TcpCommunicator<C: Connector = TcpConnector> {
    shared: Arc<Shared<C>>,
}

struct Shared<C: Connector> {
    logger: Logger,
    connector: C,
    runtime: Handle,
    receive_buffer_size: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    state: ConnectionState,
    endpoint: Endpoint,
    connected: bool,
    connection_requested: bool,
    disconnect_requested: bool,
    status: SocketStatus,
    generation: u64,
    attempt: Option<JoinHandle<()>>,
    session: Option<SessionHandle>,
    retry: RetryTimer,
    events: EventBus,
}

impl Inner {
    fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            self.connected = connected;
            self.events.publish(CommEvent::ConnectedChanged(connected));
        }
    }

    fn publish_status(&mut self, status: SocketStatus) {
        self.status = status;
        self.events.publish(CommEvent::StatusChanged(status.into()));
    }

    /// Abandon the in-flight attempt and any session; their callbacks go stale
    fn invalidate(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        if let Some(attempt) = self.attempt.take() {
            attempt.abort();
        }
        self.session.take().is_some()
    }
}

impl TcpCommunicator<TcpConnector> {
    /// Build a communicator from `config` on the current tokio runtime
    ///
    /// Nothing is connected until [`connect`](SocketCommunicator::connect)
    /// is called.
    pub fn new(config: CommunicatorConfig) -> Result<Self> {
        CommunicatorBuilder::from_config(config).build()
    }

    /// Start a [`CommunicatorBuilder`]
    pub fn builder() -> CommunicatorBuilder {
        CommunicatorBuilder::new()
    }
}

impl<C: Connector> TcpCommunicator<C> {
    pub(crate) fn from_parts(
        logger: Logger,
        config: &CommunicatorConfig,
        connector: C,
        runtime: Handle,
    ) -> Self {
        debug!(
            communicator = logger.id(),
            host = %config.host,
            port = config.port,
            retry_delay_ms = config.retry_delay.as_millis() as u64,
            "Communicator created"
        );
        Self {
            shared: Arc::new(Shared {
                logger,
                connector,
                runtime,
                receive_buffer_size: config.receive_buffer_size,
                inner: Mutex::new(Inner {
                    state: ConnectionState::Idle,
                    endpoint: Endpoint::new(config.host.clone(), config.port),
                    connected: false,
                    connection_requested: false,
                    disconnect_requested: false,
                    status: SocketStatus::NoConnect,
                    generation: 0,
                    attempt: None,
                    session: None,
                    retry: RetryTimer::new(config.retry_delay),
                    events: EventBus::default(),
                }),
            }),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.shared.inner.lock().state
    }

    /// Configured endpoint
    pub fn endpoint(&self) -> Endpoint {
        self.shared.inner.lock().endpoint.clone()
    }

    /// Delay between a failure and the next attempt
    pub fn retry_delay(&self) -> Duration {
        self.shared.inner.lock().retry.delay()
    }

    /// Whether a retry is currently scheduled
    pub fn is_retry_pending(&self) -> bool {
        self.shared.inner.lock().retry.is_armed()
    }

    /// Set log verbosity
    pub fn set_level(&self, level: DebugLevel) -> Result<()> {
        let inner = self.shared.inner.lock();
        self.shared.ensure_live(&inner)?;
        self.shared.logger.set_level(level);
        Ok(())
    }
}

impl<C: Connector> Shared<C> {
    fn ensure_live(&self, inner: &Inner) -> Result<()> {
        if inner.state == ConnectionState::Disposed {
            return Err(CommError::Disposed {
                id: self.logger.id().to_string(),
            });
        }
        Ok(())
    }

    /// Tear down whatever exists and start a fresh attempt
    fn connect_locked(self: &Arc<Self>, inner: &mut Inner) {
        let endpoint = inner.endpoint.clone();
        self.close_locked(inner);
        inner.retry.cancel();

        if !endpoint.is_valid() {
            self.logger.error(format_args!(
                "Cannot connect, host is empty or port is 0 ({})",
                endpoint
            ));
            inner.state = ConnectionState::Idle;
            return;
        }

        inner.disconnect_requested = false;
        inner.connection_requested = true;

        self.logger
            .print(format_args!("Connection starting {}...", endpoint));
        self.start_attempt_locked(inner);
    }

    /// Invalidate the current attempt/session, reporting a local close if one
    /// was established
    fn close_locked(&self, inner: &mut Inner) {
        let had_session = inner.invalidate();
        if had_session || inner.connected {
            self.logger.print(format_args!("Connection closing..."));
            inner.set_connected(false);
            self.logger.notice(format_args!(
                "SocketStatus changed {}",
                SocketStatus::BrokenLocally
            ));
            inner.publish_status(SocketStatus::BrokenLocally);
        }
    }

    fn start_attempt_locked(self: &Arc<Self>, inner: &mut Inner) {
        inner.generation = inner.generation.wrapping_add(1);
        let generation = inner.generation;
        inner.state = ConnectionState::Connecting;

        debug!(
            communicator = self.logger.id(),
            endpoint = %inner.endpoint,
            generation = generation,
            "Opening transport"
        );

        let open = self.connector.connect(&inner.endpoint);
        let shared = Arc::clone(self);
        inner.attempt = Some(self.runtime.spawn(async move {
            let result = open.await;
            shared.on_open_result(generation, result);
        }));
    }

    fn on_open_result(self: &Arc<Self>, generation: u64, result: Result<C::Stream>) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Disposed || inner.generation != generation {
            trace!(
                communicator = self.logger.id(),
                generation = generation,
                "Ignoring stale open result"
            );
            return;
        }
        inner.attempt = None;

        match result {
            Ok(stream) => {
                let events: Arc<dyn SessionEvents> = self.clone();
                inner.session = Some(session::spawn(
                    &self.runtime,
                    stream,
                    generation,
                    self.receive_buffer_size,
                    events,
                ));
                inner.state = ConnectionState::Connected;
                self.logger.notice(format_args!(
                    "SocketStatus changed {}",
                    SocketStatus::Connected
                ));
                inner.set_connected(true);
                inner.publish_status(SocketStatus::Connected);
            }
            Err(err) => {
                let status = err.status();
                self.logger
                    .warning(format_args!("Connection to {} failed: {}", inner.endpoint, err));
                self.logger
                    .notice(format_args!("SocketStatus changed {}", status));
                inner.publish_status(status);
                self.schedule_retry_locked(&mut inner);
            }
        }
    }

    fn schedule_retry_locked(self: &Arc<Self>, inner: &mut Inner) {
        if !inner.connection_requested || inner.disconnect_requested || inner.connected {
            inner.retry.cancel();
            inner.state = ConnectionState::Idle;
            return;
        }

        inner.state = ConnectionState::Reconnecting;
        let shared = Arc::downgrade(self);
        inner.retry.arm(&self.runtime, move |token| {
            if let Some(shared) = shared.upgrade() {
                shared.on_retry(token);
            }
        });
        debug!(
            communicator = self.logger.id(),
            delay_ms = inner.retry.delay().as_millis() as u64,
            "Retry scheduled"
        );
    }

    fn on_retry(self: &Arc<Self>, token: RetryToken) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Disposed || !inner.retry.fired(token) {
            return;
        }
        if inner.connected
            || inner.disconnect_requested
            || !inner.connection_requested
            || !inner.endpoint.is_valid()
        {
            inner.state = if inner.connected {
                ConnectionState::Connected
            } else {
                ConnectionState::Idle
            };
            return;
        }

        self.logger.print(format_args!(
            "Connection was not established, retrying..."
        ));
        self.start_attempt_locked(&mut inner);
    }

    fn send(&self, data: &[u8]) -> Result<()> {
        let inner = self.inner.lock();
        self.ensure_live(&inner)?;

        let session = match inner.session.as_ref() {
            Some(session) if inner.connected => session,
            _ => {
                trace!(
                    communicator = self.logger.id(),
                    bytes = data.len(),
                    "Not connected, command dropped"
                );
                return Ok(());
            }
        };

        self.logger.print(format_args!(
            "Sending command -->{}<--",
            latin1::escape_control(data)
        ));
        match session.send(Bytes::copy_from_slice(data)) {
            Ok(()) => trace!(
                communicator = self.logger.id(),
                generation = session.generation(),
                bytes = data.len(),
                "Command queued"
            ),
            Err(e) => self
                .logger
                .exception(&e, format_args!("Failed to queue command")),
        }
        Ok(())
    }

    fn dispose(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Disposed {
            return;
        }
        self.logger.print(format_args!("Disposing"));

        inner.retry.cancel();
        inner.invalidate();
        inner.connected = false;
        inner.connection_requested = false;
        inner.disconnect_requested = true;
        inner.state = ConnectionState::Disposed;
        inner.events.close();
        debug!(communicator = self.logger.id(), "Communicator disposed");
    }
}

impl<C: Connector> SessionEvents for Shared<C> {
    fn on_response(&self, generation: u64, response: String) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Disposed || inner.generation != generation {
            return;
        }
        inner.events.publish(CommEvent::Response(response));
    }

    fn on_closed(self: Arc<Self>, generation: u64, status: SocketStatus, error: Option<CommError>) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Disposed || inner.generation != generation {
            return;
        }
        inner.session = None;

        if let Some(err) = error {
            self.logger
                .exception(&err, format_args!("Connection to {} lost", inner.endpoint));
        }
        self.logger
            .notice(format_args!("SocketStatus changed {}", status));
        inner.set_connected(false);
        inner.publish_status(status);
        self.schedule_retry_locked(&mut inner);
    }
}

impl<C: Connector> Communicator for TcpCommunicator<C> {
    fn id(&self) -> &str {
        self.shared.logger.id()
    }

    fn debug_level(&self) -> DebugLevel {
        self.shared.logger.level()
    }

    fn set_debug_level(&self, level: u16) -> Result<()> {
        match DebugLevel::try_from(level) {
            Ok(level) => self.set_level(level),
            Err(reason) => {
                let inner = self.shared.inner.lock();
                self.shared.ensure_live(&inner)?;
                debug!(communicator = self.id(), reason = %reason, "Debug level ignored");
                Ok(())
            }
        }
    }

    fn is_disposed(&self) -> bool {
        self.shared.inner.lock().state == ConnectionState::Disposed
    }

    fn dispose(&self) {
        self.shared.dispose();
    }
}

impl<C: Connector> SocketCommunicator for TcpCommunicator<C> {
    fn is_connected(&self) -> bool {
        self.shared.inner.lock().connected
    }

    fn connection_status(&self) -> SocketStatus {
        self.shared.inner.lock().status
    }

    fn host(&self) -> String {
        self.shared.inner.lock().endpoint.host.clone()
    }

    fn set_host(&self, host: &str) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        self.shared.ensure_live(&inner)?;
        if inner.endpoint.host == host {
            return Ok(());
        }
        inner.endpoint.host = host.to_string();
        if inner.connection_requested {
            self.shared.connect_locked(&mut inner);
        }
        Ok(())
    }

    fn port(&self) -> u16 {
        self.shared.inner.lock().endpoint.port
    }

    fn set_port(&self, port: u16) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        self.shared.ensure_live(&inner)?;
        if inner.endpoint.port == port {
            return Ok(());
        }
        inner.endpoint.port = port;
        if inner.connection_requested {
            self.shared.connect_locked(&mut inner);
        }
        Ok(())
    }

    fn connect(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        self.shared.ensure_live(&inner)?;
        self.shared.connect_locked(&mut inner);
        Ok(())
    }

    fn connect_to(&self, host: &str, port: u16) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        self.shared.ensure_live(&inner)?;
        inner.endpoint = Endpoint::new(host, port);
        self.shared.connect_locked(&mut inner);
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        self.shared.ensure_live(&inner)?;

        inner.connection_requested = false;
        inner.disconnect_requested = true;
        inner.retry.cancel();
        if inner.connected {
            inner.state = ConnectionState::Disconnecting;
        }
        self.shared.close_locked(&mut inner);
        inner.state = ConnectionState::Idle;
        Ok(())
    }

    fn send_bytes(&self, command: &[u8]) -> Result<()> {
        self.shared.send(command)
    }

    fn subscribe(&self) -> Result<EventReceiver> {
        let mut inner = self.shared.inner.lock();
        self.shared.ensure_live(&inner)?;
        Ok(inner.events.subscribe())
    }
}

impl<C: Connector> Drop for TcpCommunicator<C> {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}

impl<C: Connector> fmt::Debug for TcpCommunicator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("TcpCommunicator")
            .field("id", &self.shared.logger.id())
            .field("endpoint", &inner.endpoint)
            .field("state", &inner.state)
            .field("status", &inner.status)
            .field("subscribers", &inner.events.subscriber_count())
            .finish()
    }
}
