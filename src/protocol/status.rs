//! Socket status vocabulary
//!
//! Status changes are published with the numeric code and the name used by
//! control-system socket stacks (`SOCKET_STATUS_*`), so existing consumers can
//! keep matching on the same strings.

use std::fmt;

/// Transport-level socket status
///
/// Discriminants are the wire/status codes reported in
/// [`StatusChange::code`](crate::io::events::StatusChange::code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum SocketStatus {
    /// No connection has been attempted
    #[default]
    NoConnect = 0,
    /// Waiting for a connection
    Waiting = 1,
    /// Connected to the remote endpoint
    Connected = 2,
    /// Connection attempt failed
    ConnectFailed = 3,
    /// Remote side closed the connection
    BrokenRemotely = 4,
    /// Connection closed on this side
    BrokenLocally = 5,
    /// Host name lookup in progress
    DnsLookup = 6,
    /// Host name lookup failed
    DnsFailed = 7,
    /// Host name resolved
    DnsResolved = 8,
    /// Established link was lost
    LinkLost = 9,
    /// Socket does not exist
    SocketNotExist = 10,
}

impl SocketStatus {
    /// All statuses in code order
    pub const ALL: [SocketStatus; 11] = [
        SocketStatus::NoConnect,
        SocketStatus::Waiting,
        SocketStatus::Connected,
        SocketStatus::ConnectFailed,
        SocketStatus::BrokenRemotely,
        SocketStatus::BrokenLocally,
        SocketStatus::DnsLookup,
        SocketStatus::DnsFailed,
        SocketStatus::DnsResolved,
        SocketStatus::LinkLost,
        SocketStatus::SocketNotExist,
    ];

    /// Numeric status code
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Status for a numeric code, if the code is known
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Human-readable status name
    ///
    /// # Examples
    ///
    /// ```
    /// use xsig_link::protocol::status::SocketStatus;
    ///
    /// assert_eq!(SocketStatus::Connected.name(), "SOCKET_STATUS_CONNECTED");
    /// ```
    pub fn name(self) -> &'static str {
        match self {
            SocketStatus::NoConnect => "SOCKET_STATUS_NO_CONNECT",
            SocketStatus::Waiting => "SOCKET_STATUS_WAITING",
            SocketStatus::Connected => "SOCKET_STATUS_CONNECTED",
            SocketStatus::ConnectFailed => "SOCKET_STATUS_CONNECT_FAILED",
            SocketStatus::BrokenRemotely => "SOCKET_STATUS_BROKEN_REMOTELY",
            SocketStatus::BrokenLocally => "SOCKET_STATUS_BROKEN_LOCALLY",
            SocketStatus::DnsLookup => "SOCKET_STATUS_DNS_LOOKUP",
            SocketStatus::DnsFailed => "SOCKET_STATUS_DNS_FAILED",
            SocketStatus::DnsResolved => "SOCKET_STATUS_DNS_RESOLVED",
            SocketStatus::LinkLost => "SOCKET_STATUS_LINK_LOST",
            SocketStatus::SocketNotExist => "SOCKET_STATUS_SOCKET_NOT_EXIST",
        }
    }

    /// Whether this status means the socket is usable
    pub fn is_connected(self) -> bool {
        self == SocketStatus::Connected
    }
}

impl fmt::Display for SocketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
