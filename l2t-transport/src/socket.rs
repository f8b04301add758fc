//! UDP socket construction for a single exchange.
//!
//! An exchange talks through one of two socket shapes:
//! - [`SocketMode::Connected`]: bound to the peer with `connect()`, so the
//!   kernel filters foreign datagrams and surfaces ICMP unreachable as a read
//!   error.  Used when the reply is expected from the addressed host.
//! - [`SocketMode::Listening`]: unconnected, receives from anyone.  Used when
//!   the reply may come from a different address than the one addressed
//!   (NAT, multi-homed switches); the caller filters sources.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use thiserror::Error;
use tokio::net::UdpSocket;

/// Largest datagram read in one call.  L2T messages are far smaller.
pub const MAX_DATAGRAM: usize = 65_535;

/// Errors that end an exchange.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("cannot create socket toward {dest}: {source}")]
    Socket {
        dest: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("cannot resolve local address toward {dest}: {source}")]
    Route {
        dest: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("send to {dest} failed: {source}")]
    Write {
        dest: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("short write to {dest}: sent {sent} of {expected} bytes")]
    ShortWrite {
        dest: SocketAddr,
        sent: usize,
        expected: usize,
    },
    #[error("receive from {dest} failed: {source}")]
    Read {
        dest: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("no reply from {dest} within {elapsed:?}")]
    Timeout {
        dest: SocketAddr,
        elapsed: std::time::Duration,
    },
}

impl TransportError {
    /// Timeouts are the ordinary "nobody answered" outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Shape of the socket used for an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketMode {
    Connected,
    Listening,
}

impl SocketMode {
    /// Pick the socket shape for a destination and an optional expected
    /// reply source.
    pub fn select(dest: SocketAddr, expected_reply_from: Option<IpAddr>) -> Self {
        match expected_reply_from {
            Some(ip) if ip == dest.ip() => SocketMode::Connected,
            _ => SocketMode::Listening,
        }
    }
}

impl std::fmt::Display for SocketMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketMode::Connected => write!(f, "connected"),
            SocketMode::Listening => write!(f, "listening"),
        }
    }
}

fn unspecified(dest: &SocketAddr) -> IpAddr {
    match dest {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    }
}

/// Ask the OS which local address it would use to reach `dest`.
///
/// Connecting a UDP socket only consults the routing table, nothing is sent.
pub async fn local_addr_for(dest: SocketAddr) -> Result<IpAddr, TransportError> {
    let route_err = |source| TransportError::Route { dest, source };
    let probe = UdpSocket::bind(SocketAddr::new(unspecified(&dest), 0))
        .await
        .map_err(route_err)?;
    probe.connect(dest).await.map_err(route_err)?;
    Ok(probe.local_addr().map_err(route_err)?.ip())
}

/// The socket owned by one exchange.
#[derive(Debug)]
pub struct ExchangeSocket {
    inner: UdpSocket,
    mode: SocketMode,
    dest: SocketAddr,
    local_addr: SocketAddr,
}

impl ExchangeSocket {
    /// Open a socket of the given shape.  `local_ip` is the address the
    /// route lookup picked; connected sockets bind to it, listening sockets
    /// bind to the wildcard so replies arriving on any interface are seen.
    pub async fn open(
        mode: SocketMode,
        local_ip: IpAddr,
        dest: SocketAddr,
    ) -> Result<Self, TransportError> {
        let socket_err = |source| TransportError::Socket { dest, source };
        let inner = match mode {
            SocketMode::Connected => {
                let sock = UdpSocket::bind(SocketAddr::new(local_ip, 0))
                    .await
                    .map_err(socket_err)?;
                sock.connect(dest).await.map_err(socket_err)?;
                sock
            }
            SocketMode::Listening => UdpSocket::bind(SocketAddr::new(unspecified(&dest), 0))
                .await
                .map_err(socket_err)?,
        };
        let bound = inner.local_addr().map_err(socket_err)?;
        // A wildcard bind reports 0.0.0.0; callers want the routed address.
        let local_addr = SocketAddr::new(local_ip, bound.port());
        log::debug!("[socket] opened {mode} socket {bound} -> {dest}");
        Ok(Self {
            inner,
            mode,
            dest,
            local_addr,
        })
    }

    pub fn mode(&self) -> SocketMode {
        self.mode
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transmit the whole payload as one datagram.
    pub async fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let dest = self.dest;
        let sent = match self.mode {
            SocketMode::Connected => self.inner.send(payload).await,
            SocketMode::Listening => self.inner.send_to(payload, dest).await,
        }
        .map_err(|source| TransportError::Write { dest, source })?;
        if sent != payload.len() {
            return Err(TransportError::ShortWrite {
                dest,
                sent,
                expected: payload.len(),
            });
        }
        Ok(())
    }

    /// Receive one datagram into `buf`, returning its length and source.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        let dest = self.dest;
        let received = match self.mode {
            SocketMode::Connected => self.inner.recv(buf).await.map(|n| (n, dest)),
            SocketMode::Listening => self.inner.recv_from(buf).await,
        };
        received.map_err(|source| TransportError::Read { dest, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest() -> SocketAddr {
        "192.0.2.10:2228".parse().unwrap()
    }

    #[test]
    fn connected_when_reply_expected_from_destination() {
        let ip: IpAddr = "192.0.2.10".parse().unwrap();
        assert_eq!(SocketMode::select(dest(), Some(ip)), SocketMode::Connected);
    }

    #[test]
    fn listening_when_reply_source_differs() {
        let ip: IpAddr = "198.51.100.1".parse().unwrap();
        assert_eq!(SocketMode::select(dest(), Some(ip)), SocketMode::Listening);
    }

    #[test]
    fn listening_when_any_source_accepted() {
        assert_eq!(SocketMode::select(dest(), None), SocketMode::Listening);
    }

    #[tokio::test]
    async fn loopback_route_uses_loopback() {
        let local = local_addr_for("127.0.0.1:2228".parse().unwrap())
            .await
            .unwrap();
        assert!(local.is_loopback());
    }

    #[tokio::test]
    async fn listening_socket_reports_routed_address() {
        let dest: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let local = "127.0.0.1".parse().unwrap();
        let sock = ExchangeSocket::open(SocketMode::Listening, local, dest)
            .await
            .unwrap();
        assert_eq!(sock.local_addr().ip(), local);
        assert_ne!(sock.local_addr().port(), 0);
        assert_eq!(sock.mode(), SocketMode::Listening);
        assert_eq!(sock.dest(), dest);
    }

    #[test]
    fn timeout_is_classified() {
        let err = TransportError::Timeout {
            dest: dest(),
            elapsed: std::time::Duration::from_secs(1),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("192.0.2.10:2228"));
    }
}
