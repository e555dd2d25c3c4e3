//! The connection-establishment and datagram seams of a channel.

use std::io::{self, Error, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use async_trait::async_trait;
use tokio::net::{lookup_host, UdpSocket};
use tracing::debug;

/// A datagram association with a single peer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one datagram to the peer.
    async fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// Receives one datagram and the address it came from.
    ///
    /// Must be cancel safe: the channel drops this future whenever another
    /// event wins the select.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// The address datagrams are sent to.
    fn peer_addr(&self) -> SocketAddr;

    /// Releases the association. Called once, before the transport is dropped.
    async fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Opens an outbound datagram association.
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    async fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>>;
}

/// Connected UDP sockets on an ephemeral local port.
#[derive(Default, Debug, Clone, Copy)]
pub struct UdpConnect;

#[async_trait]
impl Connect for UdpConnect {
    async fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>> {
        let peer = match lookup_host((host, port)).await?.next() {
            Some(addr) => addr,
            None => {
                return Err(Error::new(ErrorKind::NotFound, format!("{} did not resolve to any address", host)));
            }
        };

        let local = match peer.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;

        debug!(local = %socket.local_addr()?, peer = %peer, "udp association opened");

        Ok(Box::new(UdpTransport { socket, peer }))
    }
}

pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf).await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
