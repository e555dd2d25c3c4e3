use std::io::{self, Error, ErrorKind};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use dnschan::{Connect, Transport, UdpConnect};
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};

/// Holds establishment until the gate is opened, then connects over UDP or
/// fails with `ConnectionRefused`.
pub struct GatedConnect {
    pub gate: Arc<Notify>,
    fail: bool,
}

impl GatedConnect {
    pub fn succeeding() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());

        (Self { gate: gate.clone(), fail: false }, gate)
    }

    pub fn failing() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());

        (Self { gate: gate.clone(), fail: true }, gate)
    }
}

#[async_trait]
impl Connect for GatedConnect {
    async fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>> {
        self.gate.notified().await;

        if self.fail {
            return Err(Error::new(ErrorKind::ConnectionRefused, "resolver refused the association"));
        }

        UdpConnect.connect(host, port).await
    }
}

/// The test side of an in-memory transport.
pub struct MemoryPeer {
    pub peer: SocketAddr,
    pub sent: mpsc::UnboundedReceiver<Vec<u8>>,
    pub inbound: mpsc::UnboundedSender<(Vec<u8>, SocketAddr)>,
}

struct MemoryTransport {
    peer: SocketAddr,
    fail_sends: bool,
    sent: mpsc::UnboundedSender<Vec<u8>>,
    inbound: AsyncMutex<mpsc::UnboundedReceiver<(Vec<u8>, SocketAddr)>>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_sends {
            return Err(Error::new(ErrorKind::Other, "send path is down"));
        }

        let _ = self.sent.send(buf.to_vec());

        Ok(buf.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut inbound = self.inbound.lock().await;

        match inbound.recv().await {
            Some((datagram, from)) => {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);

                Ok((n, from))
            },
            None => std::future::pending().await,
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

/// Hands out a single in-memory transport.
pub struct MemoryConnect {
    transport: Mutex<Option<MemoryTransport>>,
}

impl MemoryConnect {
    pub fn new(fail_sends: bool) -> (Self, MemoryPeer) {
        let peer: SocketAddr = "192.0.2.53:53".parse().unwrap();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let transport = MemoryTransport {
            peer,
            fail_sends,
            sent: sent_tx,
            inbound: AsyncMutex::new(inbound_rx),
        };

        (
            Self { transport: Mutex::new(Some(transport)) },
            MemoryPeer { peer, sent: sent_rx, inbound: inbound_tx },
        )
    }
}

#[async_trait]
impl Connect for MemoryConnect {
    async fn connect(&self, _host: &str, _port: u16) -> io::Result<Box<dyn Transport>> {
        match self.transport.lock().unwrap().take() {
            Some(transport) => Ok(Box::new(transport)),
            None => Err(Error::new(ErrorKind::AddrInUse, "memory transport already taken")),
        }
    }
}
