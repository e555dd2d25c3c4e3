use std::net::{Ipv4Addr, SocketAddr};
use dnschan::message::Message;
use dnschan::{decode_message, encode_message, Record, RecordData};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};

/// A resolver on a loopback socket that answers through a closure.
///
/// Every decoded query is reported on `seen` after the replies are sent.
pub struct MockResolver {
    addr: SocketAddr,
    pub seen: mpsc::UnboundedReceiver<Message>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockResolver {
    pub async fn start<F>(mut reply: F) -> Self
    where
        F: FnMut(&Message) -> Vec<Vec<u8>> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let (seen_tx, seen) = mpsc::unbounded_channel();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        let Ok(query) = decode_message(&buf[..len]) else { continue };

                        for datagram in reply(&query) {
                            let _ = socket.send_to(&datagram, peer).await;
                        }

                        let _ = seen_tx.send(query);
                    }
                }
            }
        });

        Self {
            addr,
            seen,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Answers every query with one A record.
    pub async fn answering() -> Self {
        Self::start(|query| vec![answer_a(query, Ipv4Addr::new(93, 184, 216, 34))]).await
    }

    /// Reads queries and never replies.
    pub async fn silent() -> Self {
        Self::start(|_| Vec::new()).await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for MockResolver {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn answer_a(query: &Message, addr: Ipv4Addr) -> Vec<u8> {
    let mut res = Message::response_to(query);
    res.answers.push(Record::new(&query.questions[0].domain, 300, RecordData::A(addr)));

    encode_message(&res).unwrap()
}
