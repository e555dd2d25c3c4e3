//! A resolver channel: one UDP association and the queries in flight on it.
//!
//! All channel state lives in a single driver task. [`ChannelHandle`]s only
//! post commands to that task, so nothing inside the channel is locked and
//! every callback runs on the driver.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::select;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};
use crate::codec::{decode_message, encode_query};
use crate::error::Error;
use crate::message::Message;
use crate::query_table::QueryTable;
use crate::question::Question;
use crate::record::Record;
use crate::record_type::RecordType;
use crate::result_code::ResultCode;
use crate::timer::TimerHandle;
use crate::transport::{Connect, Transport, UdpConnect};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 4096;

pub type CompletionFn = Box<dyn FnOnce(Result<QueryResult, Error>) + Send>;
pub type ConnectedFn = Box<dyn FnOnce(Result<(), Error>) + Send>;
pub type DestroyedFn = Box<dyn FnOnce() + Send>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Connected,
    ShuttingDown,
    Destroyed,
}

impl Display for ChannelState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Connected => write!(f, "connected"),
            ChannelState::ShuttingDown => write!(f, "shutting down"),
            ChannelState::Destroyed => write!(f, "destroyed"),
        }
    }
}

pub struct ChannelOptions {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub max_datagram_size: usize,
    on_initial_connection: Option<ConnectedFn>,
    on_destroyed: Option<DestroyedFn>,
}

impl ChannelOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            on_initial_connection: None,
            on_destroyed: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;

        self
    }

    pub fn with_max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size;

        self
    }

    /// Called once the association is up, or with the reason it could not be
    /// opened. Not called if the channel is destroyed before either happens.
    pub fn on_initial_connection<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Result<(), Error>) + Send + 'static,
    {
        self.on_initial_connection = Some(Box::new(f));

        self
    }

    /// Called exactly once, after every query has completed and the
    /// association is closed.
    pub fn on_destroyed<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_destroyed = Some(Box::new(f));

        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidOptions("host is empty".to_string()));
        }

        if self.port == 0 {
            return Err(Error::InvalidOptions("port must not be 0".to_string()));
        }

        if self.timeout.is_zero() {
            return Err(Error::InvalidOptions("timeout must not be zero".to_string()));
        }

        if self.max_datagram_size < 512 {
            return Err(Error::InvalidOptions(format!(
                "max datagram size {} is below 512",
                self.max_datagram_size
            )));
        }

        Ok(())
    }
}

pub struct Query {
    pub hostname: String,
    pub record_type: RecordType,
    on_completed: CompletionFn,
}

impl Query {
    pub fn new<F>(hostname: impl Into<String>, record_type: RecordType, on_completed: F) -> Self
    where
        F: FnOnce(Result<QueryResult, Error>) + Send + 'static,
    {
        Self {
            hostname: hostname.into(),
            record_type,
            on_completed: Box::new(on_completed),
        }
    }

    fn fail(self, err: Error) {
        (self.on_completed)(Err(err))
    }
}

/// A decoded response delivered to a query's callback.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub id: u16,
    pub rcode: ResultCode,
    pub truncated: bool,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
    pub elapsed: Duration,
}

impl QueryResult {
    fn from(message: Message, elapsed: Duration) -> Self {
        Self {
            id: message.header.id,
            rcode: message.header.code,
            truncated: message.header.truncation,
            answers: message.answers,
            authorities: message.authorities,
            additionals: message.additionals,
            elapsed,
        }
    }
}

enum Command {
    Query(Query),
    Timeout { id: u16, seq: u64 },
    Destroy,
}

struct PendingQuery {
    seq: u64,
    question: Question,
    on_completed: CompletionFn,
    timer: TimerHandle,
    submitted: Instant,
}

impl PendingQuery {
    fn complete(self, result: Result<QueryResult, Error>) {
        self.timer.cancel();
        (self.on_completed)(result)
    }
}

/// Cheap, cloneable access to a running channel.
///
/// Dropping every handle without calling [`ChannelHandle::destroy`] destroys
/// the channel as well.
#[derive(Clone)]
pub struct ChannelHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ChannelState>,
}

impl ChannelHandle {
    /// Submits a query. The result is only ever delivered to its callback.
    pub fn make_query(&self, query: Query) {
        if let Err(mpsc::error::SendError(Command::Query(query))) = self.commands.send(Command::Query(query)) {
            query.fail(Error::NotConnected);
        }
    }

    pub async fn lookup(&self, hostname: &str, record_type: RecordType) -> Result<QueryResult, Error> {
        let (tx, rx) = oneshot::channel();

        self.make_query(Query::new(hostname, record_type, move |res| {
            let _ = tx.send(res);
        }));

        rx.await.unwrap_or(Err(Error::NotConnected))
    }

    /// Starts shutdown. Completion is signalled through `on_destroyed`.
    pub fn destroy(&self) {
        let _ = self.commands.send(Command::Destroy);
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Waits until the channel is destroyed and `on_destroyed` has run.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|state| *state == ChannelState::Destroyed).await;
    }
}

/// The driver owning a channel's association and query table.
pub struct Channel {
    host: String,
    port: u16,
    timeout: Duration,
    max_datagram_size: usize,
    state: watch::Sender<ChannelState>,
    table: QueryTable<PendingQuery>,
    queued: VecDeque<Query>,
    next_seq: u64,
    events: mpsc::WeakUnboundedSender<Command>,
    on_initial_connection: Option<ConnectedFn>,
    on_destroyed: Option<DestroyedFn>,
}

impl Channel {
    /// Opens a channel over UDP. Must be called from within a tokio runtime.
    pub fn new(options: ChannelOptions) -> Result<ChannelHandle, Error> {
        Self::with_connector(options, UdpConnect)
    }

    pub fn with_connector<C: Connect>(options: ChannelOptions, connector: C) -> Result<ChannelHandle, Error> {
        options.validate()?;
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);

        let span = info_span!("channel", peer = %format!("{}:{}", options.host, options.port));

        let channel = Channel {
            host: options.host,
            port: options.port,
            timeout: options.timeout,
            max_datagram_size: options.max_datagram_size,
            state: state_tx,
            table: QueryTable::new(),
            queued: VecDeque::new(),
            next_seq: 0,
            events: tx.downgrade(),
            on_initial_connection: options.on_initial_connection,
            on_destroyed: options.on_destroyed,
        };

        runtime.spawn(channel.run(Arc::new(connector), rx).instrument(span));

        Ok(ChannelHandle {
            commands: tx,
            state: state_rx,
        })
    }

    async fn run(mut self, connector: Arc<dyn Connect>, mut commands: mpsc::UnboundedReceiver<Command>) {
        if let Some(transport) = self.establish(connector.as_ref(), &mut commands).await {
            self.serve(transport.as_ref(), &mut commands).await;
            self.shutdown(transport).await;
        }

        self.finish(commands);
    }

    fn set_state(&mut self, state: ChannelState) {
        info!("channel {}", state);
        self.state.send_replace(state);
    }

    /// Waits for the association while queueing queries in arrival order.
    async fn establish(
        &mut self,
        connector: &dyn Connect,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Option<Box<dyn Transport>> {
        let host = self.host.clone();
        let connect = connector.connect(&host, self.port);
        tokio::pin!(connect);

        loop {
            select! {
                // a queued destroy wins over a connect that completes in the same poll
                biased;

                cmd = commands.recv() => match cmd {
                    Some(Command::Query(query)) => {
                        debug!(name = %query.hostname, "queueing query until connected");
                        self.queued.push_back(query);
                    },
                    Some(Command::Timeout { .. }) => {},
                    Some(Command::Destroy) | None => {
                        self.set_state(ChannelState::ShuttingDown);
                        // dropping `connect` aborts the establishment
                        self.on_initial_connection = None;
                        for query in self.queued.drain(..) {
                            query.fail(Error::Interrupted);
                        }

                        return None;
                    }
                },
                res = &mut connect => match res {
                    Ok(transport) => {
                        self.set_state(ChannelState::Connected);
                        if let Some(on_connected) = self.on_initial_connection.take() {
                            on_connected(Ok(()));
                        }

                        return Some(transport);
                    },
                    Err(e) => {
                        error!("failed to open association: {}", e);
                        let err = Error::from(e);

                        if let Some(on_connected) = self.on_initial_connection.take() {
                            on_connected(Err(err.clone()));
                        }
                        for query in self.queued.drain(..) {
                            query.fail(err.clone());
                        }

                        return None;
                    }
                }
            }
        }
    }

    async fn serve(&mut self, transport: &dyn Transport, commands: &mut mpsc::UnboundedReceiver<Command>) {
        let mut buf = vec![0u8; self.max_datagram_size];

        while let Some(query) = self.queued.pop_front() {
            self.submit(transport, query).await;
        }

        loop {
            select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Query(query)) => self.submit(transport, query).await,
                    Some(Command::Timeout { id, seq }) => self.on_timeout(id, seq),
                    Some(Command::Destroy) | None => return,
                },
                res = transport.recv(&mut buf) => match res {
                    Ok((n, from)) => self.on_datagram(&buf[..n], from, transport.peer_addr()),
                    Err(e) if is_transient(&e) => {
                        warn!("receive failed: {}", e);
                    },
                    Err(e) => {
                        error!("receive path broken, failing {} pending queries: {}", self.table.len(), e);
                        let err = Error::from(e);
                        for pending in self.table.drain_all() {
                            pending.complete(Err(err.clone()));
                        }

                        return;
                    }
                }
            }
        }
    }

    async fn submit(&mut self, transport: &dyn Transport, query: Query) {
        let id = match self.table.free_id() {
            Some(id) => id,
            None => {
                warn!(name = %query.hostname, "no free transaction id");
                query.fail(Error::IdsExhausted);

                return;
            }
        };

        let bytes = match encode_query(&query.hostname, query.record_type, id) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(name = %query.hostname, "cannot encode query: {}", e);
                query.fail(Error::Encode(e));

                return;
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        let pending = PendingQuery {
            seq,
            question: Question::new(&query.hostname, query.record_type),
            on_completed: query.on_completed,
            timer: self.arm_timeout(id, seq),
            submitted: Instant::now(),
        };

        debug!(id, name = %query.hostname, rtype = %query.record_type, "submitting query");
        self.table
            .insert(id, pending)
            .expect("free_id returned a transaction id that is in flight");

        trace!(id, len = bytes.len(), "sending datagram");
        if let Err(e) = transport.send(&bytes).await {
            warn!(id, "send failed: {}", e);

            if let Some(pending) = self.table.take(id) {
                pending.complete(Err(Error::from(e)));
            }
        }
    }

    fn arm_timeout(&self, id: u16, seq: u64) -> TimerHandle {
        let events = self.events.clone();

        TimerHandle::arm(self.timeout, move || {
            if let Some(events) = events.upgrade() {
                let _ = events.send(Command::Timeout { id, seq });
            }
        })
    }

    fn on_timeout(&mut self, id: u16, seq: u64) {
        // the id may have been completed and handed to a newer query since
        if self.table.get(id).map(|pending| pending.seq) != Some(seq) {
            return;
        }

        if let Some(pending) = self.table.take(id) {
            debug!(id, name = %pending.question.domain, "query timed out");
            pending.complete(Err(Error::Timeout));
        }
    }

    fn on_datagram(&mut self, buf: &[u8], from: SocketAddr, peer: SocketAddr) {
        trace!(len = buf.len(), %from, "datagram received");

        if from != peer {
            warn!(%from, "discarding datagram from unexpected source");

            return;
        }

        let message = match decode_message(buf) {
            Ok(message) => message,
            Err(e) => {
                warn!("discarding malformed datagram: {}", e);

                return;
            }
        };

        let id = message.header.id;
        if !message.header.response {
            warn!(id, "discarding datagram without the response flag");

            return;
        }

        let answers_question = match self.table.get(id) {
            Some(pending) => message.questions.first().is_some_and(|q| q.matches(&pending.question)),
            None => {
                debug!(id, "discarding response for unknown transaction id");

                return;
            }
        };

        if !answers_question {
            warn!(id, "discarding response whose question does not match");

            return;
        }

        if let Some(pending) = self.table.take(id) {
            let elapsed = pending.submitted.elapsed();
            debug!(
                id,
                name = %pending.question.domain,
                rcode = %message.header.code,
                answers = message.answers.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "query answered"
            );

            pending.complete(Ok(QueryResult::from(message, elapsed)));
        }
    }

    async fn shutdown(&mut self, transport: Box<dyn Transport>) {
        self.set_state(ChannelState::ShuttingDown);

        let pending = self.table.drain_all();
        if !pending.is_empty() {
            info!("interrupting {} pending queries", pending.len());
        }
        for pending in pending {
            pending.complete(Err(Error::Interrupted));
        }

        if let Err(e) = transport.close().await {
            warn!("closing association failed: {}", e);
        }
    }

    /// Rejects anything still addressed to the channel, then reports it gone.
    fn finish(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        commands.close();
        while let Ok(cmd) = commands.try_recv() {
            if let Command::Query(query) = cmd {
                query.fail(Error::NotConnected);
            }
        }

        if let Some(on_destroyed) = self.on_destroyed.take() {
            on_destroyed();
        }

        self.set_state(ChannelState::Destroyed);
    }
}

fn is_transient(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;

    // ICMP errors surface on connected UDP sockets as refused/reset
    matches!(
        err.kind(),
        ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset | ErrorKind::Interrupted | ErrorKind::WouldBlock
    )
}
