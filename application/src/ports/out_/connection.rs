use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;

use domain::PeerId;

/// Outbound half of a participant's connection.
pub trait ConnectionSink: Send + 'static {
    /// Queues `text` for delivery. Never blocks; a peer that is already gone just misses it.
    fn send(
        &self,
        text: String,
    );
}

impl ConnectionSink for mpsc::UnboundedSender<String> {
    fn send(
        &self,
        text: String,
    ) {
        let _ = mpsc::UnboundedSender::send(self, text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Message(String),
    Closed,
    Errored(String),
}

/// Next arrival stamp. Held while an event is stamped and queued, so stamps reach the channels in order.
static ARRIVALS: Mutex<u64> = Mutex::new(0);

/// Position of an event in the process-wide order in which transports reported them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Arrival(u64);

impl Arrival {
    /// Issues the next arrival to `queue`. No other arrival is issued until `queue` returns.
    fn stamp<T>(queue: impl FnOnce(Self) -> T) -> T {
        let mut next = ARRIVALS.lock().unwrap_or_else(PoisonError::into_inner);
        let arrival = Self(*next);
        *next += 1;
        queue(arrival)
    }

    /// An arrival later than every event already queued.
    pub(crate) fn now() -> Self {
        Self::stamp(|arrival| arrival)
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<(Arrival, ConnectionEvent)>;

/// Transport side of a participant's event stream. Every event is stamped with its [`Arrival`] as it is
/// sent, so a session reading two streams can put them back in the order they came in.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: mpsc::UnboundedSender<(Arrival, ConnectionEvent)>,
}

impl EventSender {
    pub fn send(
        &self,
        event: ConnectionEvent,
    ) -> Result<(), SendError<ConnectionEvent>> {
        Arrival::stamp(|arrival| self.inner.send((arrival, event)))
            .map_err(|SendError((_, event))| SendError(event))
    }
}

/// What the core gets from the transport for one participant: a way to talk to them and the ordered
/// stream of what they did.
pub struct Connection<S> {
    peer: PeerId,
    sink: S,
    events: EventReceiver,
}

/// The transport's side of a [`Connection`] built by [`Connection::pipe`].
pub struct TransportEnd {
    pub outbound: mpsc::UnboundedReceiver<String>,
    pub events: EventSender,
}

impl<S: ConnectionSink> Connection<S> {
    #[must_use]
    pub fn new(
        peer: PeerId,
        sink: S,
        events: EventReceiver,
    ) -> Self {
        Self { peer, sink, events }
    }

    #[must_use]
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub(crate) fn into_parts(self) -> (S, EventReceiver) {
        (self.sink, self.events)
    }
}

impl Connection<mpsc::UnboundedSender<String>> {
    /// A channel-backed connection. The transport writes what arrives on `outbound` to the wire and
    /// reports what it reads through `events`.
    #[must_use]
    pub fn pipe(peer: PeerId) -> (Self, TransportEnd) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connection = Self::new(peer, outbound_tx, events_rx);
        let transport = TransportEnd {
            outbound: outbound_rx,
            events: EventSender { inner: events_tx },
        };
        (connection, transport)
    }
}
