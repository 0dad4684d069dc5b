mod connection;

pub use connection::{Arrival, Connection, ConnectionEvent, ConnectionSink, EventReceiver, EventSender, TransportEnd};
