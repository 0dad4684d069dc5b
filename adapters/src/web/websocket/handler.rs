use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures::{Stream, StreamExt};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info};

use application::ports::in_::PairingService;
use application::ports::out_::{Connection, ConnectionEvent, EventSender};
use domain::PeerId;

use super::writer::forward_outbound;
use crate::web::state::{AppState, WebSocketSink};

/// Subprotocol the browser client asks for.
pub const PROTOCOL: &str = "wishbanana";

pub async fn handle_connection(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.protocols([PROTOCOL]).on_upgrade(move |socket| async move {
        let peer = PeerId::new();
        info!(peer = %peer, remote = %remote, "Accepting connection");

        let (sender, receiver) = socket.split();
        let (connection, transport) = Connection::pipe(peer);
        tokio::spawn(forward_outbound(peer, sender, transport.outbound));

        state.pairing_service.lock().await.enqueue(connection);
        relay_inbound(peer, receiver, &state.pairing_service, &transport.events).await;
    })
}

/// Relays `frames` until the socket goes away. A peer still waiting for an opponent is withdrawn
/// before its departure is reported.
pub(crate) async fn relay_inbound<St, E>(
    peer: PeerId,
    frames: St,
    pairing_service: &TokioMutex<PairingService<WebSocketSink>>,
    events: &EventSender,
) -> ConnectionEvent
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let departure = read_inbound(peer, frames, |event| {
        let _ = events.send(event);
    })
    .await;

    if pairing_service.lock().await.withdraw(peer) {
        info!(peer = %peer, event = ?departure, "Left during pairing");
    } else {
        info!(peer = %peer, event = ?departure, "Player disconnected");
    }
    let _ = events.send(departure.clone());
    departure
}

/// Forwards text frames until the socket goes away, then reports how it went away.
async fn read_inbound<St, E>(
    peer: PeerId,
    mut frames: St,
    mut forward: impl FnMut(ConnectionEvent),
) -> ConnectionEvent
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                debug!(peer = %peer, message = %text.as_str(), "<- Received");
                forward(ConnectionEvent::Message(text.as_str().to_owned()));
            }
            Ok(Message::Close(_)) => return ConnectionEvent::Closed,
            Ok(_) => {}
            Err(e) => return ConnectionEvent::Errored(e.to_string()),
        }
    }
    ConnectionEvent::Closed
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use domain::{PairingOutcome, SessionConfig};

    use super::*;

    type Frame = Result<Message, &'static str>;

    async fn read(frames: Vec<Frame>) -> (Vec<ConnectionEvent>, ConnectionEvent) {
        let mut forwarded = Vec::new();
        let departure = read_inbound(PeerId::new(), stream::iter(frames), |event| forwarded.push(event)).await;
        (forwarded, departure)
    }

    fn text(body: &str) -> ConnectionEvent {
        ConnectionEvent::Message(body.to_owned())
    }

    #[tokio::test]
    async fn test_forwards_text_and_skips_control_frames() {
        let (forwarded, departure) = read(vec![
            Ok(Message::Text(r#"{"id":4,"name":"p1"}"#.into())),
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::Ping(Default::default())),
            Ok(Message::Pong(Default::default())),
            Ok(Message::Text(r#"{"id":2}"#.into())),
        ])
        .await;

        assert_eq!(forwarded, vec![text(r#"{"id":4,"name":"p1"}"#), text(r#"{"id":2}"#)]);
        assert_eq!(departure, ConnectionEvent::Closed, "end of stream is a close");
    }

    #[tokio::test]
    async fn test_close_frame_ends_the_read() {
        let (forwarded, departure) = read(vec![
            Ok(Message::Text(r#"{"id":2}"#.into())),
            Ok(Message::Close(None)),
            Ok(Message::Text(r#"{"id":2}"#.into())),
        ])
        .await;

        assert_eq!(forwarded, vec![text(r#"{"id":2}"#)]);
        assert_eq!(departure, ConnectionEvent::Closed);
    }

    #[tokio::test]
    async fn test_read_error_is_reported() {
        let (forwarded, departure) = read(vec![Err("connection reset"), Ok(Message::Text(r#"{"id":2}"#.into()))]).await;

        assert!(forwarded.is_empty());
        assert_eq!(departure, ConnectionEvent::Errored("connection reset".into()));
    }

    #[tokio::test]
    async fn test_waiting_peer_is_withdrawn_on_departure() {
        let pairing_service = TokioMutex::new(PairingService::new(false, SessionConfig::default()));
        let (connection, transport) = Connection::pipe(PeerId::new());
        let peer = connection.peer();
        assert_eq!(pairing_service.lock().await.enqueue(connection), PairingOutcome::Waiting);

        let frames: Vec<Frame> = Vec::new();
        let departure = relay_inbound(peer, stream::iter(frames), &pairing_service, &transport.events).await;

        assert_eq!(departure, ConnectionEvent::Closed);
        assert!(!pairing_service.lock().await.is_waiting());
    }

    #[tokio::test]
    async fn test_departure_reaches_a_running_session() {
        let pairing_service = TokioMutex::new(PairingService::new(false, SessionConfig::default()));
        let (first, mut first_end) = Connection::pipe(PeerId::new());
        let (second, second_end) = Connection::pipe(PeerId::new());
        let leaver = second.peer();
        pairing_service.lock().await.enqueue(first);
        pairing_service.lock().await.enqueue(second);

        let frames: Vec<Frame> = vec![Err("connection reset")];
        let departure = relay_inbound(leaver, stream::iter(frames), &pairing_service, &second_end.events).await;
        assert_eq!(departure, ConnectionEvent::Errored("connection reset".into()));

        let game_over = domain::Message::GameOver { won: true }.encode();
        let mut last = None;
        while let Some(text) = first_end.outbound.recv().await {
            last = Some(text);
        }
        assert_eq!(last, Some(game_over), "the remaining player wins");
    }
}
