use axum::extract::ws::{Message, WebSocket};
use futures::SinkExt;
use futures::stream::SplitSink;
use tokio::sync::mpsc;
use tracing::debug;

use domain::PeerId;

pub(crate) type WebSocketSender = SplitSink<WebSocket, Message>;

/// Writes whatever the session queues for `peer`. Once the session lets go of its sink the queue drains
/// and the socket is closed.
pub(super) async fn forward_outbound(
    peer: PeerId,
    mut sender: WebSocketSender,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    while let Some(text) = outbound.recv().await {
        if let Err(e) = sender.send(Message::Text(text.into())).await {
            debug!(peer = %peer, error = %e, "Write failed, stopping writer");
            return;
        }
    }

    debug!(peer = %peer, "Outbound closed, closing socket");
    let _ = sender.close().await;
}
