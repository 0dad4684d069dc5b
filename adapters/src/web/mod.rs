mod http;
mod state;
mod websocket;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

pub use http::{QueueResponse, get_queue};
pub use state::{AppState, WebSocketSink, create_app_state};
pub use websocket::{PROTOCOL, handle_connection};

/// `/` and `/ws` upgrade to the game protocol; `/queue` reports whether someone is waiting.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_connection))
        .route("/ws", get(handle_connection))
        .route("/queue", get(get_queue))
        .with_state(state)
}
