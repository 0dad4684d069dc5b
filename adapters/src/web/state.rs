use std::sync::Arc;

use tokio::sync::{Mutex as TokioMutex, mpsc};

use application::ports::in_::PairingService;
use domain::SessionConfig;

/// Sink handed to sessions; a per-socket writer task drains the other end.
pub type WebSocketSink = mpsc::UnboundedSender<String>;

pub struct AppState {
    pub pairing_service: Arc<TokioMutex<PairingService<WebSocketSink>>>,
}

impl AppState {
    pub fn new(pairing_service: Arc<TokioMutex<PairingService<WebSocketSink>>>) -> Self {
        Self { pairing_service }
    }
}

pub fn create_app_state(
    single_participant: bool,
    config: SessionConfig,
) -> Arc<AppState> {
    let pairing_service = PairingService::new(single_participant, config);
    Arc::new(AppState::new(Arc::new(TokioMutex::new(pairing_service))))
}
