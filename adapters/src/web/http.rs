use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::state::AppState;

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct QueueResponse {
    pub waiting: bool,
}

pub async fn get_queue(State(state): State<Arc<AppState>>) -> Json<QueueResponse> {
    let waiting = state.pairing_service.lock().await.is_waiting();
    Json(QueueResponse { waiting })
}
