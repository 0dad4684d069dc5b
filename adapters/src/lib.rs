pub mod web;

pub use web::{AppState, QueueResponse, create_app_state, get_queue, handle_connection, router};
