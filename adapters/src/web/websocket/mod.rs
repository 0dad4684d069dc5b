mod handler;
mod writer;

pub use handler::{PROTOCOL, handle_connection};
