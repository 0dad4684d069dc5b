pub mod pairing_service;
pub mod session_service;

pub use pairing_service::PairingService;
pub use session_service::{STAND_IN_NAME, Session, launch};
