mod message;
mod phase;
mod queue;
mod types;

pub use message::{Message, MessageKind, ProtocolError};
pub use phase::{
    Counting, Done, Effect, Entry, Gaming, Naming, Outcome, Phase, PhaseEvent, PhaseId, SessionConfig, Transition,
};
pub use queue::{PairingOutcome, PairingQueue};
pub use types::{PeerId, SessionId, Slot};
