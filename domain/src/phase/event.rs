use crate::{Message, Slot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    Message { slot: Slot, message: Message },
    /// The active phase's timer fired.
    Tick,
}
