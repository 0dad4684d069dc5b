use crate::{Message, MessageKind, Slot};

use super::config::PhaseId;

/// Effects are what a phase asks its session to do; phases never perform I/O themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Send { slot: Slot, message: Message },
    /// A well-formed message arrived that the phase does not handle.
    Ignored { slot: Slot, kind: MessageKind, phase: PhaseId },
}

impl Effect {
    pub(super) fn ignored(
        slot: Slot,
        message: &Message,
        phase: PhaseId,
    ) -> Self {
        Effect::Ignored {
            slot,
            kind: message.kind(),
            phase,
        }
    }
}

pub(super) fn broadcast(message: Message) -> impl Iterator<Item = Effect> {
    Slot::BOTH.into_iter().map(move |slot| Effect::Send {
        slot,
        message: message.clone(),
    })
}
