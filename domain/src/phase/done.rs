use crate::{Message, Slot};

use super::{Effect, Entry, Phase, PhaseEvent, PhaseId, Transition};

#[derive(Clone, Debug)]
pub struct Done {
    winner: Slot,
}

impl Done {
    /// Announces the result. Entering is the only time Done speaks.
    #[must_use]
    pub fn enter(winner: Slot) -> Entry {
        let effects = vec![
            Effect::Send {
                slot: winner,
                message: Message::GameOver { won: true },
            },
            Effect::Send {
                slot: winner.other(),
                message: Message::GameOver { won: false },
            },
        ];
        Entry::new(Phase::Done(Self { winner }), effects)
    }

    #[must_use]
    pub fn winner(&self) -> Slot {
        self.winner
    }

    pub(super) fn update(
        &mut self,
        event: PhaseEvent,
    ) -> Transition {
        match event {
            PhaseEvent::Message { slot, message } => {
                Transition::Stay(vec![Effect::ignored(slot, &message, PhaseId::Done)])
            }
            PhaseEvent::Tick => Transition::stay(),
        }
    }
}
