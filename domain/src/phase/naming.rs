use crate::{Message, Slot};

use super::effect::broadcast;
use super::{Counting, Effect, Entry, Phase, PhaseEvent, PhaseId, SessionConfig, Transition};

#[derive(Clone, Debug)]
pub struct Naming {
    config: SessionConfig,
    names: [String; 2],
}

impl Naming {
    #[must_use]
    pub fn enter(config: SessionConfig) -> Entry {
        let effects = broadcast(Message::WinCount {
            count: config.win_count,
        })
        .chain(broadcast(Message::NamePlease))
        .collect();

        let naming = Self {
            config,
            names: Default::default(),
        };
        Entry::new(Phase::Naming(naming), effects)
    }

    #[must_use]
    pub fn name(
        &self,
        slot: Slot,
    ) -> &str {
        &self.names[slot.index()]
    }

    pub(super) fn update(
        &mut self,
        event: PhaseEvent,
    ) -> Transition {
        let (slot, name) = match event {
            PhaseEvent::Message {
                slot,
                message: Message::Name { name },
            } => (slot, name),
            PhaseEvent::Message { slot, message } => {
                return Transition::Stay(vec![Effect::ignored(slot, &message, PhaseId::Naming)]);
            }
            PhaseEvent::Tick => return Transition::stay(),
        };

        self.names[slot.index()] = name;
        if self.names.iter().any(String::is_empty) {
            return Transition::stay();
        }

        let matched = Slot::BOTH.map(|slot| Effect::Send {
            slot,
            message: Message::Matched {
                opponent_name: self.name(slot.other()).to_owned(),
            },
        });
        Transition::Advance(Counting::enter(self.config).preceded_by(matched))
    }
}
