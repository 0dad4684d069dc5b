use std::time::Duration;

use crate::Message;

use super::effect::broadcast;
use super::{Effect, Entry, Gaming, Phase, PhaseEvent, PhaseId, SessionConfig, Transition};

#[derive(Clone, Debug)]
pub struct Counting {
    config: SessionConfig,
    remaining: u32,
}

impl Counting {
    #[must_use]
    pub fn enter(config: SessionConfig) -> Entry {
        let counting = Self {
            config,
            remaining: config.countdown_from,
        };
        Entry::new(Phase::Counting(counting), Vec::new())
    }

    /// The value the next tick will broadcast.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(super) fn interval(&self) -> Duration {
        self.config.countdown_interval
    }

    pub(super) fn update(
        &mut self,
        event: PhaseEvent,
    ) -> Transition {
        match event {
            PhaseEvent::Tick => {
                let announced: Vec<Effect> = broadcast(Message::CountDown { value: self.remaining }).collect();
                match self.remaining.checked_sub(1) {
                    Some(remaining) => {
                        self.remaining = remaining;
                        Transition::Stay(announced)
                    }
                    None => Transition::Advance(Gaming::enter(self.config).preceded_by(announced)),
                }
            }
            PhaseEvent::Message { slot, message } => {
                Transition::Stay(vec![Effect::ignored(slot, &message, PhaseId::Counting)])
            }
        }
    }
}
