use std::time::Duration;

use crate::{Message, Slot};

use super::{Done, Effect, Entry, Phase, PhaseEvent, PhaseId, SessionConfig, Transition};

#[derive(Clone, Debug)]
pub struct Gaming {
    config: SessionConfig,
    scores: [u32; 2],
}

impl Gaming {
    #[must_use]
    pub fn enter(config: SessionConfig) -> Entry {
        let gaming = Self { config, scores: [0, 0] };
        Entry::new(Phase::Gaming(gaming), Vec::new())
    }

    #[must_use]
    pub fn score(
        &self,
        slot: Slot,
    ) -> u32 {
        self.scores[slot.index()]
    }

    pub(super) fn interval(&self) -> Duration {
        self.config.scoreboard_interval
    }

    pub(super) fn update(
        &mut self,
        event: PhaseEvent,
    ) -> Transition {
        match event {
            PhaseEvent::Tick => Transition::Stay(self.scoreboard()),
            PhaseEvent::Message {
                slot,
                message: Message::Click,
            } => {
                let score = &mut self.scores[slot.index()];
                *score = score.saturating_add(1);
                if *score < self.config.win_count {
                    return Transition::stay();
                }
                Transition::Advance(Done::enter(slot))
            }
            PhaseEvent::Message { slot, message } => {
                Transition::Stay(vec![Effect::ignored(slot, &message, PhaseId::Gaming)])
            }
        }
    }

    fn scoreboard(&self) -> Vec<Effect> {
        Slot::BOTH
            .into_iter()
            .map(|slot| Effect::Send {
                slot,
                message: Message::ClickCount {
                    your_count: self.score(slot),
                    their_count: self.score(slot.other()),
                },
            })
            .collect()
    }
}
