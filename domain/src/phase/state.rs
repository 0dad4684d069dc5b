use std::time::Duration;

use crate::Slot;

use super::{Counting, Done, Effect, Gaming, Naming, PhaseEvent, PhaseId, SessionConfig};

/// The per-session state machine: Naming, then Counting, then Gaming, then Done.
///
/// Phases only move forward. [`Phase::forfeit`] is the one way to skip ahead, straight to Done.
#[derive(Clone, Debug)]
pub enum Phase {
    Naming(Naming),
    Counting(Counting),
    Gaming(Gaming),
    Done(Done),
}

/// A phase that has just become active, together with what entering it does.
#[derive(Clone, Debug)]
pub struct Entry {
    pub phase: Phase,
    pub effects: Vec<Effect>,
}

impl Entry {
    pub(super) fn new(
        phase: Phase,
        effects: Vec<Effect>,
    ) -> Self {
        Self { phase, effects }
    }

    /// Puts `effects` ahead of the entry effects, for phases that speak before handing over.
    pub(super) fn preceded_by(
        mut self,
        effects: impl IntoIterator<Item = Effect>,
    ) -> Self {
        let mut ordered: Vec<Effect> = effects.into_iter().collect();
        ordered.append(&mut self.effects);
        self.effects = ordered;
        self
    }
}

#[derive(Clone, Debug)]
pub enum Transition {
    Stay(Vec<Effect>),
    Advance(Entry),
}

impl Transition {
    pub(super) fn stay() -> Self {
        Transition::Stay(Vec::new())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The previous phase was superseded; whatever it owned must be released.
    pub advanced: bool,
    pub effects: Vec<Effect>,
}

impl Phase {
    #[must_use]
    pub fn begin(config: SessionConfig) -> Entry {
        Naming::enter(config)
    }

    #[must_use]
    pub fn id(&self) -> PhaseId {
        match self {
            Phase::Naming(_) => PhaseId::Naming,
            Phase::Counting(_) => PhaseId::Counting,
            Phase::Gaming(_) => PhaseId::Gaming,
            Phase::Done(_) => PhaseId::Done,
        }
    }

    /// Period of the repeating timer this phase needs while it is active.
    #[must_use]
    pub fn cadence(&self) -> Option<Duration> {
        match self {
            Phase::Counting(counting) => Some(counting.interval()),
            Phase::Gaming(gaming) => Some(gaming.interval()),
            Phase::Naming(_) | Phase::Done(_) => None,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Phase::Done(_))
    }

    pub fn update(
        &mut self,
        event: PhaseEvent,
    ) -> Outcome {
        let transition = match self {
            Phase::Naming(naming) => naming.update(event),
            Phase::Counting(counting) => counting.update(event),
            Phase::Gaming(gaming) => gaming.update(event),
            Phase::Done(done) => done.update(event),
        };
        self.settle(transition)
    }

    /// `leaver` is gone: the other slot wins. Does nothing once the session is already Done.
    pub fn forfeit(
        &mut self,
        leaver: Slot,
    ) -> Outcome {
        if self.is_done() {
            return Outcome::default();
        }
        self.settle(Transition::Advance(Done::enter(leaver.other())))
    }

    fn settle(
        &mut self,
        transition: Transition,
    ) -> Outcome {
        match transition {
            Transition::Stay(effects) => Outcome {
                advanced: false,
                effects,
            },
            Transition::Advance(Entry { phase, effects }) => {
                *self = phase;
                Outcome { advanced: true, effects }
            }
        }
    }
}
