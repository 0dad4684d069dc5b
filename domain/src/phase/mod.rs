mod config;
mod counting;
mod done;
mod effect;
mod event;
mod gaming;
mod naming;
mod state;


pub use config::{PhaseId, SessionConfig};
pub use counting::Counting;
pub use done::Done;
pub use effect::Effect;
pub use event::PhaseEvent;
pub use gaming::Gaming;
pub use naming::Naming;
pub use state::{Entry, Outcome, Phase, Transition};
