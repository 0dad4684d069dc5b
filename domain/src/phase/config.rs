use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseId {
    Naming,
    Counting,
    Gaming,
    Done,
}

impl fmt::Display for PhaseId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let id = match self {
            PhaseId::Naming => "naming",
            PhaseId::Counting => "counting",
            PhaseId::Gaming => "gaming",
            PhaseId::Done => "done",
        };
        f.write_str(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Clicks needed to win. Announced to both participants as WINCOUNT.
    pub win_count: u32,
    /// First value of the countdown; the countdown broadcasts this value down to 0.
    pub countdown_from: u32,
    pub countdown_interval: Duration,
    pub scoreboard_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            win_count: 50,
            countdown_from: 5,
            countdown_interval: Duration::from_millis(1000),
            scoreboard_interval: Duration::from_millis(300),
        }
    }
}
