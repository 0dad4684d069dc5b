use std::collections::VecDeque;
use std::future;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::ports::out_::{Arrival, Connection, ConnectionEvent, ConnectionSink, EventReceiver};
use domain::{Effect, Entry, Message, Outcome, Phase, PhaseEvent, PhaseId, SessionConfig, SessionId, Slot};

/// Name the single-participant stand-in answers NAMEPLEASE with.
pub const STAND_IN_NAME: &str = "null";

enum Seat<S> {
    Live(S),
    /// Opponent in single-participant mode. Answers NAMEPLEASE and otherwise stays quiet.
    StandIn,
    /// Left behind by a participant that disconnected; sends go nowhere.
    Inert,
}

/// Repeating timer of the active phase. Consumed when that phase is superseded.
struct PhaseTimer {
    phase: PhaseId,
    interval: Interval,
}

impl PhaseTimer {
    fn start(phase: &Phase) -> Option<Self> {
        let period = phase.cadence()?;
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(Self {
            phase: phase.id(),
            interval,
        })
    }

    fn stop(self) {
        trace!(phase = %self.phase, "Timer stopped");
    }
}

/// One running match between two seats.
///
/// The session owns everything it touches, so driving it from a single task is enough to keep events in
/// order: nothing is shared and nothing is locked.
pub struct Session<S> {
    id: SessionId,
    seats: [Seat<S>; 2],
    events: [Option<EventReceiver>; 2],
    /// Events taken off `events` that have not been handled yet, at most one per slot.
    held: [Option<(Arrival, ConnectionEvent)>; 2],
    phase: Phase,
    timer: Option<PhaseTimer>,
    backlog: VecDeque<(Slot, Message)>,
}

impl<S: ConnectionSink> Session<S> {
    /// Seats both participants and enters Naming. Without a `second` connection the stand-in takes the
    /// second seat. Must be called within a tokio runtime.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        first: Connection<S>,
        second: Option<Connection<S>>,
    ) -> Self {
        Self::entering(Phase::begin(config), first, second)
    }

    pub(crate) fn entering(
        entry: Entry,
        first: Connection<S>,
        second: Option<Connection<S>>,
    ) -> Self {
        let id = SessionId::new();
        let (first_sink, first_events) = first.into_parts();
        let (second_seat, second_events) = match second.map(Connection::into_parts) {
            Some((sink, events)) => (Seat::Live(sink), Some(events)),
            None => (Seat::StandIn, None),
        };

        let Entry { phase, effects } = entry;
        let mut session = Self {
            id,
            seats: [Seat::Live(first_sink), second_seat],
            events: [Some(first_events), second_events],
            held: [None, None],
            timer: PhaseTimer::start(&phase),
            phase,
            backlog: VecDeque::new(),
        };
        info!(session = %id, phase = %session.phase(), "Session started");
        session.perform(effects);
        session.settle();
        session
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> PhaseId {
        self.phase.id()
    }

    #[must_use]
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn handle(
        &mut self,
        slot: Slot,
        event: ConnectionEvent,
    ) {
        match event {
            ConnectionEvent::Message(text) => {
                debug!(session = %self.id, ?slot, message = %text, "<- Received");
                match Message::decode(&text) {
                    Ok(message) => self.dispatch(PhaseEvent::Message { slot, message }),
                    Err(e) => {
                        warn!(session = %self.id, ?slot, error = %e, "Failed to parse message, dropping participant");
                        self.abandon(slot);
                    }
                }
            }
            ConnectionEvent::Closed => {
                info!(session = %self.id, ?slot, phase = %self.phase(), "Participant closed");
                self.abandon(slot);
            }
            ConnectionEvent::Errored(reason) => {
                warn!(session = %self.id, ?slot, phase = %self.phase(), error = %reason, "Participant errored");
                self.abandon(slot);
            }
        }
        self.settle();
    }

    /// The active phase's timer fired.
    pub fn tick(&mut self) {
        self.dispatch(PhaseEvent::Tick);
        self.settle();
    }

    /// Drives the session until it is Done, one event at a time. Events from both slots are handled in
    /// the order the transport reported them.
    pub async fn run(mut self) {
        while !self.phase.is_done() {
            if let Some((slot, event)) = self.take_earliest() {
                self.handle(slot, event);
                continue;
            }

            let [first, second] = &mut self.events;
            tokio::select! {
                event = next_event(first) => self.hold(Slot::First, event),
                event = next_event(second) => self.hold(Slot::Second, event),
                () = next_tick(&mut self.timer) => self.tick(),
            }
        }
        info!(session = %self.id, "Session finished");
    }

    fn hold(
        &mut self,
        slot: Slot,
        event: Option<(Arrival, ConnectionEvent)>,
    ) {
        self.held[slot.index()] = Some(event.unwrap_or_else(|| (Arrival::now(), ConnectionEvent::Closed)));
    }

    /// Takes the earliest event already queued on either connection.
    fn take_earliest(&mut self) -> Option<(Slot, ConnectionEvent)> {
        // A held event may only be handled once the other slot was checked after it was taken.
        while self.refill() {}

        let (slot, _) = Slot::BOTH
            .into_iter()
            .filter_map(|slot| self.held[slot.index()].as_ref().map(|(arrival, _)| (slot, *arrival)))
            .min_by_key(|(_, arrival)| *arrival)?;
        let (_, event) = self.held[slot.index()].take()?;
        Some((slot, event))
    }

    /// Holds the next queued event of every slot that has none held. Returns whether anything new was held.
    fn refill(&mut self) -> bool {
        let mut found = false;
        for slot in Slot::BOTH {
            let i = slot.index();
            if self.held[i].is_some() {
                continue;
            }
            let Some(events) = &mut self.events[i] else {
                continue;
            };
            let event = match events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => continue,
                Err(TryRecvError::Disconnected) => (Arrival::now(), ConnectionEvent::Closed),
            };
            self.held[i] = Some(event);
            found = true;
        }
        found
    }

    fn dispatch(
        &mut self,
        event: PhaseEvent,
    ) {
        let outcome = self.phase.update(event);
        self.apply(outcome);
    }

    /// Hands the seat to the inert sentinel and ends the match in favour of the other slot.
    fn abandon(
        &mut self,
        slot: Slot,
    ) {
        self.seats[slot.index()] = Seat::Inert;
        self.events[slot.index()] = None;
        self.held[slot.index()] = None;
        let outcome = self.phase.forfeit(slot);
        self.apply(outcome);
    }

    fn apply(
        &mut self,
        outcome: Outcome,
    ) {
        let Outcome { advanced, effects } = outcome;
        if advanced {
            if let Some(timer) = self.timer.take() {
                timer.stop();
            }
            self.timer = PhaseTimer::start(&self.phase);
            debug!(session = %self.id, phase = %self.phase(), "Phase advanced");
        }
        self.perform(effects);
    }

    fn perform(
        &mut self,
        effects: Vec<Effect>,
    ) {
        for effect in effects {
            match effect {
                Effect::Send { slot, message } => self.send(slot, message),
                Effect::Ignored { slot, kind, phase } => {
                    info!(session = %self.id, ?slot, %kind, %phase, "Ignored message");
                }
            }
        }
    }

    fn send(
        &mut self,
        slot: Slot,
        message: Message,
    ) {
        match &self.seats[slot.index()] {
            Seat::Live(sink) => {
                let text = message.encode();
                debug!(session = %self.id, ?slot, message = %text, "-> Sending");
                sink.send(text);
            }
            Seat::StandIn => {
                if message == Message::NamePlease {
                    self.backlog.push_back((
                        slot,
                        Message::Name {
                            name: STAND_IN_NAME.to_owned(),
                        },
                    ));
                }
            }
            Seat::Inert => {}
        }
    }

    /// Processes stand-in replies queued while handling the previous event.
    fn settle(&mut self) {
        while let Some((slot, message)) = self.backlog.pop_front() {
            self.dispatch(PhaseEvent::Message { slot, message });
        }
    }
}

async fn next_event(events: &mut Option<EventReceiver>) -> Option<(Arrival, ConnectionEvent)> {
    match events {
        Some(events) => events.recv().await,
        None => future::pending().await,
    }
}

async fn next_tick(timer: &mut Option<PhaseTimer>) {
    match timer {
        Some(timer) => {
            timer.interval.tick().await;
        }
        None => future::pending().await,
    }
}

/// Builds a session and drives it on its own task.
pub fn launch<S: ConnectionSink>(
    config: SessionConfig,
    first: Connection<S>,
    second: Option<Connection<S>>,
) -> SessionId {
    let session = Session::new(config, first, second);
    let id = session.id();
    tokio::spawn(session.run());
    id
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use domain::{Counting, Gaming, PeerId};
    use tokio::sync::mpsc;

    use crate::ports::out_::TransportEnd;

    use super::*;

    type TestSession = Session<mpsc::UnboundedSender<String>>;

    struct Peer {
        transport: TransportEnd,
    }

    impl Peer {
        fn connect() -> (Connection<mpsc::UnboundedSender<String>>, Self) {
            let (connection, transport) = Connection::pipe(PeerId::new());
            (connection, Self { transport })
        }

        fn received(&mut self) -> Vec<Message> {
            let mut messages = Vec::new();
            while let Ok(text) = self.transport.outbound.try_recv() {
                messages.push(Message::decode(&text).expect("server sent an undecodable message"));
            }
            messages
        }

        async fn next(&mut self) -> Message {
            let text = self.transport.outbound.recv().await.expect("outbound closed");
            Message::decode(&text).expect("server sent an undecodable message")
        }

        fn say(
            &self,
            message: Message,
        ) {
            self.transport
                .events
                .send(ConnectionEvent::Message(message.encode()))
                .expect("session gone");
        }
    }

    fn pair(entry: Entry) -> (TestSession, Peer, Peer) {
        let (first, p1) = Peer::connect();
        let (second, p2) = Peer::connect();
        (Session::entering(entry, first, Some(second)), p1, p2)
    }

    fn name(name: &str) -> Message {
        Message::Name { name: name.into() }
    }

    fn text(message: Message) -> ConnectionEvent {
        ConnectionEvent::Message(message.encode())
    }

    #[tokio::test(start_paused = true)]
    async fn test_naming() {
        let (mut session, mut p1, mut p2) = pair(Phase::begin(SessionConfig::default()));

        let greeting = vec![Message::WinCount { count: 50 }, Message::NamePlease];
        assert_eq!(p1.received(), greeting);
        assert_eq!(p2.received(), greeting);
        assert!(!session.has_timer());

        session.handle(Slot::First, text(name("p1")));
        assert_eq!(session.phase(), PhaseId::Naming);
        assert!(p1.received().is_empty());

        session.handle(Slot::Second, text(name("p2")));
        assert_eq!(session.phase(), PhaseId::Counting);
        assert!(session.has_timer());
        assert_eq!(
            p1.received(),
            vec![Message::Matched {
                opponent_name: "p2".into()
            }]
        );
        assert_eq!(
            p2.received(),
            vec![Message::Matched {
                opponent_name: "p1".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_counting_on_the_clock() {
        let (session, mut p1, mut p2) = pair(Counting::enter(SessionConfig::default()));
        let start = Instant::now();
        let task = tokio::spawn(session.run());

        for (step, value) in (0..=5).rev().enumerate() {
            assert_eq!(p1.next().await, Message::CountDown { value });
            assert_eq!(p2.next().await, Message::CountDown { value });
            assert_eq!(start.elapsed(), Duration::from_millis(1000) * (step as u32 + 1));
        }

        // Gaming's scoreboard starts 300ms after the last countdown.
        let idle = Message::ClickCount {
            your_count: 0,
            their_count: 0,
        };
        assert_eq!(p1.next().await, idle);
        assert_eq!(p2.next().await, idle);
        assert_eq!(start.elapsed(), Duration::from_millis(6300));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_gaming_until_done() {
        let (mut session, mut p1, mut p2) = pair(Gaming::enter(SessionConfig::default()));

        for _ in 0..50 {
            session.handle(Slot::First, text(Message::Click));
        }

        assert_eq!(session.phase(), PhaseId::Done);
        assert!(!session.has_timer());
        assert_eq!(p1.received(), vec![Message::GameOver { won: true }]);
        assert_eq!(p2.received(), vec![Message::GameOver { won: false }]);

        session.handle(Slot::First, text(Message::Click));
        session.handle(Slot::Second, text(Message::Click));
        session.tick();
        assert!(p1.received().is_empty());
        assert!(p2.received().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_disconnect_from_any_phase() {
        let entries: [fn() -> Entry; 3] = [
            || Phase::begin(SessionConfig::default()),
            || Counting::enter(SessionConfig::default()),
            || Gaming::enter(SessionConfig::default()),
        ];
        let departures = [ConnectionEvent::Closed, ConnectionEvent::Errored("reset".into())];

        for entry in entries {
            for departure in &departures {
                for leaver in Slot::BOTH {
                    let (mut session, p1, p2) = pair(entry());
                    let mut peers = [p1, p2];
                    for peer in &mut peers {
                        peer.received();
                    }

                    session.handle(leaver, departure.clone());
                    assert_eq!(session.phase(), PhaseId::Done);
                    assert!(!session.has_timer());
                    assert!(peers[leaver.index()].received().is_empty(), "the leaver hears nothing");
                    assert_eq!(
                        peers[leaver.other().index()].received(),
                        vec![Message::GameOver { won: true }]
                    );

                    session.handle(leaver.other(), ConnectionEvent::Closed);
                    assert!(peers.iter_mut().all(|peer| peer.received().is_empty()));
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_message_forfeits() {
        let (mut session, mut p1, mut p2) = pair(Gaming::enter(SessionConfig::default()));

        session.handle(Slot::Second, ConnectionEvent::Message(r#"{"id":4}"#.into()));

        assert_eq!(session.phase(), PhaseId::Done);
        assert_eq!(p1.received(), vec![Message::GameOver { won: true }]);
        assert!(p2.received().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stand_in_names_itself() {
        let (first, mut p1) = Peer::connect();
        let mut session: TestSession = Session::new(SessionConfig::default(), first, None);

        assert_eq!(p1.received(), vec![Message::WinCount { count: 50 }, Message::NamePlease]);
        assert_eq!(session.phase(), PhaseId::Naming);

        session.handle(Slot::First, text(name("solo")));
        assert_eq!(session.phase(), PhaseId::Counting);
        assert_eq!(
            p1.received(),
            vec![Message::Matched {
                opponent_name: STAND_IN_NAME.into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_plays_a_full_match() {
        let config = SessionConfig {
            win_count: 3,
            countdown_from: 1,
            ..SessionConfig::default()
        };
        let (session, mut p1, mut p2) = pair(Phase::begin(config));
        let task = tokio::spawn(session.run());

        assert_eq!(p1.next().await, Message::WinCount { count: 3 });
        assert_eq!(p1.next().await, Message::NamePlease);
        p1.say(name("p1"));
        p2.say(name("p2"));
        assert_eq!(
            p1.next().await,
            Message::Matched {
                opponent_name: "p2".into()
            }
        );
        assert_eq!(p1.next().await, Message::CountDown { value: 1 });
        assert_eq!(p1.next().await, Message::CountDown { value: 0 });

        for _ in 0..3 {
            p2.say(Message::Click);
        }
        task.await.expect("session panicked");

        let tail = p2.received();
        assert_eq!(tail.last(), Some(&Message::GameOver { won: true }));
        assert_eq!(p1.received().last(), Some(&Message::GameOver { won: false }));
        assert!(p1.transport.outbound.recv().await.is_none(), "sink dropped once done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_handles_slots_in_arrival_order() {
        let config = SessionConfig {
            win_count: 1,
            ..SessionConfig::default()
        };

        for round in 0..40 {
            let (session, p1, p2) = pair(Gaming::enter(config));
            let mut peers = [p1, p2];
            let early = if round % 2 == 0 { Slot::First } else { Slot::Second };
            peers[early.index()].say(Message::Click);
            peers[early.other().index()].say(Message::Click);

            tokio::spawn(session.run()).await.expect("session panicked");

            assert_eq!(
                peers[early.index()].received().last(),
                Some(&Message::GameOver { won: true }),
                "round {round}: the earlier click wins"
            );
            assert_eq!(
                peers[early.other().index()].received().last(),
                Some(&Message::GameOver { won: false }),
                "round {round}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_treats_dropped_transport_as_close() {
        let (session, mut p1, p2) = pair(Phase::begin(SessionConfig::default()));
        let task = tokio::spawn(session.run());
        drop(p2);

        task.await.expect("session panicked");
        let received = p1.received();
        assert_eq!(received.last(), Some(&Message::GameOver { won: true }));
    }
}
