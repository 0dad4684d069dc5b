use tracing::{debug, info};

use crate::ports::in_::session_service;
use crate::ports::out_::{Connection, ConnectionSink};
use domain::{PairingOutcome, PairingQueue, PeerId, SessionConfig};

type Launcher<S> = Box<dyn FnMut(Connection<S>, Option<Connection<S>>) + Send>;

pub struct PairingService<S> {
    queue: PairingQueue<PeerId, Connection<S>, Launcher<S>>,
}

impl<S: ConnectionSink> PairingService<S> {
    /// Pairs arrivals into sessions spawned on the current tokio runtime.
    #[must_use]
    pub fn new(
        single_participant: bool,
        config: SessionConfig,
    ) -> Self {
        Self::with_launcher(single_participant, move |first, second| {
            let session_id = session_service::launch(config, first, second);
            debug!(session = %session_id, "Session launched");
        })
    }

    #[must_use]
    pub fn with_launcher(
        single_participant: bool,
        launcher: impl FnMut(Connection<S>, Option<Connection<S>>) + Send + 'static,
    ) -> Self {
        let launcher: Launcher<S> = Box::new(launcher);
        Self {
            queue: PairingQueue::new(single_participant, launcher),
        }
    }

    pub fn enqueue(
        &mut self,
        connection: Connection<S>,
    ) -> PairingOutcome {
        let peer = connection.peer();
        let outcome = self.queue.enqueue(peer, connection);
        info!(peer = %peer, outcome = ?outcome, "Peer enqueued");
        outcome
    }

    /// Forgets `peer` if it is still waiting for an opponent.
    pub fn withdraw(
        &mut self,
        peer: PeerId,
    ) -> bool {
        self.queue.drop(&peer)
    }

    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.queue.is_waiting()
    }
}
