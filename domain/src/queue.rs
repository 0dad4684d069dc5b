use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingOutcome {
    /// Stored as the pending entry.
    Waiting,
    /// Matched with the pending entry; a session was started.
    Paired,
    /// Single-participant mode; a session was started against the stand-in.
    Solo,
}

/// Single-slot FIFO matcher.
///
/// Holds at most one waiting `(id, handle)` entry. The next arrival is paired with it and both handles are
/// given to `start_session`, the waiting one first. In single-participant mode every arrival starts a
/// session on its own and the second handle is `None`.
pub struct PairingQueue<K, H, F> {
    pending: Option<(K, H)>,
    single_participant: bool,
    start_session: F,
}

impl<K, H, F> PairingQueue<K, H, F>
where
    K: PartialEq,
    F: FnMut(H, Option<H>),
{
    #[must_use]
    pub fn new(
        single_participant: bool,
        start_session: F,
    ) -> Self {
        Self {
            pending: None,
            single_participant,
            start_session,
        }
    }

    pub fn enqueue(
        &mut self,
        id: K,
        handle: H,
    ) -> PairingOutcome {
        if self.single_participant {
            (self.start_session)(handle, None);
            return PairingOutcome::Solo;
        }

        match self.pending.take() {
            None => {
                self.pending = Some((id, handle));
                PairingOutcome::Waiting
            }
            Some((_, waiting)) => {
                (self.start_session)(waiting, Some(handle));
                PairingOutcome::Paired
            }
        }
    }

    /// Removes the pending entry if it belongs to `id`. Returns whether anything was removed.
    pub fn drop(
        &mut self,
        id: &K,
    ) -> bool {
        match &self.pending {
            Some((pending_id, _)) if pending_id == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    fn waiting_id(&self) -> Option<&K> {
        self.pending.as_ref().map(|(id, _)| id)
    }
}
