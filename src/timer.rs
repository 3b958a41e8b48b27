//! One-shot timer collaborator.

use std::time::Duration;

/// Opaque handle for an armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Schedules one-shot callbacks on the host's timeline.
///
/// When a timer expires the host calls [`crate::Player::on_timer`] with the
/// id returned by [`arm`](Self::arm). Cancelling an id that already fired,
/// or was never armed, must be a no-op.
pub trait Timer {
    /// Arm a one-shot timer firing after `delay`.
    fn arm(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timer.
    fn cancel(&mut self, id: TimerId);
}

/// A virtual clock for headless hosts and tests.
///
/// Nothing fires on its own: call [`pop_due`](Self::pop_due) (or
/// [`crate::Player::advance`]) to move time forward.
#[derive(Clone, Debug, Default)]
pub struct ManualTimer {
    now: Duration,
    next_id: u64,
    pending: Vec<(Duration, TimerId)>,
}

impl ManualTimer {
    /// Create a timer at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if `id` is armed.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|&(_, pending)| pending == id)
    }

    /// Remove the earliest timer due at or before `until`, moving the clock
    /// to its due time.
    ///
    /// Timers due at the same instant fire in the order they were armed.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let (pos, &(due, id)) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.0 <= until)
            .min_by_key(|(_, entry)| (entry.0, entry.1))?;
        self.pending.remove(pos);
        self.now = self.now.max(due);
        Some(id)
    }

    /// Move the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Timer for ManualTimer {
    fn arm(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push((self.now.saturating_add(delay), id));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|&(_, pending)| pending != id);
    }
}
