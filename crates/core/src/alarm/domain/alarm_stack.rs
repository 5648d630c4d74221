use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::shared::frame::Frame;
use crate::shared::timestamp::AlarmTimestamp;

/// Evidence that an unreliable face was seen: when, and what the camera showed.
#[derive(Clone, Debug, PartialEq)]
pub struct AlarmCandidate {
    pub timestamp: AlarmTimestamp,
    pub snapshot: Frame,
}

#[derive(Default)]
struct StackState {
    items: Vec<AlarmCandidate>,
    closed: bool,
}

/// Shared last-in-first-out queue of alarm candidates.
///
/// Producers push without blocking. The consumer sleeps in
/// [`AlarmStack::wait_for_burst`] until enough candidates pile up or the
/// stack is closed.
#[derive(Clone, Default)]
pub struct AlarmStack {
    inner: Arc<(Mutex<StackState>, Condvar)>,
}

impl AlarmStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate on top. Ignored once the stack is closed.
    pub fn push(&self, candidate: AlarmCandidate) {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.items.push(candidate);
        cvar.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns the most recently pushed candidate.
    pub fn pop_latest(&self) -> Option<AlarmCandidate> {
        self.lock().items.pop()
    }

    /// Drops every pending candidate and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let n = state.items.len();
        state.items.clear();
        n
    }

    /// Blocks until more than `threshold` candidates are pending.
    ///
    /// Returns the pending count, or `None` once the stack is closed.
    pub fn wait_for_burst(&self, threshold: usize) -> Option<usize> {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if state.items.len() > threshold {
                return Some(state.items.len());
            }
            state = cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wakes every waiter and refuses further pushes.
    pub fn close(&self) {
        let (_, cvar) = &*self.inner;
        self.lock().closed = true;
        cvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, StackState> {
        let (mutex, _) = &*self.inner;
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
