use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;
use usio_frame::Frame;

struct Pending {
    frame: Frame,
    received_at: Instant,
}

#[derive(Default)]
struct PendingState {
    frames: VecDeque<Pending>,
    waiters: usize,
}

/// Decoded sentences not yet claimed by any caller.
///
/// Sentences are appended by the receiver and removed only by a matching
/// lookup, so each one is delivered to at most one caller. Every append wakes
/// all idle waiters, which then re-scan the queue. The lock is never held
/// across a blocking wait.
pub struct PendingQueue {
    state: Mutex<PendingState>,
    arrived: Condvar,
    max_age: Option<Duration>,
}

impl PendingQueue {
    /// Create an empty queue. With `max_age` set, older sentences are evicted on append.
    pub fn new(max_age: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(PendingState::default()),
            arrived: Condvar::new(),
            max_age,
        }
    }

    /// Append a sentence and wake every waiter.
    pub fn push(&self, frame: Frame) {
        let mut state = self.lock();
        if let Some(max_age) = self.max_age {
            let before = state.frames.len();
            state
                .frames
                .retain(|pending| pending.received_at.elapsed() <= max_age);
            let evicted = before - state.frames.len();
            if evicted > 0 {
                debug!(evicted, "evicted unclaimed sentences");
            }
        }
        state.frames.push_back(Pending {
            frame,
            received_at: Instant::now(),
        });
        drop(state);
        self.arrived.notify_all();
    }

    /// Remove and return the first sentence for `request_id` whose sentence id
    /// is one of `sentence_ids` (empty = any), without waiting.
    pub fn take(&self, request_id: i64, sentence_ids: &[&str]) -> Option<Frame> {
        take_locked(&mut self.lock(), request_id, sentence_ids)
    }

    /// Like [`take`](Self::take), but wait for a match to arrive.
    ///
    /// `None` waits indefinitely; `Some(t)` gives up after `t` has elapsed.
    pub fn wait_for(
        &self,
        request_id: i64,
        sentence_ids: &[&str],
        timeout: Option<Duration>,
    ) -> Option<Frame> {
        // A deadline past what `Instant` can represent means wait indefinitely.
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));

        let mut state = self.lock();
        if let Some(frame) = take_locked(&mut state, request_id, sentence_ids) {
            return Some(frame);
        }

        state.waiters += 1;
        let found = loop {
            state = match deadline {
                None => self
                    .arrived
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break None;
                    }
                    self.arrived
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };

            if let Some(frame) = take_locked(&mut state, request_id, sentence_ids) {
                break Some(frame);
            }
        };
        state.waiters -= 1;
        found
    }

    /// Number of unclaimed sentences.
    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether no sentence is waiting to be claimed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of callers currently blocked in [`wait_for`](Self::wait_for).
    pub fn waiters(&self) -> usize {
        self.lock().waiters
    }

    fn lock(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn take_locked(state: &mut PendingState, request_id: i64, sentence_ids: &[&str]) -> Option<Frame> {
    let index = state
        .frames
        .iter()
        .position(|pending| matches(&pending.frame, request_id, sentence_ids))?;
    state.frames.remove(index).map(|pending| pending.frame)
}

fn matches(frame: &Frame, request_id: i64, sentence_ids: &[&str]) -> bool {
    frame.request_id() == Some(request_id)
        && (sentence_ids.is_empty() || sentence_ids.contains(&frame.sentence_id.as_str()))
}
