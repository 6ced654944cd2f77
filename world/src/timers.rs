//! One-shot timer facility shared by every delayed behaviour of a run.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::Duration,
};

use raid_rehearsal_core::{MechanicId, MechanicKind, RunEpoch};
use raid_rehearsal_system_lifecycle::Transition;

/// Identifies what a timer drives when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerOwner {
    /// Bosses finished spawning; the schedule anchors.
    SpawnComplete,
    /// Authored action at the provided schedule position.
    Schedule {
        /// Position of the action within the schedule.
        index: usize,
    },
    /// Delayed lifecycle transition of one mechanic instance.
    Instance {
        /// Kind of the instance.
        kind: MechanicKind,
        /// Identifier of the instance.
        id: MechanicId,
        /// Spawn serial distinguishing reused ids.
        serial: u64,
        /// Transition applied when the timer fires.
        transition: Transition,
    },
    /// Auto-clear of the cast bar shown under the provided generation.
    CastBar {
        /// HUD generation that armed the timer.
        generation: u64,
    },
    /// Auto-clear of the banner shown under the provided generation.
    Banner {
        /// HUD generation that armed the timer.
        generation: u64,
    },
}

impl TimerOwner {
    /// Reports whether the timer drives the provided instance.
    pub(crate) fn drives_instance(&self, target_kind: MechanicKind, target_id: MechanicId) -> bool {
        matches!(
            *self,
            Self::Instance { kind, id, .. } if kind == target_kind && id == target_id
        )
    }
}

/// Cancellation token carried by every armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TimerToken {
    /// Epoch of the run that armed the timer.
    pub(crate) epoch: RunEpoch,
    /// Behaviour driven by the timer.
    pub(crate) owner: TimerOwner,
}

/// Timer popped from the queue because it came due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DueTimer {
    /// Simulation time the timer was armed for.
    pub(crate) due: Duration,
    /// Behaviour driven by the timer.
    pub(crate) owner: TimerOwner,
}

#[derive(Debug)]
struct Entry {
    due: Duration,
    sequence: u64,
    token: TimerToken,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.sequence).cmp(&(other.due, other.sequence))
    }
}

/// Min-heap of one-shot timers ordered by due time, then arming order.
#[derive(Debug)]
pub(crate) struct TimerQueue {
    epoch: RunEpoch,
    heap: BinaryHeap<Reverse<Entry>>,
    next_sequence: u64,
}

impl TimerQueue {
    /// Creates an empty queue that only fires timers tagged with `epoch`.
    pub(crate) fn new(epoch: RunEpoch) -> Self {
        Self {
            epoch,
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Arms a one-shot timer due at `due`.
    pub(crate) fn arm(&mut self, due: Duration, owner: TimerOwner) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.heap.push(Reverse(Entry {
            due,
            sequence,
            token: TimerToken {
                epoch: self.epoch,
                owner,
            },
        }));
    }

    /// Pops the earliest timer due at or before `now`.
    ///
    /// Entries whose token belongs to another epoch are discarded unseen.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<DueTimer> {
        loop {
            let Reverse(next) = self.heap.peek()?;
            if next.due > now {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            if entry.token.epoch == self.epoch {
                return Some(DueTimer {
                    due: entry.due,
                    owner: entry.token.owner,
                });
            }
        }
    }

    /// Revokes every timer whose owner matches `predicate`.
    pub(crate) fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&TimerOwner) -> bool,
    {
        let before = self.heap.len();
        self.heap.retain(|Reverse(entry)| !predicate(&entry.token.owner));
        before - self.heap.len()
    }

    /// Revokes every armed timer.
    pub(crate) fn cancel_all(&mut self) -> usize {
        let cancelled = self.heap.len();
        self.heap.clear();
        cancelled
    }

    /// Number of armed timers.
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Due time of the earliest armed timer.
    pub(crate) fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(index: usize) -> TimerOwner {
        TimerOwner::Schedule { index }
    }

    #[test]
    fn timers_fire_in_due_order_and_ties_in_arming_order() {
        let mut queue = TimerQueue::new(RunEpoch::new(1));
        queue.arm(Duration::from_millis(300), schedule(0));
        queue.arm(Duration::from_millis(100), schedule(1));
        queue.arm(Duration::from_millis(300), schedule(2));
        queue.arm(Duration::from_millis(100), schedule(3));

        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(Duration::from_secs(1)))
            .map(|timer| timer.owner)
            .collect();
        assert_eq!(fired, vec![schedule(1), schedule(3), schedule(0), schedule(2)]);
    }

    #[test]
    fn entries_order_by_due_time_then_sequence() {
        let entry = |due: u64, sequence: u64| Entry {
            due: Duration::from_millis(due),
            sequence,
            token: TimerToken {
                epoch: RunEpoch::new(1),
                owner: schedule(0),
            },
        };
        assert!(entry(100, 5) < entry(200, 0));
        assert!(entry(100, 0) < entry(100, 1));
        assert_eq!(
            BinaryHeap::from([Reverse(entry(300, 0)), Reverse(entry(100, 1))])
                .peek()
                .map(|Reverse(entry)| entry.due),
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn timers_wait_until_due() {
        let mut queue = TimerQueue::new(RunEpoch::new(1));
        queue.arm(Duration::from_millis(500), schedule(0));
        assert_eq!(queue.pop_due(Duration::from_millis(499)), None);
        assert_eq!(queue.next_due(), Some(Duration::from_millis(500)));
        assert_eq!(
            queue.pop_due(Duration::from_millis(500)),
            Some(DueTimer {
                due: Duration::from_millis(500),
                owner: schedule(0),
            })
        );
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue = TimerQueue::new(RunEpoch::new(1));
        let kind = MechanicKind::Tower;
        let id = MechanicId::new(3);
        queue.arm(
            Duration::from_millis(10),
            TimerOwner::Instance {
                kind,
                id,
                serial: 0,
                transition: Transition::Resolve,
            },
        );
        queue.arm(Duration::from_millis(20), schedule(0));

        assert_eq!(queue.cancel_where(|owner| owner.drives_instance(kind, id)), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.cancel_all(), 1);
        assert_eq!(queue.cancel_all(), 0);
        assert_eq!(queue.pop_due(Duration::from_secs(10)), None);
    }

    #[test]
    fn foreign_epoch_tokens_are_discarded() {
        let mut queue = TimerQueue::new(RunEpoch::new(2));
        queue.heap.push(Reverse(Entry {
            due: Duration::ZERO,
            sequence: 99,
            token: TimerToken {
                epoch: RunEpoch::new(1),
                owner: schedule(7),
            },
        }));
        queue.arm(Duration::ZERO, schedule(1));

        let fired = queue.pop_due(Duration::ZERO).map(|timer| timer.owner);
        assert_eq!(fired, Some(schedule(1)));
        assert_eq!(queue.pop_due(Duration::ZERO), None);
    }
}
