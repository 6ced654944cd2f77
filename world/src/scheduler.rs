//! Timeline scheduler: anchors the authored schedule and arms its actions.

use std::time::Duration;

use raid_rehearsal_core::EncounterSchedule;

use crate::timers::{TimerOwner, TimerQueue};

/// Arms every scheduled action as a one-shot timer relative to one anchor.
#[derive(Debug, Default)]
pub(crate) struct TimelineScheduler {
    anchor: Option<Duration>,
    armed: usize,
}

impl TimelineScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arms every action at `anchor + offset`.
    ///
    /// A second call without an intervening [`Self::cancel_all`] cancels the
    /// previous arming first, so at most one arming is ever pending.
    pub(crate) fn start(
        &mut self,
        anchor: Duration,
        schedule: &EncounterSchedule,
        timers: &mut TimerQueue,
    ) {
        if self.anchor.is_some() {
            let _ = self.cancel_all(timers);
        }
        for (index, scheduled) in schedule.actions().iter().enumerate() {
            timers.arm(anchor + scheduled.offset(), TimerOwner::Schedule { index });
        }
        self.anchor = Some(anchor);
        self.armed = schedule.len();
    }

    /// Revokes every armed action that has not fired yet; idempotent.
    pub(crate) fn cancel_all(&mut self, timers: &mut TimerQueue) -> usize {
        let cancelled = timers.cancel_where(|owner| matches!(owner, TimerOwner::Schedule { .. }));
        self.anchor = None;
        self.armed = 0;
        cancelled
    }

    /// Records that one armed action fired.
    pub(crate) fn mark_fired(&mut self) {
        self.armed = self.armed.saturating_sub(1);
    }

    pub(crate) const fn anchor(&self) -> Option<Duration> {
        self.anchor
    }

    /// Number of armed actions that have not fired yet.
    pub(crate) const fn pending(&self) -> usize {
        self.armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_rehearsal_core::{Action, RunEpoch, ScheduledAction};

    fn schedule() -> EncounterSchedule {
        let phase = |name: &str| Action::SetPhase {
            name: name.to_owned(),
        };
        EncounterSchedule::new(vec![
            ScheduledAction::new(Duration::ZERO, phase("intro")),
            ScheduledAction::new(Duration::from_millis(2000), phase("mid")),
            ScheduledAction::new(Duration::from_millis(2000), phase("late")),
        ])
        .expect("ordered schedule")
    }

    #[test]
    fn start_arms_every_action_relative_to_the_anchor() {
        let mut timers = TimerQueue::new(RunEpoch::new(0));
        let mut scheduler = TimelineScheduler::new();
        scheduler.start(Duration::from_secs(5), &schedule(), &mut timers);

        assert_eq!(scheduler.anchor(), Some(Duration::from_secs(5)));
        assert_eq!(scheduler.pending(), 3);
        assert_eq!(timers.next_due(), Some(Duration::from_secs(5)));

        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(Duration::from_secs(7)))
            .map(|timer| (timer.due, timer.owner))
            .collect();
        assert_eq!(
            fired,
            vec![
                (Duration::from_secs(5), TimerOwner::Schedule { index: 0 }),
                (Duration::from_secs(7), TimerOwner::Schedule { index: 1 }),
                (Duration::from_secs(7), TimerOwner::Schedule { index: 2 }),
            ]
        );
    }

    #[test]
    fn cancel_all_is_idempotent_and_safe_when_idle() {
        let mut timers = TimerQueue::new(RunEpoch::new(0));
        let mut scheduler = TimelineScheduler::new();
        assert_eq!(scheduler.cancel_all(&mut timers), 0);

        scheduler.start(Duration::ZERO, &schedule(), &mut timers);
        assert_eq!(scheduler.cancel_all(&mut timers), 3);
        assert_eq!(scheduler.cancel_all(&mut timers), 0);
        assert_eq!(timers.pop_due(Duration::from_secs(60)), None);
    }

    #[test]
    fn restarting_replaces_the_previous_arming() {
        let mut timers = TimerQueue::new(RunEpoch::new(0));
        let mut scheduler = TimelineScheduler::new();
        scheduler.start(Duration::ZERO, &schedule(), &mut timers);
        scheduler.start(Duration::from_secs(10), &schedule(), &mut timers);

        assert_eq!(timers.len(), 3);
        assert_eq!(timers.pop_due(Duration::from_secs(9)), None);
    }
}
