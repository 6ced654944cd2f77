//! Windowless replay with a fixed tick.

use std::time::Duration;

use anyhow::{ensure, Result};
use raid_rehearsal_core::{Command, Event, GroundPoint, RunStatus};
use raid_rehearsal_system_authoring::Encounter;
use raid_rehearsal_world::{self as world, query, World};
use tracing::{info, warn};

/// Tallies gathered while replaying an encounter.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ReplaySummary {
    pub(crate) ticks: u64,
    pub(crate) simulated: Duration,
    pub(crate) actions_fired: usize,
    pub(crate) actions_failed: usize,
    pub(crate) spawned: usize,
    pub(crate) rejected: usize,
    pub(crate) resolved: usize,
    pub(crate) phases: Vec<String>,
    pub(crate) live_at_end: usize,
    pub(crate) pending_at_end: usize,
    pub(crate) status: Option<RunStatus>,
}

impl ReplaySummary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::ActionFired { .. } => self.actions_fired += 1,
            Event::ActionFailed { index, error } => {
                self.actions_failed += 1;
                warn!(?index, %error, "action failed during replay");
            }
            Event::MechanicSpawned { .. } => self.spawned += 1,
            Event::SpawnRejected { .. } => self.rejected += 1,
            Event::MechanicResolved { .. } => self.resolved += 1,
            Event::PhaseChanged { name } => self.phases.push(name.clone()),
            _ => {}
        }
    }

    /// Logs the summary at info level.
    pub(crate) fn log(&self) {
        info!(
            ticks = self.ticks,
            simulated_ms = self.simulated.as_millis() as u64,
            fired = self.actions_fired,
            failed = self.actions_failed,
            spawned = self.spawned,
            rejected = self.rejected,
            resolved = self.resolved,
            live = self.live_at_end,
            pending = self.pending_at_end,
            phases = %self.phases.join(" > "),
            "replay finished"
        );
    }
}

/// Starts the encounter and ticks it until `length` of simulated time has passed.
///
/// The avatar stands still at the arena centre.
pub(crate) fn replay(encounter: Encounter, length: Duration, tick: Duration) -> Result<ReplaySummary> {
    ensure!(!tick.is_zero(), "tick length must be positive");

    let Encounter { setup, schedule } = encounter;
    let mut world = World::new(schedule, setup);
    let avatar = GroundPoint::ORIGIN;
    let mut summary = ReplaySummary::default();
    let mut events = Vec::new();

    world::apply(&mut world, Command::StartEncounter, &avatar, &mut events);
    while query::clock(&world) < length {
        world::apply(&mut world, Command::Tick { dt: tick }, &avatar, &mut events);
        summary.ticks += 1;
        for event in events.drain(..) {
            summary.record(&event);
        }
    }
    for event in events.drain(..) {
        summary.record(&event);
    }

    summary.simulated = query::clock(&world);
    summary.live_at_end = query::live_mechanic_count(&world);
    summary.pending_at_end = query::pending_actions(&world);
    summary.status = Some(query::run_status(&world));
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_rehearsal_system_authoring as authoring;

    #[test]
    fn builtin_encounter_replays_cleanly() {
        let encounter = authoring::builtin().expect("built-in encounter parses");
        let actions = encounter.schedule.len();
        let summary = replay(encounter, Duration::from_secs(90), Duration::from_millis(16))
            .expect("replay succeeds");

        assert_eq!(summary.actions_failed, 0);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.actions_fired, actions);
        assert_eq!(summary.pending_at_end, 0);
        assert_eq!(summary.status, Some(RunStatus::Running));
        assert_eq!(summary.phases.last().map(String::as_str), Some("cleared"));
        assert!(summary.spawned > 0);
        assert!(summary.simulated >= Duration::from_secs(90));
    }

    #[test]
    fn short_replays_stop_at_the_requested_length() {
        let encounter = authoring::builtin().expect("built-in encounter parses");
        let summary = replay(encounter, Duration::from_millis(100), Duration::from_millis(10))
            .expect("replay succeeds");

        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.simulated, Duration::from_millis(100));
        assert_eq!(summary.status, Some(RunStatus::Arming));
    }

    #[test]
    fn zero_ticks_are_refused() {
        let encounter = authoring::builtin().expect("built-in encounter parses");
        assert!(replay(encounter, Duration::from_secs(1), Duration::ZERO).is_err());
    }
}
