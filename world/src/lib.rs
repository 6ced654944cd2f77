#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative encounter state for the raid rehearsal engine.
//!
//! The world owns the simulation clock and exactly one live encounter run.
//! Every mutation flows through [`apply`]; every observation flows through the
//! [`query`] module. Timers armed by a run carry the run's epoch, so nothing a
//! torn-down run scheduled can ever act on its successor.

mod bosses;
mod hud;
mod party;
mod phase;
mod registry;
mod run;
mod scheduler;
mod timers;

use std::time::Duration;

use raid_rehearsal_core::{
    AvatarPosition, Command, EncounterSchedule, EncounterSetup, Event, RunEpoch, RunStatus,
};
use tracing::{debug, info};

pub use bosses::Boss;
pub use hud::{Banner, CastBar};
pub use phase::INITIAL_PHASE;

use run::EncounterRun;

/// Represents the authoritative raid rehearsal world state.
#[derive(Debug)]
pub struct World {
    schedule: EncounterSchedule,
    setup: EncounterSetup,
    clock: Duration,
    run: EncounterRun,
}

impl World {
    /// Creates a world holding an idle run of the provided encounter.
    #[must_use]
    pub fn new(schedule: EncounterSchedule, setup: EncounterSetup) -> Self {
        let run = EncounterRun::idle(RunEpoch::new(0), &setup);
        Self {
            schedule,
            setup,
            clock: Duration::ZERO,
            run,
        }
    }

    /// Tears down the current run and installs a fresh idle one.
    fn reset(&mut self, out_events: &mut Vec<Event>) {
        let cancelled = self.run.cancel_everything();
        let epoch = self.run.epoch.next();
        self.run = EncounterRun::idle(epoch, &self.setup);
        info!(epoch = epoch.get(), cancelled, "encounter reset");
        out_events.push(Event::EncounterReset { epoch });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// The avatar position is read only by actions that anchor hazards to the
/// avatar or to a random party member.
pub fn apply(
    world: &mut World,
    command: Command,
    avatar: &dyn AvatarPosition,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.run.advance(dt, out_events);
            world
                .run
                .fire_due(world.clock, &world.schedule, avatar, out_events);
        }
        Command::StartEncounter => {
            if world.run.status != RunStatus::Idle {
                debug!(epoch = world.run.epoch.get(), "start requested mid-run");
                world.reset(out_events);
            }
            let spawn_delay = world.setup.spawn_delay;
            world.run.arm(world.clock, spawn_delay, out_events);
            world
                .run
                .fire_due(world.clock, &world.schedule, avatar, out_events);
        }
        Command::Restart => {
            world.reset(out_events);
        }
        Command::Execute { action } => {
            let now = world.clock;
            world
                .run
                .dispatch(None, &action, now, now, avatar, out_events);
        }
        Command::ForceComplete { kind, id } => {
            world.run.force_complete(kind, id, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use raid_rehearsal_core::{
        EncounterSchedule, EncounterSetup, MechanicId, MechanicKind, MechanicSnapshot,
        PartySlot, RunEpoch, RunStatus,
    };

    use super::{Banner, Boss, CastBar, World};

    /// Current simulation time.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Status of the current run.
    #[must_use]
    pub fn run_status(world: &World) -> RunStatus {
        world.run.status
    }

    /// Epoch of the current run.
    #[must_use]
    pub fn epoch(world: &World) -> RunEpoch {
        world.run.epoch
    }

    /// Simulation time at which the current run anchored its schedule.
    #[must_use]
    pub fn start_instant(world: &World) -> Option<Duration> {
        world.run.start_instant
    }

    /// Time elapsed since the schedule anchored, if it has.
    #[must_use]
    pub fn encounter_elapsed(world: &World) -> Option<Duration> {
        world
            .run
            .start_instant
            .map(|start| world.clock.saturating_sub(start))
    }

    /// Name of the current encounter phase.
    #[must_use]
    pub fn current_phase(world: &World) -> &str {
        world.run.phase.current_phase()
    }

    /// Ordered copies of the live instances of one kind.
    #[must_use]
    pub fn snapshot(world: &World, kind: MechanicKind) -> Vec<MechanicSnapshot> {
        world.run.registry.snapshot(kind)
    }

    /// Copies of every live instance, ordered by kind, then id.
    pub fn mechanics(world: &World) -> impl Iterator<Item = MechanicSnapshot> + '_ {
        world.run.registry.iter()
    }

    /// Copy of one live instance.
    #[must_use]
    pub fn mechanic(world: &World, kind: MechanicKind, id: MechanicId) -> Option<MechanicSnapshot> {
        world.run.registry.get(kind, id)
    }

    /// Number of live instances across every kind.
    #[must_use]
    pub fn live_mechanic_count(world: &World) -> usize {
        world.run.registry.len()
    }

    /// Cast bar currently shown on the HUD.
    #[must_use]
    pub fn cast_bar(world: &World) -> Option<&CastBar> {
        world.run.hud.cast()
    }

    /// Banner currently shown on the HUD.
    #[must_use]
    pub fn banner(world: &World) -> Option<&Banner> {
        world.run.hud.banner()
    }

    /// Bosses of the current run, ordered by id.
    pub fn bosses(world: &World) -> impl Iterator<Item = &Boss> + '_ {
        world.run.bosses.iter()
    }

    /// Party markers of the encounter.
    #[must_use]
    pub fn party(world: &World) -> &[PartySlot] {
        world.run.party.slots()
    }

    /// Number of timers armed by the current run.
    #[must_use]
    pub fn pending_timers(world: &World) -> usize {
        world.run.timers.len()
    }

    /// Due time of the earliest timer armed by the current run.
    #[must_use]
    pub fn next_timer_due(world: &World) -> Option<Duration> {
        world.run.timers.next_due()
    }

    /// Number of scheduled actions armed but not yet fired.
    #[must_use]
    pub fn pending_actions(world: &World) -> usize {
        world.run.scheduler.pending()
    }

    /// Authored schedule replayed by every run.
    #[must_use]
    pub fn schedule(world: &World) -> &EncounterSchedule {
        &world.schedule
    }

    /// Static arena and roster configuration.
    #[must_use]
    pub fn setup(world: &World) -> &EncounterSetup {
        &world.setup
    }
}
