//! One playthrough of the encounter and everything it owns.

use std::time::Duration;

use raid_rehearsal_core::{
    Action, ActionError, Anchor, AvatarPosition, EncounterSchedule, EncounterSetup, Event,
    GroundPoint, InstanceSelector, LifecyclePhase, MechanicId, MechanicKind, RemovalCause,
    RunEpoch, RunStatus, SpawnError, SpawnParams,
};
use raid_rehearsal_system_lifecycle::{Lifecycle, Transition};
use tracing::{debug, info, warn};

use crate::{
    bosses::BossRoster,
    hud::HudState,
    party::Party,
    phase::PhaseTracker,
    registry::{MechanicInstance, MechanicRegistry},
    scheduler::TimelineScheduler,
    timers::{DueTimer, TimerOwner, TimerQueue},
};

/// Sole mutable aggregate of one playthrough.
///
/// A run is never partially reset: restarting replaces it wholesale, and the
/// fresh run's timers carry a new epoch.
#[derive(Debug)]
pub(crate) struct EncounterRun {
    pub(crate) epoch: RunEpoch,
    pub(crate) status: RunStatus,
    pub(crate) start_instant: Option<Duration>,
    pub(crate) timers: TimerQueue,
    pub(crate) scheduler: TimelineScheduler,
    pub(crate) registry: MechanicRegistry,
    pub(crate) phase: PhaseTracker,
    pub(crate) hud: HudState,
    pub(crate) bosses: BossRoster,
    pub(crate) party: Party,
    next_serial: u64,
}

impl EncounterRun {
    /// Creates an idle run.
    pub(crate) fn idle(epoch: RunEpoch, setup: &EncounterSetup) -> Self {
        Self {
            epoch,
            status: RunStatus::Idle,
            start_instant: None,
            timers: TimerQueue::new(epoch),
            scheduler: TimelineScheduler::new(),
            registry: MechanicRegistry::new(),
            phase: PhaseTracker::new(),
            hud: HudState::new(),
            bosses: BossRoster::new(&setup.bosses),
            party: Party::new(&setup.party, setup.seed),
            next_serial: 0,
        }
    }

    /// Revokes every pending timer, schedule-level and instance-level alike.
    pub(crate) fn cancel_everything(&mut self) -> usize {
        let actions = self.scheduler.cancel_all(&mut self.timers);
        let others = self.timers.cancel_all();
        actions + others
    }

    /// Begins spawning bosses and arms the spawn-complete trigger.
    pub(crate) fn arm(&mut self, now: Duration, spawn_delay: Duration, out_events: &mut Vec<Event>) {
        self.status = RunStatus::Arming;
        self.timers.arm(now + spawn_delay, TimerOwner::SpawnComplete);
        info!(epoch = self.epoch.get(), spawn_delay_ms = spawn_delay.as_millis() as u64, "encounter arming");
        out_events.push(Event::EncounterArming {
            epoch: self.epoch,
            spawn_delay,
        });
    }

    /// Advances continuous state: lifecycles and bosses.
    pub(crate) fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();
        self.registry.advance_all(seconds);
        self.bosses
            .advance(seconds, self.phase.generation(), out_events);
    }

    /// Fires every timer due at or before `now`, including timers armed while firing.
    pub(crate) fn fire_due(
        &mut self,
        now: Duration,
        schedule: &EncounterSchedule,
        avatar: &dyn AvatarPosition,
        out_events: &mut Vec<Event>,
    ) {
        while let Some(DueTimer { due, owner }) = self.timers.pop_due(now) {
            match owner {
                TimerOwner::SpawnComplete => self.anchor(due, schedule, out_events),
                TimerOwner::Schedule { index } => {
                    self.scheduler.mark_fired();
                    let Some(scheduled) = schedule.get(index) else {
                        continue;
                    };
                    debug!(
                        index,
                        offset_ms = scheduled.offset().as_millis() as u64,
                        action = scheduled.action().label(),
                        "scheduled action due"
                    );
                    self.dispatch(Some(index), scheduled.action(), due, now, avatar, out_events);
                }
                TimerOwner::Instance {
                    kind,
                    id,
                    serial,
                    transition,
                } => self.transition(kind, id, serial, transition, due, now, out_events),
                TimerOwner::CastBar { generation } => {
                    if self.hud.clear_cast(generation) {
                        out_events.push(Event::CastCleared);
                    }
                }
                TimerOwner::Banner { generation } => {
                    if self.hud.clear_banner(generation) {
                        out_events.push(Event::HudMessageCleared);
                    }
                }
            }
        }
    }

    fn anchor(&mut self, due: Duration, schedule: &EncounterSchedule, out_events: &mut Vec<Event>) {
        if self.start_instant.is_some() || self.scheduler.anchor().is_some() {
            warn!(epoch = self.epoch.get(), "spawn-complete fired for an anchored run");
            return;
        }
        self.start_instant = Some(due);
        self.status = RunStatus::Running;
        self.bosses.complete_spawn(out_events);
        self.scheduler.start(due, schedule, &mut self.timers);
        info!(
            epoch = self.epoch.get(),
            anchor_ms = due.as_millis() as u64,
            actions = self.scheduler.pending(),
            "encounter started"
        );
        out_events.push(Event::EncounterStarted {
            epoch: self.epoch,
            anchor: due,
        });
    }

    /// Executes one action, isolating its failure from everything else.
    pub(crate) fn dispatch(
        &mut self,
        index: Option<usize>,
        action: &Action,
        due: Duration,
        now: Duration,
        avatar: &dyn AvatarPosition,
        out_events: &mut Vec<Event>,
    ) {
        match self.execute(action, due, now, avatar, out_events) {
            Ok(()) => out_events.push(Event::ActionFired { index, at: now }),
            Err(error) => {
                warn!(?index, action = action.label(), %error, "action failed");
                out_events.push(Event::ActionFailed { index, error });
            }
        }
    }

    fn execute(
        &mut self,
        action: &Action,
        due: Duration,
        now: Duration,
        avatar: &dyn AvatarPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        match action {
            Action::SpawnMechanic { kind, id, params } => {
                self.spawn(*kind, *id, params, due, now, avatar, out_events)?;
            }
            Action::DespawnMechanic { kind, selector } => {
                self.despawn(*kind, *selector, out_events);
            }
            Action::SetPhase { name } => {
                if self.phase.set_phase(name) {
                    info!(phase = %name, "phase changed");
                    out_events.push(Event::PhaseChanged { name: name.clone() });
                }
            }
            Action::StartCast {
                skill,
                boss,
                cast_time,
                color,
            } => {
                let generation = self.hud.start_cast(skill, boss, due, *cast_time, *color);
                self.timers
                    .arm(due + *cast_time, TimerOwner::CastBar { generation });
                out_events.push(Event::CastStarted {
                    skill: skill.clone(),
                    boss: boss.clone(),
                });
            }
            Action::ShowHudMessage {
                name,
                description,
                severity,
                duration,
            } => {
                let expires = due + *duration;
                let generation = self.hud.show_banner(name, description, *severity, expires);
                self.timers.arm(expires, TimerOwner::Banner { generation });
                out_events.push(Event::HudMessageShown {
                    name: name.clone(),
                    severity: *severity,
                });
            }
            Action::MoveBoss { boss, target } => {
                self.bosses
                    .move_boss(*boss, *target, self.phase.generation())?;
            }
        }
        Ok(())
    }

    fn resolve_anchor(
        &mut self,
        anchor: Anchor,
        avatar: &dyn AvatarPosition,
    ) -> Result<GroundPoint, ActionError> {
        match anchor {
            Anchor::Fixed(point) => Ok(point),
            Anchor::Avatar => Ok(avatar.ground_position()),
            Anchor::Boss(id) => self
                .bosses
                .position(id)
                .map(|position| position.ground())
                .ok_or(ActionError::UnknownBoss(id)),
            Anchor::Party(role) => self
                .party
                .position(role)
                .ok_or(ActionError::UnknownPartySlot(role)),
            Anchor::RandomPartyMember => Ok(self.party.random_member(avatar.ground_position())),
        }
    }

    /// Spawns an instance whose timers are anchored at `due`.
    #[allow(clippy::too_many_arguments)]
    fn spawn(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
        params: &SpawnParams,
        due: Duration,
        now: Duration,
        avatar: &dyn AvatarPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        if self.registry.contains(kind, id) {
            return Err(SpawnError::DuplicateId { kind, id }.into());
        }
        let origin = self.resolve_anchor(params.origin, avatar)?;
        let target = params
            .target
            .map(|anchor| self.resolve_anchor(anchor, avatar))
            .transpose()?;
        let lifecycle = Lifecycle::spawn(kind, origin, target, params)?;
        self.admit(kind, id, lifecycle, due, now, out_events)?;
        Ok(())
    }

    fn admit(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
        mut lifecycle: Lifecycle,
        due: Duration,
        now: Duration,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SpawnError> {
        if self.registry.contains(kind, id) {
            return Err(SpawnError::DuplicateId { kind, id });
        }
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);

        for (offset, transition) in lifecycle.pending_transitions() {
            self.timers.arm(
                due + offset,
                TimerOwner::Instance {
                    kind,
                    id,
                    serial,
                    transition,
                },
            );
        }
        let _ = lifecycle.advance(now.saturating_sub(due).as_secs_f32());
        let origin = lifecycle.placement().origin;
        let _ = self
            .registry
            .spawn(id, MechanicInstance { serial, lifecycle })?;

        debug!(kind = %kind, id = id.get(), serial, "mechanic spawned");
        out_events.push(Event::MechanicSpawned { kind, id, origin });
        Ok(())
    }

    fn despawn(&mut self, kind: MechanicKind, selector: InstanceSelector, out_events: &mut Vec<Event>) {
        let ids = self.registry.select(kind, selector);
        if ids.is_empty() {
            debug!(kind = %kind, ?selector, "despawn matched no live instance");
        }
        for id in ids {
            self.remove(kind, id, RemovalCause::Despawned, out_events);
        }
    }

    /// Drives one instance straight to `Done`; missing ids are ignored.
    pub(crate) fn force_complete(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(instance) = self.registry.get_mut(kind, id) else {
            debug!(kind = %kind, id = id.get(), "force-complete matched no live instance");
            return;
        };
        if instance.lifecycle.on_duration_elapsed() {
            out_events.push(Event::MechanicPhaseChanged {
                kind,
                id,
                phase: LifecyclePhase::Done,
            });
        }
        self.remove(kind, id, RemovalCause::Forced, out_events);
    }

    fn remove(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
        cause: RemovalCause,
        out_events: &mut Vec<Event>,
    ) {
        if self.registry.despawn_by_id(kind, id).is_none() {
            return;
        }
        let _ = self
            .timers
            .cancel_where(|owner| owner.drives_instance(kind, id));
        debug!(kind = %kind, id = id.get(), ?cause, "mechanic removed");
        out_events.push(Event::MechanicRemoved { kind, id, cause });
    }

    #[allow(clippy::too_many_arguments)]
    fn transition(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
        serial: u64,
        transition: Transition,
        due: Duration,
        now: Duration,
        out_events: &mut Vec<Event>,
    ) {
        let Some(instance) = self.registry.get_mut(kind, id) else {
            return;
        };
        if instance.serial != serial {
            return;
        }
        let outcome = instance.lifecycle.apply(transition);

        if let Some(phase) = outcome.entered {
            out_events.push(Event::MechanicPhaseChanged { kind, id, phase });
        }
        if let Some(position) = outcome.resolved_at {
            debug!(kind = %kind, id = id.get(), "mechanic resolved");
            out_events.push(Event::MechanicResolved { kind, id, position });
            self.chain(kind, id, position, due, now, out_events);
        }
        if outcome.entered == Some(LifecyclePhase::Done) {
            self.remove(kind, id, RemovalCause::Completed, out_events);
        }
    }

    /// Follow-up spawned by a resolving mechanic.
    fn chain(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
        position: GroundPoint,
        due: Duration,
        now: Duration,
        out_events: &mut Vec<Event>,
    ) {
        if kind != MechanicKind::DragonHead {
            return;
        }
        let follow_up = MechanicKind::Puddle;
        let params = SpawnParams::at(Anchor::Fixed(position));
        let admitted = Lifecycle::spawn(follow_up, position, None, &params)
            .and_then(|lifecycle| self.admit(follow_up, id, lifecycle, due, now, out_events));
        if let Err(reason) = admitted {
            warn!(kind = %follow_up, id = id.get(), %reason, "follow-up spawn rejected");
            out_events.push(Event::SpawnRejected {
                kind: follow_up,
                id,
                reason,
            });
        }
    }
}
