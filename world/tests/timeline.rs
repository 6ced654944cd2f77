use std::time::Duration;

use raid_rehearsal_core::{
    Action, ActionError, Anchor, Command, EncounterSchedule, EncounterSetup, Event,
    GroundPoint, InstanceSelector, LifecyclePhase, MechanicId, MechanicKind, RemovalCause,
    RunStatus, ScheduledAction, SpawnError, SpawnParams,
};
use raid_rehearsal_world::{self as world, query, World, INITIAL_PHASE};

const TICK: Duration = Duration::from_millis(10);

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn phase(name: &str) -> Action {
    Action::SetPhase {
        name: name.to_owned(),
    }
}

fn circle(id: u32, delay: u64, duration: u64) -> Action {
    Action::SpawnMechanic {
        kind: MechanicKind::AoeCircle,
        id: MechanicId::new(id),
        params: SpawnParams::at(Anchor::Fixed(GroundPoint::ORIGIN))
            .with_timing(ms(delay), ms(duration)),
    }
}

fn despawn_circle(id: u32) -> Action {
    Action::DespawnMechanic {
        kind: MechanicKind::AoeCircle,
        selector: InstanceSelector::Id(MechanicId::new(id)),
    }
}

fn world_with(actions: Vec<ScheduledAction>) -> World {
    World::new(
        EncounterSchedule::new(actions).expect("ordered schedule"),
        EncounterSetup::default(),
    )
}

fn submit(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &GroundPoint::ORIGIN, &mut events);
    events
}

/// Ticks in 10 ms steps until the clock reaches `until`.
fn run_until(world: &mut World, until: Duration) -> Vec<(Duration, Event)> {
    let mut log = Vec::new();
    while query::clock(world) < until {
        for event in submit(world, Command::Tick { dt: TICK }) {
            log.push((query::clock(world), event));
        }
    }
    log
}

fn reference_world() -> World {
    world_with(vec![
        ScheduledAction::new(Duration::ZERO, phase("intro")),
        ScheduledAction::new(ms(2000), circle(1, 1000, 1500)),
        ScheduledAction::new(ms(6000), despawn_circle(1)),
    ])
}

#[test]
fn reference_encounter_plays_out_in_order() {
    let mut world = reference_world();
    let started = submit(&mut world, Command::StartEncounter);

    assert!(started.contains(&Event::PhaseChanged {
        name: "intro".to_owned()
    }));
    assert_eq!(query::current_phase(&world), "intro");

    let _ = run_until(&mut world, ms(1990));
    assert_eq!(query::live_mechanic_count(&world), 0);

    let _ = run_until(&mut world, ms(2000));
    let snapshot = query::mechanic(&world, MechanicKind::AoeCircle, MechanicId::new(1))
        .expect("circle spawned at 2000 ms");
    assert_eq!(snapshot.visual.phase, LifecyclePhase::Telegraph);

    let _ = run_until(&mut world, ms(2990));
    assert_eq!(
        query::mechanic(&world, MechanicKind::AoeCircle, MechanicId::new(1))
            .map(|snapshot| snapshot.visual.phase),
        Some(LifecyclePhase::Telegraph)
    );
    let resolved = run_until(&mut world, ms(3000));
    assert!(resolved.iter().any(|(_, event)| matches!(
        event,
        Event::MechanicResolved { kind: MechanicKind::AoeCircle, .. }
    )));

    let finished = run_until(&mut world, ms(3500));
    assert!(finished.iter().any(|(_, event)| *event
        == Event::MechanicRemoved {
            kind: MechanicKind::AoeCircle,
            id: MechanicId::new(1),
            cause: RemovalCause::Completed,
        }));
    assert_eq!(query::live_mechanic_count(&world), 0);

    let tail = run_until(&mut world, ms(6100));
    assert!(tail.iter().any(|(at, event)| *at == ms(6000)
        && matches!(event, Event::ActionFired { index: Some(2), .. })));
    assert!(!tail
        .iter()
        .any(|(_, event)| matches!(event, Event::ActionFailed { .. })));
    assert_eq!(query::pending_actions(&world), 0);
}

#[test]
fn actions_fire_within_one_tick_of_their_offset() {
    let offsets = [0, 15, 250, 255, 1000, 1001, 2500];
    let mut world = world_with(
        offsets
            .iter()
            .enumerate()
            .map(|(index, offset)| ScheduledAction::new(ms(*offset), phase(&format!("p{index}"))))
            .collect(),
    );
    let _ = submit(&mut world, Command::StartEncounter);
    let log = run_until(&mut world, ms(3000));

    let fired: Vec<(usize, Duration)> = log
        .iter()
        .filter_map(|(at, event)| match event {
            Event::ActionFired {
                index: Some(index), ..
            } => Some((*index, *at)),
            _ => None,
        })
        .collect();

    let indices: Vec<usize> = fired.iter().map(|(index, _)| *index).collect();
    assert_eq!(indices, (1..offsets.len()).collect::<Vec<_>>());
    for (index, at) in fired {
        let offset = ms(offsets[index]);
        assert!(at >= offset, "action {index} fired early at {at:?}");
        assert!(at < offset + TICK, "action {index} fired late at {at:?}");
    }
}

#[test]
fn equal_offsets_fire_in_authored_order() {
    let mut world = world_with(vec![
        ScheduledAction::new(ms(100), phase("first")),
        ScheduledAction::new(ms(100), phase("second")),
        ScheduledAction::new(ms(100), phase("third")),
    ]);
    let _ = submit(&mut world, Command::StartEncounter);
    let log = run_until(&mut world, ms(200));

    let phases: Vec<&str> = log
        .iter()
        .filter_map(|(_, event)| match event {
            Event::PhaseChanged { name } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec!["first", "second", "third"]);
    assert_eq!(query::current_phase(&world), "third");
}

#[test]
fn restart_discards_every_pending_action() {
    let mut world = reference_world();
    let _ = submit(&mut world, Command::StartEncounter);
    let _ = run_until(&mut world, ms(1000));

    let reset = submit(&mut world, Command::Restart);
    assert!(matches!(reset.as_slice(), [Event::EncounterReset { .. }]));
    assert_eq!(query::run_status(&world), RunStatus::Idle);
    assert_eq!(query::current_phase(&world), INITIAL_PHASE);
    assert_eq!(query::pending_timers(&world), 0);

    let log = run_until(&mut world, ms(8000));
    assert!(log.iter().all(|(_, event)| matches!(event, Event::TimeAdvanced { .. })));
    assert_eq!(query::live_mechanic_count(&world), 0);
}

#[test]
fn restart_tears_down_live_mechanics_and_timers() {
    let mut world = reference_world();
    let _ = submit(&mut world, Command::StartEncounter);
    let _ = run_until(&mut world, ms(2500));
    assert_eq!(query::live_mechanic_count(&world), 1);

    let _ = submit(&mut world, Command::Restart);
    assert_eq!(query::live_mechanic_count(&world), 0);

    let _ = submit(&mut world, Command::StartEncounter);
    let log = run_until(&mut world, ms(4000));
    assert!(!log.iter().any(|(_, event)| matches!(
        event,
        Event::MechanicResolved { .. } | Event::MechanicRemoved { .. }
    )));
    assert_eq!(query::live_mechanic_count(&world), 0);
}

#[test]
fn restart_twice_matches_restart_once() {
    let summary = |world: &World| {
        (
            query::run_status(world),
            query::current_phase(world).to_owned(),
            query::live_mechanic_count(world),
            query::pending_timers(world),
            query::cast_bar(world).is_none(),
            query::banner(world).is_none(),
        )
    };

    let mut once = reference_world();
    let _ = submit(&mut once, Command::StartEncounter);
    let _ = run_until(&mut once, ms(2500));
    let _ = submit(&mut once, Command::Restart);

    let mut twice = reference_world();
    let _ = submit(&mut twice, Command::StartEncounter);
    let _ = run_until(&mut twice, ms(2500));
    let _ = submit(&mut twice, Command::Restart);
    let _ = submit(&mut twice, Command::Restart);

    assert_eq!(summary(&once), summary(&twice));
}

#[test]
fn starting_mid_run_resets_first() {
    let mut world = reference_world();
    let _ = submit(&mut world, Command::StartEncounter);
    let first_epoch = query::epoch(&world);
    let _ = run_until(&mut world, ms(2500));

    let events = submit(&mut world, Command::StartEncounter);
    assert!(matches!(events.first(), Some(Event::EncounterReset { .. })));
    assert!(query::epoch(&world) > first_epoch);
    assert_eq!(query::start_instant(&world), Some(ms(2500)));
    assert_eq!(query::live_mechanic_count(&world), 0);
    assert_eq!(query::current_phase(&world), "intro");
}

#[test]
fn force_complete_leaves_other_kinds_untouched() {
    let mut world = world_with(Vec::new());
    let _ = submit(&mut world, Command::StartEncounter);
    for kind in [MechanicKind::Tower, MechanicKind::DarkWater] {
        let _ = submit(
            &mut world,
            Command::Execute {
                action: Action::SpawnMechanic {
                    kind,
                    id: MechanicId::new(1),
                    params: SpawnParams::at(Anchor::Fixed(GroundPoint::ORIGIN)),
                },
            },
        );
    }

    let events = submit(
        &mut world,
        Command::ForceComplete {
            kind: MechanicKind::Tower,
            id: MechanicId::new(1),
        },
    );
    assert_eq!(
        events,
        vec![
            Event::MechanicPhaseChanged {
                kind: MechanicKind::Tower,
                id: MechanicId::new(1),
                phase: LifecyclePhase::Done,
            },
            Event::MechanicRemoved {
                kind: MechanicKind::Tower,
                id: MechanicId::new(1),
                cause: RemovalCause::Forced,
            },
        ]
    );
    assert!(query::mechanic(&world, MechanicKind::DarkWater, MechanicId::new(1)).is_some());
    assert!(query::snapshot(&world, MechanicKind::Tower).is_empty());

    // Dark water still resolves on its own timer, 2000 ms after spawning.
    let mut log = run_until(&mut world, ms(2100));
    assert!(log.iter().any(|(_, event)| matches!(
        event,
        Event::MechanicResolved {
            kind: MechanicKind::DarkWater,
            ..
        }
    )));
    assert_eq!(query::live_mechanic_count(&world), 1);

    log.extend(run_until(&mut world, ms(5000)));
    assert!(!log.iter().any(|(_, event)| matches!(
        event,
        Event::MechanicResolved { kind: MechanicKind::Tower, .. }
    )));
}

#[test]
fn duplicate_spawn_is_rejected_and_keeps_the_live_instance() {
    let mut world = world_with(vec![
        ScheduledAction::new(ms(0), circle(1, 1000, 1500)),
        ScheduledAction::new(ms(500), circle(1, 200, 300)),
        ScheduledAction::new(ms(600), phase("after")),
    ]);
    let _ = submit(&mut world, Command::StartEncounter);
    let log = run_until(&mut world, ms(700));

    assert!(log.iter().any(|(_, event)| *event
        == Event::ActionFailed {
            index: Some(1),
            error: ActionError::Spawn(SpawnError::DuplicateId {
                kind: MechanicKind::AoeCircle,
                id: MechanicId::new(1),
            }),
        }));
    let survivor = query::mechanic(&world, MechanicKind::AoeCircle, MechanicId::new(1))
        .expect("original instance survives");
    assert_eq!(survivor.placement.delay, ms(1000));
    assert_eq!(query::current_phase(&world), "after");

    let rest = run_until(&mut world, ms(1100));
    assert!(rest.iter().any(|(at, event)| *at == ms(1000)
        && matches!(event, Event::MechanicResolved { .. })));
}

#[test]
fn failing_actions_do_not_block_later_ones() {
    let mut world = world_with(vec![
        ScheduledAction::new(
            ms(100),
            Action::SpawnMechanic {
                kind: MechanicKind::Tower,
                id: MechanicId::new(1),
                params: SpawnParams::at(Anchor::Fixed(GroundPoint::ORIGIN)).with_radius(-1.0),
            },
        ),
        ScheduledAction::new(ms(100), phase("still running")),
        ScheduledAction::new(ms(200), circle(2, 100, 200)),
    ]);
    let _ = submit(&mut world, Command::StartEncounter);
    let log = run_until(&mut world, ms(250));

    assert!(log
        .iter()
        .any(|(_, event)| matches!(event, Event::ActionFailed { index: Some(0), .. })));
    assert_eq!(query::current_phase(&world), "still running");
    assert!(query::mechanic(&world, MechanicKind::AoeCircle, MechanicId::new(2)).is_some());
    assert!(query::mechanic(&world, MechanicKind::Tower, MechanicId::new(1)).is_none());
}

#[test]
fn despawn_all_clears_only_the_named_kind() {
    let mut world = world_with(Vec::new());
    let _ = submit(&mut world, Command::StartEncounter);
    for id in 1..=3 {
        let _ = submit(
            &mut world,
            Command::Execute {
                action: circle(id, 5000, 6000),
            },
        );
    }
    let _ = submit(
        &mut world,
        Command::Execute {
            action: Action::SpawnMechanic {
                kind: MechanicKind::Tower,
                id: MechanicId::new(1),
                params: SpawnParams::at(Anchor::Fixed(GroundPoint::ORIGIN)),
            },
        },
    );

    let events = submit(
        &mut world,
        Command::Execute {
            action: Action::DespawnMechanic {
                kind: MechanicKind::AoeCircle,
                selector: InstanceSelector::All,
            },
        },
    );
    let removed = events
        .iter()
        .filter(|event| matches!(event, Event::MechanicRemoved { cause: RemovalCause::Despawned, .. }))
        .count();
    assert_eq!(removed, 3);
    assert_eq!(query::live_mechanic_count(&world), 1);
}

#[test]
fn dragon_heads_leave_a_puddle_where_they_land() {
    let landing = GroundPoint::new(4.0, -2.0);
    let mut world = world_with(vec![ScheduledAction::new(
        ms(0),
        Action::SpawnMechanic {
            kind: MechanicKind::DragonHead,
            id: MechanicId::new(7),
            params: SpawnParams::at(Anchor::Fixed(GroundPoint::ORIGIN))
                .with_target(Anchor::Fixed(landing))
                .with_timing(ms(500), ms(600)),
        },
    )]);
    let _ = submit(&mut world, Command::StartEncounter);
    let log = run_until(&mut world, ms(700));

    assert!(log.iter().any(|(_, event)| *event
        == Event::MechanicSpawned {
            kind: MechanicKind::Puddle,
            id: MechanicId::new(7),
            origin: landing,
        }));
    let puddle = query::mechanic(&world, MechanicKind::Puddle, MechanicId::new(7))
        .expect("puddle lingers after the head is gone");
    assert_eq!(puddle.placement.origin, landing);
    assert!(query::mechanic(&world, MechanicKind::DragonHead, MechanicId::new(7)).is_none());
}

#[test]
fn cast_bars_and_banners_clear_themselves() {
    let mut world = world_with(vec![
        ScheduledAction::new(
            ms(0),
            Action::StartCast {
                skill: "Darklit Dragonsong".to_owned(),
                boss: "Oracle of Darkness".to_owned(),
                cast_time: ms(1000),
                color: raid_rehearsal_core::Rgb::WHITE,
            },
        ),
        ScheduledAction::new(
            ms(0),
            Action::ShowHudMessage {
                name: "Spread".to_owned(),
                description: "Move away from the party".to_owned(),
                severity: raid_rehearsal_core::Severity::Danger,
                duration: ms(500),
            },
        ),
    ]);
    let _ = submit(&mut world, Command::StartEncounter);
    assert!(query::cast_bar(&world).is_some());
    assert!(query::banner(&world).is_some());

    let _ = run_until(&mut world, ms(500));
    assert!(query::banner(&world).is_none());
    assert!(query::cast_bar(&world).is_some());

    let _ = run_until(&mut world, ms(1000));
    assert!(query::cast_bar(&world).is_none());
}
