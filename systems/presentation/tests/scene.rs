use std::time::Duration;

use raid_rehearsal_core::{
    Action, Anchor, BossId, BossSpec, Command, EncounterSchedule, EncounterSetup, GroundPoint,
    MechanicId, MechanicKind, PartyRole, PartySlot, Rgb, ScheduledAction, Severity, SpawnParams,
    WorldPoint,
};
use raid_rehearsal_rendering::{ArenaPresentation, Color, Scene, Shape};
use raid_rehearsal_system_presentation::PresentationBridge;
use raid_rehearsal_world::{self as world, World};

const TICK: Duration = Duration::from_millis(10);

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn setup() -> EncounterSetup {
    EncounterSetup {
        name: "Bridge".to_owned(),
        bosses: vec![BossSpec {
            id: BossId::new(1),
            name: "Oracle".to_owned(),
            color: Rgb::from_hex(0x7e57c2),
            spawn: WorldPoint::new(0.0, 1.5, -6.0),
            move_speed: 4.0,
        }],
        party: vec![
            PartySlot {
                role: PartyRole::MainTank,
                position: GroundPoint::new(0.0, -3.0),
            },
            PartySlot {
                role: PartyRole::HealerOne,
                position: GroundPoint::new(3.0, 3.0),
            },
        ],
        ..EncounterSetup::default()
    }
}

fn schedule() -> EncounterSchedule {
    EncounterSchedule::new(vec![
        ScheduledAction::new(
            Duration::ZERO,
            Action::SetPhase {
                name: "opening".to_owned(),
            },
        ),
        ScheduledAction::new(
            Duration::ZERO,
            Action::StartCast {
                skill: "Shell Crusher".to_owned(),
                boss: "Oracle".to_owned(),
                cast_time: ms(4000),
                color: Rgb::from_hex(0xb388ff),
            },
        ),
        ScheduledAction::new(
            Duration::ZERO,
            Action::ShowHudMessage {
                name: "Stack".to_owned(),
                description: "Share the hit".to_owned(),
                severity: Severity::Danger,
                duration: ms(3000),
            },
        ),
        ScheduledAction::new(
            Duration::ZERO,
            Action::SpawnMechanic {
                kind: MechanicKind::AoeCircle,
                id: MechanicId::new(1),
                params: SpawnParams::at(Anchor::Fixed(GroundPoint::new(2.0, 2.0))),
            },
        ),
    ])
    .expect("ordered schedule")
}

fn scene() -> Scene {
    Scene::new(
        ArenaPresentation::new(
            20.0,
            Color::from_rgb_u8(30, 30, 40),
            Color::from_rgb_u8(220, 220, 230),
        )
        .expect("positive radius"),
    )
}

fn submit(world: &mut World, command: Command) {
    let mut events = Vec::new();
    world::apply(world, command, &GroundPoint::ORIGIN, &mut events);
}

fn tick_for(world: &mut World, span: Duration) {
    let steps = span.as_millis() / TICK.as_millis();
    for _ in 0..steps {
        submit(world, Command::Tick { dt: TICK });
    }
}

#[test]
fn idle_world_shows_party_and_prompt_only() {
    let world = World::new(schedule(), setup());
    let mut bridge = PresentationBridge::new();
    let mut scene = scene();

    bridge.populate(&world, GroundPoint::new(1.0, -1.0), &mut scene);

    assert_eq!(scene.party.len(), 2);
    assert_eq!(scene.party[0].label, "MT");
    assert!(scene.bosses.is_empty(), "bosses appear only once spawned");
    assert!(scene.primitives.is_empty());
    assert_eq!(scene.avatar.x, 1.0);
    assert_eq!(scene.avatar.z, -1.0);
    assert_eq!(scene.hud.title, "Bridge");
    assert_eq!(scene.hud.clock, "00:00.0");
    assert_eq!(scene.hud.status, "Press Enter to start");
}

#[test]
fn running_world_fills_telegraphs_and_hud() {
    let mut world = World::new(schedule(), setup());
    let mut bridge = PresentationBridge::new();
    let mut scene = scene();

    submit(&mut world, Command::StartEncounter);
    tick_for(&mut world, ms(500));
    bridge.populate(&world, GroundPoint::ORIGIN, &mut scene);

    assert_eq!(scene.hud.phase, "opening");
    assert_eq!(scene.hud.clock, "00:00.5");
    assert_eq!(scene.hud.status, "Press R to restart");
    assert_eq!(scene.bosses.len(), 1);
    assert_eq!(&*scene.bosses[0].name, "Oracle");

    let cast = scene.hud.cast_bar.as_ref().expect("cast bar is showing");
    assert_eq!(&*cast.skill, "Shell Crusher");
    assert!((cast.progress - 0.125).abs() < 1e-4);
    assert!((cast.remaining - 3.5).abs() < 1e-4);

    let banner = scene.hud.banner.as_ref().expect("banner is showing");
    assert_eq!(&*banner.description, "Share the hit");

    assert_eq!(scene.primitives.len(), 2, "circle draws a fill and an outline");
    assert!(matches!(scene.primitives[0].shape, Shape::Disc { radius } if radius == 3.0));
    assert!(matches!(scene.primitives[1].shape, Shape::Ring { .. }));
    assert_eq!(scene.primitives[0].position.x, 2.0);
    assert_eq!(scene.primitives[0].position.z, 2.0);
}

#[test]
fn restart_leaves_nothing_behind_in_the_scene() {
    let mut world = World::new(schedule(), setup());
    let mut bridge = PresentationBridge::new();
    let mut scene = scene();

    submit(&mut world, Command::StartEncounter);
    tick_for(&mut world, ms(500));
    bridge.populate(&world, GroundPoint::ORIGIN, &mut scene);
    assert!(!scene.primitives.is_empty());

    submit(&mut world, Command::Restart);
    bridge.populate(&world, GroundPoint::ORIGIN, &mut scene);

    assert!(scene.primitives.is_empty());
    assert!(scene.hud.cast_bar.is_none());
    assert!(scene.hud.banner.is_none());
    assert_eq!(scene.hud.clock, "00:00.0");
    assert_eq!(scene.hud.status, "Press Enter to start");
}

#[test]
fn hud_clears_once_cast_and_banner_expire() {
    let mut world = World::new(schedule(), setup());
    let mut bridge = PresentationBridge::new();
    let mut scene = scene();

    submit(&mut world, Command::StartEncounter);
    tick_for(&mut world, ms(3100));
    bridge.populate(&world, GroundPoint::ORIGIN, &mut scene);
    assert!(scene.hud.banner.is_none());
    assert!(scene.hud.cast_bar.is_some());

    tick_for(&mut world, ms(1000));
    bridge.populate(&world, GroundPoint::ORIGIN, &mut scene);
    assert!(scene.hud.cast_bar.is_none());
    assert_eq!(scene.hud.clock, "00:04.1");
}
