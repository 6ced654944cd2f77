//! Windowed run: keyboard-driven avatar, real frame deltas.

use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use raid_rehearsal_core::{Command, Event, GroundPoint};
use raid_rehearsal_rendering::{ArenaPresentation, Color, Presentation, RenderingBackend, Scene};
use raid_rehearsal_rendering_macroquad::MacroquadBackend;
use raid_rehearsal_system_authoring::Encounter;
use raid_rehearsal_system_presentation::PresentationBridge;
use raid_rehearsal_world::{self as world, World};
use tracing::debug;

/// Avatar movement speed in arena units per second.
const AVATAR_SPEED: f32 = 6.0;
/// Where the avatar stands when the window opens.
const AVATAR_START: GroundPoint = GroundPoint::new(0.0, 6.0);
/// Longest frame delta fed to the world; stalls are not replayed in one step.
const MAX_FRAME: Duration = Duration::from_millis(100);

const CLEAR_COLOR: Color = Color::from_rgb_u8(12, 12, 18);
const FLOOR_COLOR: Color = Color::from_rgb_u8(46, 44, 58);
const RIM_COLOR: Color = Color::from_rgb_u8(180, 170, 210);

/// Opens the window and runs until it is closed.
pub(crate) fn run(encounter: Encounter, vsync: bool, show_fps: bool) -> Result<()> {
    let Encounter { setup, schedule } = encounter;
    let arena_radius = setup.arena_radius;
    let arena = ArenaPresentation::new(arena_radius, FLOOR_COLOR, RIM_COLOR)
        .context("encounter arena cannot be presented")?;
    let title = format!("Raid Rehearsal: {}", setup.name);

    let mut world = World::new(schedule, setup);
    let mut bridge = PresentationBridge::new();
    let mut avatar = AVATAR_START;
    let mut events = Vec::new();

    let backend = MacroquadBackend::new()
        .with_vsync(vsync)
        .with_show_fps(show_fps);
    backend.run(
        Presentation::new(title, CLEAR_COLOR, Scene::new(arena)),
        move |frame_dt, input, scene| {
            let dt = frame_dt.min(MAX_FRAME);
            avatar = step_avatar(avatar, input.movement, dt, arena_radius);

            if input.restart_requested {
                world::apply(&mut world, Command::Restart, &avatar, &mut events);
            }
            if input.start_requested {
                world::apply(&mut world, Command::StartEncounter, &avatar, &mut events);
            }
            world::apply(&mut world, Command::Tick { dt }, &avatar, &mut events);
            for event in events.drain(..) {
                if !matches!(event, Event::TimeAdvanced { .. }) {
                    debug!(?event, "world event");
                }
            }

            bridge.populate(&world, avatar, scene);
        },
    )
}

/// Moves the avatar by the movement intent and keeps it on the arena floor.
fn step_avatar(avatar: GroundPoint, intent: Vec2, dt: Duration, arena_radius: f32) -> GroundPoint {
    let step = intent.clamp_length_max(1.0) * AVATAR_SPEED * dt.as_secs_f32();
    let moved = Vec2::new(avatar.x() + step.x, avatar.z() + step.y);
    let bounded = moved.clamp_length_max(arena_radius);
    GroundPoint::new(bounded.x, bounded.y)
}
