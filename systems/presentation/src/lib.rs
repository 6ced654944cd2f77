#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation bridge: maps world snapshots onto reusable scene buffers.
//!
//! The bridge only reads the world. Every frame it clears the scene's buffers
//! and refills them from the live instances, bosses, party markers and HUD
//! state, so nothing it produces can outlive the run it was derived from.

use std::{collections::BTreeMap, f32::consts::FRAC_PI_3, fmt::Write as _, sync::Arc};

use glam::Vec3;
use raid_rehearsal_core::{
    BossId, GroundPoint, LifecyclePhase, MechanicKind, MechanicSnapshot, PartyRole, RunStatus,
    Severity, WorldPoint,
};
use raid_rehearsal_rendering::{
    BannerPresentation, BossPresentation, CastBarPresentation, Color, DrawPrimitive,
    MarkerPresentation, Scene, Shape,
};
use raid_rehearsal_world::{query, World};

/// Lift applied to flat geometry so it never z-fights with the floor.
const FLOOR_OFFSET: f32 = 0.02;
/// Width of telegraph outlines.
const OUTLINE: f32 = 0.15;
/// Radius of the sphere standing in for a travelling source.
const SOURCE_RADIUS: f32 = 0.6;
/// Half width of the tidal light wall.
const TIDAL_HALF_WIDTH: f32 = 1.5;

const TANK: Color = Color::from_rgb_u8(0x4a, 0x90, 0xe2);
const HEALER: Color = Color::from_rgb_u8(0x4c, 0xaf, 0x50);
const DAMAGE: Color = Color::from_rgb_u8(0xe5, 0x39, 0x35);

/// Fills a [`Scene`] from the world every frame.
///
/// A bridge is paired with one scene: the clock and phase labels are only
/// rewritten when the displayed value changes.
#[derive(Debug, Default)]
pub struct PresentationBridge {
    clock_tenths: Option<u128>,
    boss_names: BTreeMap<BossId, Arc<str>>,
}

impl PresentationBridge {
    /// Creates a bridge with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the scene and refills it from the current world state.
    pub fn populate(&mut self, world: &World, avatar: GroundPoint, scene: &mut Scene) {
        scene.clear();
        scene.avatar = floor(avatar);

        for slot in query::party(world) {
            scene.party.push(MarkerPresentation {
                label: slot.role.label(),
                position: floor(slot.position),
                color: role_color(slot.role),
            });
        }

        for boss in query::bosses(world).filter(|boss| boss.is_spawned()) {
            let name = self
                .boss_names
                .entry(boss.id())
                .or_insert_with(|| Arc::from(boss.name()));
            scene.bosses.push(BossPresentation {
                name: Arc::clone(name),
                position: world_point(boss.position()),
                scale: boss.scale(),
                color: Color::from(boss.color()),
            });
        }

        let arena_radius = scene.arena.radius;
        for snapshot in query::mechanics(world) {
            push_mechanic(&snapshot, arena_radius, &mut scene.primitives);
        }

        self.populate_hud(world, scene);
    }

    fn populate_hud(&mut self, world: &World, scene: &mut Scene) {
        let hud = &mut scene.hud;
        if hud.title != query::setup(world).name {
            query::setup(world).name.clone_into(&mut hud.title);
        }
        let phase = query::current_phase(world);
        if hud.phase != phase {
            phase.clone_into(&mut hud.phase);
        }

        let tenths = query::encounter_elapsed(world).map_or(0, |elapsed| elapsed.as_millis() / 100);
        if self.clock_tenths != Some(tenths) {
            self.clock_tenths = Some(tenths);
            hud.clock.clear();
            write_clock(&mut hud.clock, tenths);
        }

        hud.status = match query::run_status(world) {
            RunStatus::Idle => "Press Enter to start",
            RunStatus::Arming => "Bosses are spawning",
            RunStatus::Running => "Press R to restart",
        };

        let now = query::clock(world);
        hud.cast_bar = query::cast_bar(world).map(|cast| CastBarPresentation {
            skill: Arc::clone(cast.skill()),
            boss: Arc::clone(cast.boss()),
            progress: cast.progress(now),
            remaining: cast.remaining(now).as_secs_f32(),
            color: Color::from(cast.color()),
        });
        hud.banner = query::banner(world).map(|banner| BannerPresentation {
            name: Arc::clone(banner.name()),
            description: Arc::clone(banner.description()),
            accent: severity_color(banner.severity()),
        });
    }
}

/// Writes `MM:SS.t` for the provided number of tenths of a second.
fn write_clock(out: &mut String, tenths: u128) {
    let minutes = tenths / 600;
    let seconds = (tenths / 10) % 60;
    let tenth = tenths % 10;
    let _ = write!(out, "{minutes:02}:{seconds:02}.{tenth}");
}

fn floor(point: GroundPoint) -> Vec3 {
    Vec3::new(point.x(), FLOOR_OFFSET, point.z())
}

fn world_point(point: WorldPoint) -> Vec3 {
    Vec3::new(point.x(), point.y(), point.z())
}

fn role_color(role: PartyRole) -> Color {
    match role {
        PartyRole::MainTank | PartyRole::OffTank => TANK,
        PartyRole::HealerOne | PartyRole::HealerTwo => HEALER,
        PartyRole::MeleeOne | PartyRole::MeleeTwo | PartyRole::RangedOne | PartyRole::RangedTwo => {
            DAMAGE
        }
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::from_rgb_u8(0x64, 0xb5, 0xf6),
        Severity::Warning => Color::from_rgb_u8(0xff, 0xb3, 0x00),
        Severity::Danger => Color::from_rgb_u8(0xff, 0x17, 0x44),
    }
}

/// Appends the primitives of one live instance.
fn push_mechanic(snapshot: &MechanicSnapshot, arena_radius: f32, out: &mut Vec<DrawPrimitive>) {
    let visual = &snapshot.visual;
    if visual.phase == LifecyclePhase::Done || visual.opacity <= 0.0 {
        return;
    }
    let placement = &snapshot.placement;
    let color = Color::from(visual.color).with_alpha(visual.opacity);
    let radius = placement.radius * visual.scale;
    let centre = Vec3::new(visual.position.x(), FLOOR_OFFSET, visual.position.z());
    let disc = |radius: f32| DrawPrimitive::new(Shape::Disc { radius }, centre, color);
    let outline = |radius: f32| {
        DrawPrimitive::new(
            Shape::Ring {
                radius,
                thickness: OUTLINE,
            },
            centre,
            color.lighten(0.3),
        )
    };

    match snapshot.kind {
        MechanicKind::AoeCircle
        | MechanicKind::DarkWater
        | MechanicKind::Hourglass
        | MechanicKind::MornAfah
        | MechanicKind::UnholyDarkness
        | MechanicKind::DarkDebuff => {
            out.push(disc(radius));
            out.push(outline(radius));
        }
        MechanicKind::Puddle => {
            out.push(disc(radius * visual.secondary.max(0.0)));
        }
        MechanicKind::ReturnPoint => {
            out.push(outline(radius));
            let (sin, cos) = visual.rotation.sin_cos();
            let hand = centre + Vec3::new(sin, 0.0, cos) * radius * 0.5;
            out.push(DrawPrimitive::new(
                Shape::Sphere {
                    radius: radius * 0.15,
                },
                hand,
                color,
            ));
        }
        MechanicKind::Tower => {
            out.push(DrawPrimitive::new(
                Shape::Column {
                    radius,
                    height: visual.height,
                },
                centre,
                color.with_alpha(visual.opacity * 0.5),
            ));
            out.push(outline(radius).with_alpha_scaled(visual.secondary));
        }
        MechanicKind::Exaflare => {
            for blast in visual.active_blasts() {
                let blast_color = if blast.exploded {
                    color.lighten(0.6)
                } else {
                    color
                };
                out.push(DrawPrimitive::new(
                    Shape::Disc { radius },
                    floor(blast.position),
                    blast_color.with_alpha(blast.opacity),
                ));
            }
        }
        MechanicKind::AkhMorn => {
            out.push(disc(radius));
            if let Some(target) = placement.target {
                out.push(DrawPrimitive::new(Shape::Disc { radius }, floor(target), color));
            }
            for hit in 0..visual.hits {
                out.push(outline(radius + f32::from(hit) * OUTLINE * 2.0));
            }
        }
        MechanicKind::Enrage => {
            let ring = if visual.phase == LifecyclePhase::Resolve {
                visual.secondary
            } else {
                arena_radius * visual.secondary.clamp(0.0, 1.0)
            };
            out.push(outline(ring.min(arena_radius)));
            out.push(disc(arena_radius).with_alpha_scaled(0.3));
        }
        MechanicKind::Raidwide => {
            out.push(disc(radius.min(arena_radius)));
        }
        MechanicKind::Quietus => {
            out.push(disc(arena_radius).with_alpha_scaled(0.5));
            if visual.secondary > 0.0 {
                out.push(outline(visual.secondary.min(arena_radius)));
            }
        }
        MechanicKind::SomberDance | MechanicKind::SpiritTaker | MechanicKind::DragonHead => {
            let landing = placement.target.unwrap_or(placement.origin);
            out.push(DrawPrimitive::new(Shape::Disc { radius }, floor(landing), color));
            if visual.phase != LifecyclePhase::Resolve {
                out.push(DrawPrimitive::new(
                    Shape::Sphere {
                        radius: SOURCE_RADIUS,
                    },
                    world_point(visual.position),
                    color.lighten(0.2),
                ));
            }
        }
        MechanicKind::PathOfLight => {
            out.push(DrawPrimitive::new(
                Shape::Sector {
                    radius,
                    heading: visual.rotation,
                    spread: FRAC_PI_3,
                },
                centre,
                color,
            ));
        }
        MechanicKind::HallowedWings => {
            out.push(DrawPrimitive::new(
                Shape::Slab {
                    half_width: placement.radius / 2.0,
                    half_depth: arena_radius,
                    rotation: 0.0,
                },
                centre,
                color,
            ));
        }
        MechanicKind::TidalLight => {
            out.push(DrawPrimitive::new(
                Shape::Slab {
                    half_width: arena_radius,
                    half_depth: TIDAL_HALF_WIDTH,
                    rotation: visual.rotation,
                },
                centre,
                color,
            ));
        }
    }
}

trait AlphaScale {
    fn with_alpha_scaled(self, factor: f32) -> Self;
}

impl AlphaScale for DrawPrimitive {
    fn with_alpha_scaled(mut self, factor: f32) -> Self {
        self.color = self.color.with_alpha(self.color.alpha * factor);
        self
    }
}
