//! World-space drawing of the arena, its inhabitants and mechanic primitives.

use glam::{Vec2, Vec3};
use macroquad::models::{draw_cylinder, draw_line_3d, draw_sphere};
use raid_rehearsal_rendering::{
    ArenaPresentation, BossPresentation, Color, DrawPrimitive, MarkerPresentation, Shape,
};

use crate::{to_macroquad_color, to_macroquad_vec3};

/// Segments used to approximate a full circle.
const CIRCLE_SEGMENTS: usize = 64;
/// Thickness of flat discs so they read as surfaces rather than lines.
const DISC_HEIGHT: f32 = 0.02;
/// Spacing between hatch lines filling slabs and sectors.
const HATCH_SPACING: f32 = 0.25;
const MARKER_RADIUS: f32 = 0.35;
const MARKER_HEIGHT: f32 = 1.2;
const AVATAR_RADIUS: f32 = 0.45;
const BOSS_RADIUS: f32 = 1.4;

const AVATAR_COLOR: Color = Color::new(1.0, 1.0, 1.0, 1.0);

pub(crate) fn draw_arena(arena: &ArenaPresentation) {
    let floor = to_macroquad_color(arena.floor);
    draw_cylinder(
        to_macroquad_vec3(Vec3::new(0.0, -DISC_HEIGHT, 0.0)),
        arena.radius,
        arena.radius,
        DISC_HEIGHT,
        None,
        floor,
    );
    draw_ring(Vec3::ZERO, arena.radius, 0.2, arena.rim);
}

pub(crate) fn draw_primitive(primitive: &DrawPrimitive) {
    let DrawPrimitive {
        shape,
        position,
        color,
    } = *primitive;
    match shape {
        Shape::Disc { radius } => draw_disc(position, radius, color),
        Shape::Ring { radius, thickness } => draw_ring(position, radius, thickness, color),
        Shape::Column { radius, height } => {
            if height > 0.0 {
                draw_cylinder(
                    to_macroquad_vec3(position + Vec3::Y * (height / 2.0)),
                    radius,
                    radius,
                    height,
                    None,
                    to_macroquad_color(color),
                );
            }
        }
        Shape::Sphere { radius } => {
            draw_sphere(to_macroquad_vec3(position), radius, None, to_macroquad_color(color));
        }
        Shape::Sector {
            radius,
            heading,
            spread,
        } => {
            for (start, end) in sector_lines(position, radius, heading, spread) {
                line(start, end, color);
            }
        }
        Shape::Slab {
            half_width,
            half_depth,
            rotation,
        } => {
            for (start, end) in slab_lines(position, half_width, half_depth, rotation) {
                line(start, end, color);
            }
        }
    }
}

pub(crate) fn draw_party(party: &[MarkerPresentation]) {
    for marker in party {
        draw_cylinder(
            to_macroquad_vec3(marker.position + Vec3::Y * (MARKER_HEIGHT / 2.0)),
            MARKER_RADIUS,
            MARKER_RADIUS,
            MARKER_HEIGHT,
            None,
            to_macroquad_color(marker.color),
        );
    }
}

pub(crate) fn draw_bosses(bosses: &[BossPresentation]) {
    for boss in bosses {
        let radius = BOSS_RADIUS * boss.scale.clamp(0.0, 1.0);
        if radius > 0.0 {
            draw_sphere(
                to_macroquad_vec3(boss.position),
                radius,
                None,
                to_macroquad_color(boss.color),
            );
        }
    }
}

pub(crate) fn draw_avatar(avatar: Vec3) {
    draw_sphere(
        to_macroquad_vec3(avatar + Vec3::Y * AVATAR_RADIUS),
        AVATAR_RADIUS,
        None,
        to_macroquad_color(AVATAR_COLOR),
    );
    draw_ring(avatar, AVATAR_RADIUS * 1.6, 0.05, AVATAR_COLOR);
}

fn draw_disc(position: Vec3, radius: f32, color: Color) {
    if radius <= 0.0 {
        return;
    }
    draw_cylinder(
        to_macroquad_vec3(position),
        radius,
        radius,
        DISC_HEIGHT,
        None,
        to_macroquad_color(color),
    );
}

fn draw_ring(centre: Vec3, radius: f32, thickness: f32, color: Color) {
    if radius <= 0.0 {
        return;
    }
    let inner = (radius - thickness).max(0.0);
    for ring_radius in [radius, inner, (radius + inner) / 2.0] {
        let points = circle_points(centre, ring_radius);
        for pair in points.windows(2) {
            line(pair[0], pair[1], color);
        }
    }
}

fn line(start: Vec3, end: Vec3, color: Color) {
    draw_line_3d(
        to_macroquad_vec3(start),
        to_macroquad_vec3(end),
        to_macroquad_color(color),
    );
}

/// Direction on the floor for a heading where zero faces `+z` and positive turns toward `+x`.
fn heading_direction(heading: f32) -> Vec3 {
    let (sin, cos) = heading.sin_cos();
    Vec3::new(sin, 0.0, cos)
}

/// Closed polyline around `centre`; the first point is repeated at the end.
fn circle_points(centre: Vec3, radius: f32) -> Vec<Vec3> {
    (0..=CIRCLE_SEGMENTS)
        .map(|segment| {
            let angle = segment as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
            centre + heading_direction(angle) * radius
        })
        .collect()
}

/// Spokes and rim of a sector as line segments.
fn sector_lines(apex: Vec3, radius: f32, heading: f32, spread: f32) -> Vec<(Vec3, Vec3)> {
    let arc_length = radius * spread;
    let spokes = ((arc_length / HATCH_SPACING).ceil() as usize).max(1);
    let first = heading - spread / 2.0;
    let rim: Vec<Vec3> = (0..=spokes)
        .map(|step| apex + heading_direction(first + spread * step as f32 / spokes as f32) * radius)
        .collect();

    let mut lines: Vec<(Vec3, Vec3)> = rim.iter().map(|point| (apex, *point)).collect();
    lines.extend(rim.windows(2).map(|pair| (pair[0], pair[1])));
    lines
}

/// Outline and hatching of a rotated rectangle as line segments.
fn slab_lines(centre: Vec3, half_width: f32, half_depth: f32, rotation: f32) -> Vec<(Vec3, Vec3)> {
    let depth_axis = heading_direction(rotation);
    let width_axis = Vec3::new(depth_axis.z, 0.0, -depth_axis.x);
    let corner = |local: Vec2| centre + width_axis * local.x + depth_axis * local.y;

    let rows = ((half_depth * 2.0 / HATCH_SPACING).ceil() as usize).max(1);
    let mut lines: Vec<(Vec3, Vec3)> = (0..=rows)
        .map(|row| {
            let depth = -half_depth + half_depth * 2.0 * row as f32 / rows as f32;
            (
                corner(Vec2::new(-half_width, depth)),
                corner(Vec2::new(half_width, depth)),
            )
        })
        .collect();
    lines.push((
        corner(Vec2::new(-half_width, -half_depth)),
        corner(Vec2::new(-half_width, half_depth)),
    ));
    lines.push((
        corner(Vec2::new(half_width, -half_depth)),
        corner(Vec2::new(half_width, half_depth)),
    ));
    lines
}
