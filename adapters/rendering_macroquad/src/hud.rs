//! Screen-space overlay: world labels, cast bar, banner and the status strip.

use glam::{Vec2, Vec3};
use macroquad::{
    camera::{Camera, Camera3D},
    math::vec4,
    shapes::{draw_rectangle, draw_rectangle_lines},
    text::{draw_text, measure_text},
    window::{screen_height, screen_width},
};
use raid_rehearsal_rendering::{
    BannerPresentation, CastBarPresentation, Color, HudPresentation, Scene,
};

use crate::to_macroquad_color;

const TEXT: Color = Color::new(0.95, 0.95, 0.97, 1.0);
const MUTED: Color = Color::new(0.7, 0.7, 0.75, 1.0);
const PANEL: Color = Color::new(0.05, 0.05, 0.08, 0.75);
const LABEL_LIFT: f32 = 1.8;
const CAST_BAR_WIDTH: f32 = 420.0;
const CAST_BAR_HEIGHT: f32 = 22.0;

/// Draws party roles and boss names above their bodies.
pub(crate) fn draw_labels(scene: &Scene, camera: &Camera3D) {
    let screen = Vec2::new(screen_width(), screen_height());
    let view = camera.matrix();
    let project = |point: Vec3| {
        let clip = view * vec4(point.x, point.y, point.z, 1.0);
        project_clip([clip.x, clip.y, clip.z, clip.w], screen)
    };

    for marker in &scene.party {
        if let Some(anchor) = project(marker.position + Vec3::Y * LABEL_LIFT) {
            centred_text(marker.label, anchor, 18.0, TEXT);
        }
    }
    for boss in &scene.bosses {
        if let Some(anchor) = project(boss.position + Vec3::Y * (LABEL_LIFT + 0.6)) {
            centred_text(&boss.name, anchor, 22.0, boss.color.lighten(0.4));
        }
    }
}

/// Draws the HUD overlay in screen space.
pub(crate) fn draw_hud(hud: &HudPresentation) {
    let width = screen_width();
    let height = screen_height();

    draw_rectangle(0.0, 0.0, width, 36.0, to_macroquad_color(PANEL));
    let _ = draw_text(&hud.title, 12.0, 24.0, 24.0, to_macroquad_color(TEXT));
    let phase_width = measure_text(&hud.phase, None, 20, 1.0).width;
    let _ = draw_text(
        &hud.phase,
        (width - phase_width) / 2.0,
        24.0,
        20.0,
        to_macroquad_color(MUTED),
    );
    let clock_width = measure_text(&hud.clock, None, 24, 1.0).width;
    let _ = draw_text(
        &hud.clock,
        width - clock_width - 12.0,
        24.0,
        24.0,
        to_macroquad_color(TEXT),
    );

    if let Some(cast) = &hud.cast_bar {
        draw_cast_bar(cast, width);
    }
    if let Some(banner) = &hud.banner {
        draw_banner(banner, width);
    }

    centred_text(
        hud.status,
        Vec2::new(width / 2.0, height - 18.0),
        20.0,
        MUTED,
    );
}

fn draw_cast_bar(cast: &CastBarPresentation, width: f32) {
    let left = (width - CAST_BAR_WIDTH) / 2.0;
    let top = 60.0;
    draw_rectangle(
        left,
        top,
        CAST_BAR_WIDTH,
        CAST_BAR_HEIGHT,
        to_macroquad_color(PANEL),
    );
    draw_rectangle(
        left,
        top,
        CAST_BAR_WIDTH * cast.progress.clamp(0.0, 1.0),
        CAST_BAR_HEIGHT,
        to_macroquad_color(cast.color),
    );
    draw_rectangle_lines(
        left,
        top,
        CAST_BAR_WIDTH,
        CAST_BAR_HEIGHT,
        2.0,
        to_macroquad_color(TEXT),
    );
    let _ = draw_text(&cast.skill, left + 6.0, top + 16.0, 18.0, to_macroquad_color(TEXT));
    let remaining = format!("{:.1}s", cast.remaining.max(0.0));
    let remaining_width = measure_text(&remaining, None, 18, 1.0).width;
    let _ = draw_text(
        &remaining,
        left + CAST_BAR_WIDTH - remaining_width - 6.0,
        top + 16.0,
        18.0,
        to_macroquad_color(TEXT),
    );
    let _ = draw_text(&cast.boss, left, top - 6.0, 16.0, to_macroquad_color(MUTED));
}

fn draw_banner(banner: &BannerPresentation, width: f32) {
    let top = 100.0;
    let panel_width = 520.0;
    let left = (width - panel_width) / 2.0;
    draw_rectangle(left, top, panel_width, 58.0, to_macroquad_color(PANEL));
    draw_rectangle(left, top, 6.0, 58.0, to_macroquad_color(banner.accent));
    centred_text(
        &banner.name,
        Vec2::new(width / 2.0, top + 24.0),
        26.0,
        banner.accent,
    );
    centred_text(
        &banner.description,
        Vec2::new(width / 2.0, top + 48.0),
        18.0,
        TEXT,
    );
}

fn centred_text(text: &str, anchor: Vec2, size: f32, color: Color) {
    let dimensions = measure_text(text, None, size as u16, 1.0);
    let _ = draw_text(
        text,
        anchor.x - dimensions.width / 2.0,
        anchor.y,
        size,
        to_macroquad_color(color),
    );
}

/// Maps a clip-space position to screen pixels; points behind the camera are rejected.
fn project_clip(clip: [f32; 4], screen: Vec2) -> Option<Vec2> {
    let [x, y, _, w] = clip;
    if w <= f32::EPSILON {
        return None;
    }
    let ndc = Vec2::new(x / w, y / w);
    if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
        return None;
    }
    Some(Vec2::new(
        (ndc.x + 1.0) / 2.0 * screen.x,
        (1.0 - ndc.y) / 2.0 * screen.y,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_centre_lands_in_the_middle_of_the_screen() {
        let screen = Vec2::new(800.0, 600.0);
        assert_eq!(
            project_clip([0.0, 0.0, 0.5, 2.0], screen),
            Some(Vec2::new(400.0, 300.0))
        );
        assert_eq!(
            project_clip([-2.0, 2.0, 0.5, 2.0], screen),
            Some(Vec2::new(0.0, 0.0))
        );
    }

    #[test]
    fn points_behind_or_outside_the_view_are_dropped() {
        let screen = Vec2::new(800.0, 600.0);
        assert_eq!(project_clip([0.0, 0.0, 0.5, -1.0], screen), None);
        assert_eq!(project_clip([3.0, 0.0, 0.5, 1.0], screen), None);
    }
}
