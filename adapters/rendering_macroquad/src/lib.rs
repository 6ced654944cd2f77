#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for raid rehearsal.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The arena is drawn in 3D through a chase camera that follows the avatar;
//! the HUD is drawn afterwards in screen space by the local `hud` module.

mod draw;
mod hud;

use anyhow::Result;
use glam::{Vec2, Vec3};
use macroquad::{
    camera::{set_camera, set_default_camera, Camera3D},
    input::{is_key_down, is_key_pressed, KeyCode},
    math::vec3,
};
use raid_rehearsal_rendering::{Color, FrameInput, Presentation, RenderingBackend, Scene};
use std::time::Duration;
use tracing::info;

/// Camera offset from the avatar: above and behind, looking north.
const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 16.0, 14.0);

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the render loop.
    quit_requested: bool,
    /// `Enter` starts the encounter.
    start_requested: bool,
    /// `R` restarts the encounter.
    restart_requested: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            start_requested: is_key_pressed(KeyCode::Enter),
            restart_requested: is_key_pressed(KeyCode::R),
        }
    }
}

/// Held movement keys observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct MovementKeys {
    north: bool,
    south: bool,
    west: bool,
    east: bool,
}

impl MovementKeys {
    fn poll() -> Self {
        Self {
            north: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            south: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            west: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            east: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
        }
    }

    /// Movement intent with `x` east and `y` south, normalised so diagonals are not faster.
    fn intent(self) -> Vec2 {
        let axis = |negative: bool, positive: bool| match (negative, positive) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Vec2::new(axis(self.west, self.east), axis(self.north, self.south)).normalize_or_zero()
    }
}

fn gather_frame_input(keyboard: KeyboardShortcuts, movement: MovementKeys) -> FrameInput {
    FrameInput {
        movement: movement.intent(),
        start_requested: keyboard.start_requested,
        restart_requested: keyboard.restart_requested,
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    update_accum: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FpsMetrics {
    per_second: f32,
    avg_update: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the averages once one second has elapsed.
    fn record_frame(&mut self, frame: Duration, update: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.update_accum += update;

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let metrics = FpsMetrics {
            per_second: self.frames as f32 / self.elapsed.as_secs_f32(),
            avg_update: self.update_accum / self.frames.max(1),
        };
        *self = Self::default();
        Some(metrics)
    }
}

fn chase_camera(avatar: Vec3) -> Camera3D {
    let eye = avatar + CAMERA_OFFSET;
    Camera3D {
        position: vec3(eye.x, eye.y, eye.z),
        target: vec3(avatar.x, 0.0, avatar.z),
        up: vec3(0.0, 1.0, 0.0),
        ..Camera3D::default()
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 800,
            sample_count: 4,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                let frame_dt =
                    Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                let frame_input = gather_frame_input(keyboard, MovementKeys::poll());

                let update_start = std::time::Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let update_duration = update_start.elapsed();

                macroquad::window::clear_background(background);

                let camera = chase_camera(scene.avatar);
                set_camera(&camera);
                draw::draw_arena(&scene.arena);
                for primitive in &scene.primitives {
                    draw::draw_primitive(primitive);
                }
                draw::draw_party(&scene.party);
                draw::draw_bosses(&scene.bosses);
                draw::draw_avatar(scene.avatar);

                set_default_camera();
                hud::draw_labels(&scene, &camera);
                hud::draw_hud(&scene.hud);

                if let Some(metrics) = fps_counter.record_frame(frame_dt, update_duration) {
                    if show_fps {
                        info!(
                            fps = f64::from(metrics.per_second),
                            update_ms = metrics.avg_update.as_secs_f64() * 1_000.0,
                            primitives = scene.primitives.len(),
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

fn to_macroquad_vec3(point: Vec3) -> macroquad::math::Vec3 {
    vec3(point.x, point.y, point.z)
}
