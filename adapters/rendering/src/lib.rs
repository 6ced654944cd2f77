#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for raid rehearsal adapters.
//!
//! Backends never look at the world. They receive a [`Scene`] filled by the
//! presentation bridge each frame and draw it verbatim.

use anyhow::Result as AnyResult;
use glam::{Vec2, Vec3};
use raid_rehearsal_core::Rgb;
use std::{error::Error, fmt, sync::Arc, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the provided alpha, clamped to `0..=1`.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

impl From<Rgb> for Color {
    fn from(value: Rgb) -> Self {
        Self::from_rgb_u8(value.red(), value.green(), value.blue())
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Avatar movement intent on the arena floor, `x` east and `y` south, each in `-1..=1`.
    pub movement: Vec2,
    /// Whether the adapter detected a start request on this frame.
    pub start_requested: bool,
    /// Whether the adapter detected a restart request on this frame.
    pub restart_requested: bool,
}

/// Geometry of a single draw primitive; every shape lies on or rises from the floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Flat filled circle.
    Disc {
        /// Radius of the disc.
        radius: f32,
    },
    /// Flat circle outline.
    Ring {
        /// Outer radius of the ring.
        radius: f32,
        /// Width of the outline.
        thickness: f32,
    },
    /// Upright cylinder.
    Column {
        /// Radius of the column.
        radius: f32,
        /// Height of the column.
        height: f32,
    },
    /// Sphere centred on the primitive position.
    Sphere {
        /// Radius of the sphere.
        radius: f32,
    },
    /// Flat circular sector opening from the primitive position.
    Sector {
        /// Reach of the sector.
        radius: f32,
        /// Direction of the sector's axis in radians; zero faces positive `z`
        /// and positive angles turn toward positive `x`.
        heading: f32,
        /// Full opening angle in radians.
        spread: f32,
    },
    /// Flat rectangle centred on the primitive position.
    Slab {
        /// Half extent along the rotated `x` axis.
        half_width: f32,
        /// Half extent along the rotated `z` axis.
        half_depth: f32,
        /// Rotation around the vertical axis in radians, measured like
        /// [`Shape::Sector`] headings.
        rotation: f32,
    },
}

/// One shape to draw at one position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawPrimitive {
    /// Geometry of the primitive.
    pub shape: Shape,
    /// World position of the primitive's anchor.
    pub position: Vec3,
    /// Fill color, alpha included.
    pub color: Color,
}

impl DrawPrimitive {
    /// Creates a new primitive.
    #[must_use]
    pub const fn new(shape: Shape, position: Vec3, color: Color) -> Self {
        Self {
            shape,
            position,
            color,
        }
    }
}

/// Circular arena floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaPresentation {
    /// Radius of the floor.
    pub radius: f32,
    /// Color of the floor.
    pub floor: Color,
    /// Color of the floor's rim.
    pub rim: Color,
}

impl ArenaPresentation {
    /// Creates a new arena descriptor, rejecting non-positive radii.
    pub fn new(radius: f32, floor: Color, rim: Color) -> Result<Self, RenderingError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(RenderingError::InvalidArenaRadius { radius });
        }
        Ok(Self { radius, floor, rim })
    }
}

/// Labelled marker standing in for a party member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerPresentation {
    /// Short role label drawn above the marker.
    pub label: &'static str,
    /// Position of the marker on the floor.
    pub position: Vec3,
    /// Body color of the marker.
    pub color: Color,
}

/// Boss body.
#[derive(Clone, Debug, PartialEq)]
pub struct BossPresentation {
    /// Display name drawn above the boss.
    pub name: Arc<str>,
    /// Position of the boss.
    pub position: Vec3,
    /// Spawn scale in `0..=1`.
    pub scale: f32,
    /// Body color.
    pub color: Color,
}

/// Cast bar shown at the top of the screen.
#[derive(Clone, Debug, PartialEq)]
pub struct CastBarPresentation {
    /// Name of the skill being cast.
    pub skill: Arc<str>,
    /// Name of the caster.
    pub boss: Arc<str>,
    /// Fill fraction in `0..=1`.
    pub progress: f32,
    /// Remaining cast time in seconds.
    pub remaining: f32,
    /// Fill color.
    pub color: Color,
}

/// Mechanic banner shown beneath the cast bar.
#[derive(Clone, Debug, PartialEq)]
pub struct BannerPresentation {
    /// Headline of the banner.
    pub name: Arc<str>,
    /// Supporting text.
    pub description: Arc<str>,
    /// Accent color reflecting the banner's urgency.
    pub accent: Color,
}

/// Heads-up display content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HudPresentation {
    /// Title of the encounter.
    pub title: String,
    /// Current encounter phase.
    pub phase: String,
    /// Running encounter clock, `MM:SS.t`.
    pub clock: String,
    /// Short status line describing the run.
    pub status: &'static str,
    /// Active cast bar.
    pub cast_bar: Option<CastBarPresentation>,
    /// Active banner.
    pub banner: Option<BannerPresentation>,
}

/// Scene description combining the arena, its inhabitants and the HUD.
///
/// The presentation bridge refills the same scene every frame; the buffers
/// keep their capacity between frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Arena floor.
    pub arena: ArenaPresentation,
    /// Party markers.
    pub party: Vec<MarkerPresentation>,
    /// Bosses in the arena.
    pub bosses: Vec<BossPresentation>,
    /// Position of the player-controlled avatar.
    pub avatar: Vec3,
    /// Mechanic telegraphs and effects, in draw order.
    pub primitives: Vec<DrawPrimitive>,
    /// Heads-up display.
    pub hud: HudPresentation,
}

impl Scene {
    /// Creates an empty scene over the provided arena.
    #[must_use]
    pub fn new(arena: ArenaPresentation) -> Self {
        Self {
            arena,
            party: Vec::new(),
            bosses: Vec::new(),
            avatar: Vec3::ZERO,
            primitives: Vec::new(),
            hud: HudPresentation::default(),
        }
    }

    /// Empties the per-frame buffers while keeping their allocations.
    pub fn clear(&mut self) {
        self.party.clear();
        self.bosses.clear();
        self.primitives.clear();
        self.hud.cast_bar = None;
        self.hud.banner = None;
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting raid rehearsal scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta, per-frame
    /// input captured by the adapter, and refills the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The arena radius must be positive and finite.
    InvalidArenaRadius {
        /// Provided radius that failed validation.
        radius: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArenaRadius { radius } => {
                write!(f, "arena radius must be positive (received {radius})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> ArenaPresentation {
        ArenaPresentation::new(
            20.0,
            Color::from_rgb_u8(40, 40, 48),
            Color::from_rgb_u8(200, 200, 220),
        )
        .expect("positive radius")
    }

    #[test]
    fn arena_creation_rejects_non_positive_radii() {
        for radius in [0.0, -3.0, f32::NAN] {
            let error = ArenaPresentation::new(radius, Color::from_rgb_u8(0, 0, 0), Color::from_rgb_u8(0, 0, 0))
                .expect_err("invalid radius must be rejected");
            assert!(matches!(error, RenderingError::InvalidArenaRadius { .. }));
        }
    }

    #[test]
    fn colors_convert_from_core_rgb() {
        let color = Color::from(Rgb::from_hex(0xff0000));
        assert_eq!(color, Color::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(color.with_alpha(2.0).alpha, 1.0);
    }

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::new(0.0, 0.5, 1.0, 0.4).lighten(0.5);
        assert_eq!(color, Color::new(0.5, 0.75, 1.0, 0.4));
    }

    #[test]
    fn clearing_a_scene_keeps_buffer_capacity() {
        let mut scene = Scene::new(arena());
        scene.primitives.extend(
            std::iter::repeat(DrawPrimitive::new(
                Shape::Disc { radius: 1.0 },
                Vec3::ZERO,
                Color::from_rgb_u8(255, 255, 255),
            ))
            .take(32),
        );
        let capacity = scene.primitives.capacity();
        scene.clear();

        assert!(scene.primitives.is_empty());
        assert_eq!(scene.primitives.capacity(), capacity);
    }
}
