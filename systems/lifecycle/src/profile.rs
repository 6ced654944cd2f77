//! Per-kind description records that parameterise the lifecycle machine.
//!
//! Every mechanic kind is described by one [`MechanicProfile`]: its default
//! timing, radius and palette, plus the curves that turn elapsed time into
//! opacity and scale for each phase. Curves know their own bounds, and every
//! sample is clamped to them.

use std::{f32::consts::PI, time::Duration};

use raid_rehearsal_core::{
    DanceRange, DebuffElement, Heading, HourglassTint, LifecyclePhase, MechanicKind,
    MechanicVariant, Rgb, WingSide,
};

/// Distance between two successive exaflare blasts.
pub const BLAST_SPACING: f32 = 4.0;
/// Time between two successive exaflare blasts.
pub const BLAST_INTERVAL: Duration = Duration::from_millis(500);
/// Time an exaflare blast warns before detonating.
pub const BLAST_FUSE: Duration = Duration::from_millis(800);
/// Time an exaflare blast stays on the floor.
pub const BLAST_LIFETIME: Duration = Duration::from_millis(1200);
/// Number of blasts an exaflare lays down.
pub const BLAST_COUNT: usize = 5;
/// Time between two akh morn hits.
pub const HIT_INTERVAL: Duration = Duration::from_millis(400);

/// Time samples a curve is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseClock {
    /// Seconds since the instance spawned.
    pub total: f32,
    /// Seconds since the current phase began.
    pub in_phase: f32,
    /// Progress through the current phase in `[0, 1]`.
    pub progress: f32,
}

/// Sinusoidal opacity oscillation.
///
/// Samples `base + sin(total * (frequency + quicken * progress)) * amplitude
/// + rise * progress`, clamped to `[floor, ceiling]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    base: f32,
    amplitude: f32,
    frequency: f32,
    quicken: f32,
    rise: f32,
    floor: f32,
    ceiling: f32,
}

impl Wave {
    /// Creates a plain oscillation bounded to `[base - amplitude, base + amplitude]`.
    #[must_use]
    pub fn new(base: f32, amplitude: f32, frequency: f32) -> Self {
        let amplitude = amplitude.abs();
        Self {
            base,
            amplitude,
            frequency,
            quicken: 0.0,
            rise: 0.0,
            floor: base - amplitude,
            ceiling: base + amplitude,
        }
    }

    /// Speeds the oscillation up as the phase progresses.
    #[must_use]
    pub fn quickening(mut self, quicken: f32) -> Self {
        self.quicken = quicken;
        self
    }

    /// Lifts the oscillation as the phase progresses and rebinds its range.
    #[must_use]
    pub fn rising(mut self, rise: f32, floor: f32, ceiling: f32) -> Self {
        self.rise = rise;
        self.floor = floor;
        self.ceiling = ceiling;
        self
    }

    fn sample(&self, clock: &PhaseClock) -> f32 {
        let frequency = self.frequency + self.quicken * clock.progress;
        let raw = self.base
            + (clock.total * frequency).sin() * self.amplitude
            + self.rise * clock.progress;
        raw.clamp(self.floor, self.ceiling)
    }
}

/// Opacity curve of one lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Opacity {
    /// Constant opacity.
    Steady(f32),
    /// Sinusoidal oscillation.
    Wave(Wave),
    /// Linear rise from zero since the phase began, capped at `max`.
    Ramp {
        /// Opacity gained per second.
        rate: f32,
        /// Ceiling of the ramp.
        max: f32,
    },
    /// Linear fall from `from` since the phase began, floored at zero.
    Fade {
        /// Opacity at the start of the phase.
        from: f32,
        /// Opacity lost per second.
        rate: f32,
    },
    /// Proportional to the phase progress.
    Progress {
        /// Opacity reached at the end of the phase.
        max: f32,
    },
    /// Constant `level` until `until` of the phase elapsed, then transparent.
    Flash {
        /// Opacity while lit.
        level: f32,
        /// Fraction of the phase after which the flash goes dark.
        until: f32,
    },
}

impl Opacity {
    /// Documented range every sample of the curve falls into.
    #[must_use]
    pub fn bounds(&self) -> (f32, f32) {
        let (low, high) = match *self {
            Self::Steady(level) => (level, level),
            Self::Wave(wave) => (wave.floor, wave.ceiling),
            Self::Ramp { max, .. } => (0.0, max),
            Self::Fade { from, .. } => (0.0, from),
            Self::Progress { max } => (0.0, max),
            Self::Flash { level, .. } => (0.0, level),
        };
        (low.clamp(0.0, 1.0), high.clamp(0.0, 1.0))
    }

    /// Samples the curve, clamped to its bounds.
    #[must_use]
    pub fn sample(&self, clock: &PhaseClock) -> f32 {
        let raw = match *self {
            Self::Steady(level) => level,
            Self::Wave(wave) => wave.sample(clock),
            Self::Ramp { rate, max } => (clock.in_phase * rate).min(max),
            Self::Fade { from, rate } => from - clock.in_phase * rate,
            Self::Progress { max } => clock.progress * max,
            Self::Flash { level, until } => {
                if clock.progress < until {
                    level
                } else {
                    0.0
                }
            }
        };
        let (low, high) = self.bounds();
        raw.clamp(low, high)
    }
}

/// Scale curve of one lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scale {
    /// Constant scale.
    Fixed(f32),
    /// `1 + sin(total * frequency) * amplitude`.
    Pulse {
        /// Relative swing of the pulse.
        amplitude: f32,
        /// Angular frequency in radians per second.
        frequency: f32,
    },
    /// Linear growth from `start` since spawn, capped at `max`.
    Grow {
        /// Scale at spawn.
        start: f32,
        /// Scale gained per second.
        rate: f32,
        /// Ceiling of the growth.
        max: f32,
    },
}

impl Scale {
    /// Documented range every sample of the curve falls into.
    #[must_use]
    pub fn bounds(&self) -> (f32, f32) {
        match *self {
            Self::Fixed(scale) => (scale, scale),
            Self::Pulse { amplitude, .. } => (1.0 - amplitude.abs(), 1.0 + amplitude.abs()),
            Self::Grow { start, max, .. } => (start.min(max), start.max(max)),
        }
    }

    /// Samples the curve, clamped to its bounds.
    #[must_use]
    pub fn sample(&self, clock: &PhaseClock) -> f32 {
        let raw = match *self {
            Self::Fixed(scale) => scale,
            Self::Pulse {
                amplitude,
                frequency,
            } => 1.0 + (clock.total * frequency).sin() * amplitude,
            Self::Grow { start, rate, .. } => start + clock.total * rate,
        };
        let (low, high) = self.bounds();
        raw.clamp(low, high)
    }
}

/// Opacity and scale curves of one phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Look {
    /// Opacity curve.
    pub opacity: Opacity,
    /// Scale curve.
    pub scale: Scale,
}

impl Look {
    const fn new(opacity: Opacity, scale: Scale) -> Self {
        Self { opacity, scale }
    }

    const fn steady(opacity: f32, scale: f32) -> Self {
        Self::new(Opacity::Steady(opacity), Scale::Fixed(scale))
    }
}

/// Travel of a mechanic whose source moves toward its destination.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TravelProfile {
    /// Fraction of the resolve delay after which travel begins.
    pub start_fraction: f32,
    /// Progress gained per second; `None` spreads the travel until the delay.
    pub rate: Option<f32>,
    /// Height of the source at both ends of the arc.
    pub base_height: f32,
    /// Peak of the parabolic arc above the base height.
    pub arc_height: f32,
}

impl TravelProfile {
    /// Height of the source at the provided travel progress.
    #[must_use]
    pub fn height(&self, progress: f32) -> f32 {
        self.base_height + self.arc_height * (progress.clamp(0.0, 1.0) * PI).sin()
    }
}

/// Telegraph and resolve colours of a mechanic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Colour shown while the mechanic telegraphs.
    pub telegraph: Rgb,
    /// Colour shown once the mechanic resolves.
    pub resolve: Rgb,
}

impl Palette {
    const fn flashing(telegraph: u32) -> Self {
        Self {
            telegraph: Rgb::from_hex(telegraph),
            resolve: Rgb::WHITE,
        }
    }

    const fn shifting(telegraph: u32, resolve: u32) -> Self {
        Self {
            telegraph: Rgb::from_hex(telegraph),
            resolve: Rgb::from_hex(resolve),
        }
    }
}

/// Data-driven description of one mechanic kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MechanicProfile {
    /// Default time from spawn until the telegraph resolves.
    pub delay: Duration,
    /// Default time from spawn until the instance completes.
    pub duration: Duration,
    /// Default hazard radius.
    pub radius: f32,
    /// Default colours.
    pub palette: Palette,
    /// Curves used while telegraphing.
    pub telegraph: Look,
    /// Curves used while travelling; only meaningful with [`Self::travel`].
    pub travel_look: Look,
    /// Curves used once resolved.
    pub resolve: Look,
    /// Travel of the mechanic's source, if it moves.
    pub travel: Option<TravelProfile>,
    /// Flavour applied when a spawn does not name one.
    pub default_variant: MechanicVariant,
}

impl MechanicProfile {
    /// Profile describing the provided kind.
    #[must_use]
    pub fn for_kind(kind: MechanicKind) -> Self {
        let ms = Duration::from_millis;
        match kind {
            MechanicKind::AoeCircle => Self::stationary(
                ms(1500),
                ms(2000),
                3.0,
                Palette::flashing(0xff6b6b),
                Look::new(
                    Opacity::Wave(
                        Wave::new(0.2, 0.15, 30.0)
                            .quickening(100.0)
                            .rising(0.3, 0.2, 0.8),
                    ),
                    Scale::Fixed(1.0),
                ),
                Look::steady(0.8, 1.0),
            ),
            MechanicKind::Tower => Self::stationary(
                ms(3000),
                ms(3500),
                3.0,
                Palette::flashing(0xffcc00),
                Look::new(
                    Opacity::Wave(Wave::new(0.4, 0.2, 4.0)),
                    Scale::Pulse {
                        amplitude: 0.1,
                        frequency: 6.0,
                    },
                ),
                Look::steady(0.9, 1.0),
            ),
            MechanicKind::Exaflare => {
                let mut profile = Self::stationary(
                    BLAST_INTERVAL + BLAST_FUSE,
                    ms(5000),
                    3.0,
                    Palette::shifting(0xff6600, 0xffcc00),
                    Look::steady(0.5, 1.0),
                    Look::steady(0.9, 1.0),
                );
                profile.default_variant = MechanicVariant::Heading(Heading::North);
                profile
            }
            MechanicKind::AkhMorn => {
                let mut profile = Self::stationary(
                    ms(2000),
                    ms(4000),
                    4.0,
                    Palette::flashing(0xff4444),
                    Look::new(Opacity::Wave(Wave::new(0.4, 0.2, 8.0)), Scale::Fixed(1.0)),
                    Look::new(
                        Opacity::Steady(0.7),
                        Scale::Pulse {
                            amplitude: 0.15,
                            frequency: 15.0,
                        },
                    ),
                );
                profile.default_variant = MechanicVariant::Hits(4);
                profile
            }
            MechanicKind::Puddle => Self::stationary(
                ms(8000),
                ms(8250),
                2.0,
                Palette::shifting(0x4488ff, 0x88ccff),
                Look::new(
                    Opacity::Ramp {
                        rate: 2.0,
                        max: 0.7,
                    },
                    Scale::Pulse {
                        amplitude: 0.1,
                        frequency: 4.0,
                    },
                ),
                Look::new(
                    Opacity::Fade {
                        from: 0.7,
                        rate: 3.0,
                    },
                    Scale::Fixed(1.0),
                ),
            ),
            MechanicKind::DarkWater => Self::stationary(
                ms(2000),
                ms(2500),
                4.0,
                Palette::flashing(0x4466ff),
                Look::new(
                    Opacity::Wave(Wave::new(0.4, 0.2, 6.0)),
                    Scale::Pulse {
                        amplitude: 0.1,
                        frequency: 4.0,
                    },
                ),
                Look::steady(0.9, 1.2),
            ),
            MechanicKind::Hourglass => {
                let mut profile = Self::stationary(
                    ms(5000),
                    ms(6000),
                    8.0,
                    Palette::flashing(0xffcc00),
                    Look::new(
                        Opacity::Wave(Wave::new(0.4, 0.2, 4.0).quickening(6.0)),
                        Scale::Pulse {
                            amplitude: 0.05,
                            frequency: 3.0,
                        },
                    ),
                    Look::steady(0.9, 1.3),
                );
                profile.default_variant = MechanicVariant::Hourglass(HourglassTint::Yellow);
                profile
            }
            MechanicKind::MornAfah => Self::stationary(
                ms(2000),
                ms(3000),
                6.0,
                Palette::flashing(0xff8800),
                Look::new(
                    Opacity::Wave(Wave::new(0.4, 0.2, 6.0)),
                    Scale::Grow {
                        start: 0.5,
                        rate: 0.3,
                        max: 1.0,
                    },
                ),
                Look::steady(0.9, 1.2),
            ),
            MechanicKind::Enrage => Self::stationary(
                ms(5000),
                ms(7000),
                30.0,
                Palette::flashing(0x001133),
                Look::new(Opacity::Progress { max: 0.6 }, Scale::Fixed(1.0)),
                Look::new(
                    Opacity::Fade {
                        from: 1.0,
                        rate: 1.0,
                    },
                    Scale::Fixed(1.0),
                ),
            ),
            MechanicKind::Raidwide => Self::stationary(
                Duration::ZERO,
                ms(500),
                50.0,
                Palette::shifting(0xff4444, 0xff4444),
                Look::steady(0.6, 1.0),
                Look::new(
                    Opacity::Flash {
                        level: 0.6,
                        until: 0.6,
                    },
                    Scale::Fixed(1.0),
                ),
            ),
            MechanicKind::SomberDance => {
                let mut profile = Self::stationary(
                    ms(1500),
                    ms(2000),
                    4.0,
                    Palette::flashing(0xff6600),
                    Look::new(Opacity::Wave(Wave::new(0.4, 0.2, 8.0)), Scale::Fixed(1.0)),
                    Look::steady(0.9, 1.0),
                );
                profile.travel_look = Look::steady(0.6, 1.0);
                profile.travel = Some(TravelProfile {
                    start_fraction: 0.6,
                    rate: Some(3.0),
                    base_height: 2.0,
                    arc_height: 3.0,
                });
                profile.default_variant = MechanicVariant::Dance(DanceRange::Far);
                profile
            }
            MechanicKind::SpiritTaker => {
                let mut profile = Self::stationary(
                    ms(1500),
                    ms(2000),
                    5.0,
                    Palette::flashing(0xcc00ff),
                    Look::new(Opacity::Wave(Wave::new(0.4, 0.3, 10.0)), Scale::Fixed(1.0)),
                    Look::steady(0.9, 1.0),
                );
                profile.travel_look = Look::steady(0.6, 1.0);
                profile.travel = Some(TravelProfile {
                    start_fraction: 0.5,
                    rate: Some(2.5),
                    base_height: 2.0,
                    arc_height: 5.0,
                });
                profile
            }
            MechanicKind::ReturnPoint => Self::stationary(
                ms(6000),
                ms(7000),
                2.0,
                Palette::shifting(0x6666ff, 0x00ffff),
                Look::new(
                    Opacity::Ramp {
                        rate: 2.0,
                        max: 0.8,
                    },
                    Scale::Fixed(1.0),
                ),
                Look::steady(1.0, 1.0),
            ),
            MechanicKind::Quietus => Self::stationary(
                ms(2000),
                ms(3000),
                50.0,
                Palette::shifting(0x110022, 0x220033),
                Look::new(Opacity::Wave(Wave::new(0.2, 0.1, 4.0)), Scale::Fixed(1.0)),
                Look::new(
                    Opacity::Ramp {
                        rate: 2.0,
                        max: 0.8,
                    },
                    Scale::Fixed(1.0),
                ),
            ),
            MechanicKind::PathOfLight => Self::stationary(
                ms(2000),
                ms(2500),
                25.0,
                Palette::flashing(0xffff00),
                Look::new(
                    Opacity::Wave(Wave::new(0.3, 0.15, 6.0).quickening(8.0)),
                    Scale::Fixed(1.0),
                ),
                Look::steady(0.8, 1.0),
            ),
            MechanicKind::HallowedWings => {
                let mut profile = Self::stationary(
                    ms(2000),
                    ms(2500),
                    20.0,
                    Palette::flashing(0xff4488),
                    Look::new(Opacity::Wave(Wave::new(0.3, 0.2, 8.0)), Scale::Fixed(1.0)),
                    Look::steady(0.8, 1.0),
                );
                profile.default_variant = MechanicVariant::Wing(WingSide::Left);
                profile
            }
            MechanicKind::TidalLight => {
                let mut profile = Self::stationary(
                    ms(2000),
                    ms(3000),
                    20.0,
                    Palette::shifting(0x00ffff, 0xffffff),
                    Look::new(Opacity::Wave(Wave::new(0.3, 0.2, 6.0)), Scale::Fixed(1.0)),
                    Look::steady(0.8, 1.0),
                );
                profile.default_variant = MechanicVariant::Heading(Heading::East);
                profile
            }
            MechanicKind::DragonHead => {
                let mut profile = Self::stationary(
                    ms(3000),
                    ms(4000),
                    1.0,
                    Palette::flashing(0xff4444),
                    Look::steady(0.9, 1.0),
                    Look::new(
                        Opacity::Fade {
                            from: 0.9,
                            rate: 2.0,
                        },
                        Scale::Fixed(1.0),
                    ),
                );
                profile.travel_look = Look::steady(0.9, 1.0);
                profile.travel = Some(TravelProfile {
                    start_fraction: 0.0,
                    rate: None,
                    base_height: 1.5,
                    arc_height: 2.0,
                });
                profile
            }
            MechanicKind::DarkDebuff => {
                let mut profile = Self::stationary(
                    ms(3000),
                    ms(4000),
                    5.0,
                    Palette::flashing(0x0066cc),
                    Look::new(
                        Opacity::Wave(Wave::new(0.4, 0.2, 6.0)),
                        Scale::Pulse {
                            amplitude: 0.1,
                            frequency: 3.0,
                        },
                    ),
                    Look::steady(0.9, 1.4),
                );
                profile.default_variant = MechanicVariant::Debuff(DebuffElement::Water);
                profile
            }
            MechanicKind::UnholyDarkness => Self::stationary(
                ms(2000),
                ms(3000),
                6.0,
                Palette::flashing(0x440066),
                Look::new(
                    Opacity::Wave(Wave::new(0.4, 0.2, 8.0)),
                    Scale::Grow {
                        start: 0.5,
                        rate: 0.3,
                        max: 1.0,
                    },
                ),
                Look::steady(0.9, 1.3),
            ),
        }
    }

    fn stationary(
        delay: Duration,
        duration: Duration,
        radius: f32,
        palette: Palette,
        telegraph: Look,
        resolve: Look,
    ) -> Self {
        Self {
            delay,
            duration,
            radius,
            palette,
            telegraph,
            travel_look: telegraph,
            resolve,
            travel: None,
            default_variant: MechanicVariant::Plain,
        }
    }

    /// Curves used while the lifecycle sits in `phase`.
    #[must_use]
    pub fn look(&self, phase: LifecyclePhase) -> &Look {
        match phase {
            LifecyclePhase::Telegraph => &self.telegraph,
            LifecyclePhase::Travel => &self.travel_look,
            LifecyclePhase::Resolve | LifecyclePhase::Done => &self.resolve,
        }
    }
}

/// Telegraph colour implied by a flavour, overriding the kind's palette.
#[must_use]
pub fn variant_color(variant: MechanicVariant) -> Option<Rgb> {
    match variant {
        MechanicVariant::Hourglass(HourglassTint::Yellow) => Some(Rgb::from_hex(0xffcc00)),
        MechanicVariant::Hourglass(HourglassTint::Purple) => Some(Rgb::from_hex(0x9933ff)),
        MechanicVariant::Hourglass(HourglassTint::Untethered) => Some(Rgb::from_hex(0x666666)),
        MechanicVariant::Debuff(DebuffElement::Water) => Some(Rgb::from_hex(0x0066cc)),
        MechanicVariant::Debuff(DebuffElement::Aero) => Some(Rgb::from_hex(0x00cc66)),
        MechanicVariant::Debuff(DebuffElement::Eruption) => Some(Rgb::from_hex(0xcc3300)),
        MechanicVariant::Debuff(DebuffElement::Blizzard) => Some(Rgb::from_hex(0x6699ff)),
        _ => None,
    }
}
