#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Parameterised lifecycle state machine shared by every mechanic kind.
//!
//! A [`Lifecycle`] walks `Telegraph → (Travel →) Resolve → Done`. Phase
//! changes are driven by one-shot transitions the owner schedules from
//! [`Lifecycle::pending_transitions`]; display parameters are recomputed from
//! elapsed time alone by [`Lifecycle::advance`]. The machine never owns a
//! timer, so whoever holds it decides how transitions are cancelled.

pub mod profile;

use std::time::Duration;

use raid_rehearsal_core::{
    Blast, GroundPoint, Heading, LifecyclePhase, MechanicKind, MechanicVariant, SpawnError,
    SpawnParams, SpawnPlacement, VisualState, WingSide, MAX_BLASTS,
};

pub use profile::MechanicProfile;
use profile::{
    variant_color, PhaseClock, BLAST_COUNT, BLAST_FUSE, BLAST_INTERVAL, BLAST_LIFETIME,
    BLAST_SPACING, HIT_INTERVAL,
};

/// Delayed stimulus that moves a lifecycle to its next phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transition {
    /// The travelling source leaves its origin.
    BeginTravel,
    /// The telegraph resolves into its effect.
    Resolve,
    /// The instance reaches its terminal phase.
    Complete,
}

/// Observable consequences of applying a [`Transition`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransitionOutcome {
    /// Phase entered by the transition, if the phase changed.
    pub entered: Option<LifecyclePhase>,
    /// Position of the effect when the transition resolved the telegraph.
    pub resolved_at: Option<GroundPoint>,
}

/// Lifecycle of one mechanic instance.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    kind: MechanicKind,
    profile: MechanicProfile,
    placement: SpawnPlacement,
    phase: LifecyclePhase,
    elapsed: f32,
    resolved: bool,
    visual: VisualState,
}

impl Lifecycle {
    /// Validates the spawn parameters and creates a lifecycle in `Telegraph`.
    ///
    /// `origin` and `target` are the already-resolved anchors of `params`;
    /// every field `params` leaves unset falls back to the kind's profile.
    pub fn spawn(
        kind: MechanicKind,
        origin: GroundPoint,
        target: Option<GroundPoint>,
        params: &SpawnParams,
    ) -> Result<Self, SpawnError> {
        let profile = MechanicProfile::for_kind(kind);

        if !kind.accepts(params.variant) {
            return Err(SpawnError::VariantMismatch {
                kind,
                variant: params.variant,
            });
        }
        let variant = match params.variant {
            MechanicVariant::Plain => profile.default_variant,
            variant => variant,
        };

        let delay = params.delay.unwrap_or(profile.delay);
        let duration = params.duration.unwrap_or(profile.duration);
        if duration < delay {
            return Err(SpawnError::InvalidTiming {
                kind,
                delay,
                duration,
            });
        }

        let radius = params.radius.unwrap_or(profile.radius);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SpawnError::InvalidRadius { kind, radius });
        }

        if !origin.is_finite() || target.is_some_and(|point| !point.is_finite()) {
            return Err(SpawnError::InvalidAnchor { kind });
        }
        let target = match kind {
            MechanicKind::AkhMorn => {
                Some(target.unwrap_or_else(|| GroundPoint::new(origin.x(), -origin.z())))
            }
            _ => target,
        };

        let color = params
            .color
            .or_else(|| variant_color(variant))
            .unwrap_or(profile.palette.telegraph);

        let placement = SpawnPlacement {
            origin,
            target,
            delay,
            duration,
            radius,
            color,
            variant,
        };

        let mut lifecycle = Self {
            kind,
            profile,
            placement,
            phase: LifecyclePhase::Telegraph,
            elapsed: 0.0,
            resolved: false,
            visual: VisualState::hidden(origin.at_height(0.0), color),
        };
        lifecycle.visual = lifecycle.derive();
        Ok(lifecycle)
    }

    /// Kind described by the lifecycle.
    #[must_use]
    pub const fn kind(&self) -> MechanicKind {
        self.kind
    }

    /// Resolved spawn parameters.
    #[must_use]
    pub const fn placement(&self) -> &SpawnPlacement {
        &self.placement
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Seconds elapsed since spawn.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Display parameters derived for the latest advancement.
    #[must_use]
    pub const fn visual(&self) -> &VisualState {
        &self.visual
    }

    /// Transitions the owner must schedule, as offsets from the spawn instant.
    ///
    /// Offsets are returned in firing order; equal offsets must fire in the
    /// order they are yielded.
    pub fn pending_transitions(&self) -> impl Iterator<Item = (Duration, Transition)> {
        let travel = self.profile.travel.map(|travel| {
            (
                self.placement.delay.mul_f32(travel.start_fraction.clamp(0.0, 1.0)),
                Transition::BeginTravel,
            )
        });
        travel.into_iter().chain([
            (self.placement.delay, Transition::Resolve),
            (self.placement.duration, Transition::Complete),
        ])
    }

    /// Advances elapsed time and recomputes the display parameters.
    ///
    /// Negative or non-finite deltas leave the elapsed time untouched.
    pub fn advance(&mut self, delta_seconds: f32) -> VisualState {
        if self.phase == LifecyclePhase::Done {
            return self.visual;
        }
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.elapsed += delta_seconds;
        }
        self.visual = self.derive();
        self.visual
    }

    /// Applies a scheduled transition.
    pub fn apply(&mut self, transition: Transition) -> TransitionOutcome {
        match transition {
            Transition::BeginTravel => TransitionOutcome {
                entered: self.on_travel_elapsed(),
                resolved_at: None,
            },
            Transition::Resolve => match self.on_delay_elapsed() {
                Some(position) => TransitionOutcome {
                    entered: Some(LifecyclePhase::Resolve),
                    resolved_at: Some(position),
                },
                None => TransitionOutcome::default(),
            },
            Transition::Complete => TransitionOutcome {
                entered: self
                    .on_duration_elapsed()
                    .then_some(LifecyclePhase::Done),
                resolved_at: None,
            },
        }
    }

    /// Moves a travelling mechanic from `Telegraph` to `Travel`.
    pub fn on_travel_elapsed(&mut self) -> Option<LifecyclePhase> {
        if self.phase != LifecyclePhase::Telegraph || self.profile.travel.is_none() {
            return None;
        }
        self.phase = LifecyclePhase::Travel;
        self.visual = self.derive();
        Some(self.phase)
    }

    /// Resolves the telegraph.
    ///
    /// Returns the position of the effect the first time it is called and
    /// `None` on every later call, so the explode signal fires exactly once.
    pub fn on_delay_elapsed(&mut self) -> Option<GroundPoint> {
        if self.resolved || self.phase == LifecyclePhase::Done {
            return None;
        }
        self.resolved = true;
        self.phase = LifecyclePhase::Resolve;
        self.visual = self.derive();
        Some(self.impact_point())
    }

    /// Moves the lifecycle to `Done`; returns `false` if it already was.
    pub fn on_duration_elapsed(&mut self) -> bool {
        if self.phase == LifecyclePhase::Done {
            return false;
        }
        self.phase = LifecyclePhase::Done;
        self.visual = self.derive();
        true
    }

    fn impact_point(&self) -> GroundPoint {
        match self.profile.travel {
            Some(_) => self.placement.target.unwrap_or(self.placement.origin),
            None => self.placement.origin,
        }
    }

    fn travel_start(&self) -> f32 {
        self.profile.travel.map_or(0.0, |travel| {
            self.placement.delay.as_secs_f32() * travel.start_fraction.clamp(0.0, 1.0)
        })
    }

    fn derive(&self) -> VisualState {
        let placement = &self.placement;
        let delay = placement.delay.as_secs_f32();
        let duration = placement.duration.as_secs_f32();
        let total = self.elapsed;

        let (start, end) = match self.phase {
            LifecyclePhase::Telegraph => (0.0, delay),
            LifecyclePhase::Travel => (self.travel_start(), delay),
            LifecyclePhase::Resolve | LifecyclePhase::Done => (delay, duration),
        };
        let in_phase = (total - start).max(0.0);
        let span = end - start;
        let progress = if span > 0.0 {
            (in_phase / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let clock = PhaseClock {
            total,
            in_phase,
            progress,
        };

        let look = self.profile.look(self.phase);
        let color = match self.phase {
            LifecyclePhase::Telegraph | LifecyclePhase::Travel => placement.color,
            LifecyclePhase::Resolve | LifecyclePhase::Done => self.profile.palette.resolve,
        };

        let mut visual = VisualState {
            phase: self.phase,
            opacity: look.opacity.sample(&clock),
            scale: look.scale.sample(&clock),
            rotation: 0.0,
            position: placement.origin.at_height(0.0),
            height: 0.0,
            color,
            progress,
            secondary: 0.0,
            hits: 0,
            blasts: [None; MAX_BLASTS],
        };
        self.decorate(&mut visual, &clock);
        if self.phase == LifecyclePhase::Done {
            visual.opacity = 0.0;
        }
        visual
    }

    fn decorate(&self, visual: &mut VisualState, clock: &PhaseClock) {
        let placement = &self.placement;
        let resolved = matches!(
            self.phase,
            LifecyclePhase::Resolve | LifecyclePhase::Done
        );

        match self.kind {
            MechanicKind::Tower => {
                visual.height = (clock.total * 2.0).min(4.0);
                visual.secondary = if resolved { 0.9 } else { 0.6 };
            }
            MechanicKind::Exaflare => {
                let (dx, dz) = heading_of(placement.variant, Heading::North).unit();
                visual.rotation = dx.atan2(dz);
                visual.blasts = exaflare_blasts(placement.origin, (dx, dz), clock.total);
            }
            MechanicKind::AkhMorn if resolved => {
                let limit = match placement.variant {
                    MechanicVariant::Hits(hits) => hits,
                    _ => 0,
                };
                let landed = (clock.in_phase / HIT_INTERVAL.as_secs_f32()).floor();
                visual.hits = landed.clamp(0.0, f32::from(limit)) as u8;
            }
            MechanicKind::Puddle => {
                visual.secondary = (1.0 + (clock.total * 6.0).sin() * 0.2).clamp(0.8, 1.2);
            }
            MechanicKind::Enrage => {
                visual.secondary = if resolved {
                    30.0 + clock.in_phase * 20.0
                } else {
                    clock.progress
                };
            }
            MechanicKind::ReturnPoint => {
                visual.rotation = if resolved {
                    placement.delay.as_secs_f32() * 2.0 + clock.in_phase * 10.0
                } else {
                    clock.total * 2.0
                };
            }
            MechanicKind::Quietus if resolved => {
                visual.secondary = 20.0 + (clock.total * 10.0).sin() * 5.0;
            }
            MechanicKind::PathOfLight => {
                if let Some(target) = placement.target {
                    visual.rotation =
                        (target.x() - placement.origin.x()).atan2(target.z() - placement.origin.z());
                }
            }
            MechanicKind::HallowedWings => {
                let half = placement.radius / 2.0;
                let dx = match placement.variant {
                    MechanicVariant::Wing(WingSide::Right) => half,
                    _ => -half,
                };
                visual.position = placement.origin.offset(dx, 0.0).at_height(0.0);
            }
            MechanicKind::TidalLight => {
                let (dx, dz) = heading_of(placement.variant, Heading::East).unit();
                visual.rotation = dx.atan2(dz);
                if resolved {
                    let sweep = (clock.in_phase * 2.0).min(1.0);
                    let reach = placement.radius;
                    let start = placement.origin.offset(-dx * reach, -dz * reach);
                    let end = placement.origin.offset(dx * reach, dz * reach);
                    visual.secondary = sweep;
                    visual.position = start.lerp(end, sweep).at_height(0.0);
                }
            }
            MechanicKind::SomberDance | MechanicKind::SpiritTaker | MechanicKind::DragonHead => {
                self.decorate_travel(visual, clock);
            }
            MechanicKind::DarkDebuff => {
                visual.rotation = clock.total * 2.0;
            }
            _ => {}
        }
    }

    fn decorate_travel(&self, visual: &mut VisualState, clock: &PhaseClock) {
        let Some(travel) = self.profile.travel else {
            return;
        };
        let origin = self.placement.origin;
        let target = self.placement.target.unwrap_or(origin);
        match self.phase {
            LifecyclePhase::Telegraph => {
                visual.position = origin.at_height(travel.base_height);
            }
            LifecyclePhase::Travel => {
                let progress = travel
                    .rate
                    .map_or(clock.progress, |rate| (clock.in_phase * rate).min(1.0));
                visual.secondary = progress;
                visual.position = origin.lerp(target, progress).at_height(travel.height(progress));
            }
            LifecyclePhase::Resolve | LifecyclePhase::Done => {
                visual.secondary = 1.0;
                visual.position = target.at_height(0.0);
            }
        }
    }
}

fn heading_of(variant: MechanicVariant, fallback: Heading) -> Heading {
    match variant {
        MechanicVariant::Heading(heading) => heading,
        _ => fallback,
    }
}

fn exaflare_blasts(
    origin: GroundPoint,
    (dx, dz): (f32, f32),
    total: f32,
) -> [Option<Blast>; MAX_BLASTS] {
    let mut blasts = [None; MAX_BLASTS];
    let interval = BLAST_INTERVAL.as_secs_f32();
    let fuse = BLAST_FUSE.as_secs_f32();
    let lifetime = BLAST_LIFETIME.as_secs_f32();

    for (index, slot) in blasts.iter_mut().enumerate().take(BLAST_COUNT) {
        let born = (index + 1) as f32 * interval;
        let age = total - born;
        if !(0.0..lifetime).contains(&age) {
            continue;
        }
        let distance = index as f32 * BLAST_SPACING;
        let exploded = age >= fuse;
        *slot = Some(Blast {
            position: origin.offset(dx * distance, dz * distance),
            opacity: if exploded { 0.9 } else { 0.5 },
            exploded,
        });
    }
    blasts
}
