//! Heads-up display state: the cast bar and the mechanic banner.

use std::{sync::Arc, time::Duration};

use raid_rehearsal_core::{Rgb, Severity};

/// Cast bar currently shown on the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct CastBar {
    skill: Arc<str>,
    boss: Arc<str>,
    started: Duration,
    cast_time: Duration,
    color: Rgb,
}

impl CastBar {
    /// Name of the skill being cast.
    #[must_use]
    pub fn skill(&self) -> &Arc<str> {
        &self.skill
    }

    /// Name of the caster.
    #[must_use]
    pub fn boss(&self) -> &Arc<str> {
        &self.boss
    }

    /// Length of the cast.
    #[must_use]
    pub const fn cast_time(&self) -> Duration {
        self.cast_time
    }

    /// Fill colour of the bar.
    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    /// Time left before the cast completes at simulation time `now`.
    #[must_use]
    pub fn remaining(&self, now: Duration) -> Duration {
        (self.started + self.cast_time).saturating_sub(now)
    }

    /// Fraction of the cast completed at simulation time `now`, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, now: Duration) -> f32 {
        if self.cast_time.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started);
        (elapsed.as_secs_f32() / self.cast_time.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Mechanic banner currently shown on the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    name: Arc<str>,
    description: Arc<str>,
    severity: Severity,
    expires: Duration,
}

impl Banner {
    /// Headline of the banner.
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Supporting text of the banner.
    #[must_use]
    pub fn description(&self) -> &Arc<str> {
        &self.description
    }

    /// Urgency of the banner.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Simulation time at which the banner clears itself.
    #[must_use]
    pub const fn expires(&self) -> Duration {
        self.expires
    }
}

/// HUD state of one run.
///
/// Showing a new cast bar or banner bumps that element's generation; an
/// auto-clear timer armed for an older generation leaves the newer element
/// alone.
#[derive(Debug, Default)]
pub(crate) struct HudState {
    cast: Option<CastBar>,
    banner: Option<Banner>,
    cast_generation: u64,
    banner_generation: u64,
}

impl HudState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Shows a cast bar and returns the generation its auto-clear must carry.
    pub(crate) fn start_cast(
        &mut self,
        skill: &str,
        boss: &str,
        started: Duration,
        cast_time: Duration,
        color: Rgb,
    ) -> u64 {
        self.cast = Some(CastBar {
            skill: Arc::from(skill),
            boss: Arc::from(boss),
            started,
            cast_time,
            color,
        });
        self.cast_generation = self.cast_generation.wrapping_add(1);
        self.cast_generation
    }

    /// Shows a banner and returns the generation its auto-clear must carry.
    pub(crate) fn show_banner(
        &mut self,
        name: &str,
        description: &str,
        severity: Severity,
        expires: Duration,
    ) -> u64 {
        self.banner = Some(Banner {
            name: Arc::from(name),
            description: Arc::from(description),
            severity,
            expires,
        });
        self.banner_generation = self.banner_generation.wrapping_add(1);
        self.banner_generation
    }

    /// Clears the cast bar if it is still the one shown under `generation`.
    pub(crate) fn clear_cast(&mut self, generation: u64) -> bool {
        if generation != self.cast_generation {
            return false;
        }
        self.cast.take().is_some()
    }

    /// Clears the banner if it is still the one shown under `generation`.
    pub(crate) fn clear_banner(&mut self, generation: u64) -> bool {
        if generation != self.banner_generation {
            return false;
        }
        self.banner.take().is_some()
    }

    pub(crate) fn cast(&self) -> Option<&CastBar> {
        self.cast.as_ref()
    }

    pub(crate) fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }
}
