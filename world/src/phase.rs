//! Coarse named phase of the encounter.

/// Phase reported before the schedule sets one.
pub const INITIAL_PHASE: &str = "standby";

/// Tracks the current encounter phase.
///
/// Every accepted change bumps a generation counter; boss movement targets
/// remember the generation they were issued under and lapse once it moves on.
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    name: String,
    generation: u32,
}

impl PhaseTracker {
    pub(crate) fn new() -> Self {
        Self {
            name: INITIAL_PHASE.to_owned(),
            generation: 0,
        }
    }

    /// Enters `name`; returns `false` when it already was the current phase.
    pub(crate) fn set_phase(&mut self, name: &str) -> bool {
        if self.name == name {
            return false;
        }
        name.clone_into(&mut self.name);
        self.generation = self.generation.wrapping_add(1);
        true
    }

    pub(crate) fn current_phase(&self) -> &str {
        &self.name
    }

    pub(crate) const fn generation(&self) -> u32 {
        self.generation
    }
}
