//! Fixed party markers and the seeded picker behind random-member anchors.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use raid_rehearsal_core::{GroundPoint, PartyRole, PartySlot};

/// Party markers of one run.
#[derive(Debug)]
pub(crate) struct Party {
    slots: Vec<PartySlot>,
    rng: ChaCha8Rng,
}

impl Party {
    /// Creates the party; every run seeded alike picks the same members.
    pub(crate) fn new(slots: &[PartySlot], seed: u64) -> Self {
        Self {
            slots: slots.to_vec(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub(crate) fn position(&self, role: PartyRole) -> Option<GroundPoint> {
        self.slots
            .iter()
            .find(|slot| slot.role == role)
            .map(|slot| slot.position)
    }

    /// Picks a party member uniformly, counting the avatar as one of them.
    pub(crate) fn random_member(&mut self, avatar: GroundPoint) -> GroundPoint {
        let pick = self.rng.gen_range(0..=self.slots.len());
        self.slots
            .get(pick)
            .map_or(avatar, |slot| slot.position)
    }

    pub(crate) fn slots(&self) -> &[PartySlot] {
        &self.slots
    }
}
