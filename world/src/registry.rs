//! Registry of live mechanic instances keyed by kind, then by id.

use std::collections::{btree_map::Entry, BTreeMap};

use raid_rehearsal_core::{
    InstanceSelector, MechanicId, MechanicKind, MechanicSnapshot, SpawnError,
};
use raid_rehearsal_system_lifecycle::Lifecycle;

/// Live mechanic instance owned by the registry.
#[derive(Clone, Debug)]
pub(crate) struct MechanicInstance {
    /// Unique spawn serial; distinguishes a respawned id from its predecessor.
    pub(crate) serial: u64,
    /// Lifecycle driving the instance.
    pub(crate) lifecycle: Lifecycle,
}

impl MechanicInstance {
    fn snapshot(&self, id: MechanicId) -> MechanicSnapshot {
        MechanicSnapshot {
            kind: self.lifecycle.kind(),
            id,
            placement: *self.lifecycle.placement(),
            elapsed: self.lifecycle.elapsed(),
            visual: *self.lifecycle.visual(),
        }
    }
}

/// Mapping from mechanic kind to the instances of that kind.
///
/// Kinds never share a map, so an operation on one kind cannot observe or
/// disturb instances of another.
#[derive(Debug, Default)]
pub(crate) struct MechanicRegistry {
    kinds: BTreeMap<MechanicKind, BTreeMap<MechanicId, MechanicInstance>>,
}

impl MechanicRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, kind: MechanicKind, id: MechanicId) -> bool {
        self.kinds
            .get(&kind)
            .is_some_and(|instances| instances.contains_key(&id))
    }

    /// Inserts a new instance; rejects ids already live for the kind.
    pub(crate) fn spawn(
        &mut self,
        id: MechanicId,
        instance: MechanicInstance,
    ) -> Result<&MechanicInstance, SpawnError> {
        let kind = instance.lifecycle.kind();
        let instances = self.kinds.entry(kind).or_default();
        match instances.entry(id) {
            Entry::Occupied(_) => Err(SpawnError::DuplicateId { kind, id }),
            Entry::Vacant(slot) => Ok(slot.insert(instance)),
        }
    }

    /// Removes an instance; missing ids yield `None`.
    pub(crate) fn despawn_by_id(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
    ) -> Option<MechanicInstance> {
        let instances = self.kinds.get_mut(&kind)?;
        let removed = instances.remove(&id);
        if instances.is_empty() {
            let _ = self.kinds.remove(&kind);
        }
        removed
    }

    pub(crate) fn get_mut(
        &mut self,
        kind: MechanicKind,
        id: MechanicId,
    ) -> Option<&mut MechanicInstance> {
        self.kinds.get_mut(&kind)?.get_mut(&id)
    }

    /// Ids of the live instances matched by `selector`, in ascending order.
    pub(crate) fn select(&self, kind: MechanicKind, selector: InstanceSelector) -> Vec<MechanicId> {
        let Some(instances) = self.kinds.get(&kind) else {
            return Vec::new();
        };
        match selector {
            InstanceSelector::Id(id) => instances.contains_key(&id).then_some(id).into_iter().collect(),
            InstanceSelector::All => instances.keys().copied().collect(),
        }
    }

    /// Advances every live lifecycle by the provided delta.
    pub(crate) fn advance_all(&mut self, delta_seconds: f32) {
        for instance in self.kinds.values_mut().flat_map(BTreeMap::values_mut) {
            let _ = instance.lifecycle.advance(delta_seconds);
        }
    }

    /// Ordered copy of the live instances of one kind.
    pub(crate) fn snapshot(&self, kind: MechanicKind) -> Vec<MechanicSnapshot> {
        self.kinds
            .get(&kind)
            .map(|instances| {
                instances
                    .iter()
                    .map(|(id, instance)| instance.snapshot(*id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copies of every live instance, ordered by kind, then id.
    pub(crate) fn iter(&self) -> impl Iterator<Item = MechanicSnapshot> + '_ {
        self.kinds.values().flat_map(|instances| {
            instances
                .iter()
                .map(|(id, instance)| instance.snapshot(*id))
        })
    }

    pub(crate) fn get(&self, kind: MechanicKind, id: MechanicId) -> Option<MechanicSnapshot> {
        self.kinds
            .get(&kind)?
            .get(&id)
            .map(|instance| instance.snapshot(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.kinds.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_rehearsal_core::{Anchor, GroundPoint, SpawnParams};

    fn instance(kind: MechanicKind, serial: u64) -> MechanicInstance {
        let params = SpawnParams::at(Anchor::Fixed(GroundPoint::ORIGIN));
        MechanicInstance {
            serial,
            lifecycle: Lifecycle::spawn(kind, GroundPoint::ORIGIN, None, &params)
                .expect("default parameters are valid"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected_without_touching_the_original() {
        let mut registry = MechanicRegistry::new();
        let id = MechanicId::new(1);
        let _ = registry
            .spawn(id, instance(MechanicKind::Tower, 0))
            .expect("first spawn succeeds");

        let error = registry
            .spawn(id, instance(MechanicKind::Tower, 1))
            .expect_err("duplicate id");
        assert_eq!(
            error,
            SpawnError::DuplicateId {
                kind: MechanicKind::Tower,
                id
            }
        );
        assert_eq!(
            registry.get_mut(MechanicKind::Tower, id).map(|entry| entry.serial),
            Some(0)
        );
    }

    #[test]
    fn same_id_may_live_under_different_kinds() {
        let mut registry = MechanicRegistry::new();
        let id = MechanicId::new(1);
        let _ = registry
            .spawn(id, instance(MechanicKind::Tower, 0))
            .expect("tower spawns");
        let _ = registry
            .spawn(id, instance(MechanicKind::AoeCircle, 1))
            .expect("circle spawns");
        assert_eq!(registry.len(), 2);

        assert!(registry.despawn_by_id(MechanicKind::Tower, id).is_some());
        assert!(registry.contains(MechanicKind::AoeCircle, id));
        assert!(!registry.contains(MechanicKind::Tower, id));
    }

    #[test]
    fn despawning_missing_ids_is_a_no_op() {
        let mut registry = MechanicRegistry::new();
        assert!(registry
            .despawn_by_id(MechanicKind::Puddle, MechanicId::new(9))
            .is_none());
        assert!(registry
            .select(MechanicKind::Puddle, InstanceSelector::Id(MechanicId::new(9)))
            .is_empty());
    }

    #[test]
    fn snapshots_are_ordered_by_id() {
        let mut registry = MechanicRegistry::new();
        for raw in [5, 2, 9] {
            let _ = registry
                .spawn(MechanicId::new(raw), instance(MechanicKind::DarkWater, u64::from(raw)))
                .expect("unique ids");
        }
        let ids: Vec<_> = registry
            .snapshot(MechanicKind::DarkWater)
            .iter()
            .map(|snapshot| snapshot.id.get())
            .collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(
            registry.select(MechanicKind::DarkWater, InstanceSelector::All),
            vec![MechanicId::new(2), MechanicId::new(5), MechanicId::new(9)]
        );
        assert!(registry.snapshot(MechanicKind::Tower).is_empty());
    }

    #[test]
    fn advancing_moves_every_kind_forward() {
        let mut registry = MechanicRegistry::new();
        let _ = registry
            .spawn(MechanicId::new(1), instance(MechanicKind::Tower, 0))
            .expect("tower spawns");
        let _ = registry
            .spawn(MechanicId::new(1), instance(MechanicKind::Puddle, 1))
            .expect("puddle spawns");
        registry.advance_all(0.5);
        assert!(registry.iter().all(|snapshot| (snapshot.elapsed - 0.5).abs() < 1e-6));
    }
}
