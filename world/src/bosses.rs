//! Bosses present in the arena: spawn ramp and phase-gated movement.

use raid_rehearsal_core::{ActionError, BossId, BossSpec, Event, Rgb, WorldPoint};

/// Distance under which a moving boss snaps onto its target.
const ARRIVAL_DISTANCE: f32 = 0.1;
/// Scale gained per second while a boss materialises.
const SPAWN_SCALE_RATE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct MoveTarget {
    point: WorldPoint,
    phase_generation: u32,
}

/// Read-only state of one boss.
#[derive(Clone, Debug, PartialEq)]
pub struct Boss {
    id: BossId,
    name: String,
    color: Rgb,
    move_speed: f32,
    position: WorldPoint,
    scale: f32,
    spawned: bool,
    target: Option<MoveTarget>,
}

impl Boss {
    fn from_spec(spec: &BossSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name.clone(),
            color: spec.color,
            move_speed: spec.move_speed,
            position: spec.spawn,
            scale: 0.0,
            spawned: false,
            target: None,
        }
    }

    /// Identifier of the boss.
    #[must_use]
    pub const fn id(&self) -> BossId {
        self.id
    }

    /// Display name of the boss.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Body colour of the boss.
    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    /// Current position of the boss.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Spawn scale in `[0, 1]`; zero until the boss has spawned.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Reports whether the boss finished spawning.
    #[must_use]
    pub const fn is_spawned(&self) -> bool {
        self.spawned
    }

    /// Destination the boss is currently moving toward.
    #[must_use]
    pub fn destination(&self) -> Option<WorldPoint> {
        self.target.map(|target| target.point)
    }

    fn step(&mut self, delta_seconds: f32, phase_generation: u32, out_events: &mut Vec<Event>) {
        if !self.spawned {
            return;
        }
        self.scale = (self.scale + delta_seconds * SPAWN_SCALE_RATE).min(1.0);

        let Some(target) = self.target else {
            return;
        };
        if target.phase_generation != phase_generation {
            self.target = None;
            return;
        }

        let dx = target.point.x() - self.position.x();
        let dy = target.point.y() - self.position.y();
        let dz = target.point.z() - self.position.z();
        let distance = (dx * dx + dy * dy + dz * dz).sqrt();
        let travel = (self.move_speed * delta_seconds).min(distance);
        if distance > 0.0 && travel > 0.0 {
            let ratio = travel / distance;
            self.position = WorldPoint::new(
                self.position.x() + dx * ratio,
                self.position.y() + dy * ratio,
                self.position.z() + dz * ratio,
            );
        }

        if distance - travel < ARRIVAL_DISTANCE {
            self.position = target.point;
            self.target = None;
            out_events.push(Event::BossArrived {
                boss: self.id,
                position: target.point,
            });
        }
    }
}

/// Every boss of one run.
#[derive(Debug)]
pub(crate) struct BossRoster {
    bosses: Vec<Boss>,
}

impl BossRoster {
    pub(crate) fn new(specs: &[BossSpec]) -> Self {
        let mut bosses: Vec<Boss> = specs.iter().map(Boss::from_spec).collect();
        bosses.sort_by_key(|boss| boss.id);
        Self { bosses }
    }

    /// Marks every boss as spawned, emitting one event per boss.
    pub(crate) fn complete_spawn(&mut self, out_events: &mut Vec<Event>) {
        for boss in self.bosses.iter_mut().filter(|boss| !boss.spawned) {
            boss.spawned = true;
            out_events.push(Event::BossSpawned { boss: boss.id });
        }
    }

    /// Sends a boss toward `point`; the order lapses once the phase changes.
    pub(crate) fn move_boss(
        &mut self,
        id: BossId,
        point: WorldPoint,
        phase_generation: u32,
    ) -> Result<(), ActionError> {
        if !point.is_finite() {
            return Err(ActionError::InvalidMoveTarget(id));
        }
        let boss = self
            .bosses
            .iter_mut()
            .find(|boss| boss.id == id)
            .ok_or(ActionError::UnknownBoss(id))?;
        boss.target = Some(MoveTarget {
            point,
            phase_generation,
        });
        Ok(())
    }

    pub(crate) fn advance(
        &mut self,
        delta_seconds: f32,
        phase_generation: u32,
        out_events: &mut Vec<Event>,
    ) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        for boss in &mut self.bosses {
            boss.step(delta_seconds, phase_generation, out_events);
        }
    }

    pub(crate) fn position(&self, id: BossId) -> Option<WorldPoint> {
        self.bosses
            .iter()
            .find(|boss| boss.id == id)
            .map(|boss| boss.position)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Boss> {
        self.bosses.iter()
    }
}
