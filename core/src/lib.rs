#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the raid rehearsal engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing every
//! state transition exactly once. The authored timeline is an immutable
//! [`EncounterSchedule`] built from [`ScheduledAction`] values; the world only
//! ever reads it.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Radius of the circular arena floor, measured in world units.
pub const DEFAULT_ARENA_RADIUS: f32 = 20.0;

/// Largest number of successive blasts a single exaflare may lay down.
pub const MAX_BLASTS: usize = 8;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Arms a fresh encounter run, tearing down any run already in flight.
    StartEncounter,
    /// Tears down the current run and leaves a fresh idle run in its place.
    Restart,
    /// Executes a single action immediately, outside of the authored schedule.
    Execute {
        /// Action to execute against the current run.
        action: Action,
    },
    /// Drives a live mechanic instance straight to its terminal phase.
    ForceComplete {
        /// Kind of the targeted instance.
        kind: MechanicKind,
        /// Identifier of the targeted instance within its kind.
        id: MechanicId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that bosses began spawning and the run awaits its anchor.
    EncounterArming {
        /// Epoch assigned to the run being armed.
        epoch: RunEpoch,
        /// Time remaining until the spawn-complete trigger anchors the run.
        spawn_delay: Duration,
    },
    /// Reports that the spawn-complete trigger anchored the schedule.
    EncounterStarted {
        /// Epoch of the anchored run.
        epoch: RunEpoch,
        /// Simulation time used as the start instant of the schedule.
        anchor: Duration,
    },
    /// Reports that the previous run was torn down and a fresh idle run created.
    EncounterReset {
        /// Epoch assigned to the fresh idle run.
        epoch: RunEpoch,
    },
    /// Confirms that an action executed successfully.
    ActionFired {
        /// Position of the action within the schedule, `None` for ad-hoc actions.
        index: Option<usize>,
        /// Simulation time at which the action executed.
        at: Duration,
    },
    /// Reports that an action failed; later actions are unaffected.
    ActionFailed {
        /// Position of the action within the schedule, `None` for ad-hoc actions.
        index: Option<usize>,
        /// Reason the action failed.
        error: ActionError,
    },
    /// Confirms that a mechanic instance entered the registry.
    MechanicSpawned {
        /// Kind of the spawned instance.
        kind: MechanicKind,
        /// Identifier of the spawned instance within its kind.
        id: MechanicId,
        /// Ground position the instance was anchored to.
        origin: GroundPoint,
    },
    /// Reports that a spawn triggered by another mechanic was rejected.
    SpawnRejected {
        /// Kind requested for the spawn.
        kind: MechanicKind,
        /// Identifier requested for the spawn.
        id: MechanicId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Announces that a mechanic instance moved to a new lifecycle phase.
    MechanicPhaseChanged {
        /// Kind of the instance.
        kind: MechanicKind,
        /// Identifier of the instance within its kind.
        id: MechanicId,
        /// Phase the instance entered.
        phase: LifecyclePhase,
    },
    /// Fired exactly once when a mechanic's telegraph resolves into its effect.
    MechanicResolved {
        /// Kind of the instance.
        kind: MechanicKind,
        /// Identifier of the instance within its kind.
        id: MechanicId,
        /// Ground position at which the effect resolved.
        position: GroundPoint,
    },
    /// Confirms that a mechanic instance left the registry.
    MechanicRemoved {
        /// Kind of the removed instance.
        kind: MechanicKind,
        /// Identifier of the removed instance.
        id: MechanicId,
        /// Reason the instance was removed.
        cause: RemovalCause,
    },
    /// Announces that the encounter entered a new named phase.
    PhaseChanged {
        /// Name of the phase that became current.
        name: String,
    },
    /// Announces that a cast bar appeared on the HUD.
    CastStarted {
        /// Name of the skill being cast.
        skill: String,
        /// Name of the caster displayed alongside the skill.
        boss: String,
    },
    /// Announces that the cast bar was cleared from the HUD.
    CastCleared,
    /// Announces that a mechanic banner appeared on the HUD.
    HudMessageShown {
        /// Headline displayed on the banner.
        name: String,
        /// Urgency applied to the banner.
        severity: Severity,
    },
    /// Announces that the mechanic banner was cleared from the HUD.
    HudMessageCleared,
    /// Confirms that a boss finished spawning into the arena.
    BossSpawned {
        /// Identifier of the spawned boss.
        boss: BossId,
    },
    /// Confirms that a boss reached its current movement target.
    BossArrived {
        /// Identifier of the boss that arrived.
        boss: BossId,
        /// Position the boss settled at.
        position: WorldPoint,
    },
}

/// Unique identifier of a mechanic instance within its kind.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MechanicId(u32);

impl MechanicId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MechanicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a boss participating in the encounter.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BossId(u8);

impl BossId {
    /// Creates a new boss identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Generation counter that distinguishes successive encounter runs.
///
/// Every timer armed by a run carries the run's epoch, so a timer left over
/// from a torn-down run can never be mistaken for one belonging to its
/// successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunEpoch(u64);

impl RunEpoch {
    /// Creates an epoch with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the epoch.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Epoch assigned to the run that replaces this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Position on the arena floor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundPoint {
    x: f32,
    z: f32,
}

impl GroundPoint {
    /// Centre of the arena.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Creates a ground point from its horizontal coordinates.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Coordinate along the east-west axis.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Coordinate along the north-south axis; north is negative.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean distance to another point in the horizontal plane.
    #[must_use]
    pub fn distance(&self, other: GroundPoint) -> f32 {
        (other.x - self.x).hypot(other.z - self.z)
    }

    /// Linear interpolation toward `other`; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, other: GroundPoint, t: f32) -> GroundPoint {
        let t = t.clamp(0.0, 1.0);
        GroundPoint::new(
            self.x + (other.x - self.x) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    /// Translates the point by the provided offsets.
    #[must_use]
    pub fn offset(&self, dx: f32, dz: f32) -> GroundPoint {
        GroundPoint::new(self.x + dx, self.z + dz)
    }

    /// Lifts the point to the provided height.
    #[must_use]
    pub const fn at_height(&self, y: f32) -> WorldPoint {
        WorldPoint::new(self.x, y, self.z)
    }

    /// Reports whether both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

/// Position in the three-dimensional arena; `y` points up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
    z: f32,
}

impl WorldPoint {
    /// Creates a point from its three coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along the east-west axis.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Height above the arena floor.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Coordinate along the north-south axis.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Projects the point onto the arena floor.
    #[must_use]
    pub const fn ground(&self) -> GroundPoint {
        GroundPoint::new(self.x, self.z)
    }

    /// Reports whether every coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Opaque RGB colour used by mechanics, bosses and the HUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Pure white, the colour every telegraph flashes when it resolves.
    pub const WHITE: Self = Self::from_rgb(0xff, 0xff, 0xff);

    /// Creates a colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Creates a colour from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(packed: u32) -> Self {
        Self::from_rgb(
            ((packed >> 16) & 0xff) as u8,
            ((packed >> 8) & 0xff) as u8,
            (packed & 0xff) as u8,
        )
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Urgency attached to a HUD mechanic banner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational callout.
    Info,
    /// Standard mechanic warning.
    #[default]
    Warning,
    /// Lethal mechanic that demands immediate attention.
    Danger,
}

/// Fixed party slots that surround the avatar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartyRole {
    /// Main tank.
    #[serde(rename = "MT")]
    MainTank,
    /// Off tank.
    #[serde(rename = "ST")]
    OffTank,
    /// First healer.
    #[serde(rename = "H1")]
    HealerOne,
    /// Second healer.
    #[serde(rename = "H2")]
    HealerTwo,
    /// First melee damage dealer.
    #[serde(rename = "D1")]
    MeleeOne,
    /// Second melee damage dealer.
    #[serde(rename = "D2")]
    MeleeTwo,
    /// First ranged damage dealer.
    #[serde(rename = "D3")]
    RangedOne,
    /// Second ranged damage dealer.
    #[serde(rename = "D4")]
    RangedTwo,
}

impl PartyRole {
    /// Short marker label rendered above the party member.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MainTank => "MT",
            Self::OffTank => "ST",
            Self::HealerOne => "H1",
            Self::HealerTwo => "H2",
            Self::MeleeOne => "D1",
            Self::MeleeTwo => "D2",
            Self::RangedOne => "D3",
            Self::RangedTwo => "D4",
        }
    }
}

/// Every hazard the encounter can telegraph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MechanicKind {
    /// Blinking circle dropped on a position.
    AoeCircle,
    /// Soak tower that rises out of the floor.
    Tower,
    /// Line of successive blasts marching in one heading.
    Exaflare,
    /// Repeated stack hits on two markers.
    AkhMorn,
    /// Lingering pool left behind by another mechanic.
    Puddle,
    /// Stack marker that detonates on a player.
    DarkWater,
    /// Large timed hourglass circle.
    Hourglass,
    /// Growing shared-damage circle.
    MornAfah,
    /// Arena-wide enrage cast.
    Enrage,
    /// Short arena-wide damage flash.
    Raidwide,
    /// Boss jump toward a far or close target.
    SomberDance,
    /// Boss jump onto a random party member.
    SpiritTaker,
    /// Rewind marker that counts down to a return.
    ReturnPoint,
    /// Arena-wide darkening cast.
    Quietus,
    /// Cone cleave from the boss toward a target.
    PathOfLight,
    /// Half-arena cleave on one side.
    HallowedWings,
    /// Sweeping wall of light across the arena.
    TidalLight,
    /// Floating head that pops into a puddle.
    DragonHead,
    /// Elemental debuff circle around a player.
    DarkDebuff,
    /// Growing party-wide stack.
    UnholyDarkness,
}

impl MechanicKind {
    /// Every mechanic kind in registry order.
    pub const ALL: [MechanicKind; 20] = [
        Self::AoeCircle,
        Self::Tower,
        Self::Exaflare,
        Self::AkhMorn,
        Self::Puddle,
        Self::DarkWater,
        Self::Hourglass,
        Self::MornAfah,
        Self::Enrage,
        Self::Raidwide,
        Self::SomberDance,
        Self::SpiritTaker,
        Self::ReturnPoint,
        Self::Quietus,
        Self::PathOfLight,
        Self::HallowedWings,
        Self::TidalLight,
        Self::DragonHead,
        Self::DarkDebuff,
        Self::UnholyDarkness,
    ];

    /// Human readable name of the mechanic.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AoeCircle => "AoE",
            Self::Tower => "Tower",
            Self::Exaflare => "Exaflare",
            Self::AkhMorn => "Akh Morn",
            Self::Puddle => "Puddle",
            Self::DarkWater => "Dark Water",
            Self::Hourglass => "Hourglass",
            Self::MornAfah => "Morn Afah",
            Self::Enrage => "Enrage",
            Self::Raidwide => "Raidwide",
            Self::SomberDance => "Somber Dance",
            Self::SpiritTaker => "Spirit Taker",
            Self::ReturnPoint => "Return",
            Self::Quietus => "Quietus",
            Self::PathOfLight => "Path of Light",
            Self::HallowedWings => "Hallowed Wings",
            Self::TidalLight => "Tidal Light",
            Self::DragonHead => "Dragon Head",
            Self::DarkDebuff => "Dark Debuff",
            Self::UnholyDarkness => "Unholy Darkness",
        }
    }

    /// Reports whether the variant describes this kind.
    ///
    /// [`MechanicVariant::Plain`] is accepted by every kind and selects the
    /// kind's default flavour.
    #[must_use]
    pub const fn accepts(self, variant: MechanicVariant) -> bool {
        matches!(
            (self, variant),
            (_, MechanicVariant::Plain)
                | (Self::Hourglass, MechanicVariant::Hourglass(_))
                | (Self::DarkDebuff, MechanicVariant::Debuff(_))
                | (Self::SomberDance, MechanicVariant::Dance(_))
                | (Self::Exaflare, MechanicVariant::Heading(_))
                | (Self::TidalLight, MechanicVariant::Heading(_))
                | (Self::HallowedWings, MechanicVariant::Wing(_))
                | (Self::AkhMorn, MechanicVariant::Hits(_))
        )
    }
}

impl fmt::Display for MechanicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tint of an hourglass circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourglassTint {
    /// Fast hourglass.
    Yellow,
    /// Slow hourglass.
    Purple,
    /// Hourglass without a tether.
    Untethered,
}

/// Element carried by a dark debuff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebuffElement {
    /// Shared stack.
    Water,
    /// Knockback.
    Aero,
    /// Ground eruption.
    Eruption,
    /// Freezing ring.
    Blizzard,
}

/// Target selection of a somber dance jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanceRange {
    /// The boss leaps onto the farthest target.
    Far,
    /// The boss leaps onto the closest target.
    Close,
}

/// Compass heading on the arena floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heading {
    /// Toward negative `z`.
    North,
    /// Toward positive `x`.
    East,
    /// Toward positive `z`.
    South,
    /// Toward negative `x`.
    West,
}

impl Heading {
    /// Unit vector of the heading on the arena floor, as `(dx, dz)`.
    #[must_use]
    pub const fn unit(self) -> (f32, f32) {
        match self {
            Self::North => (0.0, -1.0),
            Self::East => (1.0, 0.0),
            Self::South => (0.0, 1.0),
            Self::West => (-1.0, 0.0),
        }
    }
}

/// Side of the arena cleaved by hallowed wings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WingSide {
    /// Western half of the arena.
    Left,
    /// Eastern half of the arena.
    Right,
}

/// Kind-specific flavour of a mechanic instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MechanicVariant {
    /// Default flavour of the kind.
    #[default]
    Plain,
    /// Hourglass tint.
    Hourglass(HourglassTint),
    /// Dark debuff element.
    Debuff(DebuffElement),
    /// Somber dance target selection.
    Dance(DanceRange),
    /// Marching or sweeping heading.
    Heading(Heading),
    /// Cleaved arena side.
    Wing(WingSide),
    /// Number of akh morn hits.
    Hits(u8),
}

/// Describes where a spawned mechanic is anchored.
///
/// Anchors are resolved exactly once, at the moment the spawning action fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// A fixed position on the arena floor.
    Fixed(GroundPoint),
    /// The avatar's position at the moment the action fires.
    Avatar,
    /// A boss's position at the moment the action fires.
    Boss(BossId),
    /// A specific party member's marker.
    Party(PartyRole),
    /// A party member (or the avatar) chosen by the run's seeded generator.
    RandomPartyMember,
}

/// Authoring-time parameters of a mechanic spawn.
///
/// Every optional field falls back to the default of the mechanic kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnParams {
    /// Anchor resolved into the instance origin.
    pub origin: Anchor,
    /// Optional anchor resolved into the travel destination or aim point.
    pub target: Option<Anchor>,
    /// Time from spawn until the telegraph resolves.
    pub delay: Option<Duration>,
    /// Time from spawn until the instance completes.
    pub duration: Option<Duration>,
    /// Radius of the hazard in world units.
    pub radius: Option<f32>,
    /// Colour override for the telegraph.
    pub color: Option<Rgb>,
    /// Kind-specific flavour.
    pub variant: MechanicVariant,
}

impl SpawnParams {
    /// Creates parameters anchored at `origin` with every other field defaulted.
    #[must_use]
    pub const fn at(origin: Anchor) -> Self {
        Self {
            origin,
            target: None,
            delay: None,
            duration: None,
            radius: None,
            color: None,
            variant: MechanicVariant::Plain,
        }
    }

    /// Overrides the resolve delay and completion time.
    #[must_use]
    pub const fn with_timing(mut self, delay: Duration, duration: Duration) -> Self {
        self.delay = Some(delay);
        self.duration = Some(duration);
        self
    }

    /// Sets the travel destination or aim point.
    #[must_use]
    pub const fn with_target(mut self, target: Anchor) -> Self {
        self.target = Some(target);
        self
    }

    /// Overrides the hazard radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Overrides the telegraph colour.
    #[must_use]
    pub const fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    /// Selects a kind-specific flavour.
    #[must_use]
    pub const fn with_variant(mut self, variant: MechanicVariant) -> Self {
        self.variant = variant;
        self
    }
}

/// Selects which instances of a kind an action targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceSelector {
    /// A single instance identified by id.
    Id(MechanicId),
    /// Every live instance of the kind.
    All,
}

/// Pure description of a single timeline step.
///
/// Executing an action mutates the run's registry, phase tracker, HUD or
/// bosses; it never mutates the schedule itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Spawns a mechanic instance into the registry.
    SpawnMechanic {
        /// Kind of mechanic to spawn.
        kind: MechanicKind,
        /// Identifier unique within the kind for the duration of the run.
        id: MechanicId,
        /// Spawn parameters.
        params: SpawnParams,
    },
    /// Removes live instances of a kind; missing instances are ignored.
    DespawnMechanic {
        /// Kind of the targeted instances.
        kind: MechanicKind,
        /// Which instances to remove.
        selector: InstanceSelector,
    },
    /// Moves the encounter to a new named phase.
    SetPhase {
        /// Name of the phase.
        name: String,
    },
    /// Shows a cast bar on the HUD that clears itself when the cast ends.
    StartCast {
        /// Name of the skill being cast.
        skill: String,
        /// Name of the caster.
        boss: String,
        /// Length of the cast.
        cast_time: Duration,
        /// Fill colour of the bar.
        color: Rgb,
    },
    /// Shows a mechanic banner on the HUD for an explicit duration.
    ShowHudMessage {
        /// Headline of the banner.
        name: String,
        /// Supporting text displayed beneath the headline.
        description: String,
        /// Urgency of the banner.
        severity: Severity,
        /// Time the banner stays visible.
        duration: Duration,
    },
    /// Sends a boss toward a new position.
    MoveBoss {
        /// Boss to move.
        boss: BossId,
        /// Destination of the move.
        target: WorldPoint,
    },
}

impl Action {
    /// Short label describing the action variant, used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SpawnMechanic { .. } => "spawn",
            Self::DespawnMechanic { .. } => "despawn",
            Self::SetPhase { .. } => "set_phase",
            Self::StartCast { .. } => "cast",
            Self::ShowHudMessage { .. } => "banner",
            Self::MoveBoss { .. } => "move_boss",
        }
    }
}

/// Action paired with its offset from the encounter start.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledAction {
    offset: Duration,
    action: Action,
}

impl ScheduledAction {
    /// Pairs an action with its offset from the encounter start.
    #[must_use]
    pub const fn new(offset: Duration, action: Action) -> Self {
        Self { offset, action }
    }

    /// Offset from the encounter start at which the action fires.
    #[must_use]
    pub const fn offset(&self) -> Duration {
        self.offset
    }

    /// Action executed when the offset elapses.
    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }
}

/// Converts an authored millisecond offset into a schedule offset.
///
/// Negative and non-finite offsets are rejected here, at authoring time, so
/// the runtime never observes them.
pub fn offset_from_millis(index: usize, millis: f64) -> Result<Duration, ScheduleError> {
    if !millis.is_finite() {
        return Err(ScheduleError::NonFiniteOffset { index });
    }
    if millis < 0.0 {
        return Err(ScheduleError::NegativeOffset {
            index,
            offset_ms: millis,
        });
    }
    Ok(Duration::from_nanos((millis * 1_000_000.0).round() as u64))
}

/// Immutable, hand-authored timeline of an encounter.
///
/// Authored order is firing order: offsets must be non-decreasing and actions
/// sharing an offset fire in the order they were authored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncounterSchedule {
    actions: Vec<ScheduledAction>,
}

impl EncounterSchedule {
    /// Validates the authored order and wraps the actions into a schedule.
    pub fn new(actions: Vec<ScheduledAction>) -> Result<Self, ScheduleError> {
        for (index, pair) in actions.windows(2).enumerate() {
            let previous = pair[0].offset;
            let offset = pair[1].offset;
            if offset < previous {
                return Err(ScheduleError::OutOfOrder {
                    index: index + 1,
                    offset,
                    previous,
                });
            }
        }
        Ok(Self { actions })
    }

    /// Schedule without any actions.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Actions in authored order.
    #[must_use]
    pub fn actions(&self) -> &[ScheduledAction] {
        &self.actions
    }

    /// Retrieves the action stored at the provided position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScheduledAction> {
        self.actions.get(index)
    }

    /// Number of authored actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Reports whether the schedule contains no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Offset of the final action.
    #[must_use]
    pub fn span(&self) -> Duration {
        self.actions
            .last()
            .map_or(Duration::ZERO, ScheduledAction::offset)
    }
}

/// Boss participating in the encounter.
#[derive(Clone, Debug, PartialEq)]
pub struct BossSpec {
    /// Identifier referenced by actions and anchors.
    pub id: BossId,
    /// Display name.
    pub name: String,
    /// Body colour.
    pub color: Rgb,
    /// Position the boss spawns at.
    pub spawn: WorldPoint,
    /// Movement speed in world units per second.
    pub move_speed: f32,
}

/// Fixed party member marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartySlot {
    /// Role displayed on the marker.
    pub role: PartyRole,
    /// Position of the marker.
    pub position: GroundPoint,
}

/// Static arena and roster configuration shared by every run.
#[derive(Clone, Debug, PartialEq)]
pub struct EncounterSetup {
    /// Display name of the encounter.
    pub name: String,
    /// Radius of the arena floor.
    pub arena_radius: f32,
    /// Time between the start request and the spawn-complete trigger.
    pub spawn_delay: Duration,
    /// Seed of the generator used for random party targets.
    pub seed: u64,
    /// Bosses present in the arena.
    pub bosses: Vec<BossSpec>,
    /// Party markers surrounding the avatar.
    pub party: Vec<PartySlot>,
}

impl Default for EncounterSetup {
    fn default() -> Self {
        Self {
            name: String::from("Practice"),
            arena_radius: DEFAULT_ARENA_RADIUS,
            spawn_delay: Duration::ZERO,
            seed: 0,
            bosses: Vec::new(),
            party: Vec::new(),
        }
    }
}

/// Lifecycle phase of a mechanic instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecyclePhase {
    /// Warning shown before the effect lands.
    Telegraph,
    /// The source of the mechanic is travelling toward its destination.
    Travel,
    /// The effect landed.
    Resolve,
    /// Terminal phase; the instance leaves the registry.
    Done,
}

/// Reason a mechanic instance left the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// The lifecycle reached its terminal phase naturally.
    Completed,
    /// A despawn action removed the instance.
    Despawned,
    /// A force-complete command drove the instance to its terminal phase.
    Forced,
}

/// Coarse state of an encounter run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// No encounter has been started.
    #[default]
    Idle,
    /// Bosses are spawning; the schedule is not anchored yet.
    Arming,
    /// The schedule is anchored and actions are firing.
    Running,
}

/// Single blast laid down by an exaflare.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blast {
    /// Centre of the blast.
    pub position: GroundPoint,
    /// Opacity of the blast circle.
    pub opacity: f32,
    /// Indicates whether the blast detonated.
    pub exploded: bool,
}

/// Display parameters derived from a lifecycle's elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualState {
    /// Phase the values were derived for.
    pub phase: LifecyclePhase,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Uniform scale multiplier applied to the hazard geometry.
    pub scale: f32,
    /// Rotation around the vertical axis, in radians.
    pub rotation: f32,
    /// Current centre of the mechanic; `y` carries the travel height.
    pub position: WorldPoint,
    /// Vertical extent of column-like geometry.
    pub height: f32,
    /// Colour of the primary geometry.
    pub color: Rgb,
    /// Progress through the current phase in `[0, 1]`.
    pub progress: f32,
    /// Kind-specific secondary channel (ring opacity, sweep, shockwave size).
    pub secondary: f32,
    /// Number of hits landed so far.
    pub hits: u8,
    /// Blasts laid down so far, in marching order.
    pub blasts: [Option<Blast>; MAX_BLASTS],
}

impl VisualState {
    /// Fully transparent state anchored at `position`.
    #[must_use]
    pub const fn hidden(position: WorldPoint, color: Rgb) -> Self {
        Self {
            phase: LifecyclePhase::Telegraph,
            opacity: 0.0,
            scale: 1.0,
            rotation: 0.0,
            position,
            height: 0.0,
            color,
            progress: 0.0,
            secondary: 0.0,
            hits: 0,
            blasts: [None; MAX_BLASTS],
        }
    }

    /// Iterator over the blasts laid down so far.
    pub fn active_blasts(&self) -> impl Iterator<Item = &Blast> {
        self.blasts.iter().flatten()
    }
}

/// Spawn parameters after anchors and kind defaults were resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPlacement {
    /// Resolved origin.
    pub origin: GroundPoint,
    /// Resolved travel destination or aim point.
    pub target: Option<GroundPoint>,
    /// Time from spawn until the telegraph resolves.
    pub delay: Duration,
    /// Time from spawn until the instance completes.
    pub duration: Duration,
    /// Hazard radius.
    pub radius: f32,
    /// Telegraph colour.
    pub color: Rgb,
    /// Resolved kind-specific flavour; never [`MechanicVariant::Plain`] for
    /// kinds that carry one.
    pub variant: MechanicVariant,
}

/// Read-only copy of a live mechanic instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MechanicSnapshot {
    /// Kind of the instance.
    pub kind: MechanicKind,
    /// Identifier of the instance within its kind.
    pub id: MechanicId,
    /// Resolved spawn parameters.
    pub placement: SpawnPlacement,
    /// Seconds elapsed since the instance spawned.
    pub elapsed: f32,
    /// Display parameters derived for the latest tick.
    pub visual: VisualState,
}

/// Synchronous pull of the avatar's horizontal position.
///
/// The world reads the position only while executing actions that anchor
/// hazards to the avatar.
pub trait AvatarPosition {
    /// Current position of the avatar on the arena floor.
    fn ground_position(&self) -> GroundPoint;
}

impl AvatarPosition for GroundPoint {
    fn ground_position(&self) -> GroundPoint {
        *self
    }
}

/// Authoring-time problems with an encounter schedule.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ScheduleError {
    /// An offset was negative.
    #[error("action {index} has a negative offset of {offset_ms} ms")]
    NegativeOffset {
        /// Position of the offending action.
        index: usize,
        /// Offset as authored.
        offset_ms: f64,
    },
    /// An offset was NaN or infinite.
    #[error("action {index} has a non-finite offset")]
    NonFiniteOffset {
        /// Position of the offending action.
        index: usize,
    },
    /// An offset precedes the offset authored before it.
    #[error("action {index} at {offset:?} precedes the previous action at {previous:?}")]
    OutOfOrder {
        /// Position of the offending action.
        index: usize,
        /// Offset of the offending action.
        offset: Duration,
        /// Offset of the action authored before it.
        previous: Duration,
    },
}

/// Reasons a mechanic spawn may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SpawnError {
    /// An instance with the same id is already live for the kind.
    #[error("{kind} {id} is already active")]
    DuplicateId {
        /// Kind of the rejected spawn.
        kind: MechanicKind,
        /// Identifier already in use.
        id: MechanicId,
    },
    /// The variant belongs to a different kind.
    #[error("variant {variant:?} does not apply to {kind}")]
    VariantMismatch {
        /// Kind of the rejected spawn.
        kind: MechanicKind,
        /// Variant supplied with the spawn.
        variant: MechanicVariant,
    },
    /// The instance would complete before it resolves.
    #[error("{kind} resolves after {delay:?} but completes after {duration:?}")]
    InvalidTiming {
        /// Kind of the rejected spawn.
        kind: MechanicKind,
        /// Resolve delay.
        delay: Duration,
        /// Completion time.
        duration: Duration,
    },
    /// The radius was not a positive finite number.
    #[error("{kind} radius {radius} is not a positive finite value")]
    InvalidRadius {
        /// Kind of the rejected spawn.
        kind: MechanicKind,
        /// Radius supplied with the spawn.
        radius: f32,
    },
    /// An anchor resolved to a non-finite position.
    #[error("{kind} anchor resolved to a non-finite position")]
    InvalidAnchor {
        /// Kind of the rejected spawn.
        kind: MechanicKind,
    },
}

/// Reasons an action may fail while executing.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ActionError {
    /// The mechanic spawn was rejected.
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    /// The action referenced a boss absent from the encounter.
    #[error("boss {0:?} is not part of the encounter")]
    UnknownBoss(BossId),
    /// The action referenced a party slot absent from the encounter.
    #[error("party slot {} is not part of the encounter", .0.label())]
    UnknownPartySlot(PartyRole),
    /// A boss was sent toward a non-finite position.
    #[error("boss {0:?} cannot move to a non-finite position")]
    InvalidMoveTarget(BossId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(name: &str) -> Action {
        Action::SetPhase {
            name: name.to_owned(),
        }
    }

    #[test]
    fn schedule_accepts_equal_offsets_in_authored_order() {
        let schedule = EncounterSchedule::new(vec![
            ScheduledAction::new(Duration::ZERO, phase("intro")),
            ScheduledAction::new(Duration::from_millis(500), phase("a")),
            ScheduledAction::new(Duration::from_millis(500), phase("b")),
        ])
        .expect("non-decreasing offsets are valid");

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.span(), Duration::from_millis(500));
        assert_eq!(
            schedule.get(2).map(ScheduledAction::action),
            Some(&phase("b"))
        );
    }

    #[test]
    fn schedule_rejects_offsets_that_go_backwards() {
        let error = EncounterSchedule::new(vec![
            ScheduledAction::new(Duration::from_millis(900), phase("late")),
            ScheduledAction::new(Duration::from_millis(300), phase("early")),
        ])
        .expect_err("offsets must not decrease");

        assert_eq!(
            error,
            ScheduleError::OutOfOrder {
                index: 1,
                offset: Duration::from_millis(300),
                previous: Duration::from_millis(900),
            }
        );
    }

    #[test]
    fn offset_conversion_rejects_negative_and_non_finite_values() {
        assert_eq!(
            offset_from_millis(4, -1.0),
            Err(ScheduleError::NegativeOffset {
                index: 4,
                offset_ms: -1.0
            })
        );
        assert_eq!(
            offset_from_millis(2, f64::NAN),
            Err(ScheduleError::NonFiniteOffset { index: 2 })
        );
        assert_eq!(
            offset_from_millis(2, f64::INFINITY),
            Err(ScheduleError::NonFiniteOffset { index: 2 })
        );
        assert_eq!(
            offset_from_millis(0, 1500.0),
            Ok(Duration::from_millis(1500))
        );
    }

    #[test]
    fn variants_only_apply_to_their_kind() {
        let heading = MechanicVariant::Heading(Heading::East);
        assert!(MechanicKind::Exaflare.accepts(heading));
        assert!(MechanicKind::TidalLight.accepts(heading));
        assert!(!MechanicKind::Tower.accepts(heading));
        assert!(!MechanicKind::Hourglass.accepts(MechanicVariant::Hits(3)));
        assert!(MechanicKind::ALL
            .iter()
            .all(|kind| kind.accepts(MechanicVariant::Plain)));
    }

    #[test]
    fn ground_distance_ignores_height() {
        let a = WorldPoint::new(0.0, 10.0, 0.0).ground();
        let b = GroundPoint::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn lerp_clamps_its_parameter() {
        let a = GroundPoint::new(0.0, 0.0);
        let b = GroundPoint::new(10.0, -10.0);
        assert_eq!(a.lerp(b, 0.5), GroundPoint::new(5.0, -5.0));
        assert_eq!(a.lerp(b, 2.0), b);
        assert_eq!(a.lerp(b, -1.0), a);
    }

    #[test]
    fn packed_hex_colours_split_into_components() {
        let color = Rgb::from_hex(0xff6b6b);
        assert_eq!(
            (color.red(), color.green(), color.blue()),
            (0xff, 0x6b, 0x6b)
        );
    }

    #[test]
    fn epochs_advance_monotonically() {
        let epoch = RunEpoch::new(7);
        assert_eq!(epoch.next().get(), 8);
        assert!(epoch < epoch.next());
    }
}
