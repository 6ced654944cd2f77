#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Encounter authoring: turns TOML encounter files into a validated schedule.
//!
//! A file is accepted or rejected as a whole. Everything the runtime relies
//! on is checked here: ordered offsets, known bosses and party slots, variants
//! that belong to their kind, timing that holds once profile defaults are
//! filled in, finite coordinates and parseable colours. The world only ever
//! sees well-formed input.

mod raw;

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use raid_rehearsal_core::{
    offset_from_millis, Action, Anchor, BossId, BossSpec, DanceRange, DebuffElement,
    EncounterSchedule, EncounterSetup, GroundPoint, Heading, HourglassTint, InstanceSelector,
    MechanicId, MechanicKind, MechanicVariant, PartyRole, PartySlot, Rgb, ScheduleError,
    ScheduledAction, SpawnParams, WingSide, WorldPoint, DEFAULT_ARENA_RADIUS,
};
use raid_rehearsal_system_lifecycle::MechanicProfile;
use serde::de::{
    value::{Error as ValueError, StrDeserializer},
    DeserializeOwned, IntoDeserializer,
};
use thiserror::Error;
use tracing::debug;

use raw::{RawAction, RawAnchor, RawBoss, RawFile, RawPartySlot};

/// Source of the hand-authored encounter shipped with the engine.
pub const BUILTIN_ENCOUNTER: &str = include_str!("../data/eden_p4.toml");

/// Cast bar colour used when an entry does not name one.
const DEFAULT_CAST_COLOR: Rgb = Rgb::from_hex(0xb388ff);

/// Schedule and static configuration loaded from one encounter file.
#[derive(Clone, Debug, PartialEq)]
pub struct Encounter {
    /// Static arena and roster configuration.
    pub setup: EncounterSetup,
    /// Ordered timeline of actions.
    pub schedule: EncounterSchedule,
}

/// Problems that reject an encounter file.
#[derive(Debug, Error)]
pub enum AuthoringError {
    /// The file could not be read.
    #[error("failed to read encounter file {}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not match the expected layout.
    #[error("malformed encounter file")]
    Toml(#[from] toml::de::Error),
    /// A colour string could not be parsed.
    #[error("`{0}` is not a `#rrggbb` colour")]
    InvalidColor(String),
    /// A variant name does not exist for the kind.
    #[error("timeline entry {index}: `{variant}` is not a {kind} variant")]
    UnknownVariant {
        /// Position of the timeline entry.
        index: usize,
        /// Kind named by the entry.
        kind: MechanicKind,
        /// Variant as authored.
        variant: String,
    },
    /// A boss id is referenced but not declared.
    #[error("timeline entry {index} references undeclared boss {boss}")]
    UnknownBoss {
        /// Position of the timeline entry.
        index: usize,
        /// Boss id as authored.
        boss: u8,
    },
    /// A party role is referenced but not declared.
    #[error("timeline entry {index} references undeclared party slot {}", role.label())]
    UnknownPartySlot {
        /// Position of the timeline entry.
        index: usize,
        /// Role as authored.
        role: PartyRole,
    },
    /// Two bosses share an id.
    #[error("boss {0} is declared twice")]
    DuplicateBoss(u8),
    /// Two party slots share a role.
    #[error("party slot {} is declared twice", .0.label())]
    DuplicatePartySlot(PartyRole),
    /// A numeric field is out of range.
    #[error("{field} must be a positive finite number")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A coordinate is `nan` or infinite.
    #[error("{field} must have finite coordinates")]
    NonFiniteCoordinate {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A spawn would complete before it resolves.
    #[error("timeline entry {index}: duration is shorter than the resolve delay")]
    InvalidTiming {
        /// Position of the timeline entry.
        index: usize,
    },
    /// The timeline offsets are malformed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Reads and validates an encounter file.
pub fn load(path: impl AsRef<Path>) -> Result<Encounter, AuthoringError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| AuthoringError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loading encounter file");
    parse(&contents)
}

/// Parses and validates the hand-authored encounter shipped with the engine.
pub fn builtin() -> Result<Encounter, AuthoringError> {
    parse(BUILTIN_ENCOUNTER)
}

/// Parses and validates encounter TOML.
pub fn parse(contents: &str) -> Result<Encounter, AuthoringError> {
    let file: RawFile = toml::from_str(contents)?;

    let arena_radius = file.encounter.arena_radius.unwrap_or(DEFAULT_ARENA_RADIUS);
    if !arena_radius.is_finite() || arena_radius <= 0.0 {
        return Err(AuthoringError::InvalidNumber {
            field: "arena_radius",
        });
    }
    let bosses = convert_bosses(&file.bosses)?;
    let party = convert_party(&file.party)?;

    let roster = Roster {
        bosses: bosses.iter().map(|boss| boss.id).collect(),
        roles: party.iter().map(|slot| slot.role).collect(),
    };
    let mut actions = Vec::with_capacity(file.timeline.len());
    for (index, entry) in file.timeline.into_iter().enumerate() {
        let offset = offset_from_millis(index, entry.at)?;
        let action = roster.convert_action(index, entry.action)?;
        actions.push(ScheduledAction::new(offset, action));
    }
    let schedule = EncounterSchedule::new(actions)?;

    debug!(
        name = %file.encounter.name,
        actions = schedule.len(),
        span_ms = schedule.span().as_millis() as u64,
        "encounter parsed"
    );
    Ok(Encounter {
        setup: EncounterSetup {
            name: file.encounter.name,
            arena_radius,
            spawn_delay: Duration::from_millis(file.encounter.spawn_delay_ms),
            seed: file.encounter.seed,
            bosses,
            party,
        },
        schedule,
    })
}

/// Parses `#rrggbb` (the `#` is optional).
pub fn parse_color(raw: &str) -> Result<Rgb, AuthoringError> {
    let digits = raw.strip_prefix('#').unwrap_or(raw);
    if digits.len() != 6 {
        return Err(AuthoringError::InvalidColor(raw.to_owned()));
    }
    u32::from_str_radix(digits, 16)
        .map(Rgb::from_hex)
        .map_err(|_| AuthoringError::InvalidColor(raw.to_owned()))
}

fn convert_bosses(raw: &[RawBoss]) -> Result<Vec<BossSpec>, AuthoringError> {
    let mut seen = BTreeSet::new();
    raw.iter()
        .map(|boss| {
            if !seen.insert(boss.id) {
                return Err(AuthoringError::DuplicateBoss(boss.id));
            }
            if !boss.move_speed.is_finite() || boss.move_speed <= 0.0 {
                return Err(AuthoringError::InvalidNumber {
                    field: "move_speed",
                });
            }
            Ok(BossSpec {
                id: BossId::new(boss.id),
                name: boss.name.clone(),
                color: parse_color(&boss.color)?,
                spawn: world_point(boss.spawn, "boss spawn")?,
                move_speed: boss.move_speed,
            })
        })
        .collect()
}

fn ground_point([x, z]: [f32; 2], field: &'static str) -> Result<GroundPoint, AuthoringError> {
    let point = GroundPoint::new(x, z);
    if point.is_finite() {
        Ok(point)
    } else {
        Err(AuthoringError::NonFiniteCoordinate { field })
    }
}

fn world_point([x, y, z]: [f32; 3], field: &'static str) -> Result<WorldPoint, AuthoringError> {
    let point = WorldPoint::new(x, y, z);
    if point.is_finite() {
        Ok(point)
    } else {
        Err(AuthoringError::NonFiniteCoordinate { field })
    }
}

fn convert_party(raw: &[RawPartySlot]) -> Result<Vec<PartySlot>, AuthoringError> {
    let mut seen = BTreeSet::new();
    raw.iter()
        .map(|slot| {
            if !seen.insert(slot.role) {
                return Err(AuthoringError::DuplicatePartySlot(slot.role));
            }
            Ok(PartySlot {
                role: slot.role,
                position: ground_point(slot.position, "party position")?,
            })
        })
        .collect()
}

/// Declared bosses and party roles that timeline entries may reference.
struct Roster {
    bosses: BTreeSet<BossId>,
    roles: BTreeSet<PartyRole>,
}

impl Roster {
    fn convert_action(&self, index: usize, raw: RawAction) -> Result<Action, AuthoringError> {
        let action = match raw {
            RawAction::Spawn {
                kind,
                id,
                origin,
                target,
                delay_ms,
                duration_ms,
                radius,
                color,
                variant,
                hits,
            } => {
                let delay = delay_ms.map(Duration::from_millis);
                let duration = duration_ms.map(Duration::from_millis);
                // Unset values fall back to the kind's profile at spawn time.
                let profile = MechanicProfile::for_kind(kind);
                if duration.unwrap_or(profile.duration) < delay.unwrap_or(profile.delay) {
                    return Err(AuthoringError::InvalidTiming { index });
                }
                if radius.is_some_and(|radius| !radius.is_finite() || radius <= 0.0) {
                    return Err(AuthoringError::InvalidNumber { field: "radius" });
                }
                Action::SpawnMechanic {
                    kind,
                    id: MechanicId::new(id),
                    params: SpawnParams {
                        origin: self.convert_anchor(index, origin)?,
                        target: target
                            .map(|anchor| self.convert_anchor(index, anchor))
                            .transpose()?,
                        delay,
                        duration,
                        radius,
                        color: color.as_deref().map(parse_color).transpose()?,
                        variant: convert_variant(index, kind, variant.as_deref(), hits)?,
                    },
                }
            }
            RawAction::Despawn { kind, id } => Action::DespawnMechanic {
                kind,
                selector: id.map_or(InstanceSelector::All, |id| {
                    InstanceSelector::Id(MechanicId::new(id))
                }),
            },
            RawAction::SetPhase { name } => Action::SetPhase { name },
            RawAction::Cast {
                skill,
                boss,
                cast_ms,
                color,
            } => Action::StartCast {
                skill,
                boss,
                cast_time: Duration::from_millis(cast_ms),
                color: color
                    .as_deref()
                    .map(parse_color)
                    .transpose()?
                    .unwrap_or(DEFAULT_CAST_COLOR),
            },
            RawAction::Banner {
                name,
                description,
                severity,
                duration_ms,
            } => Action::ShowHudMessage {
                name,
                description,
                severity,
                duration: Duration::from_millis(duration_ms),
            },
            RawAction::MoveBoss { boss, to } => Action::MoveBoss {
                boss: self.boss(index, boss)?,
                target: world_point(to, "move_boss target")?,
            },
        };
        Ok(action)
    }

    fn boss(&self, index: usize, boss: u8) -> Result<BossId, AuthoringError> {
        let id = BossId::new(boss);
        if self.bosses.contains(&id) {
            Ok(id)
        } else {
            Err(AuthoringError::UnknownBoss { index, boss })
        }
    }

    fn convert_anchor(&self, index: usize, raw: RawAnchor) -> Result<Anchor, AuthoringError> {
        Ok(match raw {
            RawAnchor::Avatar => Anchor::Avatar,
            RawAnchor::RandomParty => Anchor::RandomPartyMember,
            RawAnchor::Point(point) => Anchor::Fixed(ground_point(point, "point anchor")?),
            RawAnchor::Boss(boss) => Anchor::Boss(self.boss(index, boss)?),
            RawAnchor::Party(role) => {
                if !self.roles.contains(&role) {
                    return Err(AuthoringError::UnknownPartySlot { index, role });
                }
                Anchor::Party(role)
            }
        })
    }
}

fn convert_variant(
    index: usize,
    kind: MechanicKind,
    variant: Option<&str>,
    hits: Option<u8>,
) -> Result<MechanicVariant, AuthoringError> {
    let unknown = |name: &str| AuthoringError::UnknownVariant {
        index,
        kind,
        variant: name.to_owned(),
    };
    if let Some(hits) = hits {
        if kind != MechanicKind::AkhMorn || variant.is_some() || hits == 0 {
            return Err(unknown(&format!("hits = {hits}")));
        }
        return Ok(MechanicVariant::Hits(hits));
    }
    let Some(name) = variant else {
        return Ok(MechanicVariant::Plain);
    };
    let parsed = match kind {
        MechanicKind::Hourglass => flavour::<HourglassTint>(name).map(MechanicVariant::Hourglass),
        MechanicKind::DarkDebuff => flavour::<DebuffElement>(name).map(MechanicVariant::Debuff),
        MechanicKind::SomberDance => flavour::<DanceRange>(name).map(MechanicVariant::Dance),
        MechanicKind::Exaflare | MechanicKind::TidalLight => {
            flavour::<Heading>(name).map(MechanicVariant::Heading)
        }
        MechanicKind::HallowedWings => flavour::<WingSide>(name).map(MechanicVariant::Wing),
        _ => None,
    };
    parsed.ok_or_else(|| unknown(name))
}

/// Reads a snake_case variant name through the type's own serde mapping.
fn flavour<T: DeserializeOwned>(name: &str) -> Option<T> {
    let deserializer: StrDeserializer<'_, ValueError> = name.into_deserializer();
    T::deserialize(deserializer).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
        [encounter]
        name = "Practice"
        spawn_delay_ms = 1500

        [[boss]]
        id = 1
        name = "Oracle of Darkness"
        color = "#9933ff"
        spawn = [0.0, 1.5, -8.0]
        move_speed = 5.0

        [[party]]
        role = "MT"
        position = [0.0, -3.0]

        [[timeline]]
        at = 0
        action = "set_phase"
        name = "intro"

        [[timeline]]
        at = 2000
        action = "spawn"
        kind = "hourglass"
        id = 1
        origin = { point = [4.0, 4.0] }
        variant = "purple"

        [[timeline]]
        at = 2000.5
        action = "spawn"
        kind = "dark_water"
        id = 1
        origin = { party = "MT" }
        delay_ms = 1000
        duration_ms = 1500

        [[timeline]]
        at = 2500
        action = "spawn"
        kind = "tower"
        id = 2
        origin = { boss = 1 }
        radius = 2

        [[timeline]]
        at = 3000
        action = "despawn"
        kind = "hourglass"
    "##;

    fn with_entry(entry: &str) -> String {
        format!(
            "{MINIMAL}\n[[timeline]]\nat = 9000\n{entry}\n"
        )
    }

    #[test]
    fn minimal_file_parses_into_ordered_actions() {
        let encounter = parse(MINIMAL).expect("minimal encounter parses");
        assert_eq!(encounter.setup.spawn_delay, Duration::from_millis(1500));
        assert_eq!(encounter.setup.arena_radius, DEFAULT_ARENA_RADIUS);
        assert_eq!(encounter.schedule.len(), 5);
        assert_eq!(
            encounter.schedule.get(2).map(ScheduledAction::offset),
            Some(Duration::from_micros(2_000_500))
        );
        assert!(matches!(
            encounter.schedule.get(1).map(ScheduledAction::action),
            Some(Action::SpawnMechanic {
                kind: MechanicKind::Hourglass,
                params: SpawnParams {
                    variant: MechanicVariant::Hourglass(HourglassTint::Purple),
                    ..
                },
                ..
            })
        ));
        assert!(matches!(
            encounter.schedule.get(4).map(ScheduledAction::action),
            Some(Action::DespawnMechanic {
                selector: InstanceSelector::All,
                ..
            })
        ));
    }

    #[test]
    fn out_of_order_offsets_reject_the_file() {
        let source = MINIMAL.replace("at = 3000", "at = 100");
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::Schedule(ScheduleError::OutOfOrder { index: 4, .. }))
        ));
    }

    #[test]
    fn negative_offsets_reject_the_file() {
        let source = MINIMAL.replace("at = 0\n", "at = -5\n");
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::Schedule(ScheduleError::NegativeOffset { index: 0, .. }))
        ));
    }

    #[test]
    fn variants_must_belong_to_their_kind() {
        let source = with_entry(
            "action = \"spawn\"\nkind = \"tower\"\nid = 9\norigin = \"avatar\"\nvariant = \"purple\"",
        );
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::UnknownVariant {
                kind: MechanicKind::Tower,
                ..
            })
        ));
    }

    #[test]
    fn akh_morn_hit_counts_are_read() {
        let source = with_entry(
            "action = \"spawn\"\nkind = \"akh_morn\"\nid = 1\norigin = { party = \"MT\" }\nhits = 6",
        );
        let encounter = parse(&source).expect("akh morn entry parses");
        assert!(matches!(
            encounter.schedule.actions().last().map(ScheduledAction::action),
            Some(Action::SpawnMechanic {
                params: SpawnParams {
                    variant: MechanicVariant::Hits(6),
                    ..
                },
                ..
            })
        ));
    }

    #[test]
    fn undeclared_references_are_rejected() {
        let boss = with_entry("action = \"move_boss\"\nboss = 4\nto = [0.0, 1.5, 0.0]");
        assert!(matches!(
            parse(&boss),
            Err(AuthoringError::UnknownBoss { boss: 4, .. })
        ));

        let party = with_entry(
            "action = \"spawn\"\nkind = \"dark_water\"\nid = 5\norigin = { party = \"H2\" }",
        );
        assert!(matches!(
            parse(&party),
            Err(AuthoringError::UnknownPartySlot {
                role: PartyRole::HealerTwo,
                ..
            })
        ));
    }

    #[test]
    fn malformed_colours_are_rejected() {
        assert_eq!(parse_color("#ff8000").expect("valid colour"), Rgb::from_hex(0xff8000));
        assert_eq!(parse_color("00ff00").expect("hash is optional"), Rgb::from_hex(0x00ff00));
        assert!(parse_color("#ff80").is_err());
        assert!(parse_color("#gg0000").is_err());
    }

    #[test]
    fn unknown_actions_fail_to_parse() {
        let source = with_entry("action = \"teleport\"");
        assert!(matches!(parse(&source), Err(AuthoringError::Toml(_))));
    }

    #[test]
    fn inverted_timing_is_rejected() {
        let source = with_entry(
            "action = \"spawn\"\nkind = \"tower\"\nid = 9\norigin = \"avatar\"\ndelay_ms = 500\nduration_ms = 100",
        );
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::InvalidTiming { index: 5 })
        ));
    }

    #[test]
    fn duration_alone_is_checked_against_the_default_delay() {
        // Towers resolve after 3000 ms by default.
        let source = with_entry(
            "action = \"spawn\"\nkind = \"tower\"\nid = 9\norigin = \"avatar\"\nduration_ms = 500",
        );
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::InvalidTiming { index: 5 })
        ));

        let valid = with_entry(
            "action = \"spawn\"\nkind = \"tower\"\nid = 9\norigin = \"avatar\"\nduration_ms = 3000",
        );
        assert!(parse(&valid).is_ok());
    }

    #[test]
    fn delay_alone_is_checked_against_the_default_duration() {
        // Circles complete after 2000 ms by default.
        let source = with_entry(
            "action = \"spawn\"\nkind = \"aoe_circle\"\nid = 9\norigin = \"avatar\"\ndelay_ms = 2500",
        );
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::InvalidTiming { index: 5 })
        ));
    }

    #[test]
    fn non_finite_anchor_points_are_rejected() {
        let source = with_entry(
            "action = \"spawn\"\nkind = \"aoe_circle\"\nid = 9\norigin = { point = [nan, 0.0] }",
        );
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::NonFiniteCoordinate {
                field: "point anchor"
            })
        ));

        let target = with_entry(
            "action = \"spawn\"\nkind = \"somber_dance\"\nid = 9\norigin = { boss = 1 }\ntarget = { point = [0.0, -inf] }",
        );
        assert!(matches!(
            parse(&target),
            Err(AuthoringError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn non_finite_boss_moves_are_rejected() {
        let source = with_entry("action = \"move_boss\"\nboss = 1\nto = [0.0, inf, 0.0]");
        assert!(matches!(
            parse(&source),
            Err(AuthoringError::NonFiniteCoordinate {
                field: "move_boss target"
            })
        ));
    }

    #[test]
    fn non_finite_roster_positions_are_rejected() {
        let boss = MINIMAL.replace("spawn = [0.0, 1.5, -8.0]", "spawn = [nan, 1.5, -8.0]");
        assert!(matches!(
            parse(&boss),
            Err(AuthoringError::NonFiniteCoordinate {
                field: "boss spawn"
            })
        ));

        let party = MINIMAL.replace("position = [0.0, -3.0]", "position = [0.0, -inf]");
        assert!(matches!(
            parse(&party),
            Err(AuthoringError::NonFiniteCoordinate {
                field: "party position"
            })
        ));
    }
}
