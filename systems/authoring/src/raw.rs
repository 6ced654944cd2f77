//! Serde mirror of the encounter file layout.
//!
//! Every type here is a literal transcription of the TOML tables; nothing is
//! validated until [`crate::parse`] converts it into core types.

use serde::Deserialize;

use raid_rehearsal_core::{MechanicKind, PartyRole, Severity};

#[derive(Debug, Deserialize)]
pub(crate) struct RawFile {
    pub(crate) encounter: RawEncounter,
    #[serde(default, rename = "boss")]
    pub(crate) bosses: Vec<RawBoss>,
    #[serde(default)]
    pub(crate) party: Vec<RawPartySlot>,
    #[serde(default)]
    pub(crate) timeline: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEncounter {
    pub(crate) name: String,
    pub(crate) arena_radius: Option<f32>,
    #[serde(default)]
    pub(crate) spawn_delay_ms: u64,
    #[serde(default)]
    pub(crate) seed: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBoss {
    pub(crate) id: u8,
    pub(crate) name: String,
    pub(crate) color: String,
    pub(crate) spawn: [f32; 3],
    pub(crate) move_speed: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPartySlot {
    pub(crate) role: PartyRole,
    pub(crate) position: [f32; 2],
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEntry {
    /// Offset from the encounter anchor in milliseconds.
    pub(crate) at: f64,
    #[serde(flatten)]
    pub(crate) action: RawAction,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum RawAction {
    Spawn {
        kind: MechanicKind,
        id: u32,
        origin: RawAnchor,
        target: Option<RawAnchor>,
        delay_ms: Option<u64>,
        duration_ms: Option<u64>,
        radius: Option<f32>,
        color: Option<String>,
        variant: Option<String>,
        hits: Option<u8>,
    },
    Despawn {
        kind: MechanicKind,
        id: Option<u32>,
    },
    SetPhase {
        name: String,
    },
    Cast {
        skill: String,
        boss: String,
        cast_ms: u64,
        color: Option<String>,
    },
    Banner {
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        severity: Severity,
        duration_ms: u64,
    },
    MoveBoss {
        boss: u8,
        to: [f32; 3],
    },
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RawAnchor {
    Avatar,
    RandomParty,
    Point([f32; 2]),
    Boss(u8),
    Party(PartyRole),
}
