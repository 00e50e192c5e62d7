//! Combat log event types
//!
//! Produced by the authoritative simulation, consumed read-only here.
//! Wire format (per event): `{ "tick": 5, "kind": "UnitMove", "payload": { ... } }`
//! with camelCase payload fields.

use serde::{Deserialize, Serialize};

/// Combatant identifier, unique for the lifetime of one battle
pub type InstanceId = String;

/// Team identifier (player id of the board owner, or a PvE faction)
pub type TeamId = String;

/// Authoritative simulation tick
pub type Tick = u32;

/// Stats shown by the presentation layer (health bar, tooltips)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatBlock {
    pub attack: i32,
    pub health: i32,
    pub max_health: i32,
}

/// One combatant as it entered the battle (CombatStart roster entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantSnapshot {
    pub instance_id: InstanceId,
    /// Catalog key for template lookup
    pub unit_id: String,
    pub team_id: TeamId,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub stats: StatBlock,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Loot dropped by a dying combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootDrop {
    pub item_id: String,
    pub x: i32,
    pub y: i32,
}

/// Event payload, keyed by `kind` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum EventKind {
    #[serde(rename_all = "camelCase")]
    CombatStart { roster: Vec<CombatantSnapshot> },
    #[serde(rename_all = "camelCase")]
    UnitMove { instance_id: InstanceId, x: i32, y: i32 },
    #[serde(rename_all = "camelCase")]
    UnitAttack {
        attacker_id: InstanceId,
        target_id: InstanceId,
    },
    #[serde(rename_all = "camelCase")]
    UnitDamage {
        instance_id: InstanceId,
        damage: i32,
        current_health: i32,
        max_health: i32,
    },
    #[serde(rename_all = "camelCase")]
    UnitDeath {
        instance_id: InstanceId,
        #[serde(default)]
        loot: Option<LootDrop>,
    },
    #[serde(rename_all = "camelCase")]
    CombatEnd {
        #[serde(default)]
        winner_team_id: Option<TeamId>,
    },
    /// Kind this build does not know (newer simulation); never applied
    #[serde(skip)]
    Unknown(String),
}

/// Kind names this build understands
pub const KNOWN_KINDS: [&str; 6] = [
    "CombatStart",
    "UnitMove",
    "UnitAttack",
    "UnitDamage",
    "UnitDeath",
    "CombatEnd",
];

impl EventKind {
    pub fn name(&self) -> &str {
        match self {
            EventKind::CombatStart { .. } => "CombatStart",
            EventKind::UnitMove { .. } => "UnitMove",
            EventKind::UnitAttack { .. } => "UnitAttack",
            EventKind::UnitDamage { .. } => "UnitDamage",
            EventKind::UnitDeath { .. } => "UnitDeath",
            EventKind::CombatEnd { .. } => "CombatEnd",
            EventKind::Unknown(kind) => kind,
        }
    }

    /// Cosmetic kinds leave no lasting state and are skipped on fast-forward
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, EventKind::UnitAttack { .. } | EventKind::Unknown(_))
    }

    /// Combatant the event acts on (attacker for attacks)
    pub fn subject(&self) -> Option<&str> {
        match self {
            EventKind::UnitMove { instance_id, .. }
            | EventKind::UnitDamage { instance_id, .. }
            | EventKind::UnitDeath { instance_id, .. } => Some(instance_id),
            EventKind::UnitAttack { attacker_id, .. } => Some(attacker_id),
            EventKind::CombatStart { .. } | EventKind::CombatEnd { .. } | EventKind::Unknown(_) => None,
        }
    }
}

/// Tick-stamped event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub tick: Tick,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl CombatEvent {
    pub fn new(tick: Tick, kind: EventKind) -> Self {
        Self { tick, kind }
    }

    pub fn combat_start(tick: Tick, roster: Vec<CombatantSnapshot>) -> Self {
        Self::new(tick, EventKind::CombatStart { roster })
    }

    pub fn unit_move(tick: Tick, instance_id: &str, x: i32, y: i32) -> Self {
        Self::new(
            tick,
            EventKind::UnitMove {
                instance_id: instance_id.to_string(),
                x,
                y,
            },
        )
    }

    pub fn unit_attack(tick: Tick, attacker_id: &str, target_id: &str) -> Self {
        Self::new(
            tick,
            EventKind::UnitAttack {
                attacker_id: attacker_id.to_string(),
                target_id: target_id.to_string(),
            },
        )
    }

    pub fn unit_damage(tick: Tick, instance_id: &str, damage: i32, current_health: i32, max_health: i32) -> Self {
        Self::new(
            tick,
            EventKind::UnitDamage {
                instance_id: instance_id.to_string(),
                damage,
                current_health,
                max_health,
            },
        )
    }

    pub fn unit_death(tick: Tick, instance_id: &str, loot: Option<LootDrop>) -> Self {
        Self::new(
            tick,
            EventKind::UnitDeath {
                instance_id: instance_id.to_string(),
                loot,
            },
        )
    }

    pub fn combat_end(tick: Tick, winner_team_id: Option<&str>) -> Self {
        Self::new(
            tick,
            EventKind::CombatEnd {
                winner_team_id: winner_team_id.map(str::to_string),
            },
        )
    }
}

impl CombatantSnapshot {
    pub fn new(instance_id: &str, unit_id: &str, team_id: &str, x: i32, y: i32) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            unit_id: unit_id.to_string(),
            team_id: team_id.to_string(),
            x,
            y,
            stats: StatBlock {
                attack: 10,
                health: 100,
                max_health: 100,
            },
            items: Vec::new(),
        }
    }

    pub fn with_stats(mut self, attack: i32, health: i32, max_health: i32) -> Self {
        self.stats = StatBlock {
            attack,
            health,
            max_health,
        };
        self
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.items = items.iter().map(|item| item.to_string()).collect();
        self
    }
}
