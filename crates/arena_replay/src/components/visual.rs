//! Presentation components of a unit visual
//!
//! A renderer (outside this crate) reads these and drives models/skins:
//! - `Transform`: placement
//! - `VisualPresence`: shown/hidden
//! - `HealthDisplay`: health bar
//! - `AnimationTrigger`: clip to play (serial bumps on every retrigger)

use bevy::prelude::*;

use crate::combat_log::{InstanceId, StatBlock, TeamId};

/// Unit visual root
#[derive(Component, Debug, Clone, PartialEq)]
pub struct UnitVisual {
    pub instance_id: InstanceId,
    pub unit_id: String,
    pub team_id: TeamId,
    /// Visual descriptor from the catalog
    pub prefab: String,
    /// True when the catalog had no template and a stand-in was built
    pub placeholder: bool,
    /// Same team as the viewer (team-flag colouring)
    pub allied: bool,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualPresence {
    pub visible: bool,
}

impl Default for VisualPresence {
    fn default() -> Self {
        Self { visible: true }
    }
}

/// Health bar state
///
/// Mirrors the log: never recomputed from damage here.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthDisplay {
    pub current: i32,
    pub max: i32,
}

impl HealthDisplay {
    pub fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }

    /// Seeded from a roster snapshot (max never below current)
    pub fn from_stats(stats: &StatBlock) -> Self {
        Self::new(stats.health, stats.max_health.max(stats.health))
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            return 0.0;
        }
        (self.current.max(0) as f32 / self.max as f32).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitAnimation {
    #[default]
    Idle,
    Move,
    Attack,
    Death,
    Victory,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationTrigger {
    pub clip: UnitAnimation,
    /// Incremented on every trigger so repeated clips restart
    pub serial: u32,
}

impl AnimationTrigger {
    pub fn trigger(&mut self, clip: UnitAnimation) {
        self.clip = clip;
        self.serial = self.serial.wrapping_add(1);
    }
}

/// Cosmetic equipment shown on the model
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct EquippedItems(pub Vec<String>);

/// Board the visual currently stands on
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnBoard(pub Entity);

/// Dropped loot, owned by the engine that spawned it
#[derive(Component, Debug, Clone, PartialEq)]
pub struct LootMarker {
    pub item_id: String,
    pub dropped_by: InstanceId,
}
