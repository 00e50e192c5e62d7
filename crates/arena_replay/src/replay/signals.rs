//! Playback notifications (Bevy events), tagged with the board entity

use bevy::prelude::*;

use crate::combat_log::{InstanceId, TeamId, Tick};
use crate::logger;

/// Why a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Log drained after CombatEnd (victory pose follows)
    Completed,
    Stopped,
    /// No CombatEnd within the grace window; winner unset
    OverflowGuard,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct PlaybackStarted {
    pub board: Entity,
    pub start_tick: Tick,
    pub total_ticks: Tick,
}

/// Sent once per playback
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PlaybackEnded {
    pub board: Entity,
    pub winner_team_id: Option<TeamId>,
    pub reason: EndReason,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct UnitDamaged {
    pub board: Entity,
    pub instance_id: InstanceId,
    pub damage: i32,
    pub current_health: i32,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct UnitDied {
    pub board: Entity,
    pub instance_id: InstanceId,
}

/// Event queues for worlds driven without `ReplayPlugin`
pub fn init_replay_events(world: &mut World) {
    world.init_resource::<Events<PlaybackStarted>>();
    world.init_resource::<Events<PlaybackEnded>>();
    world.init_resource::<Events<UnitDamaged>>();
    world.init_resource::<Events<UnitDied>>();
}

pub(crate) fn emit<E: Event + std::fmt::Debug>(world: &mut World, event: E) {
    if !world.contains_resource::<Events<E>>() {
        logger::log(&format!("📭 No event queue registered, dropping {:?}", event));
        return;
    }
    world.send_event(event);
}
