//! Queued orchestrator operations for gameplay/networking systems
//!
//! ```ignore
//! commands.queue(StartPlayback(PrimaryBattle::new(home, away, log, "p1", BattleRole::Host)));
//! ```

use bevy::prelude::*;

use super::{with_orchestrator, PrimaryBattle};
use crate::combat_log::{CombatLog, TeamId, Tick};

pub struct StartPlayback(pub PrimaryBattle);

impl Command for StartPlayback {
    fn apply(self, world: &mut World) {
        with_orchestrator(world, |orchestrator, world| orchestrator.start_playback(world, self.0));
    }
}

pub struct StopPlayback;

impl Command for StopPlayback {
    fn apply(self, world: &mut World) {
        with_orchestrator(world, |orchestrator, world| orchestrator.stop_playback(world));
    }
}

pub struct PlaySpectated {
    pub board: Entity,
    pub log: CombatLog,
    pub viewing_team: TeamId,
    pub is_host: bool,
    pub start_tick: Tick,
}

impl Command for PlaySpectated {
    fn apply(self, world: &mut World) {
        with_orchestrator(world, |orchestrator, world| {
            orchestrator.play_spectated(
                world,
                self.board,
                self.log,
                &self.viewing_team,
                self.is_host,
                self.start_tick,
            )
        });
    }
}

pub struct StopSpectating(pub Entity);

impl Command for StopSpectating {
    fn apply(self, world: &mut World) {
        with_orchestrator(world, |orchestrator, world| orchestrator.stop_spectating(world, self.0));
    }
}
