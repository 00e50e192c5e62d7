//! Replay orchestrator: the viewer's own battle plus spectated boards
//!
//! # Primary battle
//! - Host: plays on the home board, mirrors the absent opponent's bench
//! - Away: relocates the viewer's roster visuals onto the opponent's board
//!   first, then plays there (board seen from the opposite side)
//!
//! # Spectation
//! One independent engine per spectated board; the primary engine is never
//! touched by spectation.
//!
//! # Teardown (victory pose over, or stop)
//! 1. engine releases its handles
//! 2. mirror visuals destroyed
//! 3. relocated roster visuals go home (dead ones stay hidden)
//! 4. opposite-side flag cleared, camera back home unless spectating

pub mod commands;
pub mod mirror;
pub mod teleport;

pub use commands::{PlaySpectated, StartPlayback, StopPlayback, StopSpectating};
pub use mirror::{MirrorDiff, MirrorRoster, MirrorRosterEntry};
pub use teleport::{relocate_roster, restore_roster, TeleportRecord};

use bevy::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::combat_log::{CombatLog, TeamId, Tick};
use crate::components::{ViewFromOppositeSide, ViewerContext};
use crate::config::ReplayConfig;
use crate::logger;
use crate::replay::{ReplayEngine, ReplayPhase, StartRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleRole {
    /// Battle happens on the viewer's board
    Host,
    /// Viewer's units visit the opponent's board
    Away,
}

/// The viewer's own battle
#[derive(Debug, Clone)]
pub struct PrimaryBattle {
    pub home_board: Entity,
    pub opponent_board: Entity,
    pub log: CombatLog,
    pub viewing_team: TeamId,
    pub role: BattleRole,
    pub start_tick: Tick,
    pub reuse_visuals: bool,
}

impl PrimaryBattle {
    pub fn new(home_board: Entity, opponent_board: Entity, log: CombatLog, viewing_team: &str, role: BattleRole) -> Self {
        Self {
            home_board,
            opponent_board,
            log,
            viewing_team: viewing_team.to_string(),
            role,
            start_tick: 0,
            reuse_visuals: true,
        }
    }

    pub fn from_tick(mut self, start_tick: Tick) -> Self {
        self.start_tick = start_tick;
        self
    }

    pub fn without_reuse(mut self) -> Self {
        self.reuse_visuals = false;
        self
    }

    /// Board the battle is played on
    pub fn board(&self) -> Entity {
        match self.role {
            BattleRole::Host => self.home_board,
            BattleRole::Away => self.opponent_board,
        }
    }
}

/// Board the camera should frame
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraFocus {
    pub board: Option<Entity>,
}

struct PrimaryPlayback {
    home_board: Entity,
    board: Entity,
    role: BattleRole,
    viewing_team: TeamId,
    engine: ReplayEngine,
    teleported: Vec<TeleportRecord>,
    mirror: MirrorRoster,
}

#[derive(Resource, Default)]
pub struct ReplayOrchestrator {
    primary: Option<PrimaryPlayback>,
    spectated: BTreeMap<Entity, ReplayEngine>,
    spectating: Option<Entity>,
}

impl ReplayOrchestrator {
    pub fn primary_engine(&self) -> Option<&ReplayEngine> {
        self.primary.as_ref().map(|primary| &primary.engine)
    }

    pub fn primary_engine_mut(&mut self) -> Option<&mut ReplayEngine> {
        self.primary.as_mut().map(|primary| &mut primary.engine)
    }

    pub fn primary_mirror(&self) -> Option<&MirrorRoster> {
        self.primary.as_ref().map(|primary| &primary.mirror)
    }

    pub fn spectated_engine(&self, board: Entity) -> Option<&ReplayEngine> {
        self.spectated.get(&board)
    }

    pub fn spectated_boards(&self) -> impl Iterator<Item = Entity> + '_ {
        self.spectated.keys().copied()
    }

    pub fn spectating(&self) -> Option<Entity> {
        self.spectating
    }

    pub fn is_idle(&self) -> bool {
        self.primary.is_none() && self.spectated.is_empty()
    }

    /// Start the viewer's battle, tearing down any previous one
    pub fn start_playback(&mut self, world: &mut World, battle: PrimaryBattle) -> bool {
        self.stop_playback(world);

        if battle.log.is_empty() {
            logger::log_warning("⚠️ Primary battle has an empty combat log, not starting");
            return false;
        }

        let board = battle.board();
        if self.spectated.contains_key(&board) {
            logger::log_warning(&format!(
                "⚠️ Board {:?} was being spectated, stopping that replay for the primary battle",
                board
            ));
            self.remove_spectation(world, board);
        }

        let teleported = match battle.role {
            BattleRole::Host => Vec::new(),
            BattleRole::Away => {
                let records = relocate_roster(world, battle.home_board, battle.opponent_board);
                set_opposite_side(world, board, true);
                records
            }
        };

        let config = world.get_resource::<ReplayConfig>().cloned().unwrap_or_default();
        let mut engine = ReplayEngine::new(board, &config);
        let request = StartRequest {
            log: battle.log,
            viewing_team: battle.viewing_team.clone(),
            is_host: battle.role == BattleRole::Host,
            start_tick: battle.start_tick,
            reuse_visuals: battle.reuse_visuals,
            spectator: false,
        };
        if !engine.start(world, request) {
            restore_roster(world, teleported, &HashSet::new());
            set_opposite_side(world, board, false);
            return false;
        }

        let mut mirror = MirrorRoster::default();
        if battle.role == BattleRole::Host && engine.phase() == ReplayPhase::Playing {
            mirror.sync(world, board, &battle.viewing_team);
        }
        if self.spectating.is_none() {
            set_focus(world, Some(board));
        }

        logger::log_info(&format!(
            "🎬 Primary battle ({:?}) on board {:?}, viewer '{}'",
            battle.role, board, battle.viewing_team
        ));
        self.primary = Some(PrimaryPlayback {
            home_board: battle.home_board,
            board,
            role: battle.role,
            viewing_team: battle.viewing_team,
            engine,
            teleported,
            mirror,
        });
        true
    }

    /// Stop the viewer's battle now; false if none was running
    pub fn stop_playback(&mut self, world: &mut World) -> bool {
        let Some(primary) = self.primary.take() else {
            return false;
        };
        self.teardown(world, primary);
        true
    }

    /// Replay another board's battle, replacing any replay already on it
    pub fn play_spectated(
        &mut self,
        world: &mut World,
        board: Entity,
        log: CombatLog,
        viewing_team: &str,
        is_host: bool,
        start_tick: Tick,
    ) -> bool {
        if self.primary.as_ref().is_some_and(|primary| primary.board == board) {
            logger::log_warning(&format!(
                "⚠️ Board {:?} hosts the primary battle, refusing to spectate it",
                board
            ));
            return false;
        }
        if self.spectated.contains_key(&board) {
            self.remove_spectation(world, board);
        }

        set_opposite_side(world, board, !is_host);
        let config = world.get_resource::<ReplayConfig>().cloned().unwrap_or_default();
        let mut engine = ReplayEngine::new(board, &config);
        let mut request = StartRequest::new(log, viewing_team).from_tick(start_tick).as_spectator();
        request.is_host = is_host;
        if !engine.start(world, request) {
            set_opposite_side(world, board, false);
            return false;
        }

        logger::log_info(&format!("👁️ Spectating board {:?} from tick {}", board, start_tick));
        self.spectated.insert(board, engine);
        self.spectating = Some(board);
        set_focus(world, Some(board));
        true
    }

    pub fn stop_spectating(&mut self, world: &mut World, board: Entity) -> bool {
        if !self.spectated.contains_key(&board) {
            return false;
        }
        self.remove_spectation(world, board);
        true
    }

    /// One frame: every engine advances, host mirror follows the feed
    pub fn update(&mut self, world: &mut World, dt: Duration) {
        let primary_done = match self.primary.as_mut() {
            Some(primary) => {
                let finished = primary.engine.advance(world, dt);
                if primary.role == BattleRole::Host && primary.engine.phase() == ReplayPhase::Playing {
                    primary.mirror.sync(world, primary.board, &primary.viewing_team);
                }
                finished.is_some()
            }
            None => false,
        };
        if primary_done {
            if let Some(primary) = self.primary.take() {
                self.teardown(world, primary);
            }
        }

        let finished: Vec<Entity> = self
            .spectated
            .iter_mut()
            .filter_map(|(&board, engine)| engine.advance(world, dt).map(|_| board))
            .collect();
        for board in finished {
            self.remove_spectation(world, board);
        }
    }

    fn teardown(&mut self, world: &mut World, mut primary: PrimaryPlayback) {
        primary.engine.stop(world);
        primary.mirror.release_all(world);

        let teleported = std::mem::take(&mut primary.teleported);
        restore_roster(world, teleported, primary.engine.fallen());
        if primary.role == BattleRole::Away {
            set_opposite_side(world, primary.board, false);
        }
        if self.spectating.is_none() {
            set_focus(world, Some(primary.home_board));
        }
        logger::log_info(&format!("🧹 Primary battle on board {:?} torn down", primary.board));
    }

    fn remove_spectation(&mut self, world: &mut World, board: Entity) {
        if let Some(mut engine) = self.spectated.remove(&board) {
            engine.stop(world);
        }
        set_opposite_side(world, board, false);

        if self.spectating == Some(board) {
            self.spectating = None;
            let resting = self
                .primary
                .as_ref()
                .map(|primary| primary.board)
                .or_else(|| world.get_resource::<ViewerContext>().and_then(|viewer| viewer.home_board));
            set_focus(world, resting);
        }
    }
}

fn set_opposite_side(world: &mut World, board: Entity, opposite: bool) {
    let Ok(mut board_mut) = world.get_entity_mut(board) else {
        return;
    };
    if opposite {
        board_mut.insert(ViewFromOppositeSide);
    } else {
        board_mut.remove::<ViewFromOppositeSide>();
    }
}

fn set_focus(world: &mut World, board: Option<Entity>) {
    world.get_resource_or_insert_with(CameraFocus::default).board = board;
}

/// Run `f` with the orchestrator lifted out of the world
pub fn with_orchestrator<U>(world: &mut World, f: impl FnOnce(&mut ReplayOrchestrator, &mut World) -> U) -> Option<U> {
    let result = world.try_resource_scope(|world, mut orchestrator: Mut<ReplayOrchestrator>| f(&mut *orchestrator, world));
    if result.is_none() {
        logger::log_error("❌ ReplayOrchestrator resource missing (is ReplayPlugin added?)");
    }
    result
}

/// Exclusive system: advance all replays by the frame delta
pub fn drive_replays(world: &mut World) {
    let Some(dt) = world.get_resource::<Time>().map(|time| time.delta()) else {
        return;
    };
    with_orchestrator(world, |orchestrator, world| orchestrator.update(world, dt));
}
