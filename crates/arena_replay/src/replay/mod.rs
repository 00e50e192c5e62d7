//! Replay engine: plays one combat log on one board
//!
//! # State machine
//! `Idle → Playing → VictoryPose → Idle`; `stop()` jumps to Idle from anywhere.
//!
//! # Scheduling
//! Frame-driven: `advance(dt)` adds `dt * speed` to a time budget and spends
//! it on pending tick waits. Each step:
//! 1. clock moves to the next tick holding an event
//! 2. every event with tick ≤ clock is applied
//! 3. next wait = (next event tick - clock) * tick_duration
//!
//! Drained log + CombatEnd seen → victory pose. Drained log without
//! CombatEnd → the clock keeps stepping one tick at a time until the
//! overflow guard stops playback with no winner.
//!
//! Animations are separate components (see `visuals::animation`), so event
//! application never waits on them.

mod apply;
pub mod signals;
pub mod state;
mod victory;


pub use signals::{init_replay_events, EndReason, PlaybackEnded, PlaybackStarted, UnitDamaged, UnitDied};
pub use state::{AppliedEvent, ReplayPhase, ReplayState};

use bevy::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::combat_log::{CombatLog, InstanceId, TeamId, Tick};
use crate::components::{BoardRegistry, VisualPresence};
use crate::config::{clamp_speed, ReplayConfig};
use crate::logger;
use crate::reconciler::{HandleTable, Provenance, VisualHandle, VisualReconciler};
use crate::visuals::{finish_death, DeathRelease};
use signals::emit;

/// Parameters of one playback
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub log: CombatLog,
    pub viewing_team: TeamId,
    pub is_host: bool,
    pub start_tick: Tick,
    /// Borrow existing visuals instead of always building new ones
    pub reuse_visuals: bool,
    /// Third-party battle: borrow only from the played board's registry
    pub spectator: bool,
}

impl StartRequest {
    pub fn new(log: CombatLog, viewing_team: &str) -> Self {
        Self {
            log,
            viewing_team: viewing_team.to_string(),
            is_host: true,
            start_tick: 0,
            reuse_visuals: true,
            spectator: false,
        }
    }

    pub fn from_tick(mut self, start_tick: Tick) -> Self {
        self.start_tick = start_tick;
        self
    }

    pub fn as_away(mut self) -> Self {
        self.is_host = false;
        self
    }

    pub fn without_reuse(mut self) -> Self {
        self.reuse_visuals = false;
        self
    }

    pub fn as_spectator(mut self) -> Self {
        self.spectator = true;
        self
    }
}

/// Returned when an engine goes back to Idle
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackFinished {
    pub winner_team_id: Option<TeamId>,
    pub reason: EndReason,
}

pub struct ReplayEngine {
    board: Entity,
    config: ReplayConfig,
    speed: f32,
    state: ReplayState,
    log: CombatLog,
    cursor: usize,
    viewing_team: TeamId,
    reconciler: VisualReconciler,
    handles: HandleTable,
    fallen: HashSet<InstanceId>,
    dying: Vec<(Entity, DeathRelease)>,
    hidden_roster: Vec<(Entity, Option<VisualPresence>)>,
    loot: Vec<Entity>,
    budget: Duration,
    pending_wait: Duration,
    next_tick: Tick,
    saw_combat_end: bool,
    fast_forwarding: bool,
    victory_remaining: Duration,
    ended_emitted: bool,
    finished: Option<PlaybackFinished>,
    trace: Vec<AppliedEvent>,
}

impl ReplayEngine {
    pub fn new(board: Entity, config: &ReplayConfig) -> Self {
        Self {
            board,
            config: config.clone(),
            speed: clamp_speed(config.playback_speed),
            state: ReplayState::default(),
            log: CombatLog::default(),
            cursor: 0,
            viewing_team: TeamId::new(),
            reconciler: VisualReconciler::standard(board, true),
            handles: HandleTable::default(),
            fallen: HashSet::new(),
            dying: Vec::new(),
            hidden_roster: Vec::new(),
            loot: Vec::new(),
            budget: Duration::ZERO,
            pending_wait: Duration::ZERO,
            next_tick: 0,
            saw_combat_end: false,
            fast_forwarding: false,
            victory_remaining: Duration::ZERO,
            ended_emitted: false,
            finished: None,
            trace: Vec::new(),
        }
    }

    pub fn board(&self) -> Entity {
        self.board
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn phase(&self) -> ReplayPhase {
        self.state.phase
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Applies to the next waits; clamped to 0.25x..4x
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = clamp_speed(speed);
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn handle(&self, instance_id: &str) -> Option<&VisualHandle> {
        self.handles.get(instance_id)
    }

    /// Died during the current (or last) playback
    pub fn has_fallen(&self, instance_id: &str) -> bool {
        self.fallen.contains(instance_id)
    }

    pub fn fallen(&self) -> &HashSet<InstanceId> {
        &self.fallen
    }

    pub fn trace(&self) -> &[AppliedEvent] {
        &self.trace
    }

    pub fn loot_markers(&self) -> &[Entity] {
        &self.loot
    }

    /// Begin a playback; false when the log is empty (engine stays Idle)
    pub fn start(&mut self, world: &mut World, request: StartRequest) -> bool {
        if self.state.is_active() {
            logger::log_warning(&format!(
                "⚠️ Replay already active on board {:?}, stopping it before restart",
                self.board
            ));
            self.stop(world);
        }

        if request.log.is_empty() {
            logger::log_warning(&format!("⚠️ Empty combat log for board {:?}, nothing to play", self.board));
            return false;
        }

        self.reset();
        self.reconciler = match (request.reuse_visuals, request.spectator) {
            (false, _) => VisualReconciler::construct_only(self.board),
            (true, true) => VisualReconciler::spectator(self.board),
            (true, false) => VisualReconciler::standard(self.board, request.is_host),
        };
        self.viewing_team = request.viewing_team;
        self.state.total_ticks = request.log.total_ticks();
        self.log = request.log;
        self.state.phase = ReplayPhase::Playing;

        logger::log_info(&format!(
            "▶️ Replay on board {:?}: {} events, {} ticks, start at {}",
            self.board,
            self.log.len(),
            self.state.total_ticks,
            request.start_tick
        ));
        emit(
            world,
            PlaybackStarted {
                board: self.board,
                start_tick: request.start_tick,
                total_ticks: self.state.total_ticks,
            },
        );

        if request.start_tick > 0 {
            self.fast_forward(world, request.start_tick);
        }
        self.apply_due(world);
        self.schedule_next(world);
        true
    }

    /// Spend `dt` of frame time; `Some` when the engine went back to Idle
    pub fn advance(&mut self, world: &mut World, dt: Duration) -> Option<PlaybackFinished> {
        match self.state.phase {
            // Start can already have tripped the overflow guard
            ReplayPhase::Idle => self.finished.take(),
            ReplayPhase::Playing => {
                self.budget += dt.mul_f64(f64::from(self.speed));
                while self.state.phase == ReplayPhase::Playing && self.budget >= self.pending_wait {
                    self.budget -= self.pending_wait;
                    self.step(world);
                }
                self.finished.take()
            }
            ReplayPhase::VictoryPose => {
                self.victory_remaining = self.victory_remaining.saturating_sub(dt);
                if self.victory_remaining.is_zero() {
                    return self.end_victory_pose(world);
                }
                None
            }
        }
    }

    /// Halt now and release every handle; nothing is mutated afterwards
    pub fn stop(&mut self, world: &mut World) -> Option<PlaybackFinished> {
        if !self.state.is_active() {
            return None;
        }
        logger::log_info(&format!(
            "⏹️ Replay on board {:?} stopped at tick {}",
            self.board, self.state.current_tick
        ));
        self.send_ended(world, EndReason::Stopped);
        self.release_all(world);
        Some(PlaybackFinished {
            winner_team_id: self.state.winner_team_id.clone(),
            reason: EndReason::Stopped,
        })
    }

    /// Cut the victory pose short
    pub fn end_victory_pose(&mut self, world: &mut World) -> Option<PlaybackFinished> {
        if self.state.phase != ReplayPhase::VictoryPose {
            return None;
        }
        self.release_all(world);
        logger::log_info(&format!("🏁 Replay on board {:?} finished", self.board));
        Some(PlaybackFinished {
            winner_team_id: self.state.winner_team_id.clone(),
            reason: EndReason::Completed,
        })
    }

    // ============================================================================
    // Scheduling
    // ============================================================================

    fn reset(&mut self) {
        self.state = ReplayState::default();
        self.log = CombatLog::default();
        self.cursor = 0;
        self.handles = HandleTable::default();
        self.fallen.clear();
        self.dying.clear();
        self.hidden_roster.clear();
        self.loot.clear();
        self.budget = Duration::ZERO;
        self.pending_wait = Duration::ZERO;
        self.next_tick = 0;
        self.saw_combat_end = false;
        self.fast_forwarding = false;
        self.victory_remaining = Duration::ZERO;
        self.ended_emitted = false;
        self.finished = None;
        self.trace.clear();
    }

    /// Apply state-changing events up to `target` instantly
    fn fast_forward(&mut self, world: &mut World, target: Tick) {
        self.fast_forwarding = true;
        let log = std::mem::take(&mut self.log);
        while let Some(event) = log.events().get(self.cursor) {
            if event.tick > target {
                break;
            }
            self.cursor += 1;
            if event.kind.is_cosmetic() {
                continue;
            }
            self.state.current_tick = self.state.current_tick.max(event.tick);
            self.apply(world, event);
        }
        self.log = log;
        self.state.current_tick = target;
        self.fast_forwarding = false;
        logger::log(&format!(
            "⏩ Fast-forwarded board {:?} to tick {} ({} events applied)",
            self.board,
            target,
            self.trace.len()
        ));
    }

    fn apply_due(&mut self, world: &mut World) {
        let log = std::mem::take(&mut self.log);
        while self.state.phase == ReplayPhase::Playing {
            let Some(event) = log.events().get(self.cursor) else {
                break;
            };
            if event.tick > self.state.current_tick {
                break;
            }
            self.cursor += 1;
            self.apply(world, event);
        }
        self.log = log;
    }

    fn schedule_next(&mut self, world: &mut World) {
        let current = self.state.current_tick;
        let next = match self.log.events().get(self.cursor) {
            Some(event) => event.tick.max(current.saturating_add(1)),
            None if self.saw_combat_end => {
                self.enter_victory_pose(world);
                return;
            }
            None if current == Tick::MAX || self.past_overflow_limit(current) => {
                self.abort_overflow(world);
                return;
            }
            None => current + 1,
        };
        self.next_tick = next;
        self.pending_wait = self.config.tick_duration().saturating_mul(next - current);
    }

    fn step(&mut self, world: &mut World) {
        self.state.current_tick = self.next_tick;

        if !self.saw_combat_end && self.past_overflow_limit(self.state.current_tick) {
            self.abort_overflow(world);
            return;
        }

        self.apply_due(world);
        if self.state.phase == ReplayPhase::Playing {
            self.schedule_next(world);
        }
    }

    /// Past the last event plus the grace window (u64: no saturation near `Tick::MAX`)
    fn past_overflow_limit(&self, tick: Tick) -> bool {
        u64::from(tick) > u64::from(self.state.total_ticks) + u64::from(self.config.overflow_grace_ticks)
    }

    fn abort_overflow(&mut self, world: &mut World) {
        logger::log_warning(&format!(
            "⚠️ No CombatEnd on board {:?} by tick {} (last event {}), forcing stop",
            self.board, self.state.current_tick, self.state.total_ticks
        ));
        self.state.winner_team_id = None;
        self.send_ended(world, EndReason::OverflowGuard);
        self.release_all(world);
        self.finished = Some(PlaybackFinished {
            winner_team_id: None,
            reason: EndReason::OverflowGuard,
        });
    }

    fn send_ended(&mut self, world: &mut World, reason: EndReason) {
        if self.ended_emitted {
            return;
        }
        self.ended_emitted = true;
        emit(
            world,
            PlaybackEnded {
                board: self.board,
                winner_team_id: self.state.winner_team_id.clone(),
                reason,
            },
        );
    }

    // ============================================================================
    // Release
    // ============================================================================

    fn release_all(&mut self, world: &mut World) {
        for (entity, release) in self.dying.drain(..) {
            finish_death(world, entity, release);
        }

        for handle in self.handles.drain() {
            self.release_handle(world, handle);
        }

        for (entity, previous) in self.hidden_roster.drain(..) {
            let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
                continue;
            };
            match previous {
                Some(presence) => entity_mut.insert(presence),
                None => entity_mut.remove::<VisualPresence>(),
            };
        }

        for marker in self.loot.drain(..) {
            if world.get_entity(marker).is_ok() {
                world.despawn(marker);
            }
        }

        self.state.phase = ReplayPhase::Idle;
        self.budget = Duration::ZERO;
        self.pending_wait = Duration::ZERO;
        self.victory_remaining = Duration::ZERO;
    }

    fn release_handle(&self, world: &mut World, handle: VisualHandle) {
        match handle.provenance {
            Provenance::New => {
                self.unbind(world, &handle.instance_id, handle.entity);
                if world.get_entity(handle.entity).is_ok() {
                    world.despawn(handle.entity);
                }
            }
            Provenance::Reused(restore) => {
                if self.fallen.contains(&handle.instance_id) {
                    return;
                }
                restore.restore(world, handle.entity);
            }
        }
    }

    fn unbind(&self, world: &mut World, instance_id: &str, entity: Entity) {
        if let Some(mut registry) = world.get_mut::<BoardRegistry>(self.board) {
            registry.unbind(instance_id, entity);
        }
    }
}
