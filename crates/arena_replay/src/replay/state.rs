//! Observable engine state

use crate::combat_log::{InstanceId, TeamId, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPhase {
    #[default]
    Idle,
    Playing,
    VictoryPose,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayState {
    pub phase: ReplayPhase,
    /// Never decreases during one playback
    pub current_tick: Tick,
    /// Max event tick of the log
    pub total_ticks: Tick,
    pub winner_team_id: Option<TeamId>,
}

impl ReplayState {
    pub fn is_active(&self) -> bool {
        self.phase != ReplayPhase::Idle
    }

    /// Fraction of the log played, in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.total_ticks == 0 {
            return if self.is_active() { 1.0 } else { 0.0 };
        }
        (self.current_tick as f32 / self.total_ticks as f32).min(1.0)
    }
}

/// One event the engine actually applied (dropped events are absent)
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEvent {
    /// Engine clock when applied
    pub at_tick: Tick,
    pub event_tick: Tick,
    pub kind: String,
    pub instance_id: Option<InstanceId>,
    pub target_id: Option<InstanceId>,
    pub fast_forward: bool,
}
