//! Arena replay
//!
//! Plays authoritative combat logs back as visuals on auto-battler boards
//! (Bevy 0.16, headless). The simulation already happened elsewhere; here we
//! only decide which visual shows each combatant, pace the events, and put
//! every borrowed visual back afterwards.
//!
//! Layers:
//! - combat_log: event model, JSON decoding, synthetic logs
//! - reconciler: combatant → visual handle (borrowed or built)
//! - replay: per-board engine (scheduler, event application, victory pose)
//! - orchestrator: primary battle, away relocation, bench mirror, spectation

use bevy::prelude::*;

pub mod catalog;
pub mod combat_log;
pub mod components;
pub mod config;
pub mod logger;
pub mod orchestrator;
pub mod reconciler;
pub mod replay;
pub mod visuals;

pub use catalog::{UnitCatalog, UnitTemplate};
pub use combat_log::{CombatEvent, CombatLog, CombatantSnapshot, DecodeError, EventKind, InstanceId, TeamId, Tick};
pub use components::*;
pub use config::ReplayConfig;
pub use logger::init_logger;
pub use orchestrator::{
    BattleRole, CameraFocus, PlaySpectated, PrimaryBattle, ReplayOrchestrator, StartPlayback, StopPlayback,
    StopSpectating,
};
pub use reconciler::{Provenance, VisualHandle, VisualLookup, VisualReconciler};
pub use replay::{
    EndReason, PlaybackEnded, PlaybackFinished, PlaybackStarted, ReplayEngine, ReplayPhase, ReplayState, StartRequest,
    UnitDamaged, UnitDied,
};

/// Replay plugin
///
/// Systems (Update, in order):
/// 1. `drive_replays`: every engine spends the frame delta (exclusive)
/// 2. `animate_visuals`: tweens and death fades advance
///
/// PreUpdate: `sync_log_level` pushes `ReplayConfig::log_level` to the logger.
pub struct ReplayPlugin;

impl Plugin for ReplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReplayConfig>()
            .init_resource::<UnitCatalog>()
            .init_resource::<BoardIndex>()
            .init_resource::<PersistentRoster>()
            .init_resource::<ViewerContext>()
            .init_resource::<RemoteRosterFeed>()
            .init_resource::<CameraFocus>()
            .init_resource::<ReplayOrchestrator>()
            .add_event::<PlaybackStarted>()
            .add_event::<PlaybackEnded>()
            .add_event::<UnitDamaged>()
            .add_event::<UnitDied>()
            .add_systems(PreUpdate, sync_log_level.run_if(resource_changed::<ReplayConfig>))
            .add_systems(
                Update,
                (orchestrator::drive_replays, visuals::animate_visuals).chain(),
            );
    }
}

fn sync_log_level(config: Res<ReplayConfig>) {
    logger::set_log_level(config.log_level);
}

/// Minimal headless app with the replay plugin and console logging
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, ReplayPlugin));
    app
}
