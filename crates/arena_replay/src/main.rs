//! Headless replay demo
//!
//! Plays the duel log as host on the viewer's board, then spectates a
//! seeded skirmish on a neighbour board, printing every playback event.

use std::time::Duration;

use arena_replay::combat_log::synthetic::{duel, skirmish};
use arena_replay::{
    create_headless_app, logger, spawn_board, BattleRole, BoardGeometry, CameraFocus, OnBoard, PersistentRoster,
    PlaySpectated, PlaybackEnded, PlaybackStarted, PrimaryBattle, ReplayOrchestrator, RosterSlot, RosterUnit,
    StartPlayback, UnitCatalog, UnitDamaged, UnitDied, ViewerContext, VisualPresence,
};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

const FRAME: Duration = Duration::from_millis(50);
const MAX_FRAMES: usize = 5_000;

fn report_events(
    mut started: EventReader<PlaybackStarted>,
    mut damaged: EventReader<UnitDamaged>,
    mut died: EventReader<UnitDied>,
    mut ended: EventReader<PlaybackEnded>,
) {
    for event in started.read() {
        logger::log_info(&format!("[event] PlaybackStarted {:?}", event));
    }
    for event in damaged.read() {
        logger::log_info(&format!("[event] UnitDamaged {:?}", event));
    }
    for event in died.read() {
        logger::log_info(&format!("[event] UnitDied {:?}", event));
    }
    for event in ended.read() {
        logger::log_info(&format!("[event] PlaybackEnded {:?}", event));
    }
}

fn run_until_idle(app: &mut App) -> usize {
    for frame in 0..MAX_FRAMES {
        app.update();
        if app.world().resource::<ReplayOrchestrator>().is_idle() {
            return frame;
        }
    }
    MAX_FRAMES
}

fn main() {
    let mut app = create_headless_app();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .add_systems(PostUpdate, report_events);

    let world = app.world_mut();
    world.insert_resource(
        UnitCatalog::default()
            .with("knight", "units/knight")
            .with("archer", "units/archer")
            .with("mage", "units/mage"),
    );
    let home = spawn_board(world, "p1", BoardGeometry::default());
    let neighbour = spawn_board(world, "p3", BoardGeometry::at(Vec3::new(20.0, 0.0, 0.0)));
    world.insert_resource(ViewerContext {
        team_id: "p1".to_string(),
        home_board: Some(home),
    });

    // The viewer's knight "A" already stands on their board
    let knight = world
        .spawn((
            Transform::from_xyz(0.0, 0.0, 0.0),
            VisualPresence::default(),
            OnBoard(home),
            RosterUnit {
                instance_id: "A".to_string(),
                slot: RosterSlot::Board { x: 0, y: 0 },
            },
        ))
        .id();
    world.resource_mut::<PersistentRoster>().insert("A", knight);

    println!("Duel on the home board (host)");
    world
        .commands()
        .queue(StartPlayback(PrimaryBattle::new(home, neighbour, duel(), "p1", BattleRole::Host)));
    world.flush();
    let frames = run_until_idle(&mut app);
    println!(
        "Duel done after {} frames; knight back at {:?}",
        frames,
        app.world().get::<Transform>(knight).map(|t| t.translation)
    );

    println!("Spectating a skirmish on board {:?}", neighbour);
    let world = app.world_mut();
    world.commands().queue(PlaySpectated {
        board: neighbour,
        log: skirmish(42, 4),
        viewing_team: "p1".to_string(),
        is_host: false,
        start_tick: 0,
    });
    world.flush();
    let frames = run_until_idle(&mut app);
    println!(
        "Skirmish done after {} frames; camera on {:?}",
        frames,
        app.world().resource::<CameraFocus>().board
    );
}
