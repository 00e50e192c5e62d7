//! Determinism: same log → same presentation, whatever the entry point
//!
//! A spectator joining late (fast-forward to a tick) must end up with the
//! same board as one who watched from tick 0.

use std::time::Duration;

use arena_replay::combat_log::synthetic::skirmish;
use arena_replay::visuals::DeathFade;
use arena_replay::{
    create_headless_app, spawn_board, BoardGeometry, HealthDisplay, OnBoard, PlaySpectated, PlaybackEnded,
    ReplayOrchestrator, ReplayPhase, UnitCatalog, UnitDied, UnitVisual, ViewerContext, VisualPresence,
};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

const FRAME: Duration = Duration::from_millis(50);

#[derive(Resource, Default)]
struct Deaths(Vec<String>);

#[derive(Resource, Default)]
struct Winners(Vec<Option<String>>);

fn record(
    mut deaths: ResMut<Deaths>,
    mut winners: ResMut<Winners>,
    mut died: EventReader<UnitDied>,
    mut ended: EventReader<PlaybackEnded>,
) {
    deaths.0.extend(died.read().map(|event| event.instance_id.clone()));
    winners.0.extend(ended.read().map(|event| event.winner_team_id.clone()));
}

/// Living visuals on the board at victory: (id, rounded position, health)
type BoardSnapshot = Vec<(String, [i32; 3], Option<(i32, i32)>)>;

struct Outcome {
    board: BoardSnapshot,
    deaths: Vec<String>,
    winners: Vec<Option<String>>,
}

fn watch(seed: u64, start_tick: u32) -> Outcome {
    let mut app = create_headless_app();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .init_resource::<Deaths>()
        .init_resource::<Winners>()
        .add_systems(PostUpdate, record);

    let world = app.world_mut();
    world.insert_resource(
        UnitCatalog::default()
            .with("knight", "units/knight")
            .with("archer", "units/archer")
            .with("mage", "units/mage"),
    );
    let home = spawn_board(world, "p9", BoardGeometry::default());
    let board = spawn_board(world, "p1", BoardGeometry::at(Vec3::new(40.0, 0.0, 0.0)));
    world.insert_resource(ViewerContext {
        team_id: "p9".to_string(),
        home_board: Some(home),
    });
    world.commands().queue(PlaySpectated {
        board,
        log: skirmish(seed, 4),
        viewing_team: "p9".to_string(),
        is_host: true,
        start_tick,
    });
    world.flush();

    let mut snapshot = None;
    for _ in 0..5_000 {
        app.update();
        let phase = app
            .world()
            .resource::<ReplayOrchestrator>()
            .spectated_engine(board)
            .map(|engine| engine.phase());
        if snapshot.is_none() && phase == Some(ReplayPhase::VictoryPose) {
            snapshot = Some(board_snapshot(app.world_mut(), board));
        }
        if phase.is_none() {
            break;
        }
    }
    // Let the last events reach the recorder
    app.update();

    let world = app.world_mut();
    Outcome {
        board: snapshot.expect("replay reached the victory pose"),
        deaths: std::mem::take(&mut world.resource_mut::<Deaths>().0),
        winners: std::mem::take(&mut world.resource_mut::<Winners>().0),
    }
}

fn board_snapshot(world: &mut World, board: Entity) -> BoardSnapshot {
    let mut query = world.query_filtered::<
        (&UnitVisual, &Transform, &OnBoard, Option<&VisualPresence>, Option<&HealthDisplay>),
        Without<DeathFade>,
    >();
    let mut living: BoardSnapshot = query
        .iter(world)
        .filter(|(_, _, on_board, presence, _)| on_board.0 == board && presence.is_none_or(|p| p.visible))
        .map(|(visual, transform, _, _, health)| {
            let position = (transform.translation * 100.0).round();
            (
                visual.instance_id.clone(),
                [position.x as i32, position.y as i32, position.z as i32],
                health.map(|h| (h.current, h.max)),
            )
        })
        .collect();
    living.sort();
    living
}

#[test]
fn test_same_log_same_outcome() {
    let first = watch(21, 0);
    let second = watch(21, 0);

    assert_eq!(first.board, second.board);
    assert_eq!(first.deaths, second.deaths);
    assert_eq!(first.winners, second.winners);
    assert_eq!(first.winners.len(), 1);
}

#[test]
fn test_late_join_matches_full_watch() {
    for seed in [4, 9, 33] {
        let log = skirmish(seed, 4);
        let midpoint = log.total_ticks() / 2;

        let full = watch(seed, 0);
        let late = watch(seed, midpoint);

        assert_eq!(full.board, late.board, "seed {}: board differs after joining at {}", seed, midpoint);
        assert_eq!(full.winners, late.winners, "seed {}", seed);
        let mut full_deaths = full.deaths.clone();
        let mut late_deaths = late.deaths.clone();
        full_deaths.sort();
        late_deaths.sort();
        assert_eq!(full_deaths, late_deaths, "seed {}", seed);
    }
}

#[test]
fn test_different_seeds_differ() {
    let a = skirmish(1, 4);
    let b = skirmish(2, 4);
    assert_ne!(a, b);
}
