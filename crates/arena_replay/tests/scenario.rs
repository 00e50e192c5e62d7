//! End-to-end playback through the plugin (headless App, manual time)

use std::time::Duration;

use arena_replay::combat_log::synthetic::duel;
use arena_replay::orchestrator::with_orchestrator;
use arena_replay::{
    create_headless_app, grid_to_world, spawn_board, AnimationTrigger, BattleRole, BoardGeometry, CameraFocus,
    EndReason, HealthDisplay, OnBoard, PersistentRoster, PlaybackEnded, PlaybackStarted, PrimaryBattle,
    ReplayOrchestrator, ReplayPhase, RosterSlot, RosterUnit, StartPlayback, StopPlayback, UnitAnimation, UnitCatalog,
    UnitDamaged, UnitDied, UnitVisual, ViewerContext, VisualPresence,
};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

const FRAME: Duration = Duration::from_millis(50);

#[derive(Resource, Default)]
struct Recorded {
    started: Vec<PlaybackStarted>,
    ended: Vec<PlaybackEnded>,
    damaged: Vec<UnitDamaged>,
    died: Vec<UnitDied>,
}

fn record(
    mut recorded: ResMut<Recorded>,
    mut started: EventReader<PlaybackStarted>,
    mut ended: EventReader<PlaybackEnded>,
    mut damaged: EventReader<UnitDamaged>,
    mut died: EventReader<UnitDied>,
) {
    recorded.started.extend(started.read().cloned());
    recorded.ended.extend(ended.read().cloned());
    recorded.damaged.extend(damaged.read().cloned());
    recorded.died.extend(died.read().cloned());
}

struct Arena {
    app: App,
    home: Entity,
    opponent: Entity,
    knight: Entity,
}

fn arena() -> Arena {
    let mut app = create_headless_app();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .init_resource::<Recorded>()
        .add_systems(PostUpdate, record);

    let world = app.world_mut();
    world.insert_resource(UnitCatalog::default().with("knight", "units/knight").with("archer", "units/archer"));
    let home = spawn_board(world, "p1", BoardGeometry::default());
    let opponent = spawn_board(world, "p2", BoardGeometry::at(Vec3::new(30.0, 0.0, 0.0)));
    world.insert_resource(ViewerContext {
        team_id: "p1".to_string(),
        home_board: Some(home),
    });

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

    Arena {
        app,
        home,
        opponent,
        knight,
    }
}

fn queue(app: &mut App, command: impl Command) {
    let world = app.world_mut();
    world.commands().queue(command);
    world.flush();
}

fn primary_phase(app: &App) -> Option<ReplayPhase> {
    app.world()
        .resource::<ReplayOrchestrator>()
        .primary_engine()
        .map(|engine| engine.phase())
}

fn run_until_idle(app: &mut App, max_frames: usize) {
    for _ in 0..max_frames {
        app.update();
        if app.world().resource::<ReplayOrchestrator>().is_idle() {
            return;
        }
    }
    panic!("replays still running after {} frames", max_frames);
}

#[test]
fn test_host_duel_borrows_roster_and_restores_it() {
    let Arena {
        mut app,
        home,
        opponent,
        knight,
    } = arena();

    queue(
        &mut app,
        StartPlayback(PrimaryBattle::new(home, opponent, duel(), "p1", BattleRole::Host)),
    );
    let borrowed = app
        .world()
        .resource::<ReplayOrchestrator>()
        .primary_engine()
        .and_then(|engine| engine.handle("A").map(|handle| (handle.entity, handle.is_reused())));
    assert_eq!(borrowed, Some((knight, true)));
    assert_eq!(app.world().resource::<CameraFocus>().board, Some(home));

    // Through the move and the kill, into the victory pose
    for _ in 0..200 {
        app.update();
        if primary_phase(&app) == Some(ReplayPhase::VictoryPose) {
            break;
        }
    }
    assert_eq!(primary_phase(&app), Some(ReplayPhase::VictoryPose));
    let position = app.world().get::<Transform>(knight).map(|t| t.translation);
    assert_eq!(position, Some(grid_to_world(app.world(), home, 1, 0)));
    assert_eq!(
        app.world().get::<AnimationTrigger>(knight).map(|a| a.clip),
        Some(UnitAnimation::Victory)
    );

    run_until_idle(&mut app, 200);

    let world = app.world();
    assert_eq!(world.get::<Transform>(knight).map(|t| t.translation), Some(Vec3::ZERO));
    assert!(world.get::<HealthDisplay>(knight).is_none());
    assert!(world.get::<AnimationTrigger>(knight).is_none());

    let recorded = world.resource::<Recorded>();
    assert_eq!(recorded.started.len(), 1);
    assert_eq!(recorded.died.len(), 1);
    assert_eq!(recorded.died[0].instance_id, "B");
    assert_eq!(recorded.damaged.len(), 1);
    assert_eq!(recorded.ended.len(), 1);
    assert_eq!(recorded.ended[0].winner_team_id.as_deref(), Some("p1"));
    assert_eq!(recorded.ended[0].reason, EndReason::Completed);
    assert_eq!(world.resource::<CameraFocus>().board, Some(home));
}

#[test]
fn test_opponent_visual_built_then_destroyed() {
    let Arena {
        mut app, home, opponent, ..
    } = arena();

    queue(
        &mut app,
        StartPlayback(PrimaryBattle::new(home, opponent, duel(), "p1", BattleRole::Host)),
    );
    let world = app.world_mut();
    let built: Vec<(String, bool)> = world
        .query::<&UnitVisual>()
        .iter(world)
        .map(|visual| (visual.instance_id.clone(), visual.allied))
        .collect();
    assert_eq!(built, vec![("B".to_string(), false)]);

    run_until_idle(&mut app, 200);
    let world = app.world_mut();
    assert_eq!(world.query::<&UnitVisual>().iter(world).count(), 0);
}

#[test]
fn test_stop_command_restores_immediately() {
    let Arena {
        mut app,
        home,
        opponent,
        knight,
    } = arena();

    queue(
        &mut app,
        StartPlayback(PrimaryBattle::new(home, opponent, duel(), "p1", BattleRole::Host)),
    );
    for _ in 0..13 {
        app.update();
    }
    queue(&mut app, StopPlayback);
    app.update();

    let world = app.world();
    assert!(world.resource::<ReplayOrchestrator>().is_idle());
    assert_eq!(world.get::<Transform>(knight).map(|t| t.translation), Some(Vec3::ZERO));
    let recorded = world.resource::<Recorded>();
    assert_eq!(recorded.ended.len(), 1);
    assert_eq!(recorded.ended[0].reason, EndReason::Stopped);
    assert!(recorded.died.is_empty());
}

#[test]
fn test_fast_forward_start_skips_to_the_end() {
    let Arena {
        mut app,
        home,
        opponent,
        knight,
    } = arena();

    let started = with_orchestrator(app.world_mut(), |orchestrator, world| {
        orchestrator.start_playback(
            world,
            PrimaryBattle::new(home, opponent, duel(), "p1", BattleRole::Host).from_tick(9),
        )
    });
    assert_eq!(started, Some(true));

    // Move teleported, B already gone
    let world = app.world_mut();
    assert_eq!(
        world.get::<Transform>(knight).map(|t| t.translation),
        Some(grid_to_world(world, home, 1, 0))
    );
    assert_eq!(world.query::<&UnitVisual>().iter(world).count(), 0);

    run_until_idle(&mut app, 200);
    let recorded = app.world().resource::<Recorded>();
    assert_eq!(recorded.died.len(), 1);
    assert_eq!(recorded.ended[0].winner_team_id.as_deref(), Some("p1"));
}

#[test]
fn test_empty_log_does_not_start() {
    let Arena {
        mut app, home, opponent, ..
    } = arena();

    let started = with_orchestrator(app.world_mut(), |orchestrator, world| {
        orchestrator.start_playback(
            world,
            PrimaryBattle::new(home, opponent, Default::default(), "p1", BattleRole::Host),
        )
    });

    assert_eq!(started, Some(false));
    app.update();
    assert!(app.world().resource::<ReplayOrchestrator>().is_idle());
    assert!(app.world().resource::<Recorded>().started.is_empty());
}
