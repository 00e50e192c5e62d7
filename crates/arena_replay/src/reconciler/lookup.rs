//! Pluggable search sources for existing visuals
//!
//! The reconciler walks its `VisualLookup` list in order; first hit wins.

use bevy::prelude::*;

use crate::components::{BoardIndex, BoardRegistry, PersistentRoster};

/// A place an already-spawned visual for an instance id may live
pub trait VisualLookup: Send + Sync {
    fn label(&self) -> &'static str;

    fn find(&self, world: &World, instance_id: &str) -> Option<Entity>;
}

fn alive(world: &World, entity: Entity) -> Option<Entity> {
    world.get::<Transform>(entity).map(|_| entity)
}

/// Registry of the board the engine plays on
#[derive(Debug, Clone, Copy)]
pub struct BoardRegistryLookup {
    pub board: Entity,
}

impl VisualLookup for BoardRegistryLookup {
    fn label(&self) -> &'static str {
        "board registry"
    }

    fn find(&self, world: &World, instance_id: &str) -> Option<Entity> {
        let entity = world.get::<BoardRegistry>(self.board)?.get(instance_id)?;
        alive(world, entity)
    }
}

/// The viewer's own persistent visuals
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistentRosterLookup;

impl VisualLookup for PersistentRosterLookup {
    fn label(&self) -> &'static str {
        "persistent roster"
    }

    fn find(&self, world: &World, instance_id: &str) -> Option<Entity> {
        let entity = world.get_resource::<PersistentRoster>()?.get(instance_id)?;
        alive(world, entity)
    }
}

/// Every other known board (away-party units relocated elsewhere)
#[derive(Debug, Clone, Copy)]
pub struct OtherBoardsLookup {
    pub exclude: Entity,
}

impl VisualLookup for OtherBoardsLookup {
    fn label(&self) -> &'static str {
        "other boards"
    }

    fn find(&self, world: &World, instance_id: &str) -> Option<Entity> {
        let index = world.get_resource::<BoardIndex>()?;
        index
            .boards()
            .iter()
            .filter(|&&board| board != self.exclude)
            .filter_map(|&board| world.get::<BoardRegistry>(board)?.get(instance_id))
            .find_map(|entity| alive(world, entity))
    }
}
