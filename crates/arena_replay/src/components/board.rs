//! Boards: geometry oracle + per-board visual registry

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat_log::{InstanceId, TeamId};
use crate::logger;

/// Board arena (one per player, spectated boards included)
#[derive(Component, Debug, Clone)]
pub struct Board {
    /// Team that owns the board (host of battles played on it)
    pub owner: TeamId,
}

/// Grid → world conversion supplied by a board
pub trait GridToWorld {
    fn grid_to_world(&self, x: i32, y: i32) -> Vec3;
}

/// Square-grid board layout
///
/// Columns run along +X, rows along +Z (row 0 nearest the owner).
/// Benches sit in front of / behind the grid, slots along +X.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct BoardGeometry {
    pub origin: Vec3,
    pub cell_size: f32,
    pub columns: i32,
    pub rows: i32,
    /// Slot 0 of the owner's bench
    pub bench_origin: Vec3,
    /// Slot 0 of the mirrored opponent bench (host rendering an absent party)
    pub opponent_bench_origin: Vec3,
    pub bench_spacing: f32,
    /// Where the owner's camera looks from
    pub viewer_anchor: Vec3,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl BoardGeometry {
    /// 8x8 board with unit cells at `origin`
    pub fn at(origin: Vec3) -> Self {
        Self {
            origin,
            cell_size: 1.0,
            columns: 8,
            rows: 8,
            bench_origin: origin + Vec3::new(0.0, 0.0, -1.5),
            opponent_bench_origin: origin + Vec3::new(0.0, 0.0, 8.5),
            bench_spacing: 1.0,
            viewer_anchor: origin + Vec3::new(3.5, 8.0, -8.0),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.origin
            + Vec3::new(
                (self.columns - 1) as f32 * self.cell_size * 0.5,
                0.0,
                (self.rows - 1) as f32 * self.cell_size * 0.5,
            )
    }

    /// Same cell seen from the opposite side of the board
    pub fn mirror(&self, x: i32, y: i32) -> IVec2 {
        IVec2::new(self.columns - 1 - x, self.rows - 1 - y)
    }

    pub fn bench_slot(&self, slot: usize) -> Vec3 {
        self.bench_origin + Vec3::X * (slot as f32 * self.bench_spacing)
    }

    pub fn opponent_bench_slot(&self, slot: usize) -> Vec3 {
        self.opponent_bench_origin + Vec3::X * (slot as f32 * self.bench_spacing)
    }

    /// Camera position; `opposite_side` = away perspective (board rotated 180°)
    pub fn viewer_position(&self, opposite_side: bool) -> Vec3 {
        if !opposite_side {
            return self.viewer_anchor;
        }
        let center = self.center();
        let offset = self.viewer_anchor - center;
        center + Vec3::new(-offset.x, offset.y, -offset.z)
    }
}

impl GridToWorld for BoardGeometry {
    fn grid_to_world(&self, x: i32, y: i32) -> Vec3 {
        self.origin + Vec3::new(x as f32 * self.cell_size, 0.0, y as f32 * self.cell_size)
    }
}

/// instance id → visual entity currently standing on this board
///
/// Shared by every engine playing on (or looking up from) the board.
/// Two engines binding the same id: last writer wins.
#[derive(Component, Debug, Default)]
pub struct BoardRegistry {
    visuals: HashMap<InstanceId, Entity>,
}

impl BoardRegistry {
    pub fn bind(&mut self, instance_id: &str, entity: Entity) {
        self.visuals.insert(instance_id.to_string(), entity);
    }

    /// Removes the binding only if it still points at `entity`
    pub fn unbind(&mut self, instance_id: &str, entity: Entity) -> bool {
        if self.visuals.get(instance_id) == Some(&entity) {
            self.visuals.remove(instance_id);
            return true;
        }
        false
    }

    pub fn get(&self, instance_id: &str) -> Option<Entity> {
        self.visuals.get(instance_id).copied()
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstanceId, &Entity)> {
        self.visuals.iter()
    }
}

/// Every board known to this client, in spawn order
#[derive(Resource, Debug, Default)]
pub struct BoardIndex {
    boards: Vec<Entity>,
}

impl BoardIndex {
    pub fn register(&mut self, board: Entity) {
        if !self.boards.contains(&board) {
            self.boards.push(board);
        }
    }

    pub fn forget(&mut self, board: Entity) {
        self.boards.retain(|&known| known != board);
    }

    pub fn boards(&self) -> &[Entity] {
        &self.boards
    }
}

/// Rendering flag: board is drawn from the away side while spectated
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ViewFromOppositeSide;

/// Spawn a board entity and register it in `BoardIndex`
pub fn spawn_board(world: &mut World, owner: &str, geometry: BoardGeometry) -> Entity {
    let origin = geometry.origin;
    let board = world
        .spawn((
            Board {
                owner: owner.to_string(),
            },
            geometry,
            BoardRegistry::default(),
            Transform::from_translation(origin),
        ))
        .id();

    world.get_resource_or_insert_with(BoardIndex::default).register(board);
    logger::log(&format!("🗺️ Board {:?} spawned for '{}' at {:?}", board, owner, origin));
    board
}

/// Grid cell of `board` in world space
///
/// Boards without geometry fall back to raw grid coordinates.
pub fn grid_to_world(world: &World, board: Entity, x: i32, y: i32) -> Vec3 {
    match world.get::<BoardGeometry>(board) {
        Some(geometry) => geometry.grid_to_world(x, y),
        None => {
            logger::log_warning(&format!("⚠️ Board {:?} has no BoardGeometry, using raw grid ({}, {})", board, x, y));
            Vec3::new(x as f32, 0.0, y as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_to_world() {
        let geometry = BoardGeometry::at(Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(geometry.grid_to_world(0, 0), Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(geometry.grid_to_world(1, 0), Vec3::new(101.0, 0.0, 0.0));
        assert_eq!(geometry.grid_to_world(6, 7), Vec3::new(106.0, 0.0, 7.0));
    }

    #[test]
    fn test_mirror() {
        let geometry = BoardGeometry::default();
        assert_eq!(geometry.mirror(1, 0), IVec2::new(6, 7));
        assert_eq!(geometry.mirror(6, 7), IVec2::new(1, 0));
    }

    #[test]
    fn test_viewer_position_opposite_side() {
        let geometry = BoardGeometry::default();
        let near = geometry.viewer_position(false);
        let far = geometry.viewer_position(true);

        assert!(near.z < geometry.center().z);
        assert!(far.z > geometry.center().z);
        assert_eq!(near.y, far.y);
    }

    #[test]
    fn test_registry_unbind_only_matching_entity() {
        let mut registry = BoardRegistry::default();
        let first = Entity::from_raw(1);
        let second = Entity::from_raw(2);

        registry.bind("A", first);
        registry.bind("A", second); // last writer wins
        assert!(!registry.unbind("A", first));
        assert_eq!(registry.get("A"), Some(second));
        assert!(registry.unbind("A", second));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_spawn_board_registers_in_index() {
        let mut world = World::new();
        let board = spawn_board(&mut world, "p1", BoardGeometry::default());

        assert_eq!(world.resource::<BoardIndex>().boards(), &[board]);
        assert_eq!(grid_to_world(&world, board, 2, 3), Vec3::new(2.0, 0.0, 3.0));
    }
}
