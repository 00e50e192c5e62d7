//! Visual reconciliation: combatant snapshot → visual handle
//!
//! # Flow
//! 1. Already bound in this battle → same handle
//! 2. Walk the injected `VisualLookup` list; first hit is borrowed (Reused)
//! 3. Otherwise build a New visual from the catalog (placeholder if missing)
//!
//! New visuals are bound in the board's registry (unless a live binding is
//! already there) so other engines and later lookups find them; the engine
//! that built them unbinds them on release.

pub mod handle;
pub mod lookup;

pub use handle::{Provenance, RestorePoint, VisualHandle};
pub use lookup::{BoardRegistryLookup, OtherBoardsLookup, PersistentRosterLookup, VisualLookup};

use bevy::prelude::*;
use std::collections::btree_map::{self, BTreeMap};

use crate::combat_log::CombatantSnapshot;
use crate::components::{BoardRegistry, HealthDisplay};
use crate::logger;
use crate::visuals::{construct_visual, VisualBlueprint};

/// Live handles of one engine, keyed by instance id
#[derive(Debug, Default)]
pub struct HandleTable {
    handles: BTreeMap<String, VisualHandle>,
}

impl HandleTable {
    pub fn get(&self, instance_id: &str) -> Option<&VisualHandle> {
        self.handles.get(instance_id)
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.handles.contains_key(instance_id)
    }

    pub fn remove(&mut self, instance_id: &str) -> Option<VisualHandle> {
        self.handles.remove(instance_id)
    }

    pub fn owns_entity(&self, entity: Entity) -> bool {
        self.handles.values().any(|handle| handle.entity == entity)
    }

    pub fn values(&self) -> impl Iterator<Item = &VisualHandle> {
        self.handles.values()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Empty the table, yielding handles in id order
    pub fn drain(&mut self) -> Vec<VisualHandle> {
        std::mem::take(&mut self.handles).into_values().collect()
    }
}

pub struct VisualReconciler {
    board: Entity,
    sources: Vec<Box<dyn VisualLookup>>,
}

impl VisualReconciler {
    /// Registry of `board`, then the viewer's roster (host only), then other boards
    pub fn standard(board: Entity, is_host: bool) -> Self {
        let mut sources: Vec<Box<dyn VisualLookup>> = vec![Box::new(BoardRegistryLookup { board })];
        if is_host {
            sources.push(Box::new(PersistentRosterLookup));
        }
        sources.push(Box::new(OtherBoardsLookup { exclude: board }));
        Self { board, sources }
    }

    /// Spectated battles: the played board's registry only
    pub fn spectator(board: Entity) -> Self {
        Self {
            board,
            sources: vec![Box::new(BoardRegistryLookup { board })],
        }
    }

    pub fn with_sources(board: Entity, sources: Vec<Box<dyn VisualLookup>>) -> Self {
        Self { board, sources }
    }

    /// Never borrow: every combatant gets a fresh visual
    pub fn construct_only(board: Entity) -> Self {
        Self {
            board,
            sources: Vec::new(),
        }
    }

    pub fn board(&self) -> Entity {
        self.board
    }

    pub fn reuses(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn resolve<'t>(
        &self,
        world: &mut World,
        table: &'t mut HandleTable,
        snapshot: &CombatantSnapshot,
        position: Vec3,
        viewing_team: &str,
    ) -> &'t VisualHandle {
        let instance_id = snapshot.instance_id.clone();
        match table.handles.entry(instance_id) {
            btree_map::Entry::Occupied(entry) => {
                logger::log(&format!("🔁 {} already bound, keeping handle", snapshot.instance_id));
                entry.into_mut()
            }
            btree_map::Entry::Vacant(entry) => {
                let reused = self.find_existing(world, snapshot);
                let handle = match reused {
                    Some(handle) => handle,
                    None => self.construct(world, snapshot, position, viewing_team),
                };
                entry.insert(handle)
            }
        }
    }

    fn find_existing(&self, world: &World, snapshot: &CombatantSnapshot) -> Option<VisualHandle> {
        for source in &self.sources {
            let Some(entity) = source.find(world, &snapshot.instance_id) else {
                continue;
            };
            let Some(restore) = RestorePoint::capture(world, entity) else {
                continue;
            };
            logger::log(&format!(
                "♻️ Reusing {:?} for {} (found in {})",
                entity,
                snapshot.instance_id,
                source.label()
            ));
            return Some(VisualHandle {
                instance_id: snapshot.instance_id.clone(),
                entity,
                team_id: snapshot.team_id.clone(),
                provenance: Provenance::Reused(restore),
            });
        }
        None
    }

    fn construct(
        &self,
        world: &mut World,
        snapshot: &CombatantSnapshot,
        position: Vec3,
        viewing_team: &str,
    ) -> VisualHandle {
        let blueprint = VisualBlueprint {
            instance_id: &snapshot.instance_id,
            unit_id: &snapshot.unit_id,
            team_id: &snapshot.team_id,
            allied: snapshot.team_id == viewing_team,
            items: &snapshot.items,
            health: HealthDisplay::from_stats(&snapshot.stats),
        };
        let entity = construct_visual(world, &blueprint, position, self.board);

        // A live binding we chose not to borrow stays in place
        let occupied = world
            .get::<BoardRegistry>(self.board)
            .and_then(|registry| registry.get(&snapshot.instance_id))
            .is_some_and(|existing| world.get::<Transform>(existing).is_some());
        match world.get_mut::<BoardRegistry>(self.board) {
            Some(mut registry) if !occupied => registry.bind(&snapshot.instance_id, entity),
            Some(_) => {}
            None => logger::log_warning(&format!("⚠️ Board {:?} has no BoardRegistry", self.board)),
        }

        VisualHandle {
            instance_id: snapshot.instance_id.clone(),
            entity,
            team_id: snapshot.team_id.clone(),
            provenance: Provenance::New,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitCatalog;
    use crate::components::{spawn_board, BoardGeometry, PersistentRoster, UnitVisual};

    fn setup() -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(UnitCatalog::default().with("knight", "units/knight"));
        let board = spawn_board(&mut world, "p1", BoardGeometry::default());
        (world, board)
    }

    #[test]
    fn test_constructs_new_when_nothing_found() {
        let (mut world, board) = setup();
        let mut table = HandleTable::default();
        let reconciler = VisualReconciler::standard(board, true);
        let snapshot = CombatantSnapshot::new("A", "knight", "p1", 0, 0);

        let handle = reconciler.resolve(&mut world, &mut table, &snapshot, Vec3::ZERO, "p1").clone();

        assert_eq!(handle.provenance, Provenance::New);
        assert_eq!(world.get::<BoardRegistry>(board).and_then(|r| r.get("A")), Some(handle.entity));
        assert_eq!(world.get::<UnitVisual>(handle.entity).map(|v| v.allied), Some(true));
    }

    #[test]
    fn test_roster_reused_only_when_hosting() {
        let (mut world, board) = setup();
        let persistent = world.spawn(Transform::from_xyz(5.0, 0.0, 5.0)).id();
        let mut roster = PersistentRoster::default();
        roster.insert("A", persistent);
        world.insert_resource(roster);
        let snapshot = CombatantSnapshot::new("A", "knight", "p1", 0, 0);

        let mut host_table = HandleTable::default();
        let host = VisualReconciler::standard(board, true);
        let handle = host.resolve(&mut world, &mut host_table, &snapshot, Vec3::ZERO, "p1");
        assert_eq!(handle.entity, persistent);
        assert!(handle.is_reused());

        let mut away_table = HandleTable::default();
        let away = VisualReconciler::standard(board, false);
        let handle = away.resolve(&mut world, &mut away_table, &snapshot, Vec3::ZERO, "p1");
        assert_ne!(handle.entity, persistent);
        assert!(!handle.is_reused());
    }

    #[test]
    fn test_spectator_skips_roster_and_other_boards() {
        let (mut world, board) = setup();
        let other = spawn_board(&mut world, "p2", BoardGeometry::at(Vec3::X * 20.0));
        let persistent = world.spawn(Transform::default()).id();
        let elsewhere = world.spawn(Transform::default()).id();
        let mut roster = PersistentRoster::default();
        roster.insert("A", persistent);
        world.insert_resource(roster);
        world.get_mut::<BoardRegistry>(other).expect("registry").bind("B", elsewhere);

        let reconciler = VisualReconciler::spectator(board);
        assert!(reconciler.reuses());
        let mut table = HandleTable::default();
        for id in ["A", "B"] {
            let snapshot = CombatantSnapshot::new(id, "knight", "p1", 0, 0);
            let handle = reconciler.resolve(&mut world, &mut table, &snapshot, Vec3::ZERO, "p9");
            assert_eq!(handle.provenance, Provenance::New);
            assert!(handle.entity != persistent && handle.entity != elsewhere);
        }

        let on_board = world.spawn(Transform::default()).id();
        world.get_mut::<BoardRegistry>(board).expect("registry").bind("C", on_board);
        let snapshot = CombatantSnapshot::new("C", "knight", "p1", 0, 0);
        assert_eq!(reconciler.resolve(&mut world, &mut table, &snapshot, Vec3::ZERO, "p9").entity, on_board);
    }

    #[test]
    fn test_duplicate_resolve_returns_existing_handle() {
        let (mut world, board) = setup();
        let mut table = HandleTable::default();
        let reconciler = VisualReconciler::construct_only(board);
        let snapshot = CombatantSnapshot::new("A", "knight", "p1", 0, 0);

        let first = reconciler.resolve(&mut world, &mut table, &snapshot, Vec3::ZERO, "p1").entity;
        let second = reconciler.resolve(&mut world, &mut table, &snapshot, Vec3::ZERO, "p1").entity;

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_construct_only_ignores_registry() {
        let (mut world, board) = setup();
        let existing = world.spawn(Transform::default()).id();
        world.get_mut::<BoardRegistry>(board).expect("registry").bind("A", existing);
        let mut table = HandleTable::default();
        let snapshot = CombatantSnapshot::new("A", "knight", "p1", 0, 0);

        let handle = VisualReconciler::construct_only(board).resolve(&mut world, &mut table, &snapshot, Vec3::ZERO, "p1");

        assert_ne!(handle.entity, existing);
        assert_eq!(world.get::<BoardRegistry>(board).and_then(|r| r.get("A")), Some(existing));
    }

    #[test]
    fn test_custom_source_order() {
        let (mut world, board) = setup();
        let other = spawn_board(&mut world, "p2", BoardGeometry::at(Vec3::X * 20.0));
        let on_board = world.spawn(Transform::default()).id();
        let elsewhere = world.spawn(Transform::default()).id();
        world.get_mut::<BoardRegistry>(board).expect("registry").bind("A", on_board);
        world.get_mut::<BoardRegistry>(other).expect("registry").bind("A", elsewhere);

        let reconciler = VisualReconciler::with_sources(
            board,
            vec![Box::new(OtherBoardsLookup { exclude: board }), Box::new(BoardRegistryLookup { board })],
        );
        let mut table = HandleTable::default();
        let snapshot = CombatantSnapshot::new("A", "knight", "p1", 0, 0);

        assert_eq!(reconciler.resolve(&mut world, &mut table, &snapshot, Vec3::ZERO, "p1").entity, elsewhere);
    }
}
