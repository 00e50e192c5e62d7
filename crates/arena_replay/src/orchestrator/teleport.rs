//! Away battles: the viewer's roster visuals visit the opponent's board
//!
//! Board-slotted units are moved onto the opponent's grid (mirrored, the
//! away party fills the far rows) and bound in its registry, so the engine
//! borrows them like any other registered visual.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::combat_log::InstanceId;
use crate::components::{
    grid_to_world, BoardGeometry, BoardRegistry, OnBoard, PersistentRoster, RosterSlot, RosterUnit,
};
use crate::logger;
use crate::visuals::cancel_tweens;

/// Where a relocated visual came from
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportRecord {
    pub instance_id: InstanceId,
    pub entity: Entity,
    pub original: Transform,
    pub original_board: Option<Entity>,
    pub visiting: Entity,
}

/// Move the viewer's board units from `home` onto `visiting`
pub fn relocate_roster(world: &mut World, home: Entity, visiting: Entity) -> Vec<TeleportRecord> {
    let Some(roster) = world.get_resource::<PersistentRoster>() else {
        return Vec::new();
    };
    let mut units: Vec<(InstanceId, Entity)> = roster.iter().map(|(id, &entity)| (id.clone(), entity)).collect();
    units.sort();

    let Some(geometry) = world.get::<BoardGeometry>(visiting).cloned() else {
        logger::log_warning(&format!("⚠️ Board {:?} has no geometry, roster not relocated", visiting));
        return Vec::new();
    };

    let mut records = Vec::new();
    for (instance_id, entity) in units {
        let Some(RosterSlot::Board { x, y }) = world.get::<RosterUnit>(entity).map(|unit| unit.slot) else {
            continue;
        };
        let original_board = world.get::<OnBoard>(entity).map(|on_board| on_board.0);
        if original_board.is_some_and(|board| board != home) {
            continue;
        }
        let Some(original) = world.get::<Transform>(entity).copied() else {
            continue;
        };

        let cell = geometry.mirror(x, y);
        let position = grid_to_world(world, visiting, cell.x, cell.y);
        cancel_tweens(world, entity);
        if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert((
                original.with_translation(position).with_rotation(original.rotation * Quat::from_rotation_y(std::f32::consts::PI)),
                OnBoard(visiting),
            ));
        }
        if let Some(mut registry) = world.get_mut::<BoardRegistry>(visiting) {
            registry.bind(&instance_id, entity);
        }

        records.push(TeleportRecord {
            instance_id,
            entity,
            original,
            original_board,
            visiting,
        });
    }

    logger::log_info(&format!(
        "🌀 Relocated {} roster visuals from {:?} to {:?}",
        records.len(),
        home,
        visiting
    ));
    records
}

/// Undo `relocate_roster`; units in `fallen` stay hidden where they died
pub fn restore_roster(world: &mut World, records: Vec<TeleportRecord>, fallen: &HashSet<InstanceId>) {
    let mut restored = 0;
    for record in records {
        if let Some(mut registry) = world.get_mut::<BoardRegistry>(record.visiting) {
            registry.unbind(&record.instance_id, record.entity);
        }
        if fallen.contains(&record.instance_id) {
            continue;
        }
        cancel_tweens(world, record.entity);
        let Ok(mut entity_mut) = world.get_entity_mut(record.entity) else {
            continue;
        };
        entity_mut.insert(record.original);
        match record.original_board {
            Some(board) => entity_mut.insert(OnBoard(board)),
            None => entity_mut.remove::<OnBoard>(),
        };
        restored += 1;
    }
    logger::log(&format!("🌀 Restored {} relocated roster visuals", restored));
}
