//! Host battles: throwaway visuals for the absent opponent's bench
//!
//! Diffed against `RemoteRosterFeed` every update while the host plays:
//! new units are built, moved ones slide to their new slot, departed ones
//! are destroyed. Entries are never rebuilt wholesale.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat_log::InstanceId;
use crate::components::{BoardGeometry, HealthDisplay, RemoteBenchUnit, RemoteRosterFeed};
use crate::logger;
use crate::reconciler::{Provenance, VisualHandle};
use crate::visuals::{construct_visual, snap_to, VisualBlueprint};

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRosterEntry {
    pub slot: usize,
    pub unit_id: String,
    pub handle: VisualHandle,
}

/// What one sync changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorDiff {
    pub added: Vec<InstanceId>,
    pub moved: Vec<InstanceId>,
    pub removed: Vec<InstanceId>,
}

impl MirrorDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.moved.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct MirrorRoster {
    entries: Vec<MirrorRosterEntry>,
    synced_revision: Option<u64>,
}

impl MirrorRoster {
    pub fn entries(&self) -> &[MirrorRosterEntry] {
        &self.entries
    }

    pub fn entity(&self, instance_id: &str) -> Option<Entity> {
        self.entries
            .iter()
            .find(|entry| entry.handle.instance_id == instance_id)
            .map(|entry| entry.handle.entity)
    }

    /// Bring the mirror in line with the feed; no-op when the feed has not changed
    pub fn sync(&mut self, world: &mut World, board: Entity, viewing_team: &str) -> MirrorDiff {
        let Some(feed) = world.get_resource::<RemoteRosterFeed>() else {
            return MirrorDiff::default();
        };
        if self.synced_revision == Some(feed.revision) {
            return MirrorDiff::default();
        }
        let revision = feed.revision;
        let team_id = feed.team_id.clone().unwrap_or_default();
        let bench: Vec<RemoteBenchUnit> = feed.bench.clone();

        let Some(geometry) = world.get::<BoardGeometry>(board).cloned() else {
            logger::log_warning(&format!("⚠️ Board {:?} has no geometry, mirror roster skipped", board));
            return MirrorDiff::default();
        };

        let wanted: HashMap<&str, &RemoteBenchUnit> =
            bench.iter().map(|unit| (unit.instance_id.as_str(), unit)).collect();
        let mut diff = MirrorDiff::default();

        // Departed (or swapped for another unit type under the same id)
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            match wanted.get(entry.handle.instance_id.as_str()) {
                Some(unit) if unit.unit_id == entry.unit_id => kept.push(entry),
                _ => {
                    diff.removed.push(entry.handle.instance_id.clone());
                    despawn_entry(world, &entry);
                }
            }
        }
        self.entries = kept;

        for entry in &mut self.entries {
            let Some(unit) = wanted.get(entry.handle.instance_id.as_str()) else {
                continue;
            };
            if unit.slot != entry.slot {
                entry.slot = unit.slot;
                snap_to(world, entry.handle.entity, geometry.opponent_bench_slot(unit.slot));
                diff.moved.push(entry.handle.instance_id.clone());
            }
        }

        for unit in &bench {
            if self.entries.iter().any(|entry| entry.handle.instance_id == unit.instance_id) {
                continue;
            }
            let blueprint = VisualBlueprint {
                instance_id: &unit.instance_id,
                unit_id: &unit.unit_id,
                team_id: &team_id,
                allied: team_id == viewing_team,
                items: &unit.items,
                health: HealthDisplay::new(0, 0),
            };
            let entity = construct_visual(world, &blueprint, geometry.opponent_bench_slot(unit.slot), board);
            // Benched units show no health bar
            if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
                entity_mut.remove::<HealthDisplay>();
            }
            self.entries.push(MirrorRosterEntry {
                slot: unit.slot,
                unit_id: unit.unit_id.clone(),
                handle: VisualHandle {
                    instance_id: unit.instance_id.clone(),
                    entity,
                    team_id: team_id.clone(),
                    provenance: Provenance::New,
                },
            });
            diff.added.push(unit.instance_id.clone());
        }

        self.synced_revision = Some(revision);
        if !diff.is_empty() {
            logger::log(&format!(
                "🪞 Mirror roster rev {}: +{} ~{} -{}",
                revision,
                diff.added.len(),
                diff.moved.len(),
                diff.removed.len()
            ));
        }
        diff
    }

    pub fn release_all(&mut self, world: &mut World) {
        for entry in self.entries.drain(..) {
            despawn_entry(world, &entry);
        }
        self.synced_revision = None;
    }
}

fn despawn_entry(world: &mut World, entry: &MirrorRosterEntry) {
    if world.get_entity(entry.handle.entity).is_ok() {
        world.despawn(entry.handle.entity);
    }
}
