//! Roster-side inputs: the viewer's persistent visuals and the absent
//! party's bench feed. Both are owned and refreshed outside this crate.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat_log::{InstanceId, TeamId};

/// Where a persistent unit lives between battles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSlot {
    Board { x: i32, y: i32 },
    Bench(usize),
}

/// Marker on a persistent (roster-owned) visual
#[derive(Component, Debug, Clone, PartialEq)]
pub struct RosterUnit {
    pub instance_id: InstanceId,
    pub slot: RosterSlot,
}

/// Who is watching
#[derive(Resource, Debug, Clone, Default)]
pub struct ViewerContext {
    pub team_id: TeamId,
    pub home_board: Option<Entity>,
}

/// The viewer's own persistent visuals, keyed by instance id
#[derive(Resource, Debug, Default)]
pub struct PersistentRoster {
    units: HashMap<InstanceId, Entity>,
}

impl PersistentRoster {
    pub fn insert(&mut self, instance_id: &str, entity: Entity) {
        self.units.insert(instance_id.to_string(), entity);
    }

    pub fn remove(&mut self, instance_id: &str) -> Option<Entity> {
        self.units.remove(instance_id)
    }

    pub fn get(&self, instance_id: &str) -> Option<Entity> {
        self.units.get(instance_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstanceId, &Entity)> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// One unit on the absent party's bench
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBenchUnit {
    pub slot: usize,
    pub instance_id: InstanceId,
    pub unit_id: String,
    pub items: Vec<String>,
}

impl RemoteBenchUnit {
    pub fn new(slot: usize, instance_id: &str, unit_id: &str) -> Self {
        Self {
            slot,
            instance_id: instance_id.to_string(),
            unit_id: unit_id.to_string(),
            items: Vec::new(),
        }
    }
}

/// Latest bench snapshot pushed by networking for the absent opponent
///
/// Units bought show up, units sold or moved onto their board disappear,
/// reordering changes `slot`. `revision` bumps on every push.
#[derive(Resource, Debug, Clone, Default)]
pub struct RemoteRosterFeed {
    pub team_id: Option<TeamId>,
    pub bench: Vec<RemoteBenchUnit>,
    pub revision: u64,
}

impl RemoteRosterFeed {
    pub fn push(&mut self, team_id: &str, bench: Vec<RemoteBenchUnit>) {
        self.team_id = Some(team_id.to_string());
        self.bench = bench;
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_push_bumps_revision() {
        let mut feed = RemoteRosterFeed::default();
        feed.push("p2", vec![RemoteBenchUnit::new(0, "B1", "archer")]);
        feed.push("p2", Vec::new());

        assert_eq!(feed.revision, 2);
        assert_eq!(feed.team_id.as_deref(), Some("p2"));
        assert!(feed.bench.is_empty());
    }

    #[test]
    fn test_persistent_roster_lookup() {
        let mut roster = PersistentRoster::default();
        let entity = Entity::from_raw(7);
        roster.insert("A", entity);

        assert_eq!(roster.get("A"), Some(entity));
        assert_eq!(roster.remove("A"), Some(entity));
        assert!(roster.is_empty());
    }
}
