//! Visual handles and their provenance

use bevy::prelude::*;

use crate::combat_log::{InstanceId, TeamId};
use crate::components::{AnimationTrigger, HealthDisplay, OnBoard, VisualPresence};
use crate::visuals::cancel_tweens;

/// Pre-battle state of a borrowed visual
///
/// `None` fields were absent before the battle and are removed again.
#[derive(Debug, Clone, PartialEq)]
pub struct RestorePoint {
    pub transform: Transform,
    pub presence: Option<VisualPresence>,
    pub health: Option<HealthDisplay>,
    pub animation: Option<AnimationTrigger>,
    pub board: Option<Entity>,
}

impl RestorePoint {
    pub fn capture(world: &World, entity: Entity) -> Option<Self> {
        let transform = *world.get::<Transform>(entity)?;
        Some(Self {
            transform,
            presence: world.get::<VisualPresence>(entity).copied(),
            health: world.get::<HealthDisplay>(entity).copied(),
            animation: world.get::<AnimationTrigger>(entity).copied(),
            board: world.get::<OnBoard>(entity).map(|on_board| on_board.0),
        })
    }

    /// Put the visual back exactly as captured
    pub fn restore(&self, world: &mut World, entity: Entity) {
        cancel_tweens(world, entity);
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            return;
        };

        entity_mut.insert(self.transform);
        match self.presence {
            Some(presence) => entity_mut.insert(presence),
            None => entity_mut.remove::<VisualPresence>(),
        };
        match self.health {
            Some(health) => entity_mut.insert(health),
            None => entity_mut.remove::<HealthDisplay>(),
        };
        match self.animation {
            // Keep the serial moving so renderers restart the clip
            Some(previous) => {
                let serial = entity_mut.get::<AnimationTrigger>().map(|a| a.serial).unwrap_or(previous.serial);
                entity_mut.insert(AnimationTrigger {
                    clip: previous.clip,
                    serial: serial.wrapping_add(1),
                })
            }
            None => entity_mut.remove::<AnimationTrigger>(),
        };
        match self.board {
            Some(board) => entity_mut.insert(OnBoard(board)),
            None => entity_mut.remove::<OnBoard>(),
        };
    }
}

/// Where a handle's visual came from
#[derive(Debug, Clone, PartialEq)]
pub enum Provenance {
    /// Borrowed from a registry or roster; restored on release
    Reused(RestorePoint),
    /// Built for this battle; destroyed on release
    New,
}

/// Binding of a combatant to a visual for one engine's battle
#[derive(Debug, Clone, PartialEq)]
pub struct VisualHandle {
    pub instance_id: InstanceId,
    pub entity: Entity,
    pub team_id: TeamId,
    pub provenance: Provenance,
}

impl VisualHandle {
    pub fn is_reused(&self) -> bool {
        matches!(self.provenance, Provenance::Reused(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UnitAnimation;

    #[test]
    fn test_restore_reverts_battle_changes() {
        let mut world = World::new();
        let home = world.spawn_empty().id();
        let entity = world
            .spawn((
                Transform::from_xyz(1.0, 0.0, 1.0),
                VisualPresence::default(),
                OnBoard(home),
            ))
            .id();
        let point = RestorePoint::capture(&world, entity).expect("capture");

        let away = world.spawn_empty().id();
        world.entity_mut(entity).insert((
            Transform::from_xyz(9.0, 0.0, 9.0),
            VisualPresence { visible: false },
            HealthDisplay::new(3, 10),
            AnimationTrigger {
                clip: UnitAnimation::Victory,
                serial: 4,
            },
            OnBoard(away),
        ));

        point.restore(&mut world, entity);

        assert_eq!(world.get::<Transform>(entity).map(|t| t.translation), Some(Vec3::new(1.0, 0.0, 1.0)));
        assert_eq!(world.get::<VisualPresence>(entity), Some(&VisualPresence { visible: true }));
        assert!(world.get::<HealthDisplay>(entity).is_none());
        assert!(world.get::<AnimationTrigger>(entity).is_none());
        assert_eq!(world.get::<OnBoard>(entity), Some(&OnBoard(home)));
    }

    #[test]
    fn test_capture_requires_transform() {
        let mut world = World::new();
        let entity = world.spawn(VisualPresence::default()).id();
        assert!(RestorePoint::capture(&world, entity).is_none());
    }
}
