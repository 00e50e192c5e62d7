//! Per-kind event application
//!
//! Events naming an unbound or dead combatant are dropped (debug log only):
//! a death is final for the rest of the battle.

use bevy::prelude::*;

use super::signals::{emit, UnitDamaged, UnitDied};
use super::state::AppliedEvent;
use super::ReplayEngine;
use crate::combat_log::{CombatEvent, CombatantSnapshot, EventKind, LootDrop};
use crate::components::{
    grid_to_world, BoardGeometry, BoardRegistry, HealthDisplay, LootMarker, OnBoard, PersistentRoster, UnitAnimation,
    VisualPresence,
};
use crate::logger;
use crate::reconciler::Provenance;
use crate::visuals::{finish_death, play_clip, snap_to, start_death, start_lunge, start_move, DeathRelease};

impl ReplayEngine {
    pub(super) fn apply(&mut self, world: &mut World, event: &CombatEvent) {
        let applied = match &event.kind {
            EventKind::CombatStart { roster } => {
                self.apply_combat_start(world, roster);
                true
            }
            EventKind::UnitMove { instance_id, x, y } => self.apply_move(world, instance_id, *x, *y),
            EventKind::UnitAttack {
                attacker_id,
                target_id,
            } => self.apply_attack(world, attacker_id, target_id),
            EventKind::UnitDamage {
                instance_id,
                damage,
                current_health,
                max_health,
            } => self.apply_damage(world, instance_id, *damage, *current_health, *max_health),
            EventKind::UnitDeath { instance_id, loot } => self.apply_death(world, instance_id, loot.as_ref()),
            EventKind::CombatEnd { winner_team_id } => {
                self.saw_combat_end = true;
                self.state.winner_team_id = winner_team_id.clone();
                true
            }
            EventKind::Unknown(kind) => {
                logger::log(&format!("❓ Ignoring unknown event kind '{}' at tick {}", kind, event.tick));
                false
            }
        };

        if applied {
            let target_id = match &event.kind {
                EventKind::UnitAttack { target_id, .. } => Some(target_id.clone()),
                _ => None,
            };
            self.trace.push(AppliedEvent {
                at_tick: self.state.current_tick,
                event_tick: event.tick,
                kind: event.kind.name().to_string(),
                instance_id: event.kind.subject().map(str::to_string),
                target_id,
                fast_forward: self.fast_forwarding,
            });
        }
    }

    fn bound_entity(&self, instance_id: &str, kind: &str) -> Option<Entity> {
        let entity = self.handles.get(instance_id).map(|handle| handle.entity);
        if entity.is_none() {
            self.log_dropped(instance_id, kind);
        }
        entity
    }

    fn log_dropped(&self, instance_id: &str, kind: &str) {
        let reason = if self.fallen.contains(instance_id) { "dead" } else { "unbound" };
        logger::log(&format!("🚫 Dropping {} for {} combatant '{}'", kind, reason, instance_id));
    }

    fn apply_combat_start(&mut self, world: &mut World, roster: &[CombatantSnapshot]) {
        for snapshot in roster {
            if self.fallen.contains(&snapshot.instance_id) {
                logger::log(&format!("🚫 '{}' already died this battle, not re-binding", snapshot.instance_id));
                continue;
            }
            let position = grid_to_world(world, self.board, snapshot.x, snapshot.y);
            let entity = self
                .reconciler
                .resolve(world, &mut self.handles, snapshot, position, &self.viewing_team)
                .entity;
            self.place(world, entity, snapshot, position);
        }

        self.hide_viewer_roster(world);
        logger::log_info(&format!(
            "⚔️ CombatStart on board {:?}: {} combatants bound",
            self.board,
            self.handles.len()
        ));
    }

    fn place(&self, world: &mut World, entity: Entity, snapshot: &CombatantSnapshot, position: Vec3) {
        snap_to(world, entity, position);
        let center = world.get::<BoardGeometry>(self.board).map(|geometry| geometry.center());

        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            return;
        };
        entity_mut.insert((
            HealthDisplay::from_stats(&snapshot.stats),
            VisualPresence { visible: true },
            OnBoard(self.board),
        ));
        // Face across the board
        if let (Some(center), Some(mut transform)) = (center, entity_mut.get_mut::<Transform>()) {
            let target = Vec3::new(center.x, position.y, center.z);
            if target.distance_squared(position) > f32::EPSILON {
                transform.look_at(target, Vec3::Y);
            }
        }
        play_clip(world, entity, UnitAnimation::Idle);
    }

    /// Hide the viewer's roster visuals on this board that no handle borrowed
    ///
    /// Covers construct-only playback and a registry binding that won over
    /// the roster entry for the same combatant. Shown again on release.
    fn hide_viewer_roster(&mut self, world: &mut World) {
        let Some(roster) = world.get_resource::<PersistentRoster>() else {
            return;
        };
        let candidates: Vec<Entity> = roster.iter().map(|(_, &entity)| entity).collect();

        for entity in candidates {
            if self.handles.owns_entity(entity) {
                continue;
            }
            if world.get::<OnBoard>(entity).map(|on_board| on_board.0) != Some(self.board) {
                continue;
            }
            let previous = world.get::<VisualPresence>(entity).copied();
            if previous == Some(VisualPresence { visible: false }) {
                continue;
            }
            if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
                entity_mut.insert(VisualPresence { visible: false });
                self.hidden_roster.push((entity, previous));
            }
        }
    }

    fn apply_move(&mut self, world: &mut World, instance_id: &str, x: i32, y: i32) -> bool {
        let Some(entity) = self.bound_entity(instance_id, "UnitMove") else {
            return false;
        };
        let target = grid_to_world(world, self.board, x, y);
        if self.fast_forwarding {
            snap_to(world, entity, target);
        } else {
            start_move(world, entity, target, self.config.move_duration_secs);
        }
        true
    }

    fn apply_attack(&mut self, world: &mut World, attacker_id: &str, target_id: &str) -> bool {
        if self.fast_forwarding {
            return false;
        }
        let Some(attacker) = self.bound_entity(attacker_id, "UnitAttack") else {
            return false;
        };
        let Some(target) = self.bound_entity(target_id, "UnitAttack") else {
            return false;
        };
        let Some(target_position) = world.get::<Transform>(target).map(|transform| transform.translation) else {
            return false;
        };
        start_lunge(
            world,
            attacker,
            target_position,
            self.config.lunge_reach,
            self.config.lunge_duration_secs,
        );
        true
    }

    fn apply_damage(
        &mut self,
        world: &mut World,
        instance_id: &str,
        damage: i32,
        current_health: i32,
        max_health: i32,
    ) -> bool {
        let Some(entity) = self.bound_entity(instance_id, "UnitDamage") else {
            return false;
        };
        if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(HealthDisplay::new(current_health, max_health));
        }
        emit(
            world,
            UnitDamaged {
                board: self.board,
                instance_id: instance_id.to_string(),
                damage,
                current_health,
            },
        );
        true
    }

    fn apply_death(&mut self, world: &mut World, instance_id: &str, loot: Option<&LootDrop>) -> bool {
        let Some(handle) = self.handles.remove(instance_id) else {
            self.log_dropped(instance_id, "UnitDeath");
            return false;
        };
        self.fallen.insert(instance_id.to_string());

        if let Some(mut registry) = world.get_mut::<BoardRegistry>(self.board) {
            registry.unbind(instance_id, handle.entity);
        }
        let release = match handle.provenance {
            Provenance::New => DeathRelease::Despawn,
            Provenance::Reused(_) => DeathRelease::Hide,
        };

        logger::log(&format!("💀 '{}' died on board {:?} ({:?})", instance_id, self.board, release));
        emit(
            world,
            UnitDied {
                board: self.board,
                instance_id: instance_id.to_string(),
            },
        );

        if let Some(loot) = loot {
            self.spawn_loot(world, instance_id, loot);
        }

        if self.fast_forwarding {
            finish_death(world, handle.entity, release);
        } else {
            start_death(world, handle.entity, release, self.config.death_fade_secs);
            self.dying.push((handle.entity, release));
        }
        true
    }

    fn spawn_loot(&mut self, world: &mut World, dropped_by: &str, loot: &LootDrop) {
        let position = grid_to_world(world, self.board, loot.x, loot.y);
        let marker = world
            .spawn((
                LootMarker {
                    item_id: loot.item_id.clone(),
                    dropped_by: dropped_by.to_string(),
                },
                Transform::from_translation(position),
                VisualPresence::default(),
                OnBoard(self.board),
            ))
            .id();
        logger::log(&format!("🎁 Loot '{}' dropped by '{}' at {:?}", loot.item_id, dropped_by, position));
        self.loot.push(marker);
    }
}
