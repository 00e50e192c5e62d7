//! Per-visual tweens, advanced independently of event application
//!
//! - `MoveTween`: linear slide to a grid cell
//! - `LungeTween`: out-and-back toward a target (cosmetic)
//! - `DeathFade`: death clip, then despawn or hide
//!
//! The engine only inserts these; `step_animations` drives them every frame.

use bevy::prelude::*;
use std::f32::consts::PI;

use crate::components::{AnimationTrigger, OnBoard, UnitAnimation, VisualPresence};
use crate::logger;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct MoveTween {
    pub from: Vec3,
    pub to: Vec3,
    pub elapsed: f32,
    pub duration: f32,
}

impl MoveTween {
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct LungeTween {
    pub origin: Vec3,
    /// Peak offset from `origin`
    pub offset: Vec3,
    pub elapsed: f32,
    pub duration: f32,
}

impl LungeTween {
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

/// What happens to a visual once its death clip ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathRelease {
    /// Battle-owned visual
    Despawn,
    /// Borrowed visual: hidden and detached from the board, never restored
    Hide,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct DeathFade {
    pub remaining: f32,
    pub release: DeathRelease,
}

fn trigger(world: &mut World, entity: Entity, clip: UnitAnimation) {
    match world.get_mut::<AnimationTrigger>(entity) {
        Some(mut animation) => animation.trigger(clip),
        None => {
            if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
                let mut animation = AnimationTrigger::default();
                animation.trigger(clip);
                entity_mut.insert(animation);
            }
        }
    }
}

/// Play `clip` on a visual (inserts the trigger on borrowed visuals lacking one)
pub fn play_clip(world: &mut World, entity: Entity, clip: UnitAnimation) {
    trigger(world, entity, clip);
}

/// Slide toward `to`; a running lunge is abandoned
pub fn start_move(world: &mut World, entity: Entity, to: Vec3, duration: f32) {
    let Some(from) = world.get::<Transform>(entity).map(|transform| transform.translation) else {
        return;
    };
    let origin = world.get::<LungeTween>(entity).map(|lunge| lunge.origin);
    let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
        return;
    };
    entity_mut.remove::<LungeTween>();
    entity_mut.insert(MoveTween {
        from: origin.unwrap_or(from),
        to,
        elapsed: 0.0,
        duration,
    });
    trigger(world, entity, UnitAnimation::Move);
}

/// Lunge toward `target`; only the clip plays while the attacker is moving
pub fn start_lunge(world: &mut World, entity: Entity, target: Vec3, reach: f32, duration: f32) {
    trigger(world, entity, UnitAnimation::Attack);

    if world.get::<MoveTween>(entity).is_some() {
        return;
    }
    let Some(current) = world.get::<Transform>(entity).map(|transform| transform.translation) else {
        return;
    };
    // Retrigger mid-lunge restarts from the resting spot
    let origin = world.get::<LungeTween>(entity).map(|lunge| lunge.origin).unwrap_or(current);
    let offset = (target - origin) * reach;

    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.insert(LungeTween {
            origin,
            offset,
            elapsed: 0.0,
            duration,
        });
    }
}

/// Jump straight to `position`, dropping any tween
pub fn snap_to(world: &mut World, entity: Entity, position: Vec3) {
    cancel_tweens(world, entity);
    if let Some(mut transform) = world.get_mut::<Transform>(entity) {
        transform.translation = position;
    }
}

/// Drop tweens, leaving the visual wherever it currently is
pub fn cancel_tweens(world: &mut World, entity: Entity) {
    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.remove::<(MoveTween, LungeTween)>();
    }
}

/// Jump tweens to their end state (move target, lunge origin)
pub fn complete_tweens(world: &mut World, entity: Entity) {
    let settled = world
        .get::<MoveTween>(entity)
        .map(|tween| tween.to)
        .or_else(|| world.get::<LungeTween>(entity).map(|lunge| lunge.origin));
    cancel_tweens(world, entity);

    if let (Some(position), Some(mut transform)) = (settled, world.get_mut::<Transform>(entity)) {
        transform.translation = position;
    }
}

/// Start the death clip; `finish_death` runs when it ends
pub fn start_death(world: &mut World, entity: Entity, release: DeathRelease, duration: f32) {
    complete_tweens(world, entity);
    trigger(world, entity, UnitAnimation::Death);
    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.insert(DeathFade {
            remaining: duration,
            release,
        });
    }
}

/// Release a dead visual now (fast-forward, stop, or fade end)
///
/// Idempotent: an already despawned entity is ignored.
pub fn finish_death(world: &mut World, entity: Entity, release: DeathRelease) {
    match release {
        DeathRelease::Despawn => {
            if world.get_entity(entity).is_ok() {
                world.despawn(entity);
            }
        }
        DeathRelease::Hide => {
            let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
                return;
            };
            entity_mut.remove::<(MoveTween, LungeTween, DeathFade, OnBoard)>();
            entity_mut.insert(VisualPresence { visible: false });
        }
    }
}

/// Advance every tween by `dt` seconds
pub fn step_animations(world: &mut World, dt: f32) {
    let mut settled = Vec::new();

    let mut moves = world.query::<(Entity, &mut Transform, &mut MoveTween)>();
    for (entity, mut transform, mut tween) in moves.iter_mut(world) {
        tween.elapsed += dt;
        let t = tween.progress();
        transform.translation = tween.from.lerp(tween.to, t);
        if t >= 1.0 {
            settled.push((entity, UnitAnimation::Move));
        }
    }

    let mut lunges = world.query_filtered::<(Entity, &mut Transform, &mut LungeTween), Without<MoveTween>>();
    for (entity, mut transform, mut lunge) in lunges.iter_mut(world) {
        lunge.elapsed += dt;
        let t = lunge.progress();
        transform.translation = lunge.origin + lunge.offset * (PI * t).sin();
        if t >= 1.0 {
            transform.translation = lunge.origin;
            settled.push((entity, UnitAnimation::Attack));
        }
    }

    let mut released = Vec::new();
    let mut fades = world.query::<(Entity, &mut DeathFade)>();
    for (entity, mut fade) in fades.iter_mut(world) {
        fade.remaining -= dt;
        if fade.remaining <= 0.0 {
            released.push((entity, fade.release));
        }
    }

    for (entity, clip) in settled {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            continue;
        };
        match clip {
            UnitAnimation::Move => entity_mut.remove::<MoveTween>(),
            _ => entity_mut.remove::<LungeTween>(),
        };
        // Back to idle unless something newer (victory, death) took over
        if let Some(mut animation) = world.get_mut::<AnimationTrigger>(entity) {
            if animation.clip == clip {
                animation.trigger(UnitAnimation::Idle);
            }
        }
    }

    for (entity, release) in released {
        logger::log(&format!("💀 Death clip finished for {:?} ({:?})", entity, release));
        finish_death(world, entity, release);
    }
}

/// System: advance tweens by the frame delta
pub fn animate_visuals(world: &mut World) {
    let Some(dt) = world.get_resource::<Time>().map(|time| time.delta_secs()) else {
        return;
    };
    step_animations(world, dt);
}
