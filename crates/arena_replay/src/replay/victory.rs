//! Victory pose: winners face the viewer, everyone else idles

use bevy::prelude::*;
use std::time::Duration;

use super::signals::EndReason;
use super::state::ReplayPhase;
use super::ReplayEngine;
use crate::components::{BoardGeometry, UnitAnimation, ViewFromOppositeSide};
use crate::logger;
use crate::visuals::{complete_tweens, play_clip};

impl ReplayEngine {
    pub(super) fn enter_victory_pose(&mut self, world: &mut World) {
        self.state.phase = ReplayPhase::VictoryPose;
        self.victory_remaining = Duration::try_from_secs_f32(self.config.victory_pose_secs).unwrap_or(Duration::ZERO);
        self.send_ended(world, EndReason::Completed);

        let opposite = world.get::<ViewFromOppositeSide>(self.board).is_some();
        let viewer = world
            .get::<BoardGeometry>(self.board)
            .map(|geometry| geometry.viewer_position(opposite));
        let winner = self.state.winner_team_id.as_deref();

        let survivors: Vec<(Entity, bool)> = self
            .handles
            .values()
            .map(|handle| (handle.entity, winner == Some(handle.team_id.as_str())))
            .collect();

        for &(entity, won) in &survivors {
            complete_tweens(world, entity);
            if !won {
                play_clip(world, entity, UnitAnimation::Idle);
                continue;
            }
            if let (Some(viewer), Some(mut transform)) = (viewer, world.get_mut::<Transform>(entity)) {
                let target = Vec3::new(viewer.x, transform.translation.y, viewer.z);
                if target.distance_squared(transform.translation) > f32::EPSILON {
                    transform.look_at(target, Vec3::Y);
                }
            }
            play_clip(world, entity, UnitAnimation::Victory);
        }

        logger::log_info(&format!(
            "🏆 Board {:?} victory pose: winner {:?}, {} survivors at tick {}",
            self.board,
            self.state.winner_team_id,
            survivors.len(),
            self.state.current_tick
        ));
    }
}
