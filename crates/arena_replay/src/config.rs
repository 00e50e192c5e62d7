//! Replay pacing and presentation tuning
//!
//! Single `ReplayConfig` resource read by every engine. Hosts override it
//! from JSON (`ReplayConfig::from_json_str`); absent fields keep defaults.

use bevy::prelude::*;
use serde::Deserialize;
use std::time::Duration;

use crate::combat_log::DecodeError;
use crate::logger::LogLevel;

/// Playback speed bounds (0.25x .. 4x)
pub const MIN_PLAYBACK_SPEED: f32 = 0.25;
pub const MAX_PLAYBACK_SPEED: f32 = 4.0;

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Wall-clock length of one authoritative tick at 1x
    pub tick_duration_ms: u64,
    /// Initial speed multiplier for new engines
    pub playback_speed: f32,
    /// Extra ticks tolerated past the last event before a log without
    /// CombatEnd is force-stopped
    pub overflow_grace_ticks: u32,
    pub move_duration_secs: f32,
    pub lunge_duration_secs: f32,
    /// Fraction of attacker→target distance covered by a lunge
    pub lunge_reach: f32,
    pub death_fade_secs: f32,
    pub victory_pose_secs: f32,
    /// Visual used when the catalog has no template for a unit
    pub placeholder_prefab: String,
    /// Logger threshold applied by `ReplayPlugin` whenever the config changes
    pub log_level: LogLevel,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms: 100,
            playback_speed: 1.0,
            overflow_grace_ticks: 30,
            move_duration_secs: 0.3,
            lunge_duration_secs: 0.25,
            lunge_reach: 0.35,
            death_fade_secs: 0.6,
            victory_pose_secs: 2.0,
            placeholder_prefab: "units/placeholder".to_string(),
            log_level: LogLevel::Debug,
        }
    }
}

impl ReplayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DecodeError> {
        let mut config: ReplayConfig = serde_json::from_str(json)?;
        config.playback_speed = clamp_speed(config.playback_speed);
        Ok(config)
    }

    /// Never zero: a zero wait would let one frame spin through every tick
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_duration_ms.max(1))
    }
}

/// Clamp a requested speed; NaN and non-positive values fall back to 1x
pub fn clamp_speed(speed: f32) -> f32 {
    if !speed.is_finite() || speed <= 0.0 {
        return 1.0;
    }
    speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReplayConfig::default();
        assert_eq!(config.tick_duration(), Duration::from_millis(100));
        assert_eq!(config.playback_speed, 1.0);
        assert_eq!(config.overflow_grace_ticks, 30);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReplayConfig::from_json_str(r#"{ "tick_duration_ms": 50, "playback_speed": 9.0 }"#)
            .expect("valid config");

        assert_eq!(config.tick_duration_ms, 50);
        assert_eq!(config.playback_speed, MAX_PLAYBACK_SPEED); // clamped
        assert_eq!(config.victory_pose_secs, 2.0);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_log_level_from_json() {
        let config = ReplayConfig::from_json_str(r#"{ "log_level": "warning" }"#).expect("valid config");
        assert_eq!(config.log_level, LogLevel::Warning);
    }

    #[test]
    fn test_zero_tick_duration_floors_at_one_ms() {
        let config = ReplayConfig::from_json_str(r#"{ "tick_duration_ms": 0 }"#).expect("valid config");
        assert_eq!(config.tick_duration(), Duration::from_millis(1));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(ReplayConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_clamp_speed() {
        assert_eq!(clamp_speed(0.1), MIN_PLAYBACK_SPEED);
        assert_eq!(clamp_speed(2.0), 2.0);
        assert_eq!(clamp_speed(f32::NAN), 1.0);
        assert_eq!(clamp_speed(-3.0), 1.0);
    }
}
