//! Visual construction and animation
//!
//! - spawn: battle-owned visuals from catalog templates (placeholder fallback)
//! - animation: move/lunge tweens, death fades, `animate_visuals` system

pub mod animation;
pub mod spawn;

pub use animation::{
    animate_visuals, cancel_tweens, complete_tweens, finish_death, play_clip, snap_to, start_death, start_lunge,
    start_move, step_animations, DeathFade, DeathRelease, LungeTween, MoveTween,
};
pub use spawn::{construct_visual, VisualBlueprint};
