//! Construction of battle-owned (New provenance) visuals

use bevy::prelude::*;

use crate::catalog::UnitCatalog;
use crate::components::{AnimationTrigger, EquippedItems, HealthDisplay, OnBoard, UnitVisual, VisualPresence};
use crate::config::ReplayConfig;
use crate::logger;

/// Everything needed to build a visual without a pre-existing one
#[derive(Debug, Clone)]
pub struct VisualBlueprint<'a> {
    pub instance_id: &'a str,
    pub unit_id: &'a str,
    pub team_id: &'a str,
    pub allied: bool,
    pub items: &'a [String],
    pub health: HealthDisplay,
}

/// Spawn a visual from its catalog template
///
/// Missing template → placeholder visual (playback must go on).
pub fn construct_visual(world: &mut World, blueprint: &VisualBlueprint, position: Vec3, board: Entity) -> Entity {
    let template_prefab = world
        .get_resource::<UnitCatalog>()
        .and_then(|catalog| catalog.template_for(blueprint.unit_id))
        .map(|template| template.prefab.clone());

    let (prefab, placeholder) = match template_prefab {
        Some(prefab) => (prefab, false),
        None => {
            let placeholder = world
                .get_resource::<ReplayConfig>()
                .map(|config| config.placeholder_prefab.clone())
                .unwrap_or_else(|| ReplayConfig::default().placeholder_prefab);
            logger::log_warning(&format!(
                "⚠️ No template for unit '{}' ({}), using placeholder",
                blueprint.unit_id, blueprint.instance_id
            ));
            (placeholder, true)
        }
    };

    let entity = world
        .spawn((
            UnitVisual {
                instance_id: blueprint.instance_id.to_string(),
                unit_id: blueprint.unit_id.to_string(),
                team_id: blueprint.team_id.to_string(),
                prefab,
                placeholder,
                allied: blueprint.allied,
            },
            Transform::from_translation(position),
            VisualPresence::default(),
            blueprint.health,
            AnimationTrigger::default(),
            EquippedItems(blueprint.items.to_vec()),
            OnBoard(board),
        ))
        .id();

    logger::log(&format!(
        "✨ Built visual {:?} for {} ({}) on board {:?}",
        entity, blueprint.instance_id, blueprint.unit_id, board
    ));
    entity
}
