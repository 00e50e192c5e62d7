//! Unit catalog: `template_for(unit_id)` for visuals that must be built

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat_log::StatBlock;

/// Visual descriptor + base stats of a unit type
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTemplate {
    pub prefab: String,
    pub base_stats: StatBlock,
}

impl UnitTemplate {
    pub fn new(prefab: impl Into<String>) -> Self {
        Self {
            prefab: prefab.into(),
            base_stats: StatBlock::default(),
        }
    }
}

/// Filled by the roster/catalog system; read-only here
#[derive(Resource, Debug, Clone, Default)]
pub struct UnitCatalog {
    templates: HashMap<String, UnitTemplate>,
}

impl UnitCatalog {
    pub fn insert(&mut self, unit_id: impl Into<String>, template: UnitTemplate) {
        self.templates.insert(unit_id.into(), template);
    }

    pub fn with(mut self, unit_id: impl Into<String>, prefab: impl Into<String>) -> Self {
        self.insert(unit_id, UnitTemplate::new(prefab));
        self
    }

    pub fn template_for(&self, unit_id: &str) -> Option<&UnitTemplate> {
        self.templates.get(unit_id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
