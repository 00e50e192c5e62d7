//! Combat log: the immutable, tick-ordered input of one battle
//!
//! # Invariants
//! - events sorted non-decreasingly by tick (restored on construction, with a warning)
//! - `total_ticks` = max event tick (0 for an empty log)

pub mod decode;
pub mod events;
pub mod synthetic;

pub use decode::{decode_events, encode_events, DecodeError};
pub use events::*;

use crate::logger;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatLog {
    events: Vec<CombatEvent>,
}

impl CombatLog {
    pub fn new(mut events: Vec<CombatEvent>) -> Self {
        let sorted = events.windows(2).all(|pair| pair[0].tick <= pair[1].tick);
        if !sorted {
            logger::log_warning("⚠️ CombatLog: events out of tick order, re-sorting (stable)");
            events.sort_by_key(|event| event.tick);
        }
        Self { events }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DecodeError> {
        Ok(Self::new(decode_events(json)?))
    }

    pub fn to_json_string(&self) -> Result<String, DecodeError> {
        encode_events(&self.events)
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total_ticks(&self) -> Tick {
        self.events.last().map(|event| event.tick).unwrap_or(0)
    }

    pub fn has_combat_end(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event.kind, EventKind::CombatEnd { .. }))
    }
}

impl From<Vec<CombatEvent>> for CombatLog {
    fn from(events: Vec<CombatEvent>) -> Self {
        Self::new(events)
    }
}
