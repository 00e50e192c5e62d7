//! ECS components and resources shared across the replay domains
//!
//! Organised by domain:
//! - board: Board, BoardGeometry (geometry oracle), BoardRegistry, BoardIndex
//! - visual: UnitVisual, VisualPresence, HealthDisplay, AnimationTrigger, LootMarker
//! - roster: RosterUnit, PersistentRoster, ViewerContext, RemoteRosterFeed

pub mod board;
pub mod roster;
pub mod visual;

pub use board::*;
pub use roster::*;
pub use visual::*;
