//! Core types for reinforced artificial life: geometry, entities, and the spatial index.
//!
//! This crate holds everything the world simulation needs that does not
//! depend on the tick algorithm itself. Geometry helpers discretize relative
//! positions into perception slices, the entity model describes creatures and
//! grass, and the spatial index answers box queries over both.

/// Error types used throughout the crate.
pub mod error;
/// Creatures, grass, identifiers, and colors.
pub mod entity;
/// Polar conversion and slice discretization helpers.
pub mod geometry;
/// Axis-aligned bounding boxes and the R*-tree backed spatial index.
pub mod spatial;

/// Re-export core entity types.
pub use entity::{Body, Creature, EntityId, EntityKind, Grass, IdGenerator, Mood, Rgb};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export spatial types.
pub use spatial::{Bbox, SpatialIndex};
