//! Tick-based artificial-life worlds.
//!
//! Two worlds share one driving surface, the [`Arena`] trait: the continuous
//! [`World`], where creatures and grass live on a plane backed by an R*-tree,
//! and the discrete [`GridWorld`]. Creatures act through pluggable
//! [`Decide`] strategies registered per species name.

/// The surface shared by both world variants.
pub mod arena;
/// Draw adapter trait and a text rasteriser.
pub mod canvas;
/// Configuration types for both worlds.
pub mod config;
/// The decision contract and built-in strategies.
pub mod decision;
/// Per-tick episode recording.
pub mod episode;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// The discrete grid world.
pub mod grid;
/// What creatures are told before they decide.
pub mod perception;
/// The continuous world and its tick algorithm.
pub mod world;

pub use arena::{Arena, TickReport};
pub use canvas::{AsciiCanvas, Canvas};
pub use config::{GridConfig, WorldConfig};
pub use decision::{Action, Decide, Greedy, Hunt, StrategyRegistry, Wander};
pub use episode::{CellChange, CreatureChange, Episode, Frame};
pub use error::{SimError, SimResult};
pub use event::{DeathCause, EventLog, SimEvent, SimEventKind};
pub use grid::{GridCreature, GridWorld, Occupant, Terrain};
pub use perception::{Cell, CellWindow, Perception, SliceVotes, View};
pub use world::World;
