//! 2D grid field-of-view engine for turn-based games.
//!
//! The engine computes which cells of a grid are visible from an origin,
//! honoring occluding terrain, a radius with a chosen falloff shape, and
//! optional directional cones. Results are exposed three ways: continuous
//! intensities, a live boolean projection, and visibility history
//! (current / newly seen / newly unseen); observers can subscribe to reset
//! and recalculated notifications. The grid walk itself is a pluggable
//! strategy ([`FovAlgorithm`]), with recursive shadowcasting provided.
//!
//! A small map-generation pipeline ([`mapgen`]) produces transparency
//! grids for the engine to consume, using a process-wide swappable RNG
//! ([`rng`]).

pub mod fov;
pub mod grid;
pub mod interactive;
pub mod mapgen;
pub mod render;
pub mod rng;

#[cfg(test)]
mod tests;

// Re-export public API
pub use fov::{
    BoolFovView, Cone, FovAlgorithm, FovCalculation, FovEngine, FovError, RadiusShape,
    Shadowcasting,
};
pub use grid::{Grid, Point};
pub use interactive::{InteractiveViewer, ViewerConfig};
pub use mapgen::{
    ComponentRequirement, GenerationContext, GenerationError, GenerationStep, Generator,
    RandomRoomsStep, RandomWalkStep, TRANSPARENCY_TAG,
};
pub use render::{intensity_to_string, visibility_to_string};
pub use rng::{seed_global_rng, set_global_rng, with_global_rng};
