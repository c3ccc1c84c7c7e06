//! GridCity - grid-based procedural city generator.
//!
//! Plans a ring-and-lattice road grid, cuts it into zoned blocks, scatters
//! square building footprints and skins each one with modular wall rings.
//! The output is a [`scene::SceneArena`] a renderer can instantiate.

pub mod error;
pub mod generation;
pub mod procgen;
pub mod scene;
pub mod world;

pub use error::{GenerationError, Result};
pub use generation::{
    generate_city, CancelToken, City, CityGenConfig, CityGeneration, CityGenerationPlugin,
    GenerationStatus,
};
