//! Procedural generation stages.
//!
//! - Road layout on a tile grid (core ring, main streets, block grid)
//! - Block subdivision and density zoning
//! - Footprint placement by rejection sampling
//! - Modular building assembly with roof caps and LOD proxies

pub mod block_extractor;
pub mod building_factory;
pub mod buildings;
pub mod lod;
pub mod lot_geometry;
pub mod modules;
pub mod road_generator;
pub mod zoning;
