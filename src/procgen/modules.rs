//! Wall and corner module palettes used to skin buildings.
//!
//! A module is a fixed-size piece of facade. Walls of one palette are
//! interchangeable and must share a depth so that faces tile exactly.

use bevy::prelude::*;
use rand::Rng;

use super::zoning::DensityTier;
use crate::error::{GenerationError, Result};
use crate::scene::Bounds;

/// Opaque material handle understood by the host renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// A placeable piece of geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct ModulePrototype {
    pub name: String,
    /// Local extents: x is thickness, y height, z depth along the face.
    pub size: Vec3,
    pub material: MaterialId,
}

impl ModulePrototype {
    pub fn new(name: impl Into<String>, size: Vec3, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            size,
            material,
        }
    }

    /// Length the module covers along its forward axis.
    pub fn depth(&self) -> f32 {
        self.size.z
    }

    /// Local-space box, centered on x and extending forward from the pivot.
    pub fn local_bounds(&self) -> Bounds {
        Bounds {
            min: Vec3::new(-self.size.x * 0.5, 0.0, 0.0),
            max: Vec3::new(self.size.x * 0.5, self.size.y, self.size.z),
        }
    }
}

/// Interchangeable wall modules plus the corner that ends each face.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleSet {
    pub walls: Vec<ModulePrototype>,
    pub corner: ModulePrototype,
}

impl ModuleSet {
    pub fn wall_depth(&self) -> f32 {
        self.walls.first().map_or(0.0, ModulePrototype::depth)
    }

    pub fn corner_depth(&self) -> f32 {
        self.corner.depth()
    }

    /// Material shared by roof caps and LOD proxies.
    pub fn material(&self) -> MaterialId {
        self.walls
            .first()
            .map_or(self.corner.material, |wall| wall.material)
    }

    /// Uniformly pick a wall module.
    pub fn pick_wall(&self, rng: &mut impl Rng) -> &ModulePrototype {
        &self.walls[rng.gen_range(0..self.walls.len())]
    }

    pub fn validate(&self, tier: DensityTier) -> Result<()> {
        let Some(first) = self.walls.first() else {
            return Err(GenerationError::MissingPalette(tier));
        };
        let expected = first.depth();
        if !(expected > 0.0) {
            return Err(GenerationError::ParameterOutOfRange {
                name: "wall module depth",
                value: expected,
                min: f32::EPSILON,
                max: f32::MAX,
            });
        }
        if let Some(odd) = self
            .walls
            .iter()
            .find(|wall| (wall.depth() - expected).abs() > 1e-4)
        {
            return Err(GenerationError::InconsistentModuleDepth {
                tier,
                expected,
                found: odd.depth(),
            });
        }
        Ok(())
    }
}

/// Supplies a module palette for a density tier.
pub trait PaletteProvider {
    fn palette(&self, tier: DensityTier) -> Option<&ModuleSet>;
}

/// Per-tier palettes plus the tiles used for roads and block ground.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct ModuleLibrary {
    pub core: Option<ModuleSet>,
    pub middle: Option<ModuleSet>,
    pub edge: Option<ModuleSet>,
    pub road_tile: ModulePrototype,
    pub ground_tile: ModulePrototype,
}

impl PaletteProvider for ModuleLibrary {
    fn palette(&self, tier: DensityTier) -> Option<&ModuleSet> {
        match tier {
            DensityTier::Core => self.core.as_ref(),
            DensityTier::Middle => self.middle.as_ref(),
            DensityTier::Edge => self.edge.as_ref(),
        }
    }
}

impl ModuleLibrary {
    /// Check every tier has a usable palette whose walls match `module_width`.
    pub fn validate(&self, module_width: f32) -> Result<()> {
        for &tier in DensityTier::all() {
            let set = self
                .palette(tier)
                .ok_or(GenerationError::MissingPalette(tier))?;
            set.validate(tier)?;
            if (set.wall_depth() - module_width).abs() > 1e-4 {
                return Err(GenerationError::ModuleWidthMismatch {
                    tier,
                    depth: set.wall_depth(),
                    module_width,
                });
            }
        }
        Ok(())
    }
}

/// Standard facade panels: 4 units deep and one floor tall.
const PANEL_SIZE: Vec3 = Vec3::new(0.5, 4.0, 4.0);
const CORNER_SIZE: Vec3 = Vec3::new(2.0, 4.0, 2.0);
const TILE_SIZE: Vec3 = Vec3::new(10.0, 0.2, 10.0);

fn panel_set(prefix: &str, material: MaterialId) -> ModuleSet {
    let panel = |variant: &str| ModulePrototype::new(format!("{prefix}_{variant}"), PANEL_SIZE, material);
    ModuleSet {
        walls: vec![
            panel("full_window"),
            panel("one_window"),
            panel("two_window"),
            panel("no_window"),
        ],
        corner: ModulePrototype::new(format!("{prefix}_corner"), CORNER_SIZE, material),
    }
}

impl Default for ModuleLibrary {
    fn default() -> Self {
        Self {
            core: Some(panel_set("glass", MaterialId(1))),
            middle: Some(panel_set("concrete", MaterialId(2))),
            edge: Some(panel_set("brick", MaterialId(3))),
            road_tile: ModulePrototype::new("road_tile", TILE_SIZE, MaterialId(10)),
            ground_tile: ModulePrototype::new("buildable_tile", TILE_SIZE, MaterialId(11)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn default_library_is_valid() {
        let library = ModuleLibrary::default();
        assert!(library.validate(4.0).is_ok());
        assert_eq!(library.palette(DensityTier::Edge).unwrap().wall_depth(), 4.0);
        assert_eq!(library.palette(DensityTier::Core).unwrap().corner_depth(), 2.0);
    }

    #[test]
    fn missing_palette_is_reported() {
        let library = ModuleLibrary {
            middle: None,
            ..Default::default()
        };
        assert_eq!(
            library.validate(4.0),
            Err(GenerationError::MissingPalette(DensityTier::Middle))
        );
    }

    #[test]
    fn mismatched_wall_depths_are_rejected() {
        let mut library = ModuleLibrary::default();
        if let Some(edge) = library.edge.as_mut() {
            edge.walls[2].size.z = 3.0;
        }
        assert!(matches!(
            library.validate(4.0),
            Err(GenerationError::InconsistentModuleDepth {
                tier: DensityTier::Edge,
                ..
            })
        ));
        assert!(matches!(
            ModuleLibrary::default().validate(5.0),
            Err(GenerationError::ModuleWidthMismatch { .. })
        ));
    }

    #[test]
    fn wall_picks_cover_the_palette() {
        let set = panel_set("test", MaterialId(0));
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(set.pick_wall(&mut rng).name.clone());
        }
        assert_eq!(seen.len(), set.walls.len());
    }
}
