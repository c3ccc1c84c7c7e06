//! Building placer turning blocks into square building footprints.
//!
//! Each block asks for a tier-dependent number of buildings. Every building
//! draws a wall count and floor count from its tier, is shrunk (or skipped)
//! until it fits the block, then gets a bounded number of random placement
//! attempts against the footprints already standing in that block.

use bevy::prelude::*;
use rand::Rng;

use super::block_extractor::Block;
use super::lot_geometry::{min_corner_region, square_fits};
use super::zoning::{DensityTier, TierProfiles};
use crate::error::{GenerationError, Result};

/// What to do with a footprint larger than its block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OversizePolicy {
    /// Remove one wall module per side until the footprint fits.
    #[default]
    Shrink,
    /// Drop the building.
    Skip,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacementConfig {
    pub profiles: TierProfiles,
    /// Core blocks allowed to hold skyscrapers across the whole city.
    pub skyscraper_budget: u32,
    /// Random placement attempts per building.
    pub max_attempts: u32,
    /// Slack subtracted from the minimum center distance between footprints.
    pub separation_tolerance: f32,
    /// Footprint length contributed by each wall module. The corners take
    /// one more module's worth per side.
    pub module_width: f32,
    pub oversize: OversizePolicy,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            profiles: TierProfiles::default(),
            skyscraper_budget: 2,
            max_attempts: 12,
            separation_tolerance: 0.5,
            module_width: 4.0,
            oversize: OversizePolicy::Shrink,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<()> {
        self.profiles.validate()?;
        if !(self.module_width > 0.0) {
            return Err(GenerationError::ParameterOutOfRange {
                name: "module width",
                value: self.module_width,
                min: f32::EPSILON,
                max: f32::MAX,
            });
        }
        Ok(())
    }

    /// Side length of a footprint with `wall_count` modules per side.
    pub fn footprint_side(&self, wall_count: u32) -> f32 {
        (wall_count + 1) as f32 * self.module_width
    }
}

/// Square ground plan of one building in world space (x, z).
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    /// Index of the block this footprint was placed in.
    pub block: usize,
    /// Tier used for sizing and module palette.
    pub tier: DensityTier,
    /// Minimum (x, z) corner.
    pub min: Vec2,
    pub side: f32,
    pub wall_count: u32,
    pub floor_count: u32,
}

impl Footprint {
    pub fn half_extent(&self) -> f32 {
        self.side * 0.5
    }

    pub fn center(&self) -> Vec2 {
        self.min + Vec2::splat(self.half_extent())
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            min: self.min,
            max: self.min + Vec2::splat(self.side),
        }
    }

    /// Minimum allowed center distance to `other`.
    pub fn required_separation(&self, other: &Footprint, tolerance: f32) -> f32 {
        self.half_extent() + other.half_extent() - tolerance
    }

    pub fn is_separated_from(&self, other: &Footprint, tolerance: f32) -> bool {
        self.center().distance(other.center()) >= self.required_separation(other, tolerance)
    }
}

/// Places footprints block by block, tracking the city-wide skyscraper budget.
///
/// One placer is meant to live for a single generation pass so the budget is
/// handed out in subdivision order.
pub struct BuildingPlacer<'a> {
    config: &'a PlacementConfig,
    skyscrapers_spawned: u32,
}

impl<'a> BuildingPlacer<'a> {
    pub fn new(config: &'a PlacementConfig) -> Self {
        Self {
            config,
            skyscrapers_spawned: 0,
        }
    }

    pub fn skyscrapers_spawned(&self) -> u32 {
        self.skyscrapers_spawned
    }

    /// Tier whose building count a block draws. Core blocks past the
    /// skyscraper budget take the middle count but keep core sizes and palette.
    fn claim_count_tier(&mut self, tier: DensityTier) -> DensityTier {
        match tier {
            DensityTier::Core if self.skyscrapers_spawned < self.config.skyscraper_budget => {
                self.skyscrapers_spawned += 1;
                DensityTier::Core
            }
            DensityTier::Core => DensityTier::Middle,
            other => other,
        }
    }

    /// Place the buildings of one block inside its world bounds.
    pub fn place(&mut self, block: &Block, bounds: Rect, rng: &mut impl Rng) -> Vec<Footprint> {
        let count_tier = self.claim_count_tier(block.tier);
        let count = rng.gen_range(self.config.profiles.get(count_tier).buildings.clone());
        self.place_footprints(block.index, block.tier, bounds, count, rng)
    }

    /// Try to place `count` footprints of `tier` inside `bounds`.
    ///
    /// Buildings that cannot fit or that exhaust their attempts are dropped,
    /// so the result holds at most `count` footprints.
    pub fn place_footprints(
        &self,
        block: usize,
        tier: DensityTier,
        bounds: Rect,
        count: u32,
        rng: &mut impl Rng,
    ) -> Vec<Footprint> {
        let profile = self.config.profiles.get(tier);
        let mut placed: Vec<Footprint> = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let wall_count = rng.gen_range(profile.walls.clone());
            let floor_count = rng.gen_range(profile.floors.clone());

            let Some(wall_count) = self.fit_wall_count(wall_count, bounds) else {
                debug!(
                    "Block {block}: {tier:?} footprint does not fit {}x{}",
                    bounds.width(),
                    bounds.height()
                );
                continue;
            };

            let side = self.config.footprint_side(wall_count);
            let Some(region) = min_corner_region(bounds, side) else {
                continue;
            };

            let accepted = (0..self.config.max_attempts).find_map(|_| {
                let candidate = Footprint {
                    block,
                    tier,
                    min: Vec2::new(
                        rng.gen_range(region.min.x..region.max.x),
                        rng.gen_range(region.min.y..region.max.y),
                    ),
                    side,
                    wall_count,
                    floor_count,
                };
                placed
                    .iter()
                    .all(|other| {
                        candidate.is_separated_from(other, self.config.separation_tolerance)
                    })
                    .then_some(candidate)
            });

            match accepted {
                Some(footprint) => placed.push(footprint),
                None => debug!(
                    "Block {block}: dropped building after {} placement attempts",
                    self.config.max_attempts
                ),
            }
        }

        placed
    }

    /// Apply the oversize policy to a sampled wall count.
    fn fit_wall_count(&self, mut wall_count: u32, bounds: Rect) -> Option<u32> {
        loop {
            if square_fits(bounds, self.config.footprint_side(wall_count)) {
                return Some(wall_count);
            }
            match self.config.oversize {
                OversizePolicy::Skip => return None,
                OversizePolicy::Shrink if wall_count > 1 => wall_count -= 1,
                OversizePolicy::Shrink => return None,
            }
        }
    }
}
