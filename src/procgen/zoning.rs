//! Density tiers and the building size ranges attached to them.

use std::ops::Range;

use crate::error::{GenerationError, Result};

/// Normalized distances below this are downtown.
pub const CORE_CUTOFF: f32 = 0.2;
/// Normalized distances below this (and not core) are the middle ring.
pub const MIDDLE_CUTOFF: f32 = 0.5;

/// Density classification of a block, driven by distance from the city center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DensityTier {
    /// Skyscraper district around the center.
    Core,
    Middle,
    /// Low-rise outskirts.
    Edge,
}

impl DensityTier {
    pub fn all() -> &'static [DensityTier] {
        &[DensityTier::Core, DensityTier::Middle, DensityTier::Edge]
    }

    /// Classify a normalized center distance (0 at the center, 1 at the lattice edge).
    pub fn from_normalized_distance(d: f32) -> Self {
        if d < CORE_CUTOFF {
            DensityTier::Core
        } else if d < MIDDLE_CUTOFF {
            DensityTier::Middle
        } else {
            DensityTier::Edge
        }
    }
}

/// Half-open ranges sampled for one tier.
#[derive(Clone, Debug, PartialEq)]
pub struct TierProfile {
    /// Wall modules per side of a footprint.
    pub walls: Range<u32>,
    /// Floors per building.
    pub floors: Range<u32>,
    /// Buildings requested per block.
    pub buildings: Range<u32>,
}

impl TierProfile {
    fn validate(&self, tier: DensityTier) -> Result<()> {
        let check = |what: &'static str, range: &Range<u32>, min_start: u32| {
            if range.start >= range.end || range.start < min_start {
                Err(GenerationError::EmptyRange {
                    tier,
                    what,
                    start: range.start,
                    end: range.end,
                })
            } else {
                Ok(())
            }
        };
        check("wall count", &self.walls, 1)?;
        check("floor count", &self.floors, 1)?;
        check("building count", &self.buildings, 0)
    }
}

/// Size ranges for every tier.
#[derive(Clone, Debug, PartialEq)]
pub struct TierProfiles {
    pub core: TierProfile,
    pub middle: TierProfile,
    pub edge: TierProfile,
}

impl Default for TierProfiles {
    fn default() -> Self {
        Self {
            core: TierProfile {
                walls: 6..9,
                floors: 30..50,
                buildings: 1..2,
            },
            middle: TierProfile {
                walls: 4..7,
                floors: 10..20,
                buildings: 1..3,
            },
            edge: TierProfile {
                walls: 2..5,
                floors: 3..7,
                buildings: 3..7,
            },
        }
    }
}

impl TierProfiles {
    pub fn get(&self, tier: DensityTier) -> &TierProfile {
        match tier {
            DensityTier::Core => &self.core,
            DensityTier::Middle => &self.middle,
            DensityTier::Edge => &self.edge,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for &tier in DensityTier::all() {
            self.get(tier).validate(tier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_classification_respects_cutoffs() {
        assert_eq!(DensityTier::from_normalized_distance(0.0), DensityTier::Core);
        assert_eq!(DensityTier::from_normalized_distance(0.19), DensityTier::Core);
        assert_eq!(DensityTier::from_normalized_distance(0.2), DensityTier::Middle);
        assert_eq!(DensityTier::from_normalized_distance(0.49), DensityTier::Middle);
        assert_eq!(DensityTier::from_normalized_distance(0.5), DensityTier::Edge);
        assert_eq!(DensityTier::from_normalized_distance(3.0), DensityTier::Edge);
    }

    #[test]
    fn default_profiles_are_valid() {
        assert!(TierProfiles::default().validate().is_ok());
    }

    #[test]
    fn empty_wall_range_is_rejected() {
        let mut profiles = TierProfiles::default();
        profiles.edge.walls = 3..3;
        assert_eq!(
            profiles.validate(),
            Err(GenerationError::EmptyRange {
                tier: DensityTier::Edge,
                what: "wall count",
                start: 3,
                end: 3,
            })
        );
    }

    #[test]
    fn zero_wall_modules_are_rejected() {
        let mut profiles = TierProfiles::default();
        profiles.middle.walls = 0..4;
        assert!(profiles.validate().is_err());
    }
}
