//! Road layout planner rasterizing a ring-and-lattice road network.
//!
//! Builds the occupancy grid by:
//! 1. Drawing a circular core ring (optionally a filled disc) around the center
//! 2. Extending four main streets north, south, east and west
//! 3. Overlaying a periodic block grid that stays out of the core
//!
//! Every step only ever marks cells as road, so the order only matters for
//! which step "claims" a cell first, never for the final grid.

use bevy::prelude::*;

use crate::error::{GenerationError, Result};
use crate::world::grid::{CityCenter, OccupancyGrid};

/// Circular road around the city center.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreRingConfig {
    /// Ring radius in cells.
    pub radius: u32,
    /// Half-thickness of the ring outline in cells.
    pub thickness: f32,
    /// Pave the whole disc instead of only its outline.
    pub filled: bool,
}

impl Default for CoreRingConfig {
    fn default() -> Self {
        Self {
            radius: 10,
            thickness: 0.7,
            filled: false,
        }
    }
}

/// Four arterial streets radiating from the center.
#[derive(Clone, Debug, PartialEq)]
pub struct MainStreetConfig {
    /// Arm length in cells, counted from the center cell.
    pub length: u32,
    /// Street width in cells, spread symmetrically around the centerline.
    pub thickness: u32,
}

impl Default for MainStreetConfig {
    fn default() -> Self {
        Self {
            length: 20,
            thickness: 1,
        }
    }
}

/// Regular street lattice. The spacing also drives block subdivision.
#[derive(Clone, Debug, PartialEq)]
pub struct GridOverlayConfig {
    /// Distance between grid streets in cells.
    pub block_spacing: u32,
    /// Width of each grid street in cells.
    pub thickness: u32,
}

impl Default for GridOverlayConfig {
    fn default() -> Self {
        Self {
            block_spacing: 5,
            thickness: 1,
        }
    }
}

/// Configuration for road layout planning.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadLayoutConfig {
    pub rows: usize,
    pub cols: usize,
    /// Core ring, or `None` for no downtown ring.
    pub core: Option<CoreRingConfig>,
    /// Main streets, or `None` to skip the arterials.
    pub main_streets: Option<MainStreetConfig>,
    pub grid: GridOverlayConfig,
    /// Whether the grid streets are drawn. Blocks are tiled by
    /// `grid.block_spacing` either way.
    pub draw_grid: bool,
}

impl Default for RoadLayoutConfig {
    fn default() -> Self {
        Self {
            rows: 60,
            cols: 60,
            core: Some(CoreRingConfig::default()),
            main_streets: Some(MainStreetConfig::default()),
            grid: GridOverlayConfig::default(),
            draw_grid: true,
        }
    }
}

impl RoadLayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GenerationError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }

        if let Some(core) = &self.core {
            check_range("center radius", core.radius as f32, 2.0, 30.0)?;
            check_range("center thickness", core.thickness, 0.01, core.radius as f32)?;
        }

        if let Some(streets) = &self.main_streets {
            check_range("main street length", streets.length as f32, 1.0, 300.0)?;
            check_range("main street thickness", streets.thickness as f32, 1.0, 10.0)?;
        }

        check_range("block spacing", self.grid.block_spacing as f32, 2.0, 20.0)?;
        check_range("grid thickness", self.grid.thickness as f32, 1.0, 5.0)
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(GenerationError::ParameterOutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Rasterizes a [`RoadLayoutConfig`] into an [`OccupancyGrid`].
pub struct RoadLayoutPlanner;

impl RoadLayoutPlanner {
    /// Validate the configuration and build the road grid.
    pub fn generate(config: &RoadLayoutConfig) -> Result<OccupancyGrid> {
        config.validate()?;

        let mut grid = OccupancyGrid::new(config.rows, config.cols);
        let center = grid.center();

        if let Some(core) = &config.core {
            build_core(&mut grid, center, core);
        }
        if let Some(streets) = &config.main_streets {
            build_main_streets(&mut grid, center, streets);
        }
        if config.draw_grid {
            build_grid_layout(&mut grid, center, &config.grid, config.core.as_ref());
        }

        debug!(
            "Planned {}x{} road grid with {} road cells",
            config.rows,
            config.cols,
            grid.road_count()
        );

        Ok(grid)
    }
}

/// Ring outline `(R-t)² ≤ d² ≤ (R+t)²`, plus the whole disc when filled.
fn build_core(grid: &mut OccupancyGrid, center: CityCenter, core: &CoreRingConfig) {
    let radius = core.radius as f32;
    let radius_sq = radius * radius;
    let inner = (radius - core.thickness) * (radius - core.thickness);
    let outer = (radius + core.thickness) * (radius + core.thickness);

    for r in 0..grid.rows() as isize {
        for c in 0..grid.cols() as isize {
            let dist = center.distance_sq(r, c);

            if dist >= inner && dist <= outer {
                grid.set_road(r, c);
            }

            if core.filled && dist <= radius_sq {
                grid.set_road(r, c);
            }
        }
    }
}

fn build_main_streets(grid: &mut OccupancyGrid, center: CityCenter, streets: &MainStreetConfig) {
    let cx = center.0.x.round_ties_even() as isize;
    let cy = center.0.y.round_ties_even() as isize;
    let half = (streets.thickness / 2) as isize;
    let length = streets.length as isize;

    for i in -half..=half {
        for step in 0..=length {
            // North/south arms
            grid.set_road(cy + step, cx + i);
            grid.set_road(cy - step, cx + i);
            // East/west arms
            grid.set_road(cy + i, cx + step);
            grid.set_road(cy + i, cx - step);
        }
    }
}

fn build_grid_layout(
    grid: &mut OccupancyGrid,
    center: CityCenter,
    overlay: &GridOverlayConfig,
    core: Option<&CoreRingConfig>,
) {
    let spacing = overlay.block_spacing.max(1) as usize;
    let thickness = overlay.thickness as isize;
    let core_radius_sq = core.map(|c| (c.radius as f32) * (c.radius as f32));
    let outside_core = |r: isize, c: isize| match core_radius_sq {
        Some(radius_sq) => center.distance_sq(r, c) > radius_sq,
        None => true,
    };

    let rows = grid.rows() as isize;
    let cols = grid.cols() as isize;

    // Horizontal streets
    for r in (0..rows).step_by(spacing) {
        for c in 0..cols {
            for t in 0..thickness {
                if !grid.in_bounds(r + t, c) {
                    break;
                }
                if outside_core(r + t, c) {
                    grid.set_road(r + t, c);
                }
            }
        }
    }

    // Vertical streets
    for c in (0..cols).step_by(spacing) {
        for r in 0..rows {
            for t in 0..thickness {
                if !grid.in_bounds(r, c + t) {
                    break;
                }
                if outside_core(r, c + t) {
                    grid.set_road(r, c + t);
                }
            }
        }
    }
}
