//! City block extraction from the road grid.
//!
//! Tiles the lattice with `block_spacing`-sized squares, trims the grid
//! streets off each tile and keeps the tiles whose interior is road-free.

use bevy::prelude::*;

use super::zoning::DensityTier;
use crate::world::grid::OccupancyGrid;
use crate::world::WorldConfig;

/// A buildable rectangle of cells, inclusive on both ends.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Position in subdivision order.
    pub index: usize,
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
    /// Centroid in grid space (x = column, y = row).
    pub centroid: Vec2,
    /// Centroid distance to the city center over the lattice half-extent.
    pub normalized_distance: f32,
    pub tier: DensityTier,
}

impl Block {
    pub fn width_cells(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    pub fn height_cells(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    /// World-space (x, z) bounds of the block interior.
    pub fn world_bounds(&self, world: &WorldConfig, grid: &OccupancyGrid) -> Rect {
        world.cell_span(
            (self.start_row, self.end_row),
            (self.start_col, self.end_col),
            grid.center(),
        )
    }
}

/// Lazily walks the block tiles of a grid in row-major order.
///
/// Each call to [`subdivide`] starts a fresh walk; the iterator itself is
/// single-pass.
pub struct Blocks<'a> {
    grid: &'a OccupancyGrid,
    spacing: usize,
    thickness: usize,
    row: usize,
    col: usize,
    emitted: usize,
}

/// Split the non-road area of `grid` into blocks.
pub fn subdivide(grid: &OccupancyGrid, block_spacing: u32, grid_thickness: u32) -> Blocks<'_> {
    Blocks {
        grid,
        spacing: block_spacing.max(1) as usize,
        thickness: grid_thickness as usize,
        row: 0,
        col: 0,
        emitted: 0,
    }
}

impl<'a> Blocks<'a> {
    /// Interior of the tile whose low corner is `(row, col)`, if non-degenerate
    /// and road-free.
    fn interior(&self, row: usize, col: usize) -> Option<(usize, usize, usize, usize)> {
        let start_row = row + self.thickness;
        let start_col = col + self.thickness;
        let end_row = (row + self.spacing - 1).min(self.grid.rows() - 1);
        let end_col = (col + self.spacing - 1).min(self.grid.cols() - 1);

        if end_row <= start_row || end_col <= start_col {
            return None;
        }

        if self
            .grid
            .any_road_in((start_row, end_row), (start_col, end_col))
        {
            return None;
        }

        Some((start_row, end_row, start_col, end_col))
    }

    fn advance(&mut self) {
        self.col += self.spacing;
        if self.col >= self.grid.cols() {
            self.col = 0;
            self.row += self.spacing;
        }
    }
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.grid.cols() == 0 {
            return None;
        }

        while self.row < self.grid.rows() {
            let (row, col) = (self.row, self.col);
            self.advance();

            let Some((start_row, end_row, start_col, end_col)) = self.interior(row, col) else {
                continue;
            };

            let centroid = Vec2::new(
                (start_col + end_col) as f32 * 0.5,
                (start_row + end_row) as f32 * 0.5,
            );
            let normalized_distance = self.grid.center().normalized_distance(
                centroid,
                self.grid.rows(),
                self.grid.cols(),
            );

            let block = Block {
                index: self.emitted,
                start_row,
                end_row,
                start_col,
                end_col,
                centroid,
                normalized_distance,
                tier: DensityTier::from_normalized_distance(normalized_distance),
            };
            self.emitted += 1;
            return Some(block);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::road_generator::{RoadLayoutConfig, RoadLayoutPlanner};

    #[test]
    fn empty_grid_yields_full_tiles() {
        let grid = OccupancyGrid::new(10, 10);
        let blocks: Vec<_> = subdivide(&grid, 5, 1).collect();

        assert_eq!(blocks.len(), 4);
        assert_eq!(
            (blocks[0].start_row, blocks[0].end_row, blocks[0].start_col, blocks[0].end_col),
            (1, 4, 1, 4)
        );
        // Row-major order
        assert_eq!((blocks[1].start_row, blocks[1].start_col), (1, 6));
        assert_eq!((blocks[2].start_row, blocks[2].start_col), (6, 1));
        assert!(blocks.iter().enumerate().all(|(i, b)| b.index == i));
    }

    #[test]
    fn high_edges_are_clamped_and_degenerate_tiles_skipped() {
        // 12 cols: tiles at 0, 5, 10. The last tile's interior is col 11..=11,
        // which is degenerate.
        let grid = OccupancyGrid::new(5, 12);
        let blocks: Vec<_> = subdivide(&grid, 5, 1).collect();
        assert_eq!(blocks.len(), 2);

        let grid = OccupancyGrid::new(5, 13);
        let blocks: Vec<_> = subdivide(&grid, 5, 1).collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!((blocks[2].start_col, blocks[2].end_col), (11, 12));
    }

    #[test]
    fn blocks_touching_a_road_are_rejected() {
        let mut grid = OccupancyGrid::new(10, 10);
        grid.set_road(3, 3);
        let blocks: Vec<_> = subdivide(&grid, 5, 1).collect();
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| b.start_row != 1 || b.start_col != 1));
    }

    #[test]
    fn accepted_blocks_never_contain_roads() {
        let config = RoadLayoutConfig::default();
        let grid = RoadLayoutPlanner::generate(&config).unwrap();
        let blocks: Vec<_> =
            subdivide(&grid, config.grid.block_spacing, config.grid.thickness).collect();

        assert!(!blocks.is_empty());
        for block in &blocks {
            for r in block.start_row..=block.end_row {
                for c in block.start_col..=block.end_col {
                    assert!(!grid.is_road(r, c), "block {} contains road", block.index);
                }
            }
        }
    }

    #[test]
    fn tier_follows_centroid_distance() {
        let grid = OccupancyGrid::new(60, 60);
        for block in subdivide(&grid, 5, 1) {
            let expected = grid.center().normalized_distance(block.centroid, 60, 60);
            assert_eq!(block.normalized_distance, expected);
            assert_eq!(block.tier, DensityTier::from_normalized_distance(expected));
        }

        let tiers: Vec<_> = subdivide(&grid, 5, 1).map(|b| b.tier).collect();
        assert!(tiers.contains(&DensityTier::Core));
        assert!(tiers.contains(&DensityTier::Middle));
        assert!(tiers.contains(&DensityTier::Edge));
    }

    #[test]
    fn each_call_restarts_the_walk() {
        let grid = OccupancyGrid::new(10, 10);
        let mut first = subdivide(&grid, 5, 1);
        first.next();
        assert_eq!(first.count(), 3);
        assert_eq!(subdivide(&grid, 5, 1).count(), 4);
    }
}
