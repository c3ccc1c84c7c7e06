//! World management: the tile lattice and its mapping into world space.

use bevy::prelude::*;

pub mod grid;

use grid::CityCenter;

/// Side length of one grid tile in world units.
pub const TILE_WORLD_SIZE: f32 = 10.0;

/// Placement of the tile lattice in world space.
///
/// Cell `(row, col)` covers `[col, col + 1) × [row, row + 1)` tiles, shifted so
/// that the city center lands on `origin`. Columns run along +X and rows along +Z.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Size of a single tile in world units.
    pub tile_size: f32,
    /// World position of the city center.
    pub origin: Vec3,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_WORLD_SIZE,
            origin: Vec3::ZERO,
        }
    }
}

impl WorldConfig {
    /// World-space (x, z) of the lattice corner at row 0, col 0.
    pub fn lattice_offset(&self, center: CityCenter) -> Vec2 {
        Vec2::new(self.origin.x, self.origin.z) - center.0 * self.tile_size
    }

    /// World position of the middle of a cell, at ground height.
    pub fn cell_center(&self, row: usize, col: usize, center: CityCenter) -> Vec3 {
        let offset = self.lattice_offset(center);
        Vec3::new(
            (col as f32 + 0.5) * self.tile_size + offset.x,
            self.origin.y,
            (row as f32 + 0.5) * self.tile_size + offset.y,
        )
    }

    /// World-space (x, z) rectangle covered by an inclusive range of cells.
    pub fn cell_span(
        &self,
        rows: (usize, usize),
        cols: (usize, usize),
        center: CityCenter,
    ) -> Rect {
        let offset = self.lattice_offset(center);
        Rect::new(
            cols.0 as f32 * self.tile_size + offset.x,
            rows.0 as f32 * self.tile_size + offset.y,
            (cols.1 + 1) as f32 * self.tile_size + offset.x,
            (rows.1 + 1) as f32 * self.tile_size + offset.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_cell_touches_origin() {
        let world = WorldConfig::default();
        let center = CityCenter(Vec2::new(30.0, 30.0));

        let span = world.cell_span((30, 30), (30, 30), center);
        assert_eq!(span.min, Vec2::ZERO);
        assert_eq!(span.max, Vec2::splat(10.0));

        let mid = world.cell_center(30, 30, center);
        assert_eq!(mid, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn span_covers_inclusive_cells() {
        let world = WorldConfig {
            tile_size: 10.0,
            origin: Vec3::new(100.0, 2.0, -50.0),
        };
        let center = CityCenter(Vec2::new(5.0, 5.0));
        let span = world.cell_span((1, 4), (1, 2), center);

        assert_eq!(span.width(), 20.0);
        assert_eq!(span.height(), 40.0);
        assert_eq!(span.min, Vec2::new(60.0, -90.0));
    }
}
