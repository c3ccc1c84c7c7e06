//! Road occupancy grid over the tile lattice.

use bevy::prelude::*;

/// State of a single lattice cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GridCell {
    #[default]
    Free,
    Road,
}

/// The city center in grid space: x is the column axis, y the row axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CityCenter(pub Vec2);

impl CityCenter {
    /// Center of a `rows × cols` lattice.
    pub fn of(rows: usize, cols: usize) -> Self {
        Self(Vec2::new(cols as f32 * 0.5, rows as f32 * 0.5))
    }

    /// Squared distance from a cell to the center.
    pub fn distance_sq(&self, row: isize, col: isize) -> f32 {
        let dx = col as f32 - self.0.x;
        let dy = row as f32 - self.0.y;
        dx * dx + dy * dy
    }

    /// Distance from a grid-space point to the center, scaled so that the
    /// lattice half-extent (`max(rows, cols) / 2`) maps to 1.0.
    pub fn normalized_distance(&self, point: Vec2, rows: usize, cols: usize) -> f32 {
        let half_extent = rows.max(cols) as f32 * 0.5;
        point.distance(self.0) / half_extent
    }
}

/// Binary road map over a `rows × cols` lattice.
///
/// Writes go through [`OccupancyGrid::set_road`], which silently drops
/// coordinates outside the lattice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
}

impl OccupancyGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![GridCell::Free; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn center(&self) -> CityCenter {
        CityCenter::of(self.rows, self.cols)
    }

    pub fn in_bounds(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Cell state, or `None` outside the lattice.
    pub fn get(&self, row: isize, col: isize) -> Option<GridCell> {
        if !self.in_bounds(row, col) {
            return None;
        }
        Some(self.cells[row as usize * self.cols + col as usize])
    }

    pub fn is_road(&self, row: usize, col: usize) -> bool {
        self.get(row as isize, col as isize) == Some(GridCell::Road)
    }

    /// Mark a cell as road. Returns false when the cell is out of bounds.
    pub fn set_road(&mut self, row: isize, col: isize) -> bool {
        if !self.in_bounds(row, col) {
            return false;
        }
        let idx = row as usize * self.cols + col as usize;
        self.cells[idx] = GridCell::Road;
        true
    }

    /// Number of road cells.
    pub fn road_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == GridCell::Road).count()
    }

    /// Coordinates of every road cell in row-major order.
    pub fn roads(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == GridCell::Road)
            .map(|(idx, _)| (idx / self.cols, idx % self.cols))
    }

    /// True if any cell of the inclusive rectangle is road.
    pub fn any_road_in(&self, rows: (usize, usize), cols: (usize, usize)) -> bool {
        (rows.0..=rows.1).any(|r| (cols.0..=cols.1).any(|c| self.is_road(r, c)))
    }

    /// One character per cell, `#` for road and `.` for free, one line per row.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in self.cells.chunks(self.cols.max(1)) {
            for cell in row {
                out.push(match cell {
                    GridCell::Road => '#',
                    GridCell::Free => '.',
                });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut grid = OccupancyGrid::new(4, 3);
        assert!(!grid.set_road(-1, 0));
        assert!(!grid.set_road(0, 3));
        assert!(!grid.set_road(4, 0));
        assert_eq!(grid.road_count(), 0);

        assert!(grid.set_road(3, 2));
        assert!(grid.is_road(3, 2));
        assert_eq!(grid.get(3, 2), Some(GridCell::Road));
        assert_eq!(grid.get(5, 5), None);
    }

    #[test]
    fn roads_iterate_row_major() {
        let mut grid = OccupancyGrid::new(3, 3);
        grid.set_road(2, 0);
        grid.set_road(0, 1);
        let roads: Vec<_> = grid.roads().collect();
        assert_eq!(roads, vec![(0, 1), (2, 0)]);
    }

    #[test]
    fn ascii_rendering_marks_roads() {
        let mut grid = OccupancyGrid::new(2, 3);
        grid.set_road(0, 0);
        grid.set_road(1, 2);
        assert_eq!(grid.render_ascii(), "#..\n..#\n");
    }

    #[test]
    fn normalized_distance_uses_larger_extent() {
        let center = CityCenter::of(20, 40);
        assert_eq!(center.0, Vec2::new(20.0, 10.0));
        let d = center.normalized_distance(Vec2::new(30.0, 10.0), 20, 40);
        assert!((d - 0.5).abs() < 1e-6);
    }
}
