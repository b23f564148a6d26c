/// Number of grid directions considered during propagation
pub const DIRECTION_COUNT: usize = 4;

/// Horizontal offset per direction (left, down, right, up)
pub const DX: [i32; DIRECTION_COUNT] = [-1, 0, 1, 0];

/// Vertical offset per direction (left, down, right, up)
pub const DY: [i32; DIRECTION_COUNT] = [0, 1, 0, -1];

/// Index of the opposite direction
pub const OPPOSITE: [usize; DIRECTION_COUNT] = [2, 3, 0, 1];

/// Rectangular grid addressing with periodic or bounded edges
///
/// `boundary_radius` is the pattern size N of the model feeding the solver:
/// on a non-periodic grid, a cell whose N×N window would extend past the
/// right or bottom edge is "on boundary". Boundary cells are never observed
/// and never receive propagation. Tile models use a radius of 1, making every
/// in-grid cell eligible.
#[derive(Clone, Copy, Debug)]
pub struct GridTopology {
    width: usize,
    height: usize,
    periodic: bool,
    boundary_radius: usize,
}

impl GridTopology {
    /// Create a topology for a `width` × `height` grid
    pub const fn new(width: usize, height: usize, periodic: bool, boundary_radius: usize) -> Self {
        Self {
            width,
            height,
            periodic,
            boundary_radius,
        }
    }

    /// Grid width in cells
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Whether the grid wraps at its edges
    pub const fn periodic(&self) -> bool {
        self.periodic
    }

    /// Pattern radius used by the boundary predicate
    pub const fn boundary_radius(&self) -> usize {
        self.boundary_radius
    }

    /// Total number of cells
    pub const fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Linear index of the cell at (x, y)
    pub const fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    /// Coordinates (x, y) of a linear cell index
    pub const fn coordinates(&self, cell: usize) -> (usize, usize) {
        (cell % self.width, cell / self.width)
    }

    /// Whether a cell is excluded from observation and propagation
    pub const fn on_boundary(&self, cell: usize) -> bool {
        let (x, y) = self.coordinates(cell);
        !self.periodic
            && (x + self.boundary_radius > self.width || y + self.boundary_radius > self.height)
    }

    /// Neighbor of a cell in one of the four directions
    ///
    /// Wraps around on periodic grids. On bounded grids returns `None` when
    /// the neighbor would sit outside the grid or on the boundary margin,
    /// which keeps propagation away from cells that can never be observed.
    pub fn neighbor(&self, cell: usize, direction: usize) -> Option<usize> {
        let (x, y) = self.coordinates(cell);
        let dx = DX.get(direction).copied().unwrap_or(0);
        let dy = DY.get(direction).copied().unwrap_or(0);

        let mut nx = x as i32 + dx;
        let mut ny = y as i32 + dy;

        if self.periodic {
            nx = nx.rem_euclid(self.width as i32);
            ny = ny.rem_euclid(self.height as i32);
        } else if nx < 0
            || ny < 0
            || nx + self.boundary_radius as i32 > self.width as i32
            || ny + self.boundary_radius as i32 > self.height as i32
        {
            return None;
        }

        Some(self.index(nx as usize, ny as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::{DIRECTION_COUNT, DX, DY, GridTopology, OPPOSITE};

    #[test]
    fn test_opposite_directions_invert_offsets() {
        for d in 0..DIRECTION_COUNT {
            let o = OPPOSITE[d];
            assert_eq!(DX[d], -DX[o]);
            assert_eq!(DY[d], -DY[o]);
        }
    }

    #[test]
    fn test_periodic_wraparound() {
        let topology = GridTopology::new(4, 3, true, 1);
        // Left from column 0 wraps to column 3
        assert_eq!(topology.neighbor(topology.index(0, 1), 0), Some(topology.index(3, 1)));
        // Up from row 0 wraps to row 2
        assert_eq!(topology.neighbor(topology.index(2, 0), 3), Some(topology.index(2, 2)));
    }

    #[test]
    fn test_bounded_edges_have_no_neighbor() {
        let topology = GridTopology::new(4, 3, false, 1);
        assert_eq!(topology.neighbor(topology.index(0, 1), 0), None);
        assert_eq!(topology.neighbor(topology.index(3, 2), 2), None);
        assert_eq!(topology.neighbor(topology.index(1, 1), 2), Some(topology.index(2, 1)));
    }

    // Tests the N-dependent boundary margin on non-periodic grids
    #[test]
    fn test_boundary_margin_tracks_pattern_radius() {
        let topology = GridTopology::new(5, 5, false, 3);
        assert!(!topology.on_boundary(topology.index(2, 2)));
        assert!(topology.on_boundary(topology.index(3, 0)));
        assert!(topology.on_boundary(topology.index(0, 4)));

        let periodic = GridTopology::new(5, 5, true, 3);
        assert!(!periodic.on_boundary(periodic.index(3, 0)));
    }
}
