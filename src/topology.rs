//! Connectivity and cycle analysis of a finished grid.
//!
//! Everything here reads the grid through its accessors and never writes to it.

use std::fmt;

use crate::maze::{Grid, Side};

/// Number of maximal sets of cells reachable from one another.
///
/// Sweeps the grid row by row keeping one region id per column. Left of the current column
/// the buffer holds ids of the current row; from the current column on it still holds the
/// row above. A cell open both upwards and leftwards onto two different regions merges
/// them, replacing the larger id with the smaller one across the buffer.
pub fn enclosures(grid: &Grid) -> usize {
    let mut buffer = vec![0usize; grid.cols()];
    let mut next_id = 0;
    let mut added = 0;
    let mut deleted = 0;

    for coord @ (_, col) in grid.coords() {
        let up = grid.is_open(coord, Side::Up).then(|| buffer[col]);
        let left = grid.is_open(coord, Side::Left).then(|| buffer[col - 1]);
        buffer[col] = match (up, left) {
            (Some(up), Some(left)) if up != left => {
                let (keep, gone) = (up.min(left), up.max(left));
                for id in buffer.iter_mut().filter(|id| **id == gone) {
                    *id = keep;
                }
                deleted += 1;
                keep
            }
            (Some(id), _) | (None, Some(id)) => id,
            (None, None) => {
                next_id += 1;
                added += 1;
                next_id
            }
        };
    }
    added - deleted
}

/// Number of independent cycles in the passages.
///
/// A perfect maze has `R*C - 1` openings. Each extra opening inside a region closes a loop
/// around an islet, and each missing link between regions leaves one more enclosure.
pub fn islets(grid: &Grid) -> usize {
    islets_from(grid.open_walls(), grid.cell_count(), enclosures(grid))
}

fn islets_from(openings: usize, cells: usize, enclosures: usize) -> usize {
    (openings + enclosures).saturating_sub(cells)
}

pub fn is_connected(grid: &Grid) -> bool {
    enclosures(grid) == 1
}

pub fn is_perfect(grid: &Grid) -> bool {
    let enclosures = enclosures(grid);
    enclosures == 1 && islets_from(grid.open_walls(), grid.cell_count(), enclosures) == 0
}

/// Summary of one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub enclosures: usize,
    pub islets: usize,
    /// Open interior walls.
    pub openings: usize,
}

impl Topology {
    pub fn is_connected(&self) -> bool {
        self.enclosures == 1
    }

    pub fn is_perfect(&self) -> bool {
        self.is_connected() && self.islets == 0
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} enclosure(s), {} islet(s), {} opening(s)",
            self.enclosures, self.islets, self.openings
        )?;
        if self.is_perfect() {
            write!(f, " - perfect")?;
        }
        Ok(())
    }
}

pub fn analyze(grid: &Grid) -> Topology {
    let enclosures = enclosures(grid);
    let openings = grid.open_walls();
    let topology = Topology {
        enclosures,
        islets: islets_from(openings, grid.cell_count(), enclosures),
        openings,
    };
    tracing::debug!("[topology] {topology}");
    topology
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Union-find over the whole grid, counting components and redundant openings.
    fn reference(grid: &Grid) -> (usize, usize) {
        let cols = grid.cols();
        let mut parent = (0..grid.cell_count()).collect::<Vec<_>>();
        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }
        let mut components = grid.cell_count();
        let mut cycles = 0;
        for (row, col) in grid.coords() {
            for side in [Side::Right, Side::Down] {
                if !grid.is_open((row, col), side) {
                    continue;
                }
                let (nr, nc) = side.step((row, col));
                let a = root(&mut parent, row * cols + col);
                let b = root(&mut parent, nr * cols + nc);
                if a == b {
                    cycles += 1;
                } else {
                    parent[a] = b;
                    components -= 1;
                }
            }
        }
        (components, cycles)
    }

    const SPIRAL: &str = "\
+-+-+-+-+
|       |
+-+-+-+ +
|     | |
+ +-+ + +
|   |   |
+-+-+-+-+
";

    fn six_regions() -> Grid {
        let mut grid = Grid::new(6, 7).unwrap();
        let right = [
            // Top-left square, whose four openings circle one islet
            (0, 0),
            (1, 0),
            // Top-right comb
            (0, 2),
            (0, 3),
            (0, 4),
            (0, 5),
            (1, 2),
            (1, 4),
            (1, 5),
            // Middle band
            (2, 0),
            (2, 1),
            (2, 3),
            (2, 4),
            (2, 5),
            (3, 0),
            (3, 1),
            (3, 2),
            (3, 3),
            (3, 4),
            (3, 5),
            // Three small blocks at the bottom
            (4, 0),
            (5, 0),
            (4, 2),
            (5, 2),
            (4, 4),
            (4, 5),
            (5, 4),
            (5, 5),
        ];
        let down = [
            (0, 0),
            (0, 1),
            (0, 2),
            (0, 4),
            (2, 0),
            (2, 6),
            (4, 0),
            (4, 2),
            (4, 6),
        ];
        for coord in right {
            grid.carve(coord, Side::Right);
        }
        for coord in down {
            grid.carve(coord, Side::Down);
        }
        grid
    }

    #[test]
    fn test_single_loop_spiral() {
        let grid = Grid::from_ascii(SPIRAL).unwrap();
        assert_eq!(enclosures(&grid), 1);
        assert_eq!(islets(&grid), 0);
        assert!(is_connected(&grid));
        assert!(is_perfect(&grid));
    }

    #[test]
    fn test_six_regions_one_islet() {
        let grid = six_regions();
        assert_eq!(grid.open_walls(), 37);
        assert_eq!(enclosures(&grid), 6);
        assert_eq!(islets(&grid), 1);
        assert!(!is_connected(&grid));
        assert!(!is_perfect(&grid));
        assert_eq!(reference(&grid), (6, 1));
    }

    #[test]
    fn test_closed_and_open_grids() {
        let mut grid = Grid::new(4, 5).unwrap();
        assert_eq!(enclosures(&grid), 20);
        assert_eq!(islets(&grid), 0);
        grid.open_interior();
        assert_eq!(enclosures(&grid), 1);
        // One islet per interior junction
        assert_eq!(islets(&grid), 3 * 4);
    }

    #[test]
    fn test_merge_reaches_the_row_above() {
        // A U shape: the two arms only meet at the bottom right
        let mut grid = Grid::new(2, 3).unwrap();
        grid.carve((0, 0), Side::Down);
        grid.carve((0, 2), Side::Down);
        grid.carve((1, 0), Side::Right);
        grid.carve((1, 1), Side::Right);
        assert_eq!(enclosures(&grid), 2);
        grid.carve((0, 1), Side::Down);
        assert_eq!(enclosures(&grid), 1);
        assert_eq!(islets(&grid), 0);
    }

    #[test]
    fn test_analyze_summary() {
        let topology = analyze(&Grid::from_ascii(SPIRAL).unwrap());
        assert_eq!(
            topology,
            Topology {
                enclosures: 1,
                islets: 0,
                openings: 11
            }
        );
        assert_eq!(
            topology.to_string(),
            "1 enclosure(s), 0 islet(s), 11 opening(s) - perfect"
        );
    }

    proptest! {
        #[test]
        fn prop_streaming_matches_reference(
            rows in 1usize..7,
            cols in 1usize..7,
            bits in prop::collection::vec(any::<bool>(), 72),
        ) {
            let mut grid = Grid::new(rows, cols).unwrap();
            for (i, coord) in grid.coords().enumerate() {
                if bits[2 * i] {
                    grid.carve(coord, Side::Right);
                }
                if bits[2 * i + 1] {
                    grid.carve(coord, Side::Down);
                }
            }
            let (components, cycles) = reference(&grid);
            prop_assert_eq!(enclosures(&grid), components);
            prop_assert_eq!(islets(&grid), cycles);
            prop_assert_eq!(is_connected(&grid), components == 1);
            prop_assert_eq!(is_perfect(&grid), components == 1 && cycles == 0);
        }
    }
}
