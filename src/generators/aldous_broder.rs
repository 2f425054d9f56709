use rand::Rng;

use super::{UNVISITED, VISITED, random_cell};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid, Side},
};

struct Walk {
    walker: Coord,
    visited: usize,
}

/// A uniform random walk that carves into every cell the first time it gets there.
pub struct AldousBroder {
    grid: Grid,
    rng: SeededRng,
    walk: Option<Walk>,
}

impl AldousBroder {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        AldousBroder {
            grid,
            rng: SeededRng::new(seed),
            walk: None,
        }
    }
}

impl Algorithm for AldousBroder {
    fn label(&self) -> &'static str {
        "Aldous-Broder"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        let start = random_cell(&self.grid, self.rng.rng());
        self.grid.set_cell(start, VISITED);
        self.walk = Some(Walk {
            walker: start,
            visited: 1,
        });
    }

    fn is_initialized(&self) -> bool {
        self.walk.is_some()
    }

    fn is_complete(&self) -> bool {
        self.walk
            .as_ref()
            .is_some_and(|walk| walk.visited >= self.grid.cell_count())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        if self.is_complete() {
            return Ok(());
        }
        let Some(walk) = self.walk.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };

        // Out-of-range neighbors read as the sentinel, which is never a valid tag
        let sides = Side::ALL
            .into_iter()
            .filter(|side| self.grid.cell(side.step(walk.walker)) != Grid::OUT_OF_RANGE)
            .collect::<Vec<_>>();
        let side = sides[self.rng.rng().random_range(0..sides.len())];
        let next = side.step(walk.walker);
        if self.grid.cell(next) == UNVISITED {
            self.grid.carve(walk.walker, side);
            self.grid.set_cell(next, VISITED);
            walk.visited += 1;
        }
        walk.walker = next;
        Ok(())
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn into_grid(self: Box<Self>) -> Grid {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::complete;

    #[test]
    fn test_visits_every_cell() {
        let mut algorithm = AldousBroder::new(Grid::new(4, 6).unwrap(), Some(2));
        algorithm.init();
        let steps = complete(&mut algorithm).unwrap();
        // A walk needs at least one step per newly visited cell
        assert!(steps >= 23);
        let grid = algorithm.grid();
        assert!(grid.coords().all(|c| grid.cell(c) == VISITED));
    }

    #[test]
    fn test_single_cell_is_complete_after_init() {
        let mut algorithm = AldousBroder::new(Grid::new(1, 1).unwrap(), Some(0));
        algorithm.init();
        assert!(algorithm.is_complete());
    }
}
