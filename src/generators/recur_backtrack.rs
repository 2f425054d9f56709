use super::{PENDING, UNVISITED, VISITED, pick, random_cell, tagged_neighbors};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid},
};

/// Depth-first carving with an explicit stack.
///
/// Cells retreated from are tagged `PENDING` so the backtracking front shows up in renders.
pub struct RecurBacktrack {
    grid: Grid,
    rng: SeededRng,
    stack: Option<Vec<Coord>>,
}

impl RecurBacktrack {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        RecurBacktrack {
            grid,
            rng: SeededRng::new(seed),
            stack: None,
        }
    }
}

impl Algorithm for RecurBacktrack {
    fn label(&self) -> &'static str {
        "Recursive Backtracking"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        let start = random_cell(&self.grid, self.rng.rng());
        self.grid.set_cell(start, VISITED);
        self.stack = Some(vec![start]);
    }

    fn is_initialized(&self) -> bool {
        self.stack.is_some()
    }

    fn is_complete(&self) -> bool {
        self.stack.as_ref().is_some_and(|stack| stack.is_empty())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(stack) = self.stack.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        let Some(&cell) = stack.last() else {
            return Ok(());
        };

        let unvisited = tagged_neighbors(&self.grid, cell, UNVISITED);
        match pick(&unvisited, self.rng.rng()) {
            Some((side, next)) => {
                self.grid.carve(cell, side);
                self.grid.set_cell(next, VISITED);
                stack.push(next);
            }
            None => {
                self.grid.set_cell(cell, PENDING);
                stack.pop();
            }
        }
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
    fn test_every_cell_is_retreated_from() {
        let mut backtrack = RecurBacktrack::new(Grid::new(5, 6).unwrap(), Some(3));
        backtrack.init();
        let steps = complete(&mut backtrack).unwrap();
        assert_eq!(steps, 29 + 30);
        let grid = backtrack.grid();
        assert!(grid.coords().all(|c| grid.cell(c) == PENDING));
    }
}
