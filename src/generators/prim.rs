use rand::Rng;

use super::{PENDING, UNVISITED, VISITED, pick, random_cell, tagged_neighbors};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid},
};

/// Randomized Prim: grows the maze from a random frontier cell each step.
pub struct Prim {
    grid: Grid,
    rng: SeededRng,
    /// Cells adjacent to the maze but not in it yet, tagged `PENDING`.
    frontier: Option<Vec<Coord>>,
}

impl Prim {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        Prim {
            grid,
            rng: SeededRng::new(seed),
            frontier: None,
        }
    }

    fn expand(grid: &mut Grid, frontier: &mut Vec<Coord>, coord: Coord) {
        for (_, neighbor) in tagged_neighbors(grid, coord, UNVISITED) {
            grid.set_cell(neighbor, PENDING);
            frontier.push(neighbor);
        }
    }
}

impl Algorithm for Prim {
    fn label(&self) -> &'static str {
        "Prim"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        let start = random_cell(&self.grid, self.rng.rng());
        self.grid.set_cell(start, VISITED);
        let mut frontier = Vec::new();
        Self::expand(&mut self.grid, &mut frontier, start);
        self.frontier = Some(frontier);
    }

    fn is_initialized(&self) -> bool {
        self.frontier.is_some()
    }

    fn is_complete(&self) -> bool {
        self.frontier.as_ref().is_some_and(|frontier| frontier.is_empty())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(frontier) = self.frontier.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if frontier.is_empty() {
            return Ok(());
        }

        let idx = self.rng.rng().random_range(0..frontier.len());
        let cell = frontier.swap_remove(idx);

        // A frontier cell always touches the maze
        let visited = tagged_neighbors(&self.grid, cell, VISITED);
        if let Some((side, _)) = pick(&visited, self.rng.rng()) {
            self.grid.carve(cell, side);
        }
        self.grid.set_cell(cell, VISITED);
        Self::expand(&mut self.grid, frontier, cell);
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

    #[test]
    fn test_frontier_is_tagged_pending() {
        let mut prim = Prim::new(Grid::new(5, 5).unwrap(), Some(1));
        prim.init();
        for _ in 0..6 {
            prim.step().unwrap();
            let frontier = prim.frontier.as_ref().unwrap();
            assert!(frontier.iter().all(|&c| prim.grid().cell(c) == PENDING));
            let pending = prim
                .grid()
                .coords()
                .filter(|&c| prim.grid().cell(c) == PENDING)
                .count();
            assert_eq!(pending, frontier.len());
        }
    }

    #[test]
    fn test_one_cell_joins_per_step() {
        let mut prim = Prim::new(Grid::new(4, 4).unwrap(), Some(8));
        prim.init();
        let mut steps = 0;
        while !prim.is_complete() {
            prim.step().unwrap();
            steps += 1;
        }
        assert_eq!(steps, 15);
    }
}
