use super::{UNVISITED, VISITED, pick, random_cell, tagged_neighbors};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid},
};

struct Hunt {
    /// Head of the random walk; `None` while hunting.
    current: Option<Coord>,
    /// Rows above this one are fully visited.
    hunt_row: usize,
    done: bool,
}

/// Random walks ("kill") that restart from the first unvisited cell next to the maze ("hunt").
pub struct HuntAndKill {
    grid: Grid,
    rng: SeededRng,
    hunt: Option<Hunt>,
}

impl HuntAndKill {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        HuntAndKill {
            grid,
            rng: SeededRng::new(seed),
            hunt: None,
        }
    }

    fn kill(&mut self, hunt: &mut Hunt, cell: Coord) {
        let unvisited = tagged_neighbors(&self.grid, cell, UNVISITED);
        match pick(&unvisited, self.rng.rng()) {
            Some((side, next)) => {
                self.grid.carve(cell, side);
                self.grid.set_cell(next, VISITED);
                hunt.current = Some(next);
            }
            None => hunt.current = None,
        }
    }

    fn hunt(&mut self, hunt: &mut Hunt) {
        for row in hunt.hunt_row..self.grid.rows() {
            let mut row_visited = true;
            for col in 0..self.grid.cols() {
                let cell = (row, col);
                if self.grid.cell(cell) != UNVISITED {
                    continue;
                }
                row_visited = false;
                let visited = tagged_neighbors(&self.grid, cell, VISITED);
                if let Some((side, _)) = pick(&visited, self.rng.rng()) {
                    self.grid.carve(cell, side);
                    self.grid.set_cell(cell, VISITED);
                    hunt.current = Some(cell);
                    return;
                }
            }
            if row_visited && row == hunt.hunt_row {
                hunt.hunt_row += 1;
            }
        }
        hunt.done = true;
    }
}

impl Algorithm for HuntAndKill {
    fn label(&self) -> &'static str {
        "Hunt and Kill"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        let start = random_cell(&self.grid, self.rng.rng());
        self.grid.set_cell(start, VISITED);
        self.hunt = Some(Hunt {
            current: Some(start),
            hunt_row: 0,
            done: false,
        });
    }

    fn is_initialized(&self) -> bool {
        self.hunt.is_some()
    }

    fn is_complete(&self) -> bool {
        self.hunt.as_ref().is_some_and(|hunt| hunt.done)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(mut hunt) = self.hunt.take() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if !hunt.done {
            match hunt.current {
                Some(cell) => self.kill(&mut hunt, cell),
                None => self.hunt(&mut hunt),
            }
        }
        self.hunt = Some(hunt);
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
    fn test_hunt_row_only_moves_forward() {
        let mut algorithm = HuntAndKill::new(Grid::new(8, 8).unwrap(), Some(17));
        algorithm.init();
        let mut last = 0;
        while !algorithm.is_complete() {
            algorithm.step().unwrap();
            let hunt_row = algorithm.hunt.as_ref().unwrap().hunt_row;
            assert!(hunt_row >= last);
            last = hunt_row;
        }
        assert_eq!(last, 8);
    }

    #[test]
    fn test_visits_every_cell() {
        let mut algorithm = HuntAndKill::new(Grid::new(5, 3).unwrap(), None);
        algorithm.init();
        complete(&mut algorithm).unwrap();
        let grid = algorithm.grid();
        assert!(grid.coords().all(|c| grid.cell(c) == VISITED));
    }
}
