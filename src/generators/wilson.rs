use rand::Rng;

use super::{PENDING, UNVISITED, VISITED, random_cell};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid, Side},
};

struct State {
    /// Cells not yet part of the maze.
    remaining: usize,
    /// The current loop-erased walk, tagged `PENDING` on the grid.
    walk: Vec<Coord>,
    /// Row-major index from which to look for the next walk start.
    cursor: usize,
}

/// Loop-erased random walks from unvisited cells, committed whole once they hit the maze.
pub struct Wilson {
    grid: Grid,
    rng: SeededRng,
    state: Option<State>,
}

impl Wilson {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        Wilson {
            grid,
            rng: SeededRng::new(seed),
            state: None,
        }
    }
}

impl Algorithm for Wilson {
    fn label(&self) -> &'static str {
        "Wilson"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        let root = random_cell(&self.grid, self.rng.rng());
        self.grid.set_cell(root, VISITED);
        self.state = Some(State {
            remaining: self.grid.cell_count() - 1,
            walk: Vec::new(),
            cursor: 0,
        });
    }

    fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn is_complete(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.remaining == 0)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        if self.is_complete() {
            return Ok(());
        }
        let Some(state) = self.state.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        let cols = self.grid.cols();

        let Some(&head) = state.walk.last() else {
            // Start a new walk from the first cell outside the maze
            while state.cursor < self.grid.cell_count() {
                let coord = (state.cursor / cols, state.cursor % cols);
                if self.grid.cell(coord) == UNVISITED {
                    self.grid.set_cell(coord, PENDING);
                    state.walk.push(coord);
                    break;
                }
                state.cursor += 1;
            }
            return Ok(());
        };

        let sides = self
            .grid
            .neighbors(head)
            .map(|(side, _)| side)
            .collect::<Vec<_>>();
        let side = sides[self.rng.rng().random_range(0..sides.len())];
        let next = side.step(head);

        match self.grid.cell(next) {
            VISITED => {
                self.grid.carve(head, side);
                for pair in state.walk.windows(2) {
                    if let Some(side) = Side::between(pair[0], pair[1]) {
                        self.grid.carve(pair[0], side);
                    }
                }
                for &coord in &state.walk {
                    self.grid.set_cell(coord, VISITED);
                }
                state.remaining -= state.walk.len();
                state.walk.clear();
            }
            PENDING => {
                // Erase the loop back to where the walk crossed itself
                while let Some(&last) = state.walk.last() {
                    if last == next {
                        break;
                    }
                    self.grid.set_cell(last, UNVISITED);
                    state.walk.pop();
                }
            }
            _ => {
                self.grid.set_cell(next, PENDING);
                state.walk.push(next);
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
