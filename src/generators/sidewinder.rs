use rand::Rng;

use super::VISITED;
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Grid, Side},
};

struct Sweep {
    /// Row-major index of the next cell.
    cursor: usize,
    /// Column where the current run began.
    run_start: usize,
}

/// Row-by-row runs, each closed by a single opening into the row above.
pub struct Sidewinder {
    grid: Grid,
    rng: SeededRng,
    sweep: Option<Sweep>,
}

impl Sidewinder {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        Sidewinder {
            grid,
            rng: SeededRng::new(seed),
            sweep: None,
        }
    }
}

impl Algorithm for Sidewinder {
    fn label(&self) -> &'static str {
        "Sidewinder"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        self.sweep = Some(Sweep {
            cursor: 0,
            run_start: 0,
        });
    }

    fn is_initialized(&self) -> bool {
        self.sweep.is_some()
    }

    fn is_complete(&self) -> bool {
        self.sweep
            .as_ref()
            .is_some_and(|sweep| sweep.cursor >= self.grid.cell_count())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(sweep) = self.sweep.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        let cols = self.grid.cols();
        if sweep.cursor >= self.grid.cell_count() {
            return Ok(());
        }
        let (row, col) = (sweep.cursor / cols, sweep.cursor % cols);
        sweep.cursor += 1;
        self.grid.set_cell((row, col), VISITED);

        let at_row_end = col + 1 == cols;
        if row == 0 {
            // Nothing above, the first row is one corridor
            if !at_row_end {
                self.grid.carve((row, col), Side::Right);
            }
        } else if at_row_end || self.rng.rng().random_bool(0.5) {
            let up = self.rng.rng().random_range(sweep.run_start..=col);
            self.grid.carve((row, up), Side::Up);
            sweep.run_start = col + 1;
        } else {
            self.grid.carve((row, col), Side::Right);
        }
        if at_row_end {
            sweep.run_start = 0;
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
    fn test_each_run_opens_up_once() {
        let mut sidewinder = Sidewinder::new(Grid::new(6, 7).unwrap(), Some(21));
        sidewinder.init();
        complete(&mut sidewinder).unwrap();
        let grid = sidewinder.grid();
        assert!((0..6).all(|col| grid.is_open((0, col), Side::Right)));
        for row in 1..6 {
            // Runs are separated by closed right walls; each has exactly one upward opening
            let mut ups = 0;
            for col in 0..7 {
                if grid.is_open((row, col), Side::Up) {
                    ups += 1;
                }
                if !grid.is_open((row, col), Side::Right) {
                    assert_eq!(ups, 1, "row {row} col {col}");
                    ups = 0;
                }
            }
        }
    }
}
