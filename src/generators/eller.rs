use std::collections::BTreeMap;

use rand::Rng;

use super::pick;
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Grid, Side, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Join horizontally adjacent cells of different sets.
    Merge,
    /// Carry every set at least once into the next row.
    Drop,
}

struct Sweep {
    row: usize,
    phase: Phase,
    /// Next unused set id.
    next_id: Value,
    done: bool,
}

/// Eller's algorithm. Cell tags hold the id of the set each cell of the current row belongs to.
///
/// One step is either the merge or the drop phase of a single row.
pub struct Eller {
    grid: Grid,
    rng: SeededRng,
    sweep: Option<Sweep>,
}

impl Eller {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        Eller {
            grid,
            rng: SeededRng::new(seed),
            sweep: None,
        }
    }

    fn merge_row(&mut self, sweep: &mut Sweep) {
        let row = sweep.row;
        let cols = self.grid.cols();
        let last_row = row + 1 == self.grid.rows();

        for col in 0..cols {
            if self.grid.cell((row, col)) == 0 {
                self.grid.set_cell((row, col), sweep.next_id);
                sweep.next_id += 1;
            }
        }
        for col in 0..cols.saturating_sub(1) {
            let here = self.grid.cell((row, col));
            let there = self.grid.cell((row, col + 1));
            // The last row must end up as a single set
            if here != there && (last_row || self.rng.rng().random_bool(0.5)) {
                self.grid.carve((row, col), Side::Right);
                let (keep, replace) = (here.min(there), here.max(there));
                for c in 0..cols {
                    if self.grid.cell((row, c)) == replace {
                        self.grid.set_cell((row, c), keep);
                    }
                }
            }
        }
        if last_row {
            sweep.done = true;
        } else {
            sweep.phase = Phase::Drop;
        }
    }

    fn drop_row(&mut self, sweep: &mut Sweep) {
        let row = sweep.row;
        let mut sets: BTreeMap<Value, Vec<usize>> = BTreeMap::new();
        for col in 0..self.grid.cols() {
            sets.entry(self.grid.cell((row, col))).or_default().push(col);
        }
        for (id, cols) in sets {
            let mut down = cols
                .iter()
                .copied()
                .filter(|_| self.rng.rng().random_bool(0.5))
                .collect::<Vec<_>>();
            if down.is_empty() {
                down.extend(pick(&cols, self.rng.rng()));
            }
            for col in down {
                self.grid.carve((row, col), Side::Down);
                self.grid.set_cell((row + 1, col), id);
            }
        }
        sweep.row += 1;
        sweep.phase = Phase::Merge;
    }
}

impl Algorithm for Eller {
    fn label(&self) -> &'static str {
        "Eller"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        self.sweep = Some(Sweep {
            row: 0,
            phase: Phase::Merge,
            next_id: 1,
            done: false,
        });
    }

    fn is_initialized(&self) -> bool {
        self.sweep.is_some()
    }

    fn is_complete(&self) -> bool {
        self.sweep.as_ref().is_some_and(|sweep| sweep.done)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(mut sweep) = self.sweep.take() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if !sweep.done {
            match sweep.phase {
                Phase::Merge => self.merge_row(&mut sweep),
                Phase::Drop => self.drop_row(&mut sweep),
            }
        }
        self.sweep = Some(sweep);
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
    fn test_two_steps_per_row() {
        let mut eller = Eller::new(Grid::new(7, 5).unwrap(), Some(4));
        eller.init();
        // A merge and a drop for every row but the last, which only merges
        assert_eq!(complete(&mut eller).unwrap(), 13);
    }

    #[test]
    fn test_last_row_is_one_set() {
        let mut eller = Eller::new(Grid::new(4, 8).unwrap(), Some(30));
        eller.init();
        complete(&mut eller).unwrap();
        let grid = eller.grid();
        let first = grid.cell((3, 0));
        assert!((0..8).all(|col| grid.cell((3, col)) == first));
    }

    #[test]
    fn test_every_set_drops() {
        let mut eller = Eller::new(Grid::new(3, 9).unwrap(), Some(2));
        eller.init();
        eller.step().unwrap();
        let grid = eller.grid().clone();
        eller.step().unwrap();
        let mut ids = (0..9).map(|col| grid.cell((0, col))).collect::<Vec<_>>();
        ids.dedup();
        for id in ids {
            assert!(
                (0..9).any(|col| grid.cell((0, col)) == id && eller.grid().is_open((0, col), Side::Down)),
                "set {id} never dropped"
            );
        }
    }
}
