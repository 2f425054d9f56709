use super::{VISITED, pick};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Grid, Side},
};

/// Opens either the upper or the right wall of each cell, one cell per step.
pub struct BinaryTree {
    grid: Grid,
    rng: SeededRng,
    /// Row-major index of the next cell.
    cursor: Option<usize>,
}

impl BinaryTree {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        BinaryTree {
            grid,
            rng: SeededRng::new(seed),
            cursor: None,
        }
    }
}

impl Algorithm for BinaryTree {
    fn label(&self) -> &'static str {
        "Binary Tree"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        self.cursor = Some(0);
    }

    fn is_initialized(&self) -> bool {
        self.cursor.is_some()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor >= self.grid.cell_count())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(cursor) = self.cursor.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if *cursor >= self.grid.cell_count() {
            return Ok(());
        }
        let cell = (*cursor / self.grid.cols(), *cursor % self.grid.cols());
        *cursor += 1;

        let sides = [Side::Up, Side::Right]
            .into_iter()
            .filter(|side| self.grid.in_bounds(side.step(cell)))
            .collect::<Vec<_>>();
        // The top-right corner has neither
        if let Some(side) = pick(&sides, self.rng.rng()) {
            self.grid.carve(cell, side);
        }
        self.grid.set_cell(cell, VISITED);
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
    fn test_top_row_and_right_column_are_corridors() {
        let mut tree = BinaryTree::new(Grid::new(5, 6).unwrap(), Some(12));
        tree.init();
        assert_eq!(complete(&mut tree).unwrap(), 30);
        let grid = tree.grid();
        assert!((0..5).all(|col| grid.is_open((0, col), Side::Right)));
        assert!((1..5).all(|row| grid.is_open((row, 5), Side::Up)));
    }
}
