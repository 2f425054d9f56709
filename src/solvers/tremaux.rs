use super::exhausted;
use crate::{
    algorithm::{Algorithm, AlgorithmError, warn_uninitialized},
    maze::{Coord, Grid, Route, Value},
};

/// Tag of a cell on the current path.
const MARKED: Value = 1;
/// Tag of a cell walked back out of.
const DEAD: Value = 2;

/// Trémeaux's algorithm.
///
/// The route doubles as the walker's stack: entering an unmarked cell pushes it, and a cell
/// with nowhere new to go is marked dead and popped.
pub struct Tremaux {
    grid: Grid,
    route: Route,
    done: Option<bool>,
}

impl Tremaux {
    pub fn new(grid: Grid, start: Coord, end: Coord) -> Self {
        Tremaux {
            grid,
            route: Route::new(start, end),
            done: None,
        }
    }
}

impl Algorithm for Tremaux {
    fn label(&self) -> &'static str {
        "Trémaux"
    }

    fn init(&mut self) {
        self.grid.reset_cells();
        self.route.clear();
        let start = self.route.start();
        self.grid.set_cell(start, MARKED);
        self.route.push(start);
        self.done = Some(start == self.route.end());
    }

    fn is_initialized(&self) -> bool {
        self.done.is_some()
    }

    fn is_complete(&self) -> bool {
        self.done == Some(true)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(done) = self.done else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if done {
            return Ok(());
        }
        let Some(current) = self.route.last() else {
            self.done = Some(true);
            return Ok(());
        };

        let next = self
            .grid
            .open_neighbors(current)
            .map(|(_, c)| c)
            .find(|&c| self.grid.cell(c) == 0);
        match next {
            Some(c) => {
                self.grid.set_cell(c, MARKED);
                self.route.push(c);
            }
            None => {
                self.grid.set_cell(current, DEAD);
                self.route.pop();
            }
        }
        self.done = Some(self.route.is_empty() || self.route.last() == Some(self.route.end()));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AlgorithmError> {
        if self.route.is_complete() {
            return Ok(());
        }
        let explored = self.grid.coords().filter(|&c| self.grid.cell(c) != 0).count();
        Err(exhausted(self.label(), explored))
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn into_grid(self: Box<Self>) -> Grid {
        self.grid
    }

    fn route(&self) -> Option<&Route> {
        Some(&self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::complete;

    #[test]
    fn test_dead_branches_are_marked() {
        let mut grid = Grid::new(2, 3).unwrap();
        // (0,0) - (0,1) - (0,2), with (1,1) hanging below the middle and (1,0) below the start
        grid.carve((0, 0), crate::maze::Side::Right);
        grid.carve((0, 1), crate::maze::Side::Right);
        grid.carve((0, 1), crate::maze::Side::Down);
        grid.carve((0, 0), crate::maze::Side::Down);
        let mut tremaux = Tremaux::new(grid, (0, 0), (0, 2));
        tremaux.init();
        complete(&mut tremaux).unwrap();
        assert_eq!(tremaux.route.path(), &[(0, 0), (0, 1), (0, 2)]);
        // Sides are tried in Up, Right, Down, Left order, so neither branch was entered
        assert_eq!(tremaux.grid().cell((1, 1)), 0);
    }

    #[test]
    fn test_backtracks_out_of_dead_ends() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.carve((0, 0), crate::maze::Side::Right);
        grid.carve((0, 0), crate::maze::Side::Down);
        grid.carve((1, 0), crate::maze::Side::Right);
        let mut tremaux = Tremaux::new(grid, (0, 0), (1, 1));
        tremaux.init();
        complete(&mut tremaux).unwrap();
        assert_eq!(tremaux.grid().cell((0, 1)), DEAD);
        assert_eq!(tremaux.route.path(), &[(0, 0), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_unreachable_end_empties_the_stack() {
        let mut tremaux = Tremaux::new(Grid::new(1, 3).unwrap(), (0, 0), (0, 2));
        tremaux.init();
        let result = complete(&mut tremaux);
        assert!(tremaux.route.is_empty());
        assert!(matches!(result, Err(AlgorithmError::SearchExhausted { .. })));
    }
}
