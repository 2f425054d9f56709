use super::exhausted;
use crate::{
    algorithm::{Algorithm, AlgorithmError, warn_uninitialized},
    maze::{Coord, Grid, Route, Value},
};

const FILLED: Value = 1;
/// Open cells the extraction walk has entered.
const WALKED: Value = 2;

/// How dead ends are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Sweep the grid cell by cell, repeating full passes until one fills nothing.
    Scan,
    /// Keep a stack of known dead ends and follow each one inward.
    Tracked,
}

struct Filling {
    /// Known dead ends, for the tracked variant.
    pending: Vec<Coord>,
    /// Row-major position of the scan, for the scan variant.
    cursor: usize,
    /// Cells filled during the current scan pass.
    fills: usize,
    done: bool,
}

/// Dead-end filling.
///
/// Cells with at most one open, unfilled neighbor are filled (tagged `1`) until none are
/// left. The start and end cells are never filled. `finish` extracts the route from what
/// remains open with a backtracking walk that marks its cells in the grid, and clears the
/// marks once done.
pub struct DeadEndFill {
    grid: Grid,
    route: Route,
    fill: Fill,
    filling: Option<Filling>,
}

impl DeadEndFill {
    pub fn new(grid: Grid, start: Coord, end: Coord, fill: Fill) -> Self {
        DeadEndFill {
            grid,
            route: Route::new(start, end),
            fill,
            filling: None,
        }
    }

    fn is_dead_end(&self, coord: Coord) -> bool {
        if coord == self.route.start()
            || coord == self.route.end()
            || self.grid.cell(coord) != 0
        {
            return false;
        }
        self.grid
            .open_neighbors(coord)
            .filter(|&(_, c)| self.grid.cell(c) != FILLED)
            .count()
            <= 1
    }

    fn fill_cell(&mut self, coord: Coord) -> bool {
        if !self.is_dead_end(coord) {
            return false;
        }
        self.grid.set_cell(coord, FILLED);
        true
    }

    fn step_tracked(&mut self, filling: &mut Filling) {
        if let Some(coord) = filling.pending.pop()
            && self.fill_cell(coord)
        {
            // The one way out may have become a dead end in turn
            let inward = self
                .grid
                .open_neighbors(coord)
                .map(|(_, c)| c)
                .filter(|&c| self.is_dead_end(c))
                .collect::<Vec<_>>();
            filling.pending.extend(inward);
        }
        filling.done = filling.pending.is_empty();
    }

    fn step_scan(&mut self, filling: &mut Filling) {
        let cols = self.grid.cols();
        let coord = (filling.cursor / cols, filling.cursor % cols);
        if self.fill_cell(coord) {
            filling.fills += 1;
        }
        filling.cursor += 1;
        if filling.cursor == self.grid.cell_count() {
            filling.done = filling.fills == 0;
            filling.cursor = 0;
            filling.fills = 0;
        }
    }
}

impl Algorithm for DeadEndFill {
    fn label(&self) -> &'static str {
        match self.fill {
            Fill::Scan => "Dead-end Filling (scan)",
            Fill::Tracked => "Dead-end Filling (tracked)",
        }
    }

    fn init(&mut self) {
        self.grid.reset_cells();
        self.route.clear();
        let pending = match self.fill {
            Fill::Scan => Vec::new(),
            Fill::Tracked => self
                .grid
                .coords()
                .filter(|&c| self.is_dead_end(c))
                .collect::<Vec<_>>(),
        };
        self.filling = Some(Filling {
            done: self.fill == Fill::Tracked && pending.is_empty(),
            pending,
            cursor: 0,
            fills: 0,
        });
    }

    fn is_initialized(&self) -> bool {
        self.filling.is_some()
    }

    fn is_complete(&self) -> bool {
        self.filling.as_ref().is_some_and(|filling| filling.done)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(mut filling) = self.filling.take() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if !filling.done {
            match self.fill {
                Fill::Scan => self.step_scan(&mut filling),
                Fill::Tracked => self.step_tracked(&mut filling),
            }
        }
        self.filling = Some(filling);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AlgorithmError> {
        let (start, end) = (self.route.start(), self.route.end());
        let open = self
            .grid
            .coords()
            .filter(|&c| self.grid.cell(c) != FILLED)
            .count();
        if !self.grid.in_bounds(start) || !self.grid.in_bounds(end) {
            return Err(exhausted(self.label(), 0));
        }

        self.grid.set_cell(start, WALKED);
        let mut path = vec![start];
        while let Some(&current) = path.last() {
            if current == end {
                break;
            }
            let next = self
                .grid
                .open_neighbors(current)
                .map(|(_, c)| c)
                .find(|&c| self.grid.cell(c) == 0);
            match next {
                Some(c) => {
                    self.grid.set_cell(c, WALKED);
                    path.push(c);
                }
                None => {
                    path.pop();
                }
            }
        }
        for coord in self.grid.coords() {
            if self.grid.cell(coord) == WALKED {
                self.grid.set_cell(coord, 0);
            }
        }
        if path.last() != Some(&end) {
            return Err(exhausted(self.label(), open));
        }
        self.route.set_path(path);
        Ok(())
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
