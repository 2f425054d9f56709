use super::exhausted;
use crate::{
    algorithm::{Algorithm, AlgorithmError, warn_uninitialized},
    maze::{Coord, Grid, Route, Value},
};

struct Waves {
    /// The most recent skin.
    skin: Vec<Coord>,
    /// Label carried by every cell of `skin`.
    label: Value,
    done: bool,
}

/// Lee's wavefront router.
///
/// Every cell gets its breadth-first distance from the start plus one as its tag, one skin per
/// step. The route is read back by walking strictly decreasing labels from the end.
pub struct Lee {
    grid: Grid,
    route: Route,
    waves: Option<Waves>,
}

impl Lee {
    pub fn new(grid: Grid, start: Coord, end: Coord) -> Self {
        Lee {
            grid,
            route: Route::new(start, end),
            waves: None,
        }
    }

    /// Label of the end cell, 0 while unreached.
    pub fn end_label(&self) -> Value {
        self.grid.cell(self.route.end()).max(0)
    }
}

impl Algorithm for Lee {
    fn label(&self) -> &'static str {
        "Lee"
    }

    fn init(&mut self) {
        self.grid.reset_cells();
        self.route.clear();
        let start = self.route.start();
        self.grid.set_cell(start, 1);
        self.waves = Some(Waves {
            skin: vec![start],
            label: 1,
            done: self.end_label() > 0,
        });
    }

    fn is_initialized(&self) -> bool {
        self.waves.is_some()
    }

    fn is_complete(&self) -> bool {
        self.waves.as_ref().is_some_and(|waves| waves.done)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(waves) = self.waves.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if waves.done {
            return Ok(());
        }
        let label = waves.label + 1;
        let mut next = Vec::new();
        for &cell in &waves.skin {
            let neighbors = self.grid.open_neighbors(cell).collect::<Vec<_>>();
            for (_, neighbor) in neighbors {
                if self.grid.cell(neighbor) == 0 {
                    self.grid.set_cell(neighbor, label);
                    next.push(neighbor);
                }
            }
        }
        waves.skin = next;
        waves.label = label;
        waves.done = waves.skin.is_empty() || self.grid.cell(self.route.end()) > 0;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AlgorithmError> {
        self.route.clear();
        let end = self.route.end();
        let mut label = self.end_label();
        if label == 0 {
            let explored = self.grid.coords().filter(|&c| self.grid.cell(c) > 0).count();
            return Err(exhausted(self.label(), explored));
        }

        let mut path = vec![end];
        let mut current = end;
        while label > 1 {
            let Some((_, previous)) = self
                .grid
                .open_neighbors(current)
                .find(|&(_, c)| self.grid.cell(c) == label - 1)
            else {
                break;
            };
            path.push(previous);
            current = previous;
            label -= 1;
        }
        path.reverse();
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
