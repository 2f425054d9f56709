use rand::Rng;

use super::{exhausted, extend_trail};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid, Route, Side},
};

struct Walk {
    pos: Coord,
    heading: Option<Side>,
    moves: usize,
    done: bool,
}

/// Wanders at random, turning back only at dead ends. Not guaranteed to terminate.
pub struct RandomMouse {
    grid: Grid,
    route: Route,
    rng: SeededRng,
    walk: Option<Walk>,
}

impl RandomMouse {
    pub fn new(grid: Grid, start: Coord, end: Coord, seed: Option<u64>) -> Self {
        RandomMouse {
            grid,
            route: Route::new(start, end),
            rng: SeededRng::new(seed),
            walk: None,
        }
    }
}

impl Algorithm for RandomMouse {
    fn label(&self) -> &'static str {
        "Random Mouse"
    }

    fn init(&mut self) {
        self.grid.reset_cells();
        self.route.clear();
        self.rng.restart();
        let start = self.route.start();
        extend_trail(&mut self.grid, &mut self.route, start);
        self.walk = Some(Walk {
            pos: start,
            heading: None,
            moves: 0,
            done: start == self.route.end(),
        });
    }

    fn is_initialized(&self) -> bool {
        self.walk.is_some()
    }

    fn is_complete(&self) -> bool {
        self.walk.as_ref().is_some_and(|walk| walk.done)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(walk) = self.walk.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if walk.done {
            return Ok(());
        }
        let mut sides = self
            .grid
            .open_neighbors(walk.pos)
            .map(|(side, _)| side)
            .collect::<Vec<_>>();
        if sides.len() > 1
            && let Some(heading) = walk.heading
        {
            sides.retain(|&side| side != heading.opposite());
        }
        if sides.is_empty() {
            walk.done = true;
            return Ok(());
        }
        let side = sides[self.rng.rng().random_range(0..sides.len())];
        walk.heading = Some(side);
        walk.pos = side.step(walk.pos);
        walk.moves += 1;
        extend_trail(&mut self.grid, &mut self.route, walk.pos);
        walk.done = walk.pos == self.route.end();
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AlgorithmError> {
        if self.route.is_complete() {
            return Ok(());
        }
        let explored = self.walk.as_ref().map_or(0, |walk| walk.moves);
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
