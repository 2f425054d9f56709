use super::{clear_exits, exhausted, extend_trail, mark_exit, wall_follower::Hand};
use crate::{
    algorithm::{Algorithm, AlgorithmError, warn_uninitialized},
    maze::{Coord, Grid, Route, Side},
};

struct Walk {
    pos: Coord,
    heading: Side,
    /// Net quarter turns since the walker started following a wall.
    counter: i32,
    following: bool,
    /// Set once the walker keeps its right hand on the wall for good.
    fallback: bool,
    moves: usize,
    done: bool,
}

/// The Pledge algorithm, heading for the end cell.
///
/// Walks straight in a preferred direction, and follows the wall with the right hand
/// whenever blocked until the turn counter is back at zero. Moves are recorded in the cell
/// tags. The first repeated move hands over to a plain right-hand walk, which stops at its
/// own first repeat.
pub struct Pledge {
    grid: Grid,
    route: Route,
    walk: Option<Walk>,
}

impl Pledge {
    pub fn new(grid: Grid, start: Coord, end: Coord) -> Self {
        Pledge {
            grid,
            route: Route::new(start, end),
            walk: None,
        }
    }

    /// The axis direction that closes most of the distance to the end.
    fn preferred(&self) -> Side {
        let (sr, sc) = self.route.start();
        let (er, ec) = self.route.end();
        let dr = er as isize - sr as isize;
        let dc = ec as isize - sc as isize;
        if dc.abs() >= dr.abs() && dc != 0 {
            if dc > 0 { Side::Right } else { Side::Left }
        } else if dr < 0 {
            Side::Up
        } else {
            Side::Down
        }
    }

    fn next_move(&mut self, walk: &mut Walk) -> Option<Side> {
        if walk.fallback {
            let (side, _) = Hand::Right.follow(&self.grid, walk.pos, walk.heading)?;
            return mark_exit(&mut self.grid, walk.pos, side).then_some(side);
        }
        let side = self.rule_move(walk)?;
        if mark_exit(&mut self.grid, walk.pos, side) {
            return Some(side);
        }
        tracing::debug!("[pledge] rule is looping, keeping to the wall");
        walk.fallback = true;
        clear_exits(&mut self.grid);
        self.next_move(walk)
    }

    fn rule_move(&self, walk: &mut Walk) -> Option<Side> {
        let preferred = self.preferred();
        if walk.following && walk.counter == 0 && self.grid.is_open(walk.pos, preferred) {
            walk.following = false;
        }
        if !walk.following {
            if self.grid.is_open(walk.pos, preferred) {
                return Some(preferred);
            }
            // Turn away from the obstacle so the wall ends up on the right
            walk.following = true;
            let (side, turn) = [
                (preferred.turn_left(), -1),
                (preferred.opposite(), -2),
                (preferred.turn_right(), 1),
            ]
            .into_iter()
            .find(|&(side, _)| self.grid.is_open(walk.pos, side))?;
            walk.counter += turn;
            return Some(side);
        }
        let (side, turn) = Hand::Right.follow(&self.grid, walk.pos, walk.heading)?;
        walk.counter += turn;
        Some(side)
    }
}

impl Algorithm for Pledge {
    fn label(&self) -> &'static str {
        "Pledge"
    }

    fn init(&mut self) {
        self.grid.reset_cells();
        self.route.clear();
        let start = self.route.start();
        extend_trail(&mut self.grid, &mut self.route, start);
        self.walk = Some(Walk {
            pos: start,
            heading: self.preferred(),
            counter: 0,
            following: false,
            fallback: false,
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
        let Some(mut walk) = self.walk.take() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if !walk.done {
            match self.next_move(&mut walk) {
                Some(side) => {
                    walk.heading = side;
                    walk.pos = side.step(walk.pos);
                    walk.moves += 1;
                    extend_trail(&mut self.grid, &mut self.route, walk.pos);
                    walk.done = walk.pos == self.route.end();
                }
                None => walk.done = true,
            }
        }
        self.walk = Some(walk);
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
