use super::{exhausted, extend_trail, mark_exit};
use crate::{
    algorithm::{Algorithm, AlgorithmError, warn_uninitialized},
    maze::{Coord, Grid, Route, Side},
};

/// The hand kept on the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Candidate moves in order of preference, with the quarter turns each one takes.
    /// Right turns count positive.
    pub fn turns(self, heading: Side) -> [(Side, i32); 4] {
        match self {
            Hand::Right => [
                (heading.turn_right(), 1),
                (heading, 0),
                (heading.turn_left(), -1),
                (heading.opposite(), -2),
            ],
            Hand::Left => [
                (heading.turn_left(), -1),
                (heading, 0),
                (heading.turn_right(), 1),
                (heading.opposite(), 2),
            ],
        }
    }

    /// The first open side in order of preference.
    pub fn follow(self, grid: &Grid, pos: Coord, heading: Side) -> Option<(Side, i32)> {
        self.turns(heading)
            .into_iter()
            .find(|&(side, _)| grid.is_open(pos, side))
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hand::Left => write!(f, "left"),
            Hand::Right => write!(f, "right"),
        }
    }
}

struct Walk {
    pos: Coord,
    heading: Side,
    moves: usize,
    done: bool,
}

/// Keeps one hand on the wall.
///
/// Reaches the end on any maze without islets. The route is the walk with loops erased.
/// Moves are recorded in the cell tags, and making one a second time means the walker is
/// circling.
pub struct WallFollower {
    grid: Grid,
    route: Route,
    hand: Hand,
    walk: Option<Walk>,
}

impl WallFollower {
    pub fn new(grid: Grid, start: Coord, end: Coord, hand: Hand) -> Self {
        WallFollower {
            grid,
            route: Route::new(start, end),
            hand,
            walk: None,
        }
    }
}

impl Algorithm for WallFollower {
    fn label(&self) -> &'static str {
        match self.hand {
            Hand::Left => "Wall Follower (left)",
            Hand::Right => "Wall Follower (right)",
        }
    }

    fn init(&mut self) {
        self.grid.reset_cells();
        self.route.clear();
        let start = self.route.start();
        extend_trail(&mut self.grid, &mut self.route, start);
        self.walk = Some(Walk {
            pos: start,
            heading: Side::Right,
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
        let Some((side, _)) = self.hand.follow(&self.grid, walk.pos, walk.heading) else {
            walk.done = true;
            return Ok(());
        };
        if !mark_exit(&mut self.grid, walk.pos, side) {
            tracing::debug!("[{}] walked in a circle", self.hand);
            walk.done = true;
            return Ok(());
        }
        walk.heading = side;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithm::complete, solvers::trail_position};

    #[test]
    fn test_turn_orders_mirror() {
        let right = Hand::Right.turns(Side::Up);
        let left = Hand::Left.turns(Side::Up);
        assert_eq!(right[0], (Side::Right, 1));
        assert_eq!(left[0], (Side::Left, -1));
        assert_eq!(right[1], left[1]);
        assert_eq!(right[3].0, Side::Down);
    }

    #[test]
    fn test_circles_around_an_islet() {
        // Open field with a wall ring around the middle of a 3x3 grid; the end is inside
        let mut grid = Grid::new(3, 3).unwrap();
        grid.open_interior();
        for side in Side::ALL {
            grid.build((1, 1), side);
        }
        let mut follower = WallFollower::new(grid, (0, 0), (1, 1), Hand::Left);
        follower.init();
        let result = complete(&mut follower);
        assert!(matches!(result, Err(AlgorithmError::SearchExhausted { .. })));
    }

    #[test]
    fn test_trail_erases_dead_ends() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.carve((0, 0), Side::Right);
        grid.carve((0, 0), Side::Down);
        grid.carve((1, 0), Side::Right);
        for hand in [Hand::Left, Hand::Right] {
            let mut follower = WallFollower::new(grid.clone(), (0, 0), (1, 1), hand);
            follower.init();
            complete(&mut follower).unwrap();
            assert_eq!(follower.route.path(), &[(0, 0), (1, 0), (1, 1)], "{hand}");
            assert_eq!(trail_position(follower.grid().cell((0, 1))), 0);
        }
    }
}
