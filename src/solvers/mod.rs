mod dead_end;
mod heur_tree;
mod heuristic;
mod lee;
mod pledge;
mod random_mouse;
mod tremaux;
mod wall_follower;

pub use dead_end::{DeadEndFill, Fill};
pub use heur_tree::{HeurTree, Node};
pub use heuristic::{Cost, HeuristicSearch};
pub use lee::Lee;
pub use pledge::Pledge;
pub use random_mouse::RandomMouse;
pub use tremaux::Tremaux;
pub use wall_follower::{Hand, WallFollower};

use crate::{
    algorithm::{self, Algorithm, AlgorithmError},
    maze::{Coord, Grid, Route, Side, Value},
};

/// The available maze solving strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    AStar,
    Dijkstra,
    PrimJarnik,
    Lee,
    DeadEndScan,
    DeadEndTracked,
    Tremaux,
    Pledge,
    WallFollower(Hand),
    RandomMouse,
}

impl Solver {
    pub const ALL: [Solver; 11] = [
        Solver::AStar,
        Solver::Dijkstra,
        Solver::PrimJarnik,
        Solver::Lee,
        Solver::DeadEndScan,
        Solver::DeadEndTracked,
        Solver::Tremaux,
        Solver::Pledge,
        Solver::WallFollower(Hand::Left),
        Solver::WallFollower(Hand::Right),
        Solver::RandomMouse,
    ];

    /// Binds a new, uninitialized instance of this strategy to `grid`.
    ///
    /// Only the random mouse uses `seed`.
    pub fn build(
        self,
        grid: Grid,
        start: Coord,
        end: Coord,
        seed: Option<u64>,
    ) -> Box<dyn Algorithm> {
        match self {
            Solver::AStar => Box::new(HeuristicSearch::a_star(grid, start, end)),
            Solver::Dijkstra => Box::new(HeuristicSearch::dijkstra(grid, start, end)),
            Solver::PrimJarnik => Box::new(HeuristicSearch::prim_jarnik(grid, start, end)),
            Solver::Lee => Box::new(Lee::new(grid, start, end)),
            Solver::DeadEndScan => Box::new(DeadEndFill::new(grid, start, end, Fill::Scan)),
            Solver::DeadEndTracked => {
                Box::new(DeadEndFill::new(grid, start, end, Fill::Tracked))
            }
            Solver::Tremaux => Box::new(Tremaux::new(grid, start, end)),
            Solver::Pledge => Box::new(Pledge::new(grid, start, end)),
            Solver::WallFollower(hand) => Box::new(WallFollower::new(grid, start, end, hand)),
            Solver::RandomMouse => Box::new(RandomMouse::new(grid, start, end, seed)),
        }
    }
}

impl std::fmt::Display for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::AStar => write!(f, "A* Search"),
            Solver::Dijkstra => write!(f, "Dijkstra's Algorithm"),
            Solver::PrimJarnik => write!(f, "Prim-Jarnik Spanning Search"),
            Solver::Lee => write!(f, "Lee's Wavefront"),
            Solver::DeadEndScan => write!(f, "Dead-end Filling (scan)"),
            Solver::DeadEndTracked => write!(f, "Dead-end Filling (tracked)"),
            Solver::Tremaux => write!(f, "Trémaux's Algorithm"),
            Solver::Pledge => write!(f, "Pledge Algorithm"),
            Solver::WallFollower(hand) => write!(f, "Wall Follower ({hand} hand)"),
            Solver::RandomMouse => write!(f, "Random Mouse"),
        }
    }
}

/// Solves a copy of `grid` from `start` to `end` in one go.
pub fn solve_maze(
    grid: &Grid,
    solver: Solver,
    start: Coord,
    end: Coord,
    seed: Option<u64>,
) -> Result<Route, AlgorithmError> {
    let mut algorithm = solver.build(grid.clone(), start, end, seed);
    algorithm.init();
    let steps = algorithm::complete(algorithm.as_mut())?;
    let route = algorithm.route().cloned().unwrap_or_default();
    tracing::debug!(
        "[solve] {solver} found a {}-cell route in {steps} steps",
        route.len()
    );
    Ok(route)
}

fn exhausted(label: &'static str, explored: usize) -> AlgorithmError {
    tracing::error!("[{label}] search exhausted after {explored} cells");
    AlgorithmError::SearchExhausted { label, explored }
}

/// Low bits of a walker's cell tag: one bit per side the walker has left the cell through.
const EXIT_BITS: u32 = 4;
const EXIT_MASK: Value = (1 << EXIT_BITS) - 1;

/// Position of `tag`'s cell in the trail plus one, or `0` when the cell is off the trail.
fn trail_position(tag: Value) -> usize {
    (tag >> EXIT_BITS) as usize
}

/// Moves the head of a loop-erased trail to `next`.
///
/// Trail cells carry their position in the route plus one above the exit bits. Walking back
/// onto the trail cuts off everything after that cell. Exit bits survive the cut.
fn extend_trail(grid: &mut Grid, route: &mut Route, next: Coord) {
    match trail_position(grid.cell(next)) {
        0 => {
            route.push(next);
            let exits = grid.cell(next) & EXIT_MASK;
            grid.set_cell(next, (route.len() as Value) << EXIT_BITS | exits);
        }
        keep => {
            for &coord in &route.path()[keep..] {
                let exits = grid.cell(coord) & EXIT_MASK;
                grid.set_cell(coord, exits);
            }
            route.truncate(keep);
        }
    }
}

/// Records a move out of `coord` through `side`. Returns `false` if that move was made before.
fn mark_exit(grid: &mut Grid, coord: Coord, side: Side) -> bool {
    let tag = grid.cell(coord);
    let bit = 1 << side as u32;
    if tag & bit != 0 {
        return false;
    }
    grid.set_cell(coord, tag | bit);
    true
}

/// Forgets every recorded move, keeping the trail.
fn clear_exits(grid: &mut Grid) {
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let tag = grid.cell((row, col));
            if tag & EXIT_MASK != 0 {
                grid.set_cell((row, col), tag & !EXIT_MASK);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{Generator, generate_maze};

    const SPIRAL: &str = "\
+-+-+-+-+
|       |
+-+-+-+ +
|     | |
+ +-+ + +
|   |   |
+-+-+-+-+
";

    #[test]
    fn test_every_solver_finds_the_unique_route() {
        for generator in [Generator::RecurBacktrack, Generator::Kruskal, Generator::Eller] {
            for seed in 0..3 {
                let grid =
                    generate_maze(Grid::new(8, 11).unwrap(), generator, Some(seed)).unwrap();
                let (start, end) = ((0, 0), (7, 10));
                let expected = solve_maze(&grid, Solver::Lee, start, end, None).unwrap();
                assert!(expected.is_complete());
                for solver in Solver::ALL {
                    let route = solve_maze(&grid, solver, start, end, Some(seed)).unwrap();
                    assert_eq!(
                        route.path(),
                        expected.path(),
                        "{solver} on {generator} (seed {seed})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_spiral_interior_end() {
        let grid = Grid::from_ascii(SPIRAL).unwrap();
        for solver in Solver::ALL {
            let route = solve_maze(&grid, solver, (2, 3), (1, 1), Some(1)).unwrap();
            assert_eq!(route.path(), &[(2, 3), (2, 2), (1, 2), (1, 1)], "{solver}");
            assert!(route.is_complete(), "{solver}");
        }
    }

    #[test]
    fn test_start_is_end() {
        let grid = generate_maze(Grid::new(4, 4).unwrap(), Generator::Wilson, Some(0)).unwrap();
        for solver in Solver::ALL {
            let route = solve_maze(&grid, solver, (2, 1), (2, 1), None).unwrap();
            assert_eq!(route.path(), &[(2, 1)], "{solver}");
        }
    }

    #[test]
    fn test_a_star_and_dijkstra_agree_on_loops() {
        // Open fields have many shortest routes; only their lengths must agree
        let mut grid = Grid::new(6, 6).unwrap();
        grid.open_interior();
        grid.build((2, 2), crate::maze::Side::Right);
        grid.build((3, 2), crate::maze::Side::Right);
        let a_star = solve_maze(&grid, Solver::AStar, (2, 0), (3, 5), None).unwrap();
        let dijkstra = solve_maze(&grid, Solver::Dijkstra, (2, 0), (3, 5), None).unwrap();
        let lee = solve_maze(&grid, Solver::Lee, (2, 0), (3, 5), None).unwrap();
        assert_eq!(a_star.len(), dijkstra.len());
        assert_eq!(a_star.len(), lee.len());
    }

    #[test]
    fn test_step_before_init_is_ignored() {
        for solver in Solver::ALL {
            let mut algorithm = solver.build(Grid::new(3, 3).unwrap(), (0, 0), (2, 2), Some(0));
            assert_eq!(algorithm.step(), Ok(()));
            assert!(!algorithm.is_initialized());
            assert!(!algorithm.is_complete());
        }
    }

    #[test]
    fn test_init_restarts_the_same_route() {
        let grid = generate_maze(Grid::new(6, 6).unwrap(), Generator::Prim, Some(4)).unwrap();
        for solver in Solver::ALL {
            let mut algorithm = solver.build(grid.clone(), (5, 0), (0, 5), Some(2));
            algorithm.init();
            let first_steps = algorithm::complete(algorithm.as_mut()).unwrap();
            let first = algorithm.route().cloned();
            algorithm.init();
            // Walkers start their trail on the start cell
            assert!(algorithm.route().is_some_and(|route| route.len() <= 1));
            let second_steps = algorithm::complete(algorithm.as_mut()).unwrap();
            assert_eq!(first_steps, second_steps, "{solver}");
            assert_eq!(algorithm.route().cloned(), first, "{solver}");
        }
    }

    #[test]
    fn test_trail_erases_loops() {
        let mut grid = Grid::new(1, 4).unwrap();
        let mut route = Route::new((0, 0), (0, 3));
        for coord in [(0, 0), (0, 1), (0, 2), (0, 1)] {
            extend_trail(&mut grid, &mut route, coord);
        }
        assert_eq!(route.path(), &[(0, 0), (0, 1)]);
        assert_eq!(grid.cell((0, 2)), 0);
        assert_eq!(trail_position(grid.cell((0, 1))), 2);
    }

    #[test]
    fn test_exits_are_marked_once_and_outlive_the_trail() {
        let mut grid = Grid::new(1, 3).unwrap();
        let mut route = Route::new((0, 0), (0, 2));
        extend_trail(&mut grid, &mut route, (0, 0));
        extend_trail(&mut grid, &mut route, (0, 1));
        assert!(mark_exit(&mut grid, (0, 1), Side::Right));
        assert!(mark_exit(&mut grid, (0, 1), Side::Left));
        assert!(!mark_exit(&mut grid, (0, 1), Side::Right));
        assert_eq!(trail_position(grid.cell((0, 1))), 2);

        // Stepping back erases the trail position only
        extend_trail(&mut grid, &mut route, (0, 0));
        assert_eq!(route.path(), &[(0, 0)]);
        assert_eq!(trail_position(grid.cell((0, 1))), 0);
        assert!(!mark_exit(&mut grid, (0, 1), Side::Left));

        clear_exits(&mut grid);
        assert_eq!(grid.cell((0, 1)), 0);
        assert_eq!(trail_position(grid.cell((0, 0))), 1);
        assert!(mark_exit(&mut grid, (0, 1), Side::Left));
    }
}
