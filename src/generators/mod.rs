use rand::{Rng, rngs::StdRng};

mod aldous_broder;
mod binary_tree;
mod eller;
mod growing_tree;
mod hunt_and_kill;
mod kruskal;
mod prim;
mod recur_backtrack;
mod recur_div;
mod sidewinder;
mod wilson;

pub use aldous_broder::AldousBroder;
pub use binary_tree::BinaryTree;
pub use eller::Eller;
pub use growing_tree::{GrowingTree, Pick};
pub use hunt_and_kill::HuntAndKill;
pub use kruskal::Kruskal;
pub use prim::Prim;
pub use recur_backtrack::RecurBacktrack;
pub use recur_div::RecurDiv;
pub use sidewinder::Sidewinder;
pub use wilson::Wilson;

use crate::{
    algorithm::{self, Algorithm, AlgorithmError},
    maze::{Coord, Grid, Side, Value, WallCoord},
};

/// Cell tag of a cell not yet part of the maze.
const UNVISITED: Value = 0;
/// Cell tag of a cell carved into the maze.
const VISITED: Value = 1;
/// Cell tag of a cell waiting on a frontier or a pending walk.
const PENDING: Value = 2;

/// The available maze generation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    Kruskal,
    ShuffledKruskal,
    AldousBroder,
    Wilson,
    Prim,
    GrowingTree(Pick),
    RecurBacktrack,
    RecurDiv,
    BinaryTree,
    Sidewinder,
    Eller,
    HuntAndKill,
}

impl Generator {
    pub const ALL: [Generator; 14] = [
        Generator::RecurBacktrack,
        Generator::Kruskal,
        Generator::ShuffledKruskal,
        Generator::Prim,
        Generator::RecurDiv,
        Generator::AldousBroder,
        Generator::Wilson,
        Generator::GrowingTree(Pick::Newest),
        Generator::GrowingTree(Pick::Oldest),
        Generator::GrowingTree(Pick::Random),
        Generator::BinaryTree,
        Generator::Sidewinder,
        Generator::Eller,
        Generator::HuntAndKill,
    ];

    /// Binds a new, uninitialized instance of this strategy to `grid`.
    pub fn build(self, grid: Grid, seed: Option<u64>) -> Box<dyn Algorithm> {
        match self {
            Generator::Kruskal => Box::new(Kruskal::new(grid, seed)),
            Generator::ShuffledKruskal => Box::new(Kruskal::shuffled(grid, seed)),
            Generator::AldousBroder => Box::new(AldousBroder::new(grid, seed)),
            Generator::Wilson => Box::new(Wilson::new(grid, seed)),
            Generator::Prim => Box::new(Prim::new(grid, seed)),
            Generator::GrowingTree(pick) => Box::new(GrowingTree::new(grid, pick, seed)),
            Generator::RecurBacktrack => Box::new(RecurBacktrack::new(grid, seed)),
            Generator::RecurDiv => Box::new(RecurDiv::new(grid, seed)),
            Generator::BinaryTree => Box::new(BinaryTree::new(grid, seed)),
            Generator::Sidewinder => Box::new(Sidewinder::new(grid, seed)),
            Generator::Eller => Box::new(Eller::new(grid, seed)),
            Generator::HuntAndKill => Box::new(HuntAndKill::new(grid, seed)),
        }
    }
}

impl std::fmt::Display for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generator::Kruskal => write!(f, "Kruskal's Algorithm"),
            Generator::ShuffledKruskal => write!(f, "Kruskal's Algorithm (pre-shuffled)"),
            Generator::AldousBroder => write!(f, "Aldous-Broder"),
            Generator::Wilson => write!(f, "Wilson's Algorithm"),
            Generator::Prim => write!(f, "Prim's Algorithm"),
            Generator::GrowingTree(pick) => write!(f, "Growing Tree ({pick})"),
            Generator::RecurBacktrack => write!(f, "Recursive Backtracking"),
            Generator::RecurDiv => write!(f, "Recursive Division"),
            Generator::BinaryTree => write!(f, "Binary Tree"),
            Generator::Sidewinder => write!(f, "Sidewinder"),
            Generator::Eller => write!(f, "Eller's Algorithm"),
            Generator::HuntAndKill => write!(f, "Hunt and Kill"),
        }
    }
}

/// Generates a maze on `grid` in one go and hands the grid back.
pub fn generate_maze(
    grid: Grid,
    generator: Generator,
    seed: Option<u64>,
) -> Result<Grid, AlgorithmError> {
    let mut algorithm = generator.build(grid, seed);
    algorithm.init();
    let steps = algorithm::complete(algorithm.as_mut())?;
    tracing::debug!("[generate] {generator} done in {steps} steps");
    Ok(algorithm.into_grid())
}

fn random_cell(grid: &Grid, rng: &mut StdRng) -> Coord {
    (
        rng.random_range(0..grid.rows()),
        rng.random_range(0..grid.cols()),
    )
}

fn pick<T: Copy>(items: &[T], rng: &mut StdRng) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[rng.random_range(0..items.len())])
    }
}

/// In-bounds neighbors of `coord` whose cell carries `tag`.
fn tagged_neighbors(grid: &Grid, coord: Coord, tag: Value) -> Vec<(Side, Coord)> {
    grid.neighbors(coord)
        .filter(|&(_, c)| grid.cell(c) == tag)
        .collect()
}

/// Every interior wall, once, as the right or lower wall of a cell.
fn interior_walls(grid: &Grid) -> Vec<WallCoord> {
    grid.coords()
        .flat_map(|coord| [WallCoord::new(coord, Side::Right), WallCoord::new(coord, Side::Down)])
        .filter(|wall| grid.in_bounds(wall.neighbor()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology;

    const SIZES: [(usize, usize); 7] = [(1, 1), (1, 6), (6, 1), (2, 2), (5, 8), (9, 4), (12, 12)];

    #[test]
    fn test_every_generator_builds_perfect_mazes() {
        for generator in Generator::ALL {
            for (rows, cols) in SIZES {
                for seed in 0..3 {
                    let grid =
                        generate_maze(Grid::new(rows, cols).unwrap(), generator, Some(seed))
                            .unwrap();
                    assert_eq!(
                        grid.open_walls(),
                        rows * cols - 1,
                        "{generator} on {rows}x{cols} (seed {seed})"
                    );
                    assert!(
                        topology::is_connected(&grid),
                        "{generator} on {rows}x{cols} (seed {seed}) is not connected"
                    );
                    assert_eq!(topology::islets(&grid), 0, "{generator} left a loop");
                }
            }
        }
    }

    #[test]
    fn test_generators_are_deterministic_under_seed() {
        for generator in Generator::ALL {
            let first = generate_maze(Grid::new(7, 9).unwrap(), generator, Some(5)).unwrap();
            let second = generate_maze(Grid::new(7, 9).unwrap(), generator, Some(5)).unwrap();
            assert_eq!(first, second, "{generator}");
        }
    }

    #[test]
    fn test_init_restarts_the_same_maze() {
        for generator in Generator::ALL {
            let mut algorithm = generator.build(Grid::new(6, 6).unwrap(), Some(3));
            algorithm.init();
            algorithm::complete(algorithm.as_mut()).unwrap();
            let first = algorithm.grid().clone();

            algorithm.init();
            assert!(!algorithm.is_complete());
            algorithm::complete(algorithm.as_mut()).unwrap();
            assert_eq!(algorithm.grid(), &first, "{generator}");
        }
    }

    #[test]
    fn test_step_before_init_is_ignored() {
        for generator in Generator::ALL {
            let mut algorithm = generator.build(Grid::new(3, 3).unwrap(), Some(1));
            assert!(!algorithm.is_initialized());
            assert_eq!(algorithm.step(), Ok(()));
            assert!(!algorithm.is_complete());
            assert_eq!(algorithm.grid(), &Grid::new(3, 3).unwrap());
        }
    }

    #[test]
    fn test_interior_walls() {
        let grid = Grid::new(2, 3).unwrap();
        // 2 rows of 2 vertical walls, plus 3 horizontal walls
        assert_eq!(interior_walls(&grid).len(), 7);
    }
}
