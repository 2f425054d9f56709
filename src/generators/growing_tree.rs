use rand::Rng;

use super::{UNVISITED, VISITED, pick, random_cell, tagged_neighbors};
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid},
};

/// Which active cell the growing tree extends next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// Most recently added; behaves like the recursive backtracker.
    Newest,
    /// Least recently added; produces long straight corridors.
    Oldest,
    /// Uniformly random; behaves like Prim.
    Random,
}

impl std::fmt::Display for Pick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pick::Newest => write!(f, "newest"),
            Pick::Oldest => write!(f, "oldest"),
            Pick::Random => write!(f, "random"),
        }
    }
}

pub struct GrowingTree {
    grid: Grid,
    rng: SeededRng,
    pick: Pick,
    active: Option<Vec<Coord>>,
}

impl GrowingTree {
    pub fn new(grid: Grid, pick: Pick, seed: Option<u64>) -> Self {
        GrowingTree {
            grid,
            rng: SeededRng::new(seed),
            pick,
            active: None,
        }
    }
}

impl Algorithm for GrowingTree {
    fn label(&self) -> &'static str {
        match self.pick {
            Pick::Newest => "Growing Tree (newest)",
            Pick::Oldest => "Growing Tree (oldest)",
            Pick::Random => "Growing Tree (random)",
        }
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        let start = random_cell(&self.grid, self.rng.rng());
        self.grid.set_cell(start, VISITED);
        self.active = Some(vec![start]);
    }

    fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    fn is_complete(&self) -> bool {
        self.active.as_ref().is_some_and(|active| active.is_empty())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(active) = self.active.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        if active.is_empty() {
            return Ok(());
        }

        let idx = match self.pick {
            Pick::Newest => active.len() - 1,
            Pick::Oldest => 0,
            Pick::Random => self.rng.rng().random_range(0..active.len()),
        };
        let cell = active[idx];
        let unvisited = tagged_neighbors(&self.grid, cell, UNVISITED);
        match pick(&unvisited, self.rng.rng()) {
            Some((side, next)) => {
                self.grid.carve(cell, side);
                self.grid.set_cell(next, VISITED);
                active.push(next);
            }
            None => {
                // Order matters for the newest/oldest policies
                active.remove(idx);
            }
        }
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
    fn test_oldest_on_a_row_is_a_corridor() {
        let mut tree = GrowingTree::new(Grid::new(1, 7).unwrap(), Pick::Oldest, Some(6));
        tree.init();
        complete(&mut tree).unwrap();
        assert_eq!(tree.grid().open_walls(), 6);
    }

    #[test]
    fn test_each_cell_is_added_and_retired_once() {
        for pick in [Pick::Newest, Pick::Oldest, Pick::Random] {
            let mut tree = GrowingTree::new(Grid::new(4, 5).unwrap(), pick, Some(2));
            tree.init();
            let steps = complete(&mut tree).unwrap();
            // 19 additions plus 20 removals
            assert_eq!(steps, 39, "{pick}");
        }
    }

    #[test]
    fn test_pick_display() {
        assert_eq!(Pick::Newest.to_string(), "newest");
        assert_eq!(Pick::Random.to_string(), "random");
    }
}
