use rand::{Rng, seq::SliceRandom};

use super::interior_walls;
use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Grid, Value, WallCoord},
};

/// Randomized Kruskal over cell-id tags.
///
/// Each cell starts with its own id. Every step examines one interior wall: when the cells on
/// both sides carry different ids the wall is opened and the larger id is replaced by the
/// smaller one everywhere.
pub struct Kruskal {
    grid: Grid,
    rng: SeededRng,
    /// Shuffle the walls once up front and scan them, instead of drawing one per step.
    shuffled: bool,
    /// Walls not examined yet.
    walls: Option<Vec<WallCoord>>,
}

impl Kruskal {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        Kruskal {
            grid,
            rng: SeededRng::new(seed),
            shuffled: false,
            walls: None,
        }
    }

    pub fn shuffled(grid: Grid, seed: Option<u64>) -> Self {
        Kruskal {
            shuffled: true,
            ..Kruskal::new(grid, seed)
        }
    }

    fn merge(&mut self, keep: Value, replace: Value) {
        for coord in self.grid.coords() {
            if self.grid.cell(coord) == replace {
                self.grid.set_cell(coord, keep);
            }
        }
    }
}

impl Algorithm for Kruskal {
    fn label(&self) -> &'static str {
        if self.shuffled {
            "Shuffled Kruskal"
        } else {
            "Kruskal"
        }
    }

    fn init(&mut self) {
        self.grid.clear();
        self.rng.restart();
        for (id, coord) in self.grid.coords().enumerate() {
            self.grid.set_cell(coord, id as Value + 1);
        }
        let mut walls = interior_walls(&self.grid);
        if self.shuffled {
            walls.shuffle(self.rng.rng());
        }
        self.walls = Some(walls);
    }

    fn is_initialized(&self) -> bool {
        self.walls.is_some()
    }

    fn is_complete(&self) -> bool {
        self.walls.as_ref().is_some_and(|walls| walls.is_empty())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(walls) = self.walls.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        let wall = if self.shuffled {
            walls.pop()
        } else if walls.is_empty() {
            None
        } else {
            let idx = self.rng.rng().random_range(0..walls.len());
            Some(walls.swap_remove(idx))
        };
        let Some(wall) = wall else {
            return Ok(());
        };

        let here = self.grid.cell(wall.cell);
        let there = self.grid.neighbor_cell(wall);
        if here != there {
            self.grid.carve(wall.cell, wall.side);
            self.merge(here.min(there), here.max(there));
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
    fn test_init_tags_unique_ids() {
        let mut kruskal = Kruskal::new(Grid::new(3, 4).unwrap(), Some(0));
        kruskal.init();
        let ids = kruskal
            .grid()
            .coords()
            .map(|c| kruskal.grid().cell(c))
            .collect::<Vec<_>>();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_all_cells_end_in_the_smallest_set() {
        for mut kruskal in [
            Kruskal::new(Grid::new(5, 5).unwrap(), Some(9)),
            Kruskal::shuffled(Grid::new(5, 5).unwrap(), Some(9)),
        ] {
            kruskal.init();
            let steps = complete(&mut kruskal).unwrap();
            // One step per interior wall
            assert_eq!(steps, 40);
            assert!(kruskal.grid().coords().all(|c| kruskal.grid().cell(c) == 1));
        }
    }

    #[test]
    fn test_labels() {
        let grid = Grid::new(2, 2).unwrap();
        assert_eq!(Kruskal::new(grid.clone(), None).label(), "Kruskal");
        assert_eq!(Kruskal::shuffled(grid, None).label(), "Shuffled Kruskal");
    }
}
