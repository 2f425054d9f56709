use rand::Rng;

use crate::{
    algorithm::{Algorithm, AlgorithmError, SeededRng, warn_uninitialized},
    maze::{Coord, Grid, Side},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    /// A wall running left to right, splitting the region into upper and lower parts.
    Horizontal,
    /// A wall running top to bottom, splitting the region into left and right parts.
    Vertical,
}

impl Orientation {
    fn flip(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Region {
    top_left: Coord,
    height: usize,
    width: usize,
    orientation: Orientation,
}

impl Region {
    fn is_divisible(&self) -> bool {
        self.height >= 2 && self.width >= 2
    }
}

/// Recursive division, driven by an explicit stack of regions still to split.
///
/// Starts from an open field and adds one wall with a single gap per step. The cut
/// orientation alternates from one level to the next.
pub struct RecurDiv {
    grid: Grid,
    rng: SeededRng,
    regions: Option<Vec<Region>>,
}

impl RecurDiv {
    pub fn new(grid: Grid, seed: Option<u64>) -> Self {
        RecurDiv {
            grid,
            rng: SeededRng::new(seed),
            regions: None,
        }
    }
}

impl Algorithm for RecurDiv {
    fn label(&self) -> &'static str {
        "Recursive Division"
    }

    fn init(&mut self) {
        self.grid.clear();
        self.grid.open_interior();
        self.rng.restart();

        let (height, width) = (self.grid.rows(), self.grid.cols());
        let orientation = match width.cmp(&height) {
            std::cmp::Ordering::Less => Orientation::Horizontal,
            std::cmp::Ordering::Greater => Orientation::Vertical,
            std::cmp::Ordering::Equal => {
                if self.rng.rng().random_bool(0.5) {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                }
            }
        };
        let root = Region {
            top_left: (0, 0),
            height,
            width,
            orientation,
        };
        self.regions = Some(if root.is_divisible() { vec![root] } else { Vec::new() });
    }

    fn is_initialized(&self) -> bool {
        self.regions.is_some()
    }

    fn is_complete(&self) -> bool {
        self.regions.as_ref().is_some_and(|regions| regions.is_empty())
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(regions) = self.regions.as_mut() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        let Some(region) = regions.pop() else {
            return Ok(());
        };
        let rng = self.rng.rng();
        let (y, x) = region.top_left;
        let next = region.orientation.flip();

        let halves = match region.orientation {
            Orientation::Horizontal => {
                // Wall below row `y + diff`
                let diff = rng.random_range(0..region.height - 1);
                let gap = x + rng.random_range(0..region.width);
                for col in x..x + region.width {
                    if col != gap {
                        self.grid.build((y + diff, col), Side::Down);
                    }
                }
                let upper = diff + 1;
                [
                    Region {
                        top_left: (y, x),
                        height: upper,
                        width: region.width,
                        orientation: next,
                    },
                    Region {
                        top_left: (y + upper, x),
                        height: region.height - upper,
                        width: region.width,
                        orientation: next,
                    },
                ]
            }
            Orientation::Vertical => {
                // Wall right of column `x + diff`
                let diff = rng.random_range(0..region.width - 1);
                let gap = y + rng.random_range(0..region.height);
                for row in y..y + region.height {
                    if row != gap {
                        self.grid.build((row, x + diff), Side::Right);
                    }
                }
                let left = diff + 1;
                [
                    Region {
                        top_left: (y, x),
                        height: region.height,
                        width: left,
                        orientation: next,
                    },
                    Region {
                        top_left: (y, x + left),
                        height: region.height,
                        width: region.width - left,
                        orientation: next,
                    },
                ]
            }
        };
        // Second half first so the first half is divided next
        regions.extend(halves.into_iter().rev().filter(Region::is_divisible));
        Ok(())
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn into_grid(self: Box<Self>) -> Grid {
        self.grid
    }
}
