use super::{exhausted, heur_tree::HeurTree};
use crate::{
    algorithm::{Algorithm, AlgorithmError, warn_uninitialized},
    maze::{Coord, Grid, Route},
};

/// How a frontier node is prioritized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cost {
    /// Cost so far plus `weight` times the straight-line distance to the end.
    AStar { weight: f64 },
    /// Cost so far.
    Dijkstra,
    /// Cost of the last edge only. The tree spans everything reachable.
    PrimJarnik,
}

struct Search {
    tree: HeurTree,
    /// Unexpanded nodes, in insertion order.
    frontier: Vec<usize>,
    reached: Option<usize>,
    done: bool,
}

/// Best-first growth of a search tree rooted at the start cell.
///
/// Cell tags hold the index of the cell's tree node plus one, or 0 when unreached.
pub struct HeuristicSearch {
    grid: Grid,
    route: Route,
    cost: Cost,
    search: Option<Search>,
}

impl HeuristicSearch {
    pub fn new(grid: Grid, start: Coord, end: Coord, cost: Cost) -> Self {
        HeuristicSearch {
            grid,
            route: Route::new(start, end),
            cost,
            search: None,
        }
    }

    pub fn a_star(grid: Grid, start: Coord, end: Coord) -> Self {
        Self::new(grid, start, end, Cost::AStar { weight: 1.0 })
    }

    pub fn dijkstra(grid: Grid, start: Coord, end: Coord) -> Self {
        Self::new(grid, start, end, Cost::Dijkstra)
    }

    pub fn prim_jarnik(grid: Grid, start: Coord, end: Coord) -> Self {
        Self::new(grid, start, end, Cost::PrimJarnik)
    }

    /// Scales the distance term of A*. Other cost models ignore it.
    pub fn with_weight(mut self, weight: f64) -> Self {
        if let Cost::AStar { .. } = self.cost {
            self.cost = Cost::AStar { weight };
        }
        self
    }

    fn key(&self, coord: Coord, cost: f64) -> f64 {
        match self.cost {
            Cost::AStar { weight } => cost + weight * euclidean(coord, self.route.end()),
            Cost::Dijkstra => cost,
            Cost::PrimJarnik => 1.0,
        }
    }

    fn expand(&mut self, search: &mut Search, idx: usize) {
        let coord = search.tree.node(idx).coord;
        let cost = search.tree.node(idx).cost + 1.0;
        let neighbors = self.grid.open_neighbors(coord).collect::<Vec<_>>();
        for (_, next) in neighbors {
            let key = self.key(next, cost);
            match self.grid.cell(next) {
                0 => {
                    let child = search.tree.add(next, Some(idx), cost, key);
                    self.grid.set_cell(next, child as i32 + 1);
                    search.frontier.push(child);
                }
                tag => {
                    let other = tag as usize - 1;
                    let node = search.tree.node(other);
                    if !node.expanded && key < node.key {
                        search.tree.reparent(other, idx);
                        let node = search.tree.node_mut(other);
                        node.cost = cost;
                        node.key = key;
                    }
                }
            }
        }
    }
}

impl Algorithm for HeuristicSearch {
    fn label(&self) -> &'static str {
        match self.cost {
            Cost::AStar { .. } => "A*",
            Cost::Dijkstra => "Dijkstra",
            Cost::PrimJarnik => "Prim-Jarnik",
        }
    }

    fn init(&mut self) {
        self.grid.reset_cells();
        self.route.clear();
        let start = self.route.start();
        let mut tree = HeurTree::new();
        let root = tree.add(start, None, 0.0, self.key(start, 0.0));
        self.grid.set_cell(start, root as i32 + 1);
        self.search = Some(Search {
            tree,
            frontier: vec![root],
            reached: None,
            done: false,
        });
    }

    fn is_initialized(&self) -> bool {
        self.search.is_some()
    }

    fn is_complete(&self) -> bool {
        self.search.as_ref().is_some_and(|search| search.done)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let Some(mut search) = self.search.take() else {
            warn_uninitialized(self.label());
            return Ok(());
        };
        let result = self.advance(&mut search);
        self.search = Some(search);
        result
    }

    fn finish(&mut self) -> Result<(), AlgorithmError> {
        let Some(search) = self.search.as_ref() else {
            return Ok(());
        };
        match search.reached {
            Some(idx) => {
                self.route.set_path(search.tree.path_to_root(idx));
                Ok(())
            }
            None => Err(exhausted(self.label(), search.tree.len())),
        }
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

impl HeuristicSearch {
    fn advance(&mut self, search: &mut Search) -> Result<(), AlgorithmError> {
        if search.done {
            return Ok(());
        }
        // First minimum wins, so ties go to the oldest frontier node
        let Some(pos) = search
            .frontier
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (pos, &idx)| {
                let key = search.tree.node(idx).key;
                match best {
                    Some((_, best_key)) if best_key <= key => best,
                    _ => Some((pos, key)),
                }
            })
            .map(|(pos, _)| pos)
        else {
            return Err(exhausted(self.label(), search.tree.len()));
        };

        let idx = search.frontier.remove(pos);
        search.tree.node_mut(idx).expanded = true;
        if search.tree.node(idx).coord == self.route.end() {
            search.reached = Some(idx);
            if self.cost != Cost::PrimJarnik {
                search.done = true;
                return Ok(());
            }
        }
        self.expand(search, idx);
        if search.frontier.is_empty() && search.reached.is_some() {
            search.done = true;
        }
        Ok(())
    }
}

fn euclidean((r1, c1): Coord, (r2, c2): Coord) -> f64 {
    let dr = r1 as f64 - r2 as f64;
    let dc = c1 as f64 - c2 as f64;
    (dr * dr + dc * dc).sqrt()
}
