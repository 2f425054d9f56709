use crate::maze::Coord;

/// One reached cell of a search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub coord: Coord,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Cumulative cost from the root.
    pub cost: f64,
    /// Priority used to pick the next node to expand. Lower goes first.
    pub key: f64,
    pub expanded: bool,
}

/// A search tree stored as an arena. Nodes are addressed by index and never removed.
#[derive(Debug, Default, Clone)]
pub struct HeurTree {
    nodes: Vec<Node>,
}

impl HeurTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    /// Adds a node below `parent`, or a new root, and returns its index.
    pub fn add(&mut self, coord: Coord, parent: Option<usize>, cost: f64, key: f64) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            coord,
            parent,
            children: Vec::new(),
            cost,
            key,
            expanded: false,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(idx);
        }
        idx
    }

    /// Moves `idx` under `parent`.
    pub fn reparent(&mut self, idx: usize, parent: usize) {
        if let Some(old) = self.nodes[idx].parent {
            self.nodes[old].children.retain(|&child| child != idx);
        }
        self.nodes[idx].parent = Some(parent);
        self.nodes[parent].children.push(idx);
    }

    /// Coordinates from the root down to `idx`.
    pub fn path_to_root(&self, idx: usize) -> Vec<Coord> {
        let mut path = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            path.push(self.nodes[i].coord);
            current = self.nodes[i].parent;
        }
        path.reverse();
        path
    }
}
