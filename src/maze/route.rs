use super::Coord;

/// A path through the maze between a start and an end cell.
///
/// Start and end default to `(0, 0)` until the host sets them. Only solvers write the path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    start: Coord,
    end: Coord,
    path: Vec<Coord>,
}

impl Route {
    pub fn new(start: Coord, end: Coord) -> Self {
        Route {
            start,
            end,
            path: Vec::new(),
        }
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    pub fn set_start(&mut self, start: Coord) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: Coord) {
        self.end = end;
    }

    /// The cells of the route, in walking order.
    pub fn path(&self) -> &[Coord] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn push(&mut self, coord: Coord) {
        self.path.push(coord);
    }

    pub fn pop(&mut self) -> Option<Coord> {
        self.path.pop()
    }

    pub fn last(&self) -> Option<Coord> {
        self.path.last().copied()
    }

    /// Drops every cell after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.path.truncate(len);
    }

    pub fn clear(&mut self) {
        self.path.clear();
    }

    /// Replaces the path in one go.
    pub fn set_path(&mut self, path: Vec<Coord>) {
        self.path = path;
    }

    /// Whether the path runs from the start cell to the end cell.
    pub fn is_complete(&self) -> bool {
        self.path.first() == Some(&self.start) && self.path.last() == Some(&self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers() {
        let route = Route::default();
        assert_eq!(route.start(), (0, 0));
        assert_eq!(route.end(), (0, 0));
        assert!(route.is_empty());
        assert!(!route.is_complete());
    }

    #[test]
    fn test_build_route() {
        let mut route = Route::new((0, 0), (0, 2));
        route.push((0, 0));
        route.push((0, 1));
        assert!(!route.is_complete());
        route.push((0, 2));
        assert!(route.is_complete());
        assert_eq!(route.len(), 3);

        route.truncate(1);
        assert_eq!(route.path(), &[(0, 0)]);
        route.set_end((0, 0));
        assert!(route.is_complete());
    }
}
