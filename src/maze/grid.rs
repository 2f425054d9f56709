use std::sync::mpsc::SyncSender;

use super::{Coord, GridError, Side, WallCoord};

/// The value type stored for every cell, wall and junction of a grid.
pub type Value = i32;

/// Change notifications sent by a grid that carries a sender.
///
/// Positions are expressed in the doubled `(2 * rows + 1) x (2 * cols + 1)` matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    Initial {
        rows: usize,
        cols: usize,
    },
    Update {
        position: (usize, usize),
        old: Value,
        new: Value,
    },
}

/// Cells and walls of a rectangular maze sharing one addressable matrix.
///
/// Cell `(i, j)` lives at matrix position `(2i + 1, 2j + 1)`; every position with an even
/// coordinate holds a wall or a junction. A wall value of `0` is open, anything else is present.
///
/// Accessors never panic on bad coordinates: reads outside the grid return
/// [`Grid::OUT_OF_RANGE`] and writes outside the grid are ignored.
#[derive(Debug)]
pub struct Grid {
    data: Box<[Value]>,
    rows: usize,
    cols: usize,
    sender: Option<SyncSender<GridEvent>>,
}

impl Grid {
    /// Value returned when reading out of range.
    pub const OUT_OF_RANGE: Value = -1;
    /// Value of an open wall.
    pub const OPEN: Value = 0;
    /// Value of a closed wall.
    pub const WALL: Value = 1;

    /// Creates a cleared grid: every cell is `0` and every wall is present.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        Grid::build_grid(rows, cols, None)
    }

    /// Creates a cleared grid which reports every change to `sender`.
    pub fn with_sender(
        rows: usize,
        cols: usize,
        sender: SyncSender<GridEvent>,
    ) -> Result<Self, GridError> {
        Grid::build_grid(rows, cols, Some(sender))
    }

    fn build_grid(
        rows: usize,
        cols: usize,
        sender: Option<SyncSender<GridEvent>>,
    ) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        let height = rows
            .checked_mul(2)
            .and_then(|h| h.checked_add(1))
            .ok_or(GridError::InvalidDimensions { rows, cols })?;
        let width = cols
            .checked_mul(2)
            .and_then(|w| w.checked_add(1))
            .ok_or(GridError::InvalidDimensions { rows, cols })?;
        let len = height
            .checked_mul(width)
            .ok_or(GridError::InvalidDimensions { rows, cols })?;

        let mut data = vec![Grid::WALL; len].into_boxed_slice();
        for y in (1..height).step_by(2) {
            for x in (1..width).step_by(2) {
                data[y * width + x] = 0;
            }
        }
        if let Some(s) = &sender {
            let _ = s.send(GridEvent::Initial { rows, cols });
        }
        Ok(Grid {
            data,
            rows,
            cols,
            sender,
        })
    }

    /// Number of cell rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cell columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Height of the doubled matrix.
    pub fn height(&self) -> usize {
        self.rows * 2 + 1
    }

    /// Width of the doubled matrix.
    pub fn width(&self) -> usize {
        self.cols * 2 + 1
    }

    pub fn in_bounds(&self, (row, col): Coord) -> bool {
        row < self.rows && col < self.cols
    }

    /// All cell coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }

    fn ravel_index(&self, y: usize, x: usize) -> usize {
        y * self.width() + x
    }

    /// Reads a raw position of the doubled matrix.
    pub fn raw(&self, (y, x): (usize, usize)) -> Value {
        if y >= self.height() || x >= self.width() {
            return Grid::OUT_OF_RANGE;
        }
        self.data[self.ravel_index(y, x)]
    }

    pub(super) fn set_raw(&mut self, position: (usize, usize), value: Value) {
        let idx = self.ravel_index(position.0, position.1);
        let old = self.data[idx];
        if old != value {
            self.data[idx] = value;
            if let Some(sender) = &self.sender {
                let _ = sender.send(GridEvent::Update {
                    position,
                    old,
                    new: value,
                });
            }
        }
    }

    /// Whether a raw position lies on the outer border of the matrix.
    pub fn is_border(&self, (y, x): (usize, usize)) -> bool {
        y == 0 || x == 0 || y == self.height() - 1 || x == self.width() - 1
    }

    fn wall_position(&self, (row, col): Coord, side: Side) -> Option<(usize, usize)> {
        if !self.in_bounds((row, col)) {
            return None;
        }
        let (dy, dx) = side.delta();
        Some((
            (row * 2 + 1).checked_add_signed(dy)?,
            (col * 2 + 1).checked_add_signed(dx)?,
        ))
    }

    pub fn cell(&self, coord: Coord) -> Value {
        if !self.in_bounds(coord) {
            return Grid::OUT_OF_RANGE;
        }
        self.raw((coord.0 * 2 + 1, coord.1 * 2 + 1))
    }

    pub fn set_cell(&mut self, coord: Coord, value: Value) {
        if !self.in_bounds(coord) {
            return;
        }
        self.set_raw((coord.0 * 2 + 1, coord.1 * 2 + 1), value);
    }

    pub fn wall(&self, coord: Coord, side: Side) -> Value {
        match self.wall_position(coord, side) {
            Some(position) => self.raw(position),
            None => Grid::OUT_OF_RANGE,
        }
    }

    /// Writes a wall value. Walls on the outer border always stay present.
    pub fn set_wall(&mut self, coord: Coord, side: Side, value: Value) {
        if let Some(position) = self.wall_position(coord, side)
            && !self.is_border(position)
        {
            self.set_raw(position, value);
        }
    }

    /// Value of the cell across `wall`, or [`Grid::OUT_OF_RANGE`] past the border.
    pub fn neighbor_cell(&self, wall: WallCoord) -> Value {
        if !self.in_bounds(wall.cell) {
            return Grid::OUT_OF_RANGE;
        }
        self.cell(wall.neighbor())
    }

    /// Whether the wall on `side` of `coord` is open and leads to another cell.
    pub fn is_open(&self, coord: Coord, side: Side) -> bool {
        self.wall(coord, side) == Grid::OPEN && self.in_bounds(side.step(coord))
    }

    /// Opens the wall on `side` of `coord`.
    pub fn carve(&mut self, coord: Coord, side: Side) {
        self.set_wall(coord, side, Grid::OPEN);
    }

    /// Closes the wall on `side` of `coord`.
    pub fn build(&mut self, coord: Coord, side: Side) {
        self.set_wall(coord, side, Grid::WALL);
    }

    /// In-bounds neighbors of a cell, with the side they lie on.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = (Side, Coord)> + '_ {
        Side::ALL
            .into_iter()
            .map(move |side| (side, side.step(coord)))
            .filter(move |&(_, c)| self.in_bounds(c))
    }

    /// Neighbors reachable through an open wall.
    pub fn open_neighbors(&self, coord: Coord) -> impl Iterator<Item = (Side, Coord)> + '_ {
        self.neighbors(coord)
            .filter(move |&(side, _)| self.wall(coord, side) == Grid::OPEN)
    }

    /// Resets every cell to `0` and every wall and junction to present.
    pub fn clear(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let value = if y % 2 == 1 && x % 2 == 1 { 0 } else { Grid::WALL };
                self.set_raw((y, x), value);
            }
        }
    }

    /// Resets every cell to `0`, leaving walls untouched.
    pub fn reset_cells(&mut self) {
        for coord in self.coords() {
            self.set_cell(coord, 0);
        }
    }

    /// Opens every interior wall segment. Border walls and junctions stay present.
    pub fn open_interior(&mut self) {
        for y in 1..self.height() - 1 {
            for x in 1..self.width() - 1 {
                if (y + x) % 2 == 1 {
                    self.set_raw((y, x), Grid::OPEN);
                }
            }
        }
    }

    /// Number of open interior walls.
    pub fn open_walls(&self) -> usize {
        self.coords()
            .map(|coord| {
                [Side::Right, Side::Down]
                    .into_iter()
                    .filter(|&side| self.is_open(coord, side))
                    .count()
            })
            .sum()
    }
}

impl Clone for Grid {
    /// Deep copy of the cells and walls. The copy never reports changes.
    fn clone(&self) -> Self {
        Grid {
            data: self.data.clone(),
            rows: self.rows,
            cols: self.cols,
            sender: None,
        }
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

impl Eq for Grid {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_rejects_empty_dimensions() {
        assert_eq!(
            Grid::new(0, 4),
            Err(GridError::InvalidDimensions { rows: 0, cols: 4 })
        );
        assert!(Grid::new(3, 0).is_err());
        assert!(Grid::new(1, 1).is_ok());
    }

    #[test]
    fn test_new_grid_is_cleared() {
        let grid = Grid::new(3, 4).unwrap();
        assert_eq!(grid.height(), 7);
        assert_eq!(grid.width(), 9);
        assert!(grid.coords().all(|c| grid.cell(c) == 0));
        assert!(
            grid.coords()
                .all(|c| Side::ALL.into_iter().all(|s| grid.wall(c, s) == Grid::WALL))
        );
        assert_eq!(grid.open_walls(), 0);
    }

    #[test]
    fn test_cell_and_wall_accessors() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set_cell((1, 2), 7);
        assert_eq!(grid.cell((1, 2)), 7);
        assert_eq!(grid.raw((3, 5)), 7);

        grid.carve((1, 1), Side::Right);
        assert_eq!(grid.wall((1, 1), Side::Right), 0);
        // The same wall seen from the other cell
        assert_eq!(grid.wall((1, 2), Side::Left), 0);
        assert!(grid.is_open((1, 2), Side::Left));
        assert_eq!(grid.open_walls(), 1);

        grid.build((1, 2), Side::Left);
        assert_eq!(grid.wall((1, 1), Side::Right), Grid::WALL);
    }

    #[test]
    fn test_border_walls_stay_present() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.carve((0, 0), Side::Up);
        grid.carve((1, 1), Side::Right);
        assert_eq!(grid.wall((0, 0), Side::Up), Grid::WALL);
        assert_eq!(grid.wall((1, 1), Side::Right), Grid::WALL);
        assert!(!grid.is_open((0, 0), Side::Up));
    }

    #[test]
    fn test_neighbor_cell() {
        let mut grid = Grid::new(2, 3).unwrap();
        grid.set_cell((0, 1), 5);
        assert_eq!(grid.neighbor_cell(WallCoord::new((1, 1), Side::Up)), 5);
        assert_eq!(
            grid.neighbor_cell(WallCoord::new((0, 1), Side::Up)),
            Grid::OUT_OF_RANGE
        );
        assert_eq!(
            grid.neighbor_cell(WallCoord::new((4, 4), Side::Up)),
            Grid::OUT_OF_RANGE
        );
    }

    #[test]
    fn test_clone_is_deep() {
        let mut grid = Grid::new(2, 2).unwrap();
        let copy = grid.clone();
        grid.carve((0, 0), Side::Right);
        assert_ne!(grid, copy);
        assert_eq!(copy.wall((0, 0), Side::Right), Grid::WALL);
    }

    #[test]
    fn test_clear_restores_walls() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.open_interior();
        grid.set_cell((2, 2), 3);
        assert_eq!(grid.open_walls(), 12);
        grid.clear();
        assert_eq!(grid, Grid::new(3, 3).unwrap());
    }

    #[test]
    fn test_sender_reports_changes() {
        let (tx, rx) = std::sync::mpsc::sync_channel(16);
        let mut grid = Grid::with_sender(2, 2, tx).unwrap();
        grid.set_cell((0, 0), 1);
        // Unchanged values are not reported
        grid.set_cell((0, 0), 1);
        grid.carve((0, 0), Side::Down);
        drop(grid);

        let events = rx.iter().collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                GridEvent::Initial { rows: 2, cols: 2 },
                GridEvent::Update {
                    position: (1, 1),
                    old: 0,
                    new: 1
                },
                GridEvent::Update {
                    position: (2, 1),
                    old: 1,
                    new: 0
                },
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_out_of_range_access_is_inert(
            rows in 1usize..8,
            cols in 1usize..8,
            row in 0usize..16,
            col in 0usize..16,
            value in 1i32..100,
        ) {
            prop_assume!(row >= rows || col >= cols);
            let mut grid = Grid::new(rows, cols).unwrap();
            let before = grid.clone();
            prop_assert_eq!(grid.cell((row, col)), Grid::OUT_OF_RANGE);
            grid.set_cell((row, col), value);
            for side in Side::ALL {
                prop_assert_eq!(grid.wall((row, col), side), Grid::OUT_OF_RANGE);
                grid.set_wall((row, col), side, 0);
            }
            prop_assert_eq!(grid, before);
        }
    }
}
