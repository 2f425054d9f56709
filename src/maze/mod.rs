mod grid;
mod layout;
mod route;

use std::{error::Error, fmt};

pub use grid::{Grid, GridEvent, Value};
pub use route::Route;

/// A cell coordinate as `(row, col)`.
pub type Coord = (usize, usize);

/// One of the four sides of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Up,
    Right,
    Down,
    Left,
}

impl Side {
    /// All sides in clockwise order, starting from `Up`.
    pub const ALL: [Side; 4] = [Side::Up, Side::Right, Side::Down, Side::Left];

    pub fn opposite(self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Right => Side::Left,
            Side::Down => Side::Up,
            Side::Left => Side::Right,
        }
    }

    pub fn turn_left(self) -> Side {
        match self {
            Side::Up => Side::Left,
            Side::Right => Side::Up,
            Side::Down => Side::Right,
            Side::Left => Side::Down,
        }
    }

    pub fn turn_right(self) -> Side {
        match self {
            Side::Up => Side::Right,
            Side::Right => Side::Down,
            Side::Down => Side::Left,
            Side::Left => Side::Up,
        }
    }

    /// Offset of the wall on this side, in doubled-matrix units relative to the cell.
    pub(crate) fn delta(self) -> (isize, isize) {
        match self {
            Side::Up => (-1, 0),
            Side::Right => (0, 1),
            Side::Down => (1, 0),
            Side::Left => (0, -1),
        }
    }

    /// The coordinate one step away on this side.
    ///
    /// NOTE: This way of handling underflow is overflow-safe. Stepping up from row 0 or
    /// left from column 0 wraps to `usize::MAX`, which every bounds check filters out,
    /// and stepping down/right saturates instead of overflowing.
    pub fn step(self, (row, col): Coord) -> Coord {
        match self {
            Side::Up => (row.wrapping_sub(1), col),
            Side::Right => (row, col.saturating_add(1)),
            Side::Down => (row.saturating_add(1), col),
            Side::Left => (row, col.wrapping_sub(1)),
        }
    }

    /// The side of `from` that faces the adjacent cell `to`, if they are adjacent.
    pub fn between(from: Coord, to: Coord) -> Option<Side> {
        Side::ALL.into_iter().find(|side| side.step(from) == to)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Up => write!(f, "up"),
            Side::Right => write!(f, "right"),
            Side::Down => write!(f, "down"),
            Side::Left => write!(f, "left"),
        }
    }
}

/// Identifies a wall by a reference cell and the side of that cell it lies on.
///
/// A wall coordinate pointing out of the grid is not a valid mutation target.
/// Algorithms check boundedness before building one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WallCoord {
    pub cell: Coord,
    pub side: Side,
}

impl WallCoord {
    pub fn new(cell: Coord, side: Side) -> Self {
        WallCoord { cell, side }
    }

    /// The cell on the other side of the wall. May be out of range.
    pub fn neighbor(&self) -> Coord {
        self.side.step(self.cell)
    }
}

/// Errors raised while building a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A grid needs at least one row and one column.
    InvalidDimensions { rows: usize, cols: usize },
    /// An ASCII layout could not be decoded.
    Layout { line: usize, reason: String },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::InvalidDimensions { rows, cols } => {
                write!(f, "invalid grid dimensions {rows}x{cols}: both must be positive")
            }
            GridError::Layout { line, reason } => {
                write!(f, "invalid layout at line {line}: {reason}")
            }
        }
    }
}

impl Error for GridError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_turns_are_inverse() {
        for side in Side::ALL {
            assert_eq!(side.turn_left().turn_right(), side);
            assert_eq!(side.turn_right().turn_right(), side.opposite());
        }
    }

    #[test]
    fn test_step_wraps_out_of_range() {
        assert_eq!(Side::Up.step((0, 3)), (usize::MAX, 3));
        assert_eq!(Side::Left.step((2, 0)), (2, usize::MAX));
        assert_eq!(Side::Down.step((2, 3)), (3, 3));
    }

    #[test]
    fn test_between() {
        assert_eq!(Side::between((1, 1), (0, 1)), Some(Side::Up));
        assert_eq!(Side::between((1, 1), (1, 2)), Some(Side::Right));
        assert_eq!(Side::between((1, 1), (2, 2)), None);
    }

    #[test]
    fn test_wall_coord_neighbor() {
        let wall = WallCoord::new((2, 2), Side::Left);
        assert_eq!(wall.neighbor(), (2, 1));
    }
}
