//! Plain-text layout of a grid's walls.
//!
//! A layout has `2 * rows + 1` lines of `2 * cols + 1` characters, one per position of the
//! doubled matrix. On wall and junction positions a space is an open wall and any other
//! character is a present wall. Cell positions are ignored on input and printed as spaces.
//!
//! ```text
//! +-+-+
//! |   |
//! + +-+
//! | | |
//! +-+-+
//! ```

use std::fmt;

use super::{Grid, GridError};

impl Grid {
    /// Decodes a layout into a fresh grid. Trailing blank lines are ignored.
    pub fn from_ascii(layout: &str) -> Result<Grid, GridError> {
        let lines = layout
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect::<Vec<_>>();
        let lines = match lines.iter().rposition(|line| !line.trim().is_empty()) {
            Some(last) => &lines[..=last],
            None => &[][..],
        };

        if lines.len() < 3 || lines.len() % 2 == 0 {
            return Err(GridError::Layout {
                line: lines.len(),
                reason: format!("expected an odd number of lines (at least 3), got {}", lines.len()),
            });
        }
        let width = lines[0].chars().count();
        if width < 3 || width % 2 == 0 {
            return Err(GridError::Layout {
                line: 1,
                reason: format!("expected an odd line width (at least 3), got {width}"),
            });
        }

        let mut grid = Grid::new((lines.len() - 1) / 2, (width - 1) / 2)?;
        for (y, line) in lines.iter().enumerate() {
            let chars = line.chars().collect::<Vec<_>>();
            if chars.len() != width {
                return Err(GridError::Layout {
                    line: y + 1,
                    reason: format!("expected {width} characters, got {}", chars.len()),
                });
            }
            for (x, &ch) in chars.iter().enumerate() {
                // Cell positions carry no wall information
                if y % 2 == 1 && x % 2 == 1 {
                    continue;
                }
                let value = if ch == ' ' { Grid::OPEN } else { Grid::WALL };
                if grid.is_border((y, x)) {
                    if value == Grid::OPEN {
                        return Err(GridError::Layout {
                            line: y + 1,
                            reason: format!("border opening at column {}", x + 1),
                        });
                    }
                    continue;
                }
                grid.set_raw((y, x), value);
            }
        }
        Ok(grid)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height() {
            let line = (0..self.width())
                .map(|x| match (y % 2, x % 2) {
                    (1, 1) => ' ',
                    _ if self.raw((y, x)) == Grid::OPEN => ' ',
                    (0, 0) => '+',
                    (0, _) => '-',
                    _ => '|',
                })
                .collect::<String>();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Side;

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
    fn test_from_ascii_reads_walls() {
        let grid = Grid::from_ascii(SPIRAL).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (3, 4));
        assert!(grid.is_open((0, 0), Side::Right));
        assert!(!grid.is_open((0, 0), Side::Down));
        assert!(grid.is_open((0, 3), Side::Down));
        assert!(!grid.is_open((1, 2), Side::Right));
        assert!(grid.is_open((1, 0), Side::Down));
        assert!(!grid.is_open((1, 1), Side::Down));
        assert!(!grid.is_open((2, 1), Side::Right));
        assert_eq!(grid.open_walls(), 11);
    }

    #[test]
    fn test_layout_round_trip() {
        let grid = Grid::from_ascii(SPIRAL).unwrap();
        assert_eq!(grid.to_string(), SPIRAL);
        assert_eq!(Grid::from_ascii(&grid.to_string()).unwrap(), grid);
    }

    #[test]
    fn test_from_ascii_rejects_bad_layouts() {
        assert!(matches!(
            Grid::from_ascii("+-+\n| |\n"),
            Err(GridError::Layout { .. })
        ));
        assert!(matches!(
            Grid::from_ascii("+-+\n| |\n+-+-+\n"),
            Err(GridError::Layout { line: 3, .. })
        ));
        assert!(matches!(
            Grid::from_ascii("+ +\n| |\n+-+\n"),
            Err(GridError::Layout { line: 1, .. })
        ));
    }
}
