use std::fmt;

use crossterm::style::{Color, Stylize};

use crate::maze::Value;

/// Which kind of algorithm is currently drawing on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Generating,
    Solving,
}

/// What one position of the doubled matrix looks like on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Wall,
    Open,
    /// A cell a generator is holding on a frontier or a pending walk.
    Pending,
    /// A cell a solver has tagged.
    Explored,
    Route,
    Start,
    End,
}

impl Glyph {
    /// The width of each glyph when rendered, in character widths.
    pub const CELL_WIDTH: u16 = 2;

    /// The glyph of a raw grid value at `(y, x)` in the doubled matrix.
    ///
    /// Positions with an even coordinate are walls or junctions, the rest are cells. Cell tags
    /// mean different things while generating and while solving.
    pub fn for_value(phase: Phase, (y, x): (usize, usize), value: Value) -> Glyph {
        if y % 2 == 0 || x % 2 == 0 {
            return match value {
                0 => Glyph::Open,
                _ => Glyph::Wall,
            };
        }
        match (phase, value) {
            (_, ..=0) => Glyph::Open,
            // Visited cells of a generator are just part of the maze
            (Phase::Generating, 1) => Glyph::Open,
            (Phase::Generating, _) => Glyph::Pending,
            (Phase::Solving, _) => Glyph::Explored,
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styled_symbol = match self {
            Glyph::Wall => "⬜".with(Color::White),
            Glyph::Open => "  ".with(Color::Reset),
            Glyph::Pending => "🟪".with(Color::Magenta),
            Glyph::Explored => "* ".with(Color::Blue),
            Glyph::Route => "🟨".with(Color::Yellow),
            Glyph::Start => "🟩".with(Color::Green),
            Glyph::End => "🟥".with(Color::Red),
        };

        #[cfg(debug_assertions)]
        {
            use unicode_width::UnicodeWidthStr;
            assert_eq!(
                styled_symbol.content().width(),
                Glyph::CELL_WIDTH as usize,
                "Each glyph must occupy exactly two character widths."
            );
        }

        write!(f, "{}", styled_symbol)
    }
}
