use std::{
    collections::HashSet,
    io::Write,
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Duration,
};

use crossterm::{
    QueueableCommand, cursor, queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};

use crate::{
    app::glyph::{Glyph, Phase},
    maze::{Coord, Grid, GridEvent, Value},
};

/// Drawing instructions that do not come from the grid itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    /// A different kind of algorithm takes over the grid. Clears the route.
    Phase(Phase),
    Markers { start: Coord, end: Coord },
    Route(Vec<Coord>),
    /// Live runner status, shown on the first line below the maze.
    Status(String),
    /// Outcome messages, shown on the second line below the maze.
    Message(String),
    /// The terminal was resized.
    Resize,
}

/// Mirror of the doubled matrix plus everything drawn over it.
struct Canvas {
    height: usize,
    width: usize,
    values: Vec<Value>,
    phase: Phase,
    start: Option<(usize, usize)>,
    end: Option<(usize, usize)>,
    route: HashSet<(usize, usize)>,
}

fn position((row, col): Coord) -> (usize, usize) {
    (2 * row + 1, 2 * col + 1)
}

impl Canvas {
    /// A canvas matching a freshly built grid: every wall present, every cell clear.
    fn new(rows: usize, cols: usize, phase: Phase) -> Self {
        let (height, width) = (2 * rows + 1, 2 * cols + 1);
        let values = (0..height * width)
            .map(|i| match (i / width % 2, i % width % 2) {
                (1, 1) => 0,
                _ => Grid::WALL,
            })
            .collect();
        Canvas {
            height,
            width,
            values,
            phase,
            start: None,
            end: None,
            route: HashSet::new(),
        }
    }

    fn contains(&self, (y, x): (usize, usize)) -> bool {
        y < self.height && x < self.width
    }

    fn apply(&mut self, (y, x): (usize, usize), value: Value) {
        if self.contains((y, x)) {
            self.values[y * self.width + x] = value;
        }
    }

    fn glyph_at(&self, pos: (usize, usize)) -> Glyph {
        if self.start == Some(pos) {
            Glyph::Start
        } else if self.end == Some(pos) {
            Glyph::End
        } else if self.route.contains(&pos) {
            Glyph::Route
        } else {
            let value = self.values[pos.0 * self.width + pos.1];
            Glyph::for_value(self.phase, pos, value)
        }
    }

    /// Replaces the route, returning every position whose glyph may have changed.
    ///
    /// The route covers its cells and the open walls between consecutive cells.
    fn set_route(&mut self, path: &[Coord]) -> Vec<(usize, usize)> {
        let mut route = HashSet::new();
        for pair in path.windows(2) {
            let (a, b) = (position(pair[0]), position(pair[1]));
            route.insert(a);
            route.insert(((a.0 + b.0) / 2, (a.1 + b.1) / 2));
        }
        if let Some(&last) = path.last() {
            route.insert(position(last));
        }
        route.retain(|&pos| self.contains(pos));
        let mut changed = self
            .route
            .symmetric_difference(&route)
            .copied()
            .collect::<Vec<_>>();
        changed.sort_unstable();
        self.route = route;
        changed
    }

    fn set_markers(&mut self, start: Coord, end: Coord) -> Vec<(usize, usize)> {
        let (start, end) = (position(start), position(end));
        let changed = [self.start, self.end, Some(start), Some(end)]
            .into_iter()
            .flatten()
            .filter(|&pos| self.contains(pos))
            .collect();
        self.start = Some(start);
        self.end = Some(end);
        changed
    }
}

/// Draws grid events and overlays on a terminal.
pub struct Renderer<W: Write> {
    out: W,
    canvas: Option<Canvas>,
    phase: Phase,
    status: String,
    message: String,
    /// Whether the maze fits the terminal at its current size.
    fits: bool,
}

impl<W: Write> Renderer<W> {
    /// Lines reserved below the maze for the status and message lines.
    pub const NUM_STATUS_ROWS: u16 = 2;

    pub fn new(out: W) -> Self {
        Self {
            out,
            canvas: None,
            phase: Phase::Generating,
            status: String::new(),
            message: String::new(),
            fits: true,
        }
    }

    /// Whether the terminal can show a maze of this doubled size and its status lines.
    fn check_fits(height: usize, width: usize) -> bool {
        match terminal::size() {
            Ok((term_width, term_height)) => {
                width * Glyph::CELL_WIDTH as usize <= term_width as usize
                    && height + Self::NUM_STATUS_ROWS as usize <= term_height as usize
            }
            // Not a terminal, nothing to check against
            Err(_) => true,
        }
    }

    fn draw_position(&mut self, pos: (usize, usize)) -> std::io::Result<()> {
        let Some(canvas) = &self.canvas else {
            return Ok(());
        };
        if !self.fits || !canvas.contains(pos) {
            return Ok(());
        }
        let (x, y) = (pos.1 as u16 * Glyph::CELL_WIDTH, pos.0 as u16);
        queue!(
            self.out,
            cursor::MoveTo(x, y),
            style::Print(canvas.glyph_at(pos))
        )
    }

    fn draw_status(&mut self) -> std::io::Result<()> {
        let Some(canvas) = &self.canvas else {
            return Ok(());
        };
        if !self.fits {
            return Ok(());
        }
        let row = canvas.height as u16;
        queue!(
            self.out,
            cursor::MoveTo(0, row),
            terminal::Clear(ClearType::UntilNewLine),
            style::PrintStyledContent(self.status.as_str().with(Color::Cyan)),
            cursor::MoveTo(0, row + 1),
            terminal::Clear(ClearType::UntilNewLine),
            style::PrintStyledContent(
                self.message
                    .as_str()
                    .with(Color::Green)
                    .attribute(Attribute::Bold)
            ),
        )
    }

    /// Clears the screen and draws everything again, or asks for a larger terminal.
    fn redraw(&mut self) -> std::io::Result<()> {
        self.out.queue(terminal::Clear(ClearType::All))?;
        let Some(canvas) = &self.canvas else {
            return Ok(());
        };
        let (height, width) = (canvas.height, canvas.width);
        self.fits = Self::check_fits(height, width);
        if !self.fits {
            tracing::warn!("[render] terminal too small for a {height}x{width} matrix");
            let msg = format!(
                "Terminal size is too small to display the maze ({}x{} needed). Please resize the terminal.\r\n",
                width * Glyph::CELL_WIDTH as usize,
                height + Self::NUM_STATUS_ROWS as usize
            );
            queue!(
                self.out,
                cursor::MoveTo(0, 0),
                style::PrintStyledContent(msg.with(Color::Yellow).attribute(Attribute::Bold))
            )?;
            return Ok(());
        }
        for y in 0..height {
            self.out.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..width {
                if let Some(canvas) = &self.canvas {
                    self.out.queue(style::Print(canvas.glyph_at((y, x))))?;
                }
            }
        }
        self.draw_status()
    }

    fn apply_grid_event(&mut self, event: GridEvent) -> std::io::Result<()> {
        match event {
            GridEvent::Initial { rows, cols } => {
                tracing::debug!("[render] new {rows}x{cols} grid");
                self.canvas = Some(Canvas::new(rows, cols, self.phase));
                self.redraw()
            }
            GridEvent::Update { position, new, .. } => match self.canvas.as_mut() {
                Some(canvas) => {
                    canvas.apply(position, new);
                    self.draw_position(position)
                }
                // Skip if no grid was announced yet
                None => Ok(()),
            },
        }
    }

    fn apply_overlay(&mut self, overlay: Overlay) -> std::io::Result<()> {
        let changed = match overlay {
            Overlay::Status(status) => {
                self.status = status;
                return self.draw_status();
            }
            Overlay::Message(message) => {
                self.message = message;
                return self.draw_status();
            }
            Overlay::Resize => return self.redraw(),
            Overlay::Phase(phase) => {
                self.phase = phase;
                self.canvas.as_mut().map_or_else(Vec::new, |canvas| {
                    canvas.phase = phase;
                    canvas.set_route(&[])
                })
            }
            Overlay::Markers { start, end } => self
                .canvas
                .as_mut()
                .map_or_else(Vec::new, |canvas| canvas.set_markers(start, end)),
            Overlay::Route(path) => self
                .canvas
                .as_mut()
                .map_or_else(Vec::new, |canvas| canvas.set_route(&path)),
        };
        for pos in changed {
            self.draw_position(pos)?;
        }
        Ok(())
    }

    /// Applies every overlay already queued.
    fn drain_overlays(&mut self, overlay_rx: &Receiver<Overlay>) -> std::io::Result<()> {
        for overlay in overlay_rx.try_iter() {
            self.apply_overlay(overlay)?;
        }
        Ok(())
    }

    /// Render loop. Returns once every grid event sender is gone.
    ///
    /// Overlays queued before a grid event are applied before drawing that event.
    pub fn render(
        &mut self,
        grid_event_rx: Receiver<GridEvent>,
        overlay_rx: Receiver<Overlay>,
        poll_timeout: Duration,
    ) -> std::io::Result<()> {
        queue!(self.out, terminal::Clear(ClearType::All), cursor::Hide)?;
        self.out.flush()?;

        loop {
            let event = grid_event_rx.recv_timeout(poll_timeout);
            self.drain_overlays(&overlay_rx)?;
            match event {
                Ok(event) => self.apply_grid_event(event)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.out.flush()?;
        }

        // Move cursor below the maze after exiting
        let below = self
            .canvas
            .as_ref()
            .map_or(0, |canvas| canvas.height as u16 + Self::NUM_STATUS_ROWS);
        queue!(self.out, cursor::MoveTo(0, below), cursor::Show)?;
        self.out.flush()?;
        tracing::debug!("[render] grid channel closed, exiting");
        Ok(())
    }
}
