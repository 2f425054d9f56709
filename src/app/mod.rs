mod config;
mod glyph;
mod renderer;

pub use config::{AppConfig, ConfigError};
pub use glyph::{Glyph, Phase};
pub use renderer::{Overlay, Renderer};

use std::{
    io::{Stdout, Write},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    time::Duration,
};

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, KeyCode},
    queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};

use crate::{
    algorithm::AlgorithmError,
    generators::Generator,
    maze::{Coord, Grid, GridEvent, Route},
    runner::{Runner, RunnerConfig, RunnerEvent},
    solvers::Solver,
    topology::{self, Topology},
};

enum UserInputEvent {
    KeyPress(event::KeyEvent),
    Resize,
}

/// How one phase of the animation ended.
#[derive(Debug)]
enum Outcome {
    Completed,
    Failed(AlgorithmError),
    Cancelled,
}

/// Longest pause between two steps reachable with the arrow keys.
const MAX_DELAY: Duration = Duration::from_secs(1);

/// Halves the delay, dropping to no delay at all below a millisecond.
fn faster(delay: Duration) -> Duration {
    if delay <= Duration::from_millis(1) {
        Duration::ZERO
    } else {
        delay / 2
    }
}

fn slower(delay: Duration) -> Duration {
    if delay.is_zero() {
        Duration::from_millis(1)
    } else {
        (delay * 2).min(MAX_DELAY)
    }
}

fn io_error(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> std::io::Error {
    std::io::Error::other(e)
}

#[derive(Default)]
pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Install a file-backed subscriber for the `tracing` macros
    /// The returned guard flushes pending lines when dropped, so hold it until exit
    pub fn init_logging(config: &AppConfig) -> std::io::Result<WorkerGuard> {
        let directory = config
            .log_file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = config.log_file.file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("log file path {} has no file name", config.log_file.display()),
            )
        })?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name.to_string_lossy())
            .build(directory)
            .map_err(io_error)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .with_max_level(config.log_level)
            .try_init()
            .map_err(io_error)?;
        Ok(guard)
    }

    /// Set a panic hook to restore terminal state on panic
    /// This ensures that the terminal is not left in raw mode or alternate screen on panic
    /// even if the panic occurs in a different thread
    fn set_panic_hook() {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = App::restore_terminal(&mut std::io::stdout()); // ignore any errors as we are already failing
            hook(panic_info);
        }));
    }

    /// Setup terminal in raw mode and enter alternate screen
    /// Also sets a panic hook to restore terminal on panic
    pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        terminal::enable_raw_mode()?;
        App::set_panic_hook();
        queue!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Restore terminal to original state
    /// Leave alternate screen and disable raw mode
    pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        queue!(stdout, terminal::LeaveAlternateScreen, cursor::Show)?;
        stdout.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Main application loop
    pub fn run(&self, stdout: &mut Stdout) -> std::io::Result<()> {
        let Some((rows, cols)) = App::ask_maze_dimensions(stdout)? else {
            return Ok(());
        };

        let Some(generator) = App::select_from_menu(
            stdout,
            "Select maze generation algorithm (use arrow keys and Enter, or Esc to exit):",
            &Generator::ALL,
        )?
        else {
            return Ok(());
        };
        stdout.execute(style::PrintStyledContent(
            format!("Selected generator: {generator}\r\n")
                .with(Color::Green)
                .attribute(Attribute::Bold),
        ))?;

        let Some(solver) = App::select_from_menu(
            stdout,
            "Select maze solving algorithm (use arrow keys and Enter, or Esc to exit):",
            &Solver::ALL,
        )?
        else {
            return Ok(());
        };
        stdout.execute(style::PrintStyledContent(
            format!("Selected solver: {solver}\r\n")
                .with(Color::Green)
                .attribute(Attribute::Bold),
        ))?;

        queue!(
            stdout,
            style::PrintStyledContent(
                "Controls:\r\n"
                    .with(Color::Yellow)
                    .attribute(Attribute::Bold)
            ),
            style::PrintStyledContent("  Enter: Pause/Resume\r\n".with(Color::Cyan)),
            style::PrintStyledContent("  →: Single step when paused\r\n".with(Color::Cyan)),
            style::PrintStyledContent(
                "  ↑/↓: Shorter/longer delay between steps\r\n".with(Color::Cyan)
            ),
            style::PrintStyledContent("  Esc: Exit\r\n\r\n".with(Color::Cyan)),
            style::PrintStyledContent(
                "Press any key to start...\r\n"
                    .with(Color::Blue)
                    .attribute(Attribute::Bold)
            ),
        )?;
        stdout.flush()?;
        if App::wait_for_key()? == KeyCode::Esc {
            return Ok(());
        }

        tracing::info!("[app] {rows}x{cols} maze, {generator} then {solver}");

        // Set by the main thread once the animation is over, checked by the input thread
        let quit = Arc::new(AtomicBool::new(false));

        let (user_input_event_tx, user_input_event_rx) = mpsc::channel::<UserInputEvent>();
        let poll_timeout = self.config.input_poll_timeout;
        let quit_for_input = quit.clone();
        let input_thread_handle = std::thread::spawn(move || -> std::io::Result<()> {
            App::listen_to_user_input(user_input_event_tx, poll_timeout, &quit_for_input)
        });

        let (grid_event_tx, grid_event_rx) = mpsc::sync_channel(self.config.grid_event_buffer);
        let (overlay_tx, overlay_rx) = mpsc::channel::<Overlay>();
        let render_thread_handle = std::thread::spawn(move || {
            Renderer::new(std::io::stdout()).render(grid_event_rx, overlay_rx, poll_timeout)
        });

        let result = self.animate(
            rows,
            cols,
            generator,
            solver,
            grid_event_tx,
            &user_input_event_rx,
            &overlay_tx,
        );

        // Stop the input thread, then let the renderer drain and exit
        quit.store(true, Ordering::Relaxed);
        drop(overlay_tx);
        drop(user_input_event_rx);
        let _ = input_thread_handle.join();
        render_thread_handle
            .join()
            .expect("Render thread panicked")?;
        result
    }

    /// Generates then solves a maze, rendering every change
    /// Everything that holds the grid is dropped before returning, which lets the renderer exit
    #[allow(clippy::too_many_arguments)]
    fn animate(
        &self,
        rows: usize,
        cols: usize,
        generator: Generator,
        solver: Solver,
        grid_event_tx: mpsc::SyncSender<GridEvent>,
        user_input_event_rx: &Receiver<UserInputEvent>,
        overlay_tx: &Sender<Overlay>,
    ) -> std::io::Result<()> {
        let seed = self.config.seed;
        let runner_config = RunnerConfig {
            delay: self.config.delay,
            ..RunnerConfig::default()
        };
        let mut generation = Runner::new(runner_config);
        let mut solving = Runner::new(runner_config);
        let generation_events = generation.subscribe();
        let solving_events = solving.subscribe();
        let grid = Grid::with_sender(rows, cols, grid_event_tx).map_err(io_error)?;

        // Overlays go out before the grid changes they describe
        let _ = overlay_tx.send(Overlay::Phase(Phase::Generating));
        generation.set_algorithm(generator.build(grid, seed));
        generation.reset();
        generation.start();
        match self.drive(&mut generation, &generation_events, user_input_event_rx, overlay_tx) {
            Outcome::Completed => {}
            Outcome::Cancelled => return Ok(()),
            Outcome::Failed(e) => {
                let _ = overlay_tx.send(Overlay::Message(format!("{e}. Press Esc to exit...")));
                return App::wait_for_esc(user_input_event_rx, overlay_tx);
            }
        }

        let grid = generation
            .take_algorithm()
            .map(|algorithm| algorithm.into_grid())
            .ok_or_else(|| io_error("the generator did not hand back its grid"))?;
        let topology = topology::analyze(&grid);
        let (start, end) = ((0, 0), (rows - 1, cols - 1));

        let _ = overlay_tx.send(Overlay::Phase(Phase::Solving));
        let _ = overlay_tx.send(Overlay::Markers { start, end });
        let _ = overlay_tx.send(Overlay::Message(format!("Maze: {topology}")));
        solving.set_algorithm(solver.build(grid, start, end, seed));
        solving.reset();
        solving.start();
        let outcome = self.drive(&mut solving, &solving_events, user_input_event_rx, overlay_tx);
        let route = solving
            .algorithm()
            .and_then(|algorithm| algorithm.route())
            .cloned();
        let message = match outcome {
            Outcome::Cancelled => return Ok(()),
            Outcome::Completed => {
                let route = route.unwrap_or_default();
                let _ = overlay_tx.send(Overlay::Route(route.path().to_vec()));
                App::summary(&route, solving.steps(), &topology)
            }
            Outcome::Failed(e) => {
                if let Some(route) = route {
                    let _ = overlay_tx.send(Overlay::Route(route.path().to_vec()));
                }
                format!("{e}. Maze: {topology}")
            }
        };
        let _ = overlay_tx.send(Overlay::Message(format!("{message}. Press Esc to exit...")));
        App::wait_for_esc(user_input_event_rx, overlay_tx)
    }

    fn summary(route: &Route, steps: u64, topology: &Topology) -> String {
        match route.len() {
            0 => format!("No route after {steps} steps. Maze: {topology}"),
            len => format!("Route of {len} cells found in {steps} steps. Maze: {topology}"),
        }
    }

    fn status_line(runner: &Runner, label: &str) -> String {
        // Steps are only known while the runner holds the algorithm
        let steps = match runner.algorithm() {
            Some(_) => runner.steps().to_string(),
            None => "-".to_string(),
        };
        format!(
            "{label} | {} | {steps} steps | {:.2?} | delay {:?}",
            runner.state(),
            runner.elapsed(),
            runner.timeout()
        )
    }

    /// Runs the bound algorithm under keyboard control until it completes, fails or the
    /// user cancels
    fn drive(
        &self,
        runner: &mut Runner,
        runner_events: &Receiver<RunnerEvent>,
        user_input_event_rx: &Receiver<UserInputEvent>,
        overlay_tx: &Sender<Overlay>,
    ) -> Outcome {
        let mut label = runner.algorithm().map_or("", |algorithm| algorithm.label());
        loop {
            let mut changed = false;
            for event in runner_events.try_iter() {
                if let RunnerEvent::AlgorithmChanged { label: new } = event {
                    label = new;
                }
                changed = true;
            }

            match user_input_event_rx.recv_timeout(self.config.input_poll_timeout) {
                Ok(UserInputEvent::KeyPress(key_event)) => {
                    changed = true;
                    match key_event.code {
                        KeyCode::Esc => {
                            tracing::debug!("[app loop] Esc key pressed, cancelling");
                            if let Err(e) = runner.stop() {
                                tracing::warn!("[app loop] run ended with an error: {e}");
                            }
                            return Outcome::Cancelled;
                        }
                        KeyCode::Enter if runner.is_running() => {
                            if let Err(e) = runner.stop() {
                                return Outcome::Failed(e);
                            }
                        }
                        KeyCode::Enter => {
                            runner.start();
                        }
                        KeyCode::Right if !runner.is_running() => {
                            if let Err(e) = runner.step() {
                                return Outcome::Failed(e);
                            }
                        }
                        KeyCode::Up => runner.set_timeout(faster(runner.timeout())),
                        KeyCode::Down => runner.set_timeout(slower(runner.timeout())),
                        _ => {} // Ignore other keys
                    }
                }
                Ok(UserInputEvent::Resize) => {
                    let _ = overlay_tx.send(Overlay::Resize);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Outcome::Cancelled,
            }

            // A continuous run that ended on its own hands its result back here
            if !runner.is_running()
                && let Err(e) = runner.wait()
            {
                return Outcome::Failed(e);
            }
            if changed {
                let _ = overlay_tx.send(Overlay::Status(App::status_line(runner, label)));
            }
            if runner
                .algorithm()
                .is_some_and(|algorithm| algorithm.is_complete())
            {
                let _ = overlay_tx.send(Overlay::Status(App::status_line(runner, label)));
                return Outcome::Completed;
            }
        }
    }

    /// Profiling mode: generate and solve mazes without rendering to terminal
    pub fn profile(
        &self,
        rows: usize,
        cols: usize,
        generator: Generator,
        solver: Solver,
        iterations: usize,
    ) -> std::io::Result<()> {
        let (grid_event_tx, grid_event_rx) = mpsc::sync_channel(self.config.grid_event_buffer);
        // Stands in for the renderer, counting the events it would draw
        let drain_thread_handle = std::thread::spawn(move || grid_event_rx.iter().count());

        let seed = self.config.seed;
        let start: Coord = (0, 0);
        let end: Coord = (rows.saturating_sub(1), cols.saturating_sub(1));
        let mut generation = Runner::default();
        let mut solving = Runner::default();
        for iteration in 0..iterations {
            let grid =
                Grid::with_sender(rows, cols, grid_event_tx.clone()).map_err(io_error)?;
            generation.set_algorithm(generator.build(grid, seed));
            generation.reset();
            generation.start();
            generation.wait().map_err(io_error)?;
            let generated_in = generation.elapsed();
            let grid = generation
                .take_algorithm()
                .map(|algorithm| algorithm.into_grid())
                .ok_or_else(|| io_error("the generator did not hand back its grid"))?;
            let topology = topology::analyze(&grid);

            solving.set_algorithm(solver.build(grid, start, end, seed));
            solving.reset();
            solving.start();
            solving.wait().map_err(io_error)?;
            let route_len = solving
                .algorithm()
                .and_then(|algorithm| algorithm.route())
                .map_or(0, Route::len);
            tracing::info!(
                "[profile] #{iteration}: {generator} in {generated_in:?}, {solver} in {:?} ({} steps, {route_len}-cell route), {topology}",
                solving.elapsed(),
                solving.steps()
            );
            println!(
                "#{iteration}: generated in {generated_in:.2?}, solved in {:.2?}, route of {route_len} cells",
                solving.elapsed()
            );
        }

        drop(generation);
        drop(solving);
        drop(grid_event_tx);
        let events = drain_thread_handle
            .join()
            .expect("Drain thread panicked");
        println!("{events} grid events emitted");
        Ok(())
    }

    /// Listen for user input events (key presses and resize)
    /// This function runs in a separate thread, and is the only place where user input is read
    /// once the animation started
    fn listen_to_user_input(
        user_input_event_tx: Sender<UserInputEvent>,
        event_poll_timeout: Duration,
        quit: &AtomicBool,
    ) -> std::io::Result<()> {
        loop {
            if quit.load(Ordering::Relaxed) {
                return Ok(());
            }

            // Poll for events with a timeout
            if !event::poll(event_poll_timeout)? {
                // No event available, continue loop to check the flag again
                continue;
            }

            let input_event = match event::read()? {
                event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                    UserInputEvent::KeyPress(key_event)
                }
                event::Event::Resize(_, _) => UserInputEvent::Resize,
                _ => continue, // Ignore other events
            };

            if user_input_event_tx.send(input_event).is_err() {
                // Receiver has been dropped, exit the thread
                return Ok(());
            }
        }
    }

    /// Block until the user presses Esc, forwarding resizes to the renderer
    fn wait_for_esc(
        user_input_event_rx: &Receiver<UserInputEvent>,
        overlay_tx: &Sender<Overlay>,
    ) -> std::io::Result<()> {
        for event in user_input_event_rx.iter() {
            match event {
                UserInputEvent::KeyPress(event::KeyEvent {
                    code: KeyCode::Esc, ..
                }) => break,
                UserInputEvent::Resize => {
                    let _ = overlay_tx.send(Overlay::Resize);
                }
                UserInputEvent::KeyPress(_) => {}
            }
        }
        Ok(())
    }

    /// Wait for any key press and return its code
    fn wait_for_key() -> std::io::Result<KeyCode> {
        loop {
            if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()?
                && kind == event::KeyEventKind::Press
            {
                return Ok(code);
            }
        }
    }

    /// Get user input with real-time validation and feedback
    /// Returns None if user cancels input with Esc
    /// Returns Some(T) if user inputs a valid input and presses Enter, where T is the validated type
    fn prompt_with_validation<F, T>(
        stdout: &mut Stdout,
        prompt: &str,
        validate: F,
    ) -> std::io::Result<Option<T>>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        // Save cursor position so we can restore / redraw
        queue!(stdout, cursor::Hide, cursor::SavePosition)?;
        stdout.flush()?;

        let mut input = String::new();

        let value = loop {
            queue!(
                stdout,
                cursor::RestorePosition,
                terminal::Clear(ClearType::FromCursorDown)
            )?;
            stdout.queue(style::PrintStyledContent(
                prompt.with(Color::Cyan).attribute(Attribute::Bold),
            ))?;

            // Green while the input is acceptable, red otherwise
            let validation_result = validate(input.trim());
            let color = match validation_result {
                Ok(_) => Color::Green,
                Err(_) => Color::Red,
            };
            queue!(
                stdout,
                style::SetForegroundColor(color),
                style::Print(&input),
                style::ResetColor,
                style::Print(" \r\n")
            )?;
            if let Err(msg) = validation_result {
                stdout.queue(style::PrintStyledContent(
                    msg.with(Color::DarkGrey).attribute(Attribute::Dim),
                ))?;
            }
            stdout.flush()?;

            let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? else {
                continue;
            };
            if kind != event::KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Enter => {
                    if let Ok(value) = validate(input.trim()) {
                        break Some(value);
                    }
                }
                KeyCode::Char(c) if !c.is_whitespace() && !c.is_control() => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Esc => break None,
                _ => {}
            }
        };
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown),
            cursor::Show
        )?;
        stdout.flush()?;

        Ok(value)
    }

    /// Calculate max maze size based on terminal size and glyph size
    /// The doubled matrix of a maze of size n takes 2n + 1 glyphs, so this is half the
    /// largest odd glyph count that fits, and at least 1
    fn get_max_maze_size(term_size: u16, glyph_size: u16) -> usize {
        let odd_and_min_3 = |n: u16| if n % 2 == 0 && n > 0 { n - 1 } else { n }.max(3);
        usize::from(odd_and_min_3(term_size / glyph_size) / 2)
    }

    /// Checks one typed dimension against its maximum. Empty input picks the maximum.
    fn validate_dimension(input: &str, max_size: usize) -> Result<usize, String> {
        if input.is_empty() {
            return Ok(max_size);
        }
        let error_msg = format!("Please enter a valid number between 1 and {max_size}.");
        match input.parse::<usize>() {
            Ok(n) if (1..=max_size).contains(&n) => Ok(n),
            _ => Err(error_msg),
        }
    }

    /// Ask user for maze dimensions, bounded by the current terminal size
    /// Returns None if user cancels input with Esc
    fn ask_maze_dimensions(stdout: &mut Stdout) -> std::io::Result<Option<(usize, usize)>> {
        stdout.execute(style::PrintStyledContent(
            "Enter maze dimensions, or press Esc to exit. Leave empty for the largest maze \
that fits the current terminal size.\r\n"
                .with(Color::Blue),
        ))?;

        let (max_rows, max_cols) = match terminal::size() {
            Ok((term_width, term_height)) => (
                // Reserve rows for the status lines
                App::get_max_maze_size(
                    term_height.saturating_sub(Renderer::<Stdout>::NUM_STATUS_ROWS),
                    1,
                ),
                App::get_max_maze_size(term_width, Glyph::CELL_WIDTH),
            ),
            // Fallback to a fixed size if terminal size cannot be determined
            Err(_) => (u8::MAX as usize, u8::MAX as usize),
        };

        let Some(rows) = App::prompt_with_validation(stdout, "Rows: ", |s| {
            App::validate_dimension(s, max_rows)
        })?
        else {
            return Ok(None);
        };
        stdout.execute(style::PrintStyledContent(
            format!("Rows set to {rows}\r\n")
                .with(Color::Green)
                .attribute(Attribute::Bold),
        ))?;

        let Some(cols) = App::prompt_with_validation(stdout, "Columns: ", |s| {
            App::validate_dimension(s, max_cols)
        })?
        else {
            return Ok(None);
        };
        stdout.execute(style::PrintStyledContent(
            format!("Columns set to {cols}\r\n")
                .with(Color::Green)
                .attribute(Attribute::Bold),
        ))?;

        Ok(Some((rows, cols)))
    }

    /// Present a menu of options to the user and let them select one using arrow keys
    /// Returns None if user cancels input with Esc
    fn select_from_menu<T: std::fmt::Display + Copy>(
        stdout: &mut Stdout,
        prompt: &str,
        options: &[T],
    ) -> std::io::Result<Option<T>> {
        if options.is_empty() {
            return Ok(None);
        }

        queue!(stdout, cursor::Hide, cursor::SavePosition)?;

        let mut selected = 0;
        let choice = loop {
            queue!(
                stdout,
                cursor::RestorePosition,
                terminal::Clear(ClearType::FromCursorDown),
                style::PrintStyledContent(prompt.with(Color::Yellow))
            )?;
            for (i, option) in options.iter().enumerate() {
                let line = format!("\r\n{option}");
                if i == selected {
                    stdout.queue(style::PrintStyledContent(line.attribute(Attribute::Reverse)))?;
                } else {
                    stdout.queue(style::Print(line))?;
                }
            }
            stdout.queue(style::Print("\r\n"))?;
            stdout.flush()?;

            let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? else {
                continue;
            };
            if kind != event::KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Up => selected = (selected + options.len() - 1) % options.len(),
                KeyCode::Down => selected = (selected + 1) % options.len(),
                KeyCode::Enter => break Some(options[selected]),
                KeyCode::Esc => break None,
                _ => {}
            }
        };
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown),
            cursor::Show
        )?;
        stdout.flush()?;

        Ok(choice)
    }
}
