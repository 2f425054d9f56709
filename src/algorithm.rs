//! The lifecycle shared by every generation and solving strategy.

use std::{error::Error, fmt};

use rand::{SeedableRng, rngs::StdRng};

use crate::maze::{Grid, Route};

/// A step-driven algorithm bound to one grid for its whole lifetime.
///
/// The lifecycle is `init` -> `step`* -> `finish`. `init` can be called again to restart on
/// the same grid. Stepping before `init`, or after completion, does nothing.
pub trait Algorithm: Send {
    /// Stable identifier of the strategy, for display and logging.
    fn label(&self) -> &'static str;

    /// (Re-)derives all private state from the current grid contents.
    fn init(&mut self);

    /// Whether `init` has run at least once.
    fn is_initialized(&self) -> bool;

    /// Whether the algorithm reached its completion criterion. Stays true once true.
    fn is_complete(&self) -> bool;

    /// Performs one unit of work.
    fn step(&mut self) -> Result<(), AlgorithmError>;

    /// Post-processing after the step that completed the run.
    fn finish(&mut self) -> Result<(), AlgorithmError> {
        Ok(())
    }

    /// The grid this algorithm works on.
    fn grid(&self) -> &Grid;

    /// Releases the grid, dropping the algorithm state.
    fn into_grid(self: Box<Self>) -> Grid;

    /// The route computed so far. Generators have none.
    fn route(&self) -> Option<&Route> {
        None
    }
}

/// Errors surfaced by an algorithm run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmError {
    /// A solver ran out of candidates before reaching the end cell.
    SearchExhausted {
        label: &'static str,
        /// Cells reached before giving up.
        explored: usize,
    },
    /// The thread driving a continuous run panicked.
    WorkerPanicked,
}

impl fmt::Display for AlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmError::SearchExhausted { label, explored } => write!(
                f,
                "{label} exhausted its search after reaching {explored} cells without finding the end"
            ),
            AlgorithmError::WorkerPanicked => write!(f, "the algorithm worker thread panicked"),
        }
    }
}

impl Error for AlgorithmError {}

/// A random generator which can be rewound to its seed when an algorithm restarts.
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: Option<u64>,
    rng: StdRng,
}

impl SeededRng {
    /// Seeds from `seed`, or from the OS when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        SeededRng { seed, rng }
    }

    /// Rewinds to the seed. Unseeded generators keep their current stream.
    pub fn restart(&mut self) {
        if let Some(s) = self.seed {
            self.rng = StdRng::seed_from_u64(s);
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Logs a step request made before `init`. Such requests are ignored.
pub(crate) fn warn_uninitialized(label: &str) {
    tracing::warn!("[{label}] stepped before init, ignoring");
}

/// Drives an initialized algorithm to completion on the calling thread, then finishes it.
///
/// Returns the number of steps taken. Beware of algorithms without a termination
/// guarantee, such as the random mouse.
pub fn complete(algorithm: &mut dyn Algorithm) -> Result<u64, AlgorithmError> {
    if !algorithm.is_initialized() {
        tracing::warn!(
            "[algorithm] {} driven before init, nothing to do",
            algorithm.label()
        );
        return Ok(0);
    }
    let mut steps = 0;
    while !algorithm.is_complete() {
        algorithm.step()?;
        steps += 1;
    }
    algorithm.finish()?;
    Ok(steps)
}
