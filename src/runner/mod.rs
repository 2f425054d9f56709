mod timer;

use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

pub use timer::Stopwatch;

use crate::algorithm::{Algorithm, AlgorithmError};

/// Tuning knobs of a [`Runner`].
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    /// Pause between two steps of a continuous run.
    pub delay: Duration,
    /// Minimum interval between two [`RunnerEvent::TimerUpdated`] notifications.
    pub tick: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            tick: Duration::from_millis(100),
        }
    }
}

/// Notifications sent to every subscriber of a [`Runner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// A new algorithm was bound.
    AlgorithmChanged { label: &'static str },
    /// The inter-step delay changed.
    TimeoutChanged(Duration),
    TimerStarted,
    TimerUpdated(Duration),
    TimerStopped(Duration),
    TimerReset,
    /// A single step was performed on request.
    Stepped { steps: u64 },
    /// The bound algorithm completed and was finished.
    Completed { label: &'static str, steps: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Nothing in progress.
    Idle,
    /// Single steps were taken and the algorithm is not complete yet.
    Stepping,
    /// A continuous run is in progress on the worker thread.
    Running,
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerState::Idle => write!(f, "idle"),
            RunnerState::Stepping => write!(f, "stepping"),
            RunnerState::Running => write!(f, "running"),
        }
    }
}

/// The bound algorithm together with its run bookkeeping.
struct Bound {
    algorithm: Box<dyn Algorithm>,
    finished: bool,
    steps: u64,
}

impl Bound {
    fn new(algorithm: Box<dyn Algorithm>) -> Self {
        Bound {
            algorithm,
            finished: false,
            steps: 0,
        }
    }

    /// Calls `finish` once, right after the algorithm completes.
    fn finish_if_complete(&mut self) -> Result<bool, AlgorithmError> {
        if self.finished || !self.algorithm.is_complete() {
            return Ok(false);
        }
        self.finished = true;
        self.algorithm.finish()?;
        Ok(true)
    }
}

/// The continuous-mode thread. Hands the algorithm back when joined.
struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<(Bound, Result<(), AlgorithmError>)>,
}

/// Drives one bound algorithm, either a step at a time or continuously on a worker thread.
///
/// Steps are strictly sequential: while a continuous run is in progress the algorithm lives
/// on the worker thread and single-step requests are ignored. Stopping is cooperative and
/// observed between steps.
pub struct Runner {
    config: RunnerConfig,
    /// Inter-step delay in microseconds, shared with the worker so it can change mid-run.
    delay: Arc<AtomicU64>,
    bound: Option<Bound>,
    worker: Option<Worker>,
    timer: Arc<Mutex<Stopwatch>>,
    observers: Vec<Sender<RunnerEvent>>,
    stepping: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Runner::new(RunnerConfig::default())
    }
}

fn lock(timer: &Mutex<Stopwatch>) -> MutexGuard<'_, Stopwatch> {
    // A poisoned stopwatch is still a valid stopwatch
    timer.lock().unwrap_or_else(PoisonError::into_inner)
}

fn broadcast(observers: &[Sender<RunnerEvent>], event: RunnerEvent) {
    for observer in observers {
        let _ = observer.send(event.clone());
    }
}

fn as_micros(duration: Duration) -> u64 {
    duration.as_micros().try_into().unwrap_or(u64::MAX)
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Runner {
            delay: Arc::new(AtomicU64::new(as_micros(config.delay))),
            config,
            bound: None,
            worker: None,
            timer: Arc::new(Mutex::new(Stopwatch::new())),
            observers: Vec::new(),
            stepping: false,
        }
    }

    /// Registers a new observer. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<RunnerEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, event: RunnerEvent) {
        self.observers
            .retain(|observer| observer.send(event.clone()).is_ok());
    }

    /// Binds a new algorithm, stopping any run in progress and resetting the timer.
    ///
    /// Returns the previously bound algorithm.
    pub fn set_algorithm(&mut self, algorithm: Box<dyn Algorithm>) -> Option<Box<dyn Algorithm>> {
        let previous = self.take_algorithm();
        let label = algorithm.label();
        tracing::info!("[runner] bound algorithm {label}");
        self.bound = Some(Bound::new(algorithm));
        self.stepping = false;
        lock(&self.timer).reset();
        self.notify(RunnerEvent::AlgorithmChanged { label });
        self.notify(RunnerEvent::TimerReset);
        previous
    }

    /// Unbinds the current algorithm, stopping any run in progress first.
    pub fn take_algorithm(&mut self) -> Option<Box<dyn Algorithm>> {
        if let Err(e) = self.stop() {
            tracing::warn!("[runner] run ended with an error while unbinding: {e}");
        }
        self.stepping = false;
        self.bound.take().map(|bound| bound.algorithm)
    }

    /// The bound algorithm. `None` when unbound or while a continuous run holds it.
    pub fn algorithm(&self) -> Option<&dyn Algorithm> {
        self.bound.as_ref().map(|bound| bound.algorithm.as_ref())
    }

    /// Sets the pause between steps of a continuous run. Applies to a run in progress.
    pub fn set_timeout(&mut self, delay: Duration) {
        self.delay.store(as_micros(delay), Ordering::Relaxed);
        self.config.delay = delay;
        tracing::debug!("[runner] inter-step delay set to {delay:?}");
        self.notify(RunnerEvent::TimeoutChanged(delay));
    }

    pub fn timeout(&self) -> Duration {
        self.config.delay
    }

    /// Running time accumulated by the bound algorithm.
    pub fn elapsed(&self) -> Duration {
        lock(&self.timer).elapsed()
    }

    /// Steps taken by the bound algorithm since it was bound or reset.
    pub fn steps(&self) -> u64 {
        self.bound.as_ref().map_or(0, |bound| bound.steps)
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    pub fn state(&self) -> RunnerState {
        if self.is_running() {
            RunnerState::Running
        } else if self.stepping {
            RunnerState::Stepping
        } else {
            RunnerState::Idle
        }
    }

    /// Performs one step of the bound algorithm, finishing it if that step completes it.
    ///
    /// Returns whether the algorithm is complete. Requests without an initialized algorithm,
    /// or during a continuous run, are logged and ignored.
    pub fn step(&mut self) -> Result<bool, AlgorithmError> {
        self.reap()?;
        if self.worker.is_some() {
            tracing::warn!("[runner] single step requested during a continuous run, ignoring");
            return Ok(false);
        }
        let Some(bound) = self.bound.as_mut() else {
            tracing::warn!("[runner] single step requested with no algorithm bound, ignoring");
            return Ok(false);
        };
        if !bound.algorithm.is_initialized() {
            tracing::warn!(
                "[runner] {} stepped before init, ignoring",
                bound.algorithm.label()
            );
            return Ok(false);
        }
        if bound.algorithm.is_complete() {
            // Some algorithms are complete straight after init and still need finishing
            if bound.finish_if_complete()? {
                let (label, steps) = (bound.algorithm.label(), bound.steps);
                self.stepping = false;
                tracing::info!("[runner] {label} completed after {steps} steps");
                self.notify(RunnerEvent::Completed { label, steps });
            }
            return Ok(true);
        }

        lock(&self.timer).start();
        let result = bound.algorithm.step();
        lock(&self.timer).stop();
        result?;
        bound.steps += 1;
        let steps = bound.steps;
        let label = bound.algorithm.label();
        let completed = bound.finish_if_complete()?;

        self.stepping = !completed;
        self.notify(RunnerEvent::Stepped { steps });
        let elapsed = self.elapsed();
        self.notify(RunnerEvent::TimerUpdated(elapsed));
        if completed {
            tracing::info!("[runner] {label} completed after {steps} steps");
            self.notify(RunnerEvent::Completed { label, steps });
        }
        Ok(completed)
    }

    /// Starts a continuous run on a worker thread.
    ///
    /// Returns whether a run is in progress afterwards. Starting with no initialized
    /// algorithm bound is logged and ignored.
    pub fn start(&mut self) -> bool {
        if let Err(e) = self.reap() {
            tracing::warn!("[runner] previous run ended with an error: {e}");
        }
        if self.worker.is_some() {
            tracing::debug!("[runner] start requested while already running");
            return true;
        }
        let Some(bound) = self.bound.take() else {
            tracing::warn!("[runner] start requested with no algorithm bound, ignoring");
            return false;
        };
        if !bound.algorithm.is_initialized() || bound.finished {
            if bound.finished {
                tracing::debug!("[runner] {} is already complete", bound.algorithm.label());
            } else {
                tracing::warn!(
                    "[runner] {} started before init, ignoring",
                    bound.algorithm.label()
                );
            }
            self.bound = Some(bound);
            return false;
        }

        tracing::info!("[runner] starting continuous run of {}", bound.algorithm.label());
        let (stop_tx, stop_rx) = mpsc::channel();
        let observers = self.observers.clone();
        let timer = self.timer.clone();
        let delay = self.delay.clone();
        let tick = self.config.tick;
        let handle = std::thread::spawn(move || {
            run_continuous(bound, &stop_rx, &observers, &timer, &delay, tick)
        });
        self.worker = Some(Worker { stop_tx, handle });
        self.stepping = false;
        true
    }

    /// Requests a continuous run to stop and waits for the in-flight step to end.
    pub fn stop(&mut self) -> Result<(), AlgorithmError> {
        match self.worker.take() {
            Some(worker) => {
                // The worker may have finished already and dropped its receiver
                let _ = worker.stop_tx.send(());
                self.join(worker)
            }
            None => Ok(()),
        }
    }

    /// Blocks until a continuous run ends on its own.
    pub fn wait(&mut self) -> Result<(), AlgorithmError> {
        match self.worker.take() {
            Some(worker) => self.join(worker),
            None => Ok(()),
        }
    }

    /// Stops any run, re-initializes the bound algorithm and zeroes the timer.
    pub fn reset(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("[runner] run ended with an error before reset: {e}");
        }
        match self.bound.as_mut() {
            Some(bound) => {
                bound.algorithm.init();
                bound.finished = false;
                bound.steps = 0;
                tracing::debug!("[runner] {} reset", bound.algorithm.label());
            }
            None => tracing::warn!("[runner] reset requested with no algorithm bound"),
        }
        self.stepping = false;
        lock(&self.timer).reset();
        self.notify(RunnerEvent::TimerReset);
    }

    /// Joins a worker that already ended, taking the algorithm back.
    fn reap(&mut self) -> Result<(), AlgorithmError> {
        match self.worker.take() {
            Some(worker) if worker.handle.is_finished() => self.join(worker),
            other => {
                self.worker = other;
                Ok(())
            }
        }
    }

    fn join(&mut self, worker: Worker) -> Result<(), AlgorithmError> {
        match worker.handle.join() {
            Ok((bound, result)) => {
                self.bound = Some(bound);
                result
            }
            Err(_) => {
                tracing::error!("[runner] worker thread panicked, the algorithm is lost");
                lock(&self.timer).stop();
                Err(AlgorithmError::WorkerPanicked)
            }
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.handle.join();
        }
    }
}

/// Body of the worker thread: steps until completion or a stop request.
fn run_continuous(
    mut bound: Bound,
    stop_rx: &Receiver<()>,
    observers: &[Sender<RunnerEvent>],
    timer: &Mutex<Stopwatch>,
    delay: &AtomicU64,
    tick: Duration,
) -> (Bound, Result<(), AlgorithmError>) {
    lock(timer).start();
    broadcast(observers, RunnerEvent::TimerStarted);

    let mut result = Ok(());
    let mut last_tick = Instant::now();
    while !bound.algorithm.is_complete() {
        if let Err(e) = bound.algorithm.step() {
            tracing::error!("[runner] {} failed: {e}", bound.algorithm.label());
            result = Err(e);
            break;
        }
        bound.steps += 1;
        if last_tick.elapsed() >= tick {
            broadcast(observers, RunnerEvent::TimerUpdated(lock(timer).elapsed()));
            last_tick = Instant::now();
        }
        if bound.algorithm.is_complete() {
            break;
        }

        let pause = Duration::from_micros(delay.load(Ordering::Relaxed));
        let should_stop = if pause.is_zero() {
            !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
        } else {
            !matches!(stop_rx.recv_timeout(pause), Err(RecvTimeoutError::Timeout))
        };
        if should_stop {
            tracing::debug!(
                "[runner] {} interrupted after {} steps",
                bound.algorithm.label(),
                bound.steps
            );
            break;
        }
    }

    let elapsed = {
        let mut timer = lock(timer);
        timer.stop();
        timer.elapsed()
    };
    broadcast(observers, RunnerEvent::TimerStopped(elapsed));

    if result.is_ok() {
        match bound.finish_if_complete() {
            Ok(true) => {
                let label = bound.algorithm.label();
                tracing::info!("[runner] {label} completed after {} steps", bound.steps);
                broadcast(
                    observers,
                    RunnerEvent::Completed {
                        label,
                        steps: bound.steps,
                    },
                );
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("[runner] {} failed to finish: {e}", bound.algorithm.label());
                result = Err(e);
            }
        }
    }
    (bound, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generators::{Generator, generate_maze},
        maze::{Grid, Route, Side},
        solvers::Solver,
    };

    /// Opens the walls of the first row one step at a time.
    struct Corridor {
        grid: Grid,
        next: Option<usize>,
        finishes: usize,
    }

    impl Corridor {
        fn boxed(cols: usize) -> Box<Self> {
            Box::new(Corridor {
                grid: Grid::new(1, cols).unwrap(),
                next: None,
                finishes: 0,
            })
        }
    }

    impl Algorithm for Corridor {
        fn label(&self) -> &'static str {
            "corridor"
        }

        fn init(&mut self) {
            self.grid.clear();
            self.next = Some(0);
        }

        fn is_initialized(&self) -> bool {
            self.next.is_some()
        }

        fn is_complete(&self) -> bool {
            self.next.is_some_and(|col| col + 1 >= self.grid.cols())
        }

        fn step(&mut self) -> Result<(), AlgorithmError> {
            if let Some(col) = self.next.as_mut()
                && *col + 1 < self.grid.cols()
            {
                self.grid.carve((0, *col), Side::Right);
                *col += 1;
            }
            Ok(())
        }

        fn finish(&mut self) -> Result<(), AlgorithmError> {
            self.finishes += 1;
            self.grid.set_cell((0, 0), self.finishes as i32);
            Ok(())
        }

        fn grid(&self) -> &Grid {
            &self.grid
        }

        fn into_grid(self: Box<Self>) -> Grid {
            self.grid
        }
    }

    #[test]
    fn test_unbound_runner_is_inert() {
        let mut runner = Runner::default();
        assert!(!runner.start());
        assert_eq!(runner.step(), Ok(false));
        assert_eq!(runner.state(), RunnerState::Idle);
        runner.reset();
        assert!(runner.stop().is_ok());
    }

    #[test]
    fn test_uninitialized_algorithm_is_not_stepped() {
        let mut runner = Runner::default();
        runner.set_algorithm(Corridor::boxed(4));
        assert_eq!(runner.step(), Ok(false));
        assert!(!runner.start());
        assert_eq!(runner.steps(), 0);
    }

    #[test]
    fn test_single_steps_finish_once() {
        let mut runner = Runner::default();
        let events = runner.subscribe();
        runner.set_algorithm(Corridor::boxed(4));
        runner.reset();

        assert_eq!(runner.step(), Ok(false));
        assert_eq!(runner.state(), RunnerState::Stepping);
        assert_eq!(runner.step(), Ok(false));
        assert_eq!(runner.step(), Ok(true));
        // Further steps are no-ops
        assert_eq!(runner.step(), Ok(true));
        assert_eq!(runner.steps(), 3);
        assert_eq!(runner.state(), RunnerState::Idle);

        let grid = runner.take_algorithm().unwrap().into_grid();
        assert_eq!(grid.cell((0, 0)), 1, "finish must run exactly once");
        assert_eq!(grid.open_walls(), 3);

        let events = events.try_iter().collect::<Vec<_>>();
        assert_eq!(events[0], RunnerEvent::AlgorithmChanged { label: "corridor" });
        assert!(events.contains(&RunnerEvent::Stepped { steps: 3 }));
        assert!(events.contains(&RunnerEvent::Completed {
            label: "corridor",
            steps: 3
        }));
    }

    #[test]
    fn test_continuous_run_completes() {
        let mut runner = Runner::default();
        let events = runner.subscribe();
        runner.set_algorithm(Corridor::boxed(16));
        runner.reset();
        assert!(runner.start());
        assert!(runner.algorithm().is_none());
        assert_eq!(runner.wait(), Ok(()));

        let algorithm = runner.algorithm().unwrap();
        assert!(algorithm.is_complete());
        assert_eq!(algorithm.grid().cell((0, 0)), 1);
        assert_eq!(runner.steps(), 15);
        // Completed runs do not restart
        assert!(!runner.start());

        let events = events.try_iter().collect::<Vec<_>>();
        assert!(events.contains(&RunnerEvent::TimerStarted));
        assert!(events.iter().any(|e| matches!(e, RunnerEvent::TimerStopped(_))));
        assert!(events.contains(&RunnerEvent::Completed {
            label: "corridor",
            steps: 15
        }));
    }

    #[test]
    fn test_stop_interrupts_between_steps() {
        let mut runner = Runner::new(RunnerConfig {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        runner.set_algorithm(Corridor::boxed(100));
        runner.reset();
        assert!(runner.start());
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(runner.stop(), Ok(()));
        assert_eq!(runner.state(), RunnerState::Idle);

        let algorithm = runner.algorithm().unwrap();
        assert!(!algorithm.is_complete());
        let taken = runner.steps();
        assert!(taken > 0 && taken < 99);
        assert!(runner.elapsed() > Duration::ZERO);

        // Resuming picks up where the run stopped
        runner.set_timeout(Duration::ZERO);
        assert!(runner.start());
        assert_eq!(runner.wait(), Ok(()));
        assert_eq!(runner.steps(), 99);
    }

    #[test]
    fn test_reset_restarts_algorithm() {
        let mut runner = Runner::default();
        let events = runner.subscribe();
        runner.set_algorithm(Corridor::boxed(3));
        runner.reset();
        while !runner.step().unwrap() {}
        runner.reset();
        assert_eq!(runner.steps(), 0);
        assert_eq!(runner.elapsed(), Duration::ZERO);
        assert!(!runner.algorithm().unwrap().is_complete());
        assert_eq!(runner.algorithm().unwrap().grid().open_walls(), 0);
        assert!(events.try_iter().any(|e| e == RunnerEvent::TimerReset));
    }

    #[test]
    fn test_timeout_change_is_notified() {
        let mut runner = Runner::default();
        let events = runner.subscribe();
        runner.set_timeout(Duration::from_millis(5));
        assert_eq!(runner.timeout(), Duration::from_millis(5));
        assert_eq!(
            events.try_recv(),
            Ok(RunnerEvent::TimeoutChanged(Duration::from_millis(5)))
        );
    }

    /// Runs one fresh instance to completion a step at a time and another continuously.
    fn run_both_ways<F>(build: F) -> [(Grid, Option<Route>); 2]
    where
        F: Fn() -> Box<dyn Algorithm>,
    {
        let mut stepped = Runner::default();
        stepped.set_algorithm(build());
        stepped.reset();
        while !stepped.step().unwrap() {}

        let mut continuous = Runner::default();
        continuous.set_algorithm(build());
        continuous.reset();
        continuous.start();
        continuous.wait().unwrap();

        [stepped, continuous].map(|mut runner| {
            let algorithm = runner.take_algorithm().unwrap();
            let route = algorithm.route().cloned();
            (algorithm.into_grid(), route)
        })
    }

    #[test]
    fn test_single_step_and_continuous_agree() {
        for generator in [Generator::Kruskal, Generator::Wilson, Generator::Eller] {
            for (rows, cols) in [(6, 7), (1, 1)] {
                let [left, right] =
                    run_both_ways(|| generator.build(Grid::new(rows, cols).unwrap(), Some(11)));
                assert_eq!(left, right, "{generator} diverged on {rows}x{cols}");
            }
        }
    }

    #[test]
    fn test_solvers_agree_across_modes() {
        let maze = generate_maze(Grid::new(6, 7).unwrap(), Generator::Prim, Some(3)).unwrap();
        for solver in Solver::ALL {
            for (start, end) in [((0, 0), (5, 6)), ((2, 3), (2, 3))] {
                let [left, right] =
                    run_both_ways(|| solver.build(maze.clone(), start, end, Some(5)));
                assert_eq!(left, right, "{solver} diverged from {start:?} to {end:?}");
                let route = left.1.unwrap();
                assert!(route.is_complete(), "{solver} from {start:?} to {end:?}");
            }
        }
    }

    #[test]
    fn test_single_step_finishes_algorithm_complete_at_init() {
        let mut grid = Grid::new(1, 2).unwrap();
        grid.open_interior();
        let mut runner = Runner::default();
        let events = runner.subscribe();
        runner.set_algorithm(Solver::Lee.build(grid, (0, 0), (0, 0), None));
        runner.reset();
        assert!(runner.algorithm().unwrap().is_complete());

        assert_eq!(runner.step(), Ok(true));
        assert_eq!(runner.steps(), 0);
        let route = runner.algorithm().unwrap().route().cloned().unwrap();
        assert_eq!(route.path(), &[(0, 0)]);
        // Finishing happens once
        assert_eq!(runner.step(), Ok(true));

        let completions = events
            .try_iter()
            .filter(|e| matches!(e, RunnerEvent::Completed { .. }))
            .collect::<Vec<_>>();
        assert_eq!(
            completions,
            vec![RunnerEvent::Completed {
                label: "Lee",
                steps: 0
            }]
        );
    }
}
