use std::time::{Duration, Instant};

/// Accumulates running time across start/stop cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts or resumes. Starting a running stopwatch does nothing.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Pauses, folding the current lap into the total.
    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated += started_at.elapsed();
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self.accumulated + started_at.elapsed(),
            None => self.accumulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_accumulates() {
        let mut watch = Stopwatch::new();
        assert_eq!(watch.elapsed(), Duration::ZERO);

        watch.start();
        std::thread::sleep(Duration::from_millis(5));
        watch.stop();
        let first = watch.elapsed();
        assert!(first >= Duration::from_millis(5));

        // Stopped stopwatches do not advance
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(watch.elapsed(), first);

        watch.start();
        std::thread::sleep(Duration::from_millis(5));
        watch.stop();
        assert!(watch.elapsed() >= first + Duration::from_millis(5));

        watch.reset();
        assert_eq!(watch.elapsed(), Duration::ZERO);
        assert!(!watch.is_running());
    }
}
