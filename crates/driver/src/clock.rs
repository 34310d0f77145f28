use std::collections::VecDeque;
use std::time::Instant;

/// Source of per-frame elapsed time.
pub trait Clock {
    /// Seconds since the previous call (or since creation on the first call).
    fn elapsed(&mut self) -> f64;
}

/// Wall-clock time.
#[derive(Debug)]
pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&mut self) -> f64 {
        let now = Instant::now();
        let secs = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        secs
    }
}

/// Scripted time for tests and headless runs: queued readings first, then a
/// fixed frame length.
#[derive(Debug, Clone)]
pub struct ManualClock {
    queued: VecDeque<f64>,
    frame: f64,
}

impl ManualClock {
    pub fn new(frame: f64) -> Self {
        Self {
            queued: VecDeque::new(),
            frame,
        }
    }

    pub fn from_millis(ms: f64) -> Self {
        Self::new(ms / 1000.0)
    }

    /// Queue a one-off reading, e.g. a hitch.
    pub fn push(&mut self, secs: f64) -> &mut Self {
        self.queued.push_back(secs);
        self
    }
}

impl Clock for ManualClock {
    fn elapsed(&mut self) -> f64 {
        self.queued.pop_front().unwrap_or(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_plays_queue_then_repeats() {
        let mut clock = ManualClock::from_millis(16.0);
        clock.push(5.0).push(-1.0);
        assert_eq!(clock.elapsed(), 5.0);
        assert_eq!(clock.elapsed(), -1.0);
        assert_eq!(clock.elapsed(), 0.016);
        assert_eq!(clock.elapsed(), 0.016);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let mut clock = SystemClock::new();
        assert!(clock.elapsed() >= 0.0);
        assert!(clock.elapsed() >= 0.0);
    }
}
