use tracing::trace;

use crate::driver::Housekeeping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    remaining: f64,
    period: Option<f64>,
    callback: Box<dyn FnMut()>,
}

/// Delayed and repeating callbacks advanced by frame time.
#[derive(Default)]
pub struct TimerManager {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once, `delay` seconds from now.
    pub fn after<F>(&mut self, delay: f64, callback: F) -> TimerId
    where
        F: FnMut() + 'static,
    {
        self.insert(delay.max(0.0), None, Box::new(callback))
    }

    /// Run `callback` every `period` seconds. Returns `None` unless `period`
    /// is positive and finite.
    pub fn every<F>(&mut self, period: f64, callback: F) -> Option<TimerId>
    where
        F: FnMut() + 'static,
    {
        if !(period > 0.0 && period.is_finite()) {
            return None;
        }
        Some(self.insert(period, Some(period), Box::new(callback)))
    }

    fn insert(&mut self, delay: f64, period: Option<f64>, callback: Box<dyn FnMut()>) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(Timer {
            id,
            remaining: delay,
            period,
            callback,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Move time forward, firing due callbacks in creation order. A periodic
    /// timer fires once per elapsed period.
    pub fn advance(&mut self, elapsed: f64) {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        self.timers.retain_mut(|timer| {
            timer.remaining -= elapsed;
            while timer.remaining <= 0.0 {
                (timer.callback)();
                trace!(id = timer.id.0, "timer fired");
                match timer.period {
                    Some(period) => timer.remaining += period,
                    None => return false,
                }
            }
            true
        });
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Housekeeping for TimerManager {
    fn advance(&mut self, elapsed: f64) {
        TimerManager::advance(self, elapsed);
    }
}

impl std::fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerManager")
            .field("timers", &self.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn after_fires_once() {
        let mut timers = TimerManager::new();
        let (count, cb) = counter();
        timers.after(0.5, cb);

        timers.advance(0.3);
        assert_eq!(count.get(), 0);
        timers.advance(0.3);
        assert_eq!(count.get(), 1);
        timers.advance(10.0);
        assert_eq!(count.get(), 1);
        assert!(timers.is_empty());
    }

    #[test]
    fn every_catches_up() {
        let mut timers = TimerManager::new();
        let (count, cb) = counter();
        timers.every(0.25, cb).unwrap();

        timers.advance(1.0);
        assert_eq!(count.get(), 4);
        timers.advance(0.1);
        assert_eq!(count.get(), 4);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn cancel_stops_timer() {
        let mut timers = TimerManager::new();
        let (count, cb) = counter();
        let id = timers.every(0.1, cb).unwrap();
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        timers.advance(1.0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn zero_period_is_refused() {
        let mut timers = TimerManager::new();
        assert!(timers.every(0.0, || {}).is_none());
        assert!(timers.every(f64::NAN, || {}).is_none());
    }
}
