use tracing::{debug, warn};

use crate::config::{DriverError, positive};

/// Accumulator converting frame times into whole steps of `dt`.
#[derive(Debug, Clone)]
pub struct FixedStep {
    dt: f64,
    max_frame_time: f64,
    accumulated: f64,
}

impl FixedStep {
    pub fn new(dt: f64, max_frame_time: f64) -> Result<Self, DriverError> {
        Ok(Self {
            dt: positive("dt", dt)?,
            max_frame_time: positive("max_frame_time", max_frame_time)?,
            accumulated: 0.0,
        })
    }

    /// A clock reading with negative or non-finite values replaced by zero.
    pub fn sanitize(elapsed: f64) -> f64 {
        if !elapsed.is_finite() || elapsed < 0.0 {
            warn!(elapsed, "clock anomaly, treating frame as zero length");
            0.0
        } else {
            elapsed
        }
    }

    /// Feed one frame's elapsed seconds and return the clamped frame time.
    ///
    /// Negative or non-finite readings count as zero.
    pub fn begin_frame(&mut self, elapsed: f64) -> f64 {
        let elapsed = Self::sanitize(elapsed);
        let frame_time = if elapsed > self.max_frame_time {
            debug!(elapsed, max = self.max_frame_time, "frame time clamped");
            self.max_frame_time
        } else {
            elapsed
        };
        self.accumulated += frame_time;
        frame_time
    }

    /// Take one `dt` out of the accumulator if there is one.
    pub fn consume_step(&mut self) -> bool {
        if self.accumulated >= self.dt {
            self.accumulated -= self.dt;
            true
        } else {
            false
        }
    }

    /// Drop the whole steps still owed, keeping the fractional remainder.
    /// Returns how many were dropped.
    pub fn discard_steps(&mut self) -> u64 {
        let owed = (self.accumulated / self.dt).floor() as u64;
        if owed > 0 {
            self.accumulated = self.accumulated.rem_euclid(self.dt);
            if self.accumulated >= self.dt {
                self.accumulated = 0.0;
            }
        }
        owed
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn max_frame_time(&self) -> f64 {
        self.max_frame_time
    }

    /// Seconds not yet simulated.
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    pub fn max_steps_per_frame(&self) -> u64 {
        (self.max_frame_time / self.dt).floor() as u64 + 1
    }
}
