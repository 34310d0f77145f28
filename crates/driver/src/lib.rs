//! Driver: turns variable wall-clock frames into fixed simulation steps.
//!
//! Each frame advances housekeeping, clamps the elapsed time, emits
//! `fixedUpdate` once per whole `dt` in the accumulator, emits one `update`
//! with the clamped frame time, then renders once.
//!
//! # Invariants
//! - After a frame, `0 <= accumulated < dt`.
//! - A frame never runs more than `floor(max_frame_time / dt) + 1` steps.
//! - Every `fixedUpdate` of a frame precedes its `update`, which precedes
//!   its render.
//! - Nothing is emitted before [`Driver::start`].

mod clock;
mod config;
mod driver;
mod fixed_step;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DriverConfig, DriverError};
pub use driver::{Driver, FrameReport, Housekeeping, RunSummary};
pub use fixed_step::FixedStep;
pub use timer::{TimerId, TimerManager};

pub fn crate_info() -> &'static str {
    "kinloop-driver v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("driver"));
    }
}
