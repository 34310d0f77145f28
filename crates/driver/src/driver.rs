use std::rc::Rc;

use kinloop_events::{EventBus, GameEvent};
use kinloop_render::{Container, Renderer};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{DriverConfig, DriverError};
use crate::fixed_step::FixedStep;
use crate::timer::TimerManager;

/// Per-frame bookkeeping advanced by raw elapsed time before simulation,
/// such as tweens.
pub trait Housekeeping {
    fn advance(&mut self, elapsed: f64);
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub fixed_steps: u64,
    /// Clamped seconds fed to the accumulator and sent with `update`.
    pub frame_time: f64,
}

/// Totals from [`Driver::run_for`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub fixed_steps: u64,
    pub simulated: f64,
}

/// The frame loop: housekeeping, fixed steps, one update, one render.
pub struct Driver<R: Renderer> {
    step: FixedStep,
    events: Rc<EventBus>,
    stage: Container,
    renderer: R,
    timers: TimerManager,
    housekeeping: Vec<Box<dyn Housekeeping>>,
    started: bool,
    frames: u64,
    fixed_steps: u64,
}

impl<R: Renderer> Driver<R> {
    /// `dt` is the world's time step.
    pub fn new(
        dt: f64,
        config: &DriverConfig,
        events: Rc<EventBus>,
        stage: Container,
        renderer: R,
    ) -> Result<Self, DriverError> {
        Ok(Self {
            step: FixedStep::new(dt, config.max_frame_time)?,
            events,
            stage,
            renderer,
            timers: TimerManager::new(),
            housekeeping: Vec::new(),
            started: false,
            frames: 0,
            fixed_steps: 0,
        })
    }

    /// Allow frames to run. Called once assets are loaded.
    pub fn start(&mut self) {
        if !self.started {
            self.started = true;
            info!(
                dt = self.step.dt(),
                max_frame_time = self.step.max_frame_time(),
                "driver started"
            );
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn add_housekeeping(&mut self, task: Box<dyn Housekeeping>) {
        self.housekeeping.push(task);
    }

    pub fn timers_mut(&mut self) -> &mut TimerManager {
        &mut self.timers
    }

    /// Run one frame for `elapsed` wall-clock seconds.
    ///
    /// A fail-fast listener error aborts the frame. Steps already emitted stay
    /// simulated; steps still owed are dropped so the next frame stays within
    /// [`FixedStep::max_steps_per_frame`].
    pub fn frame(&mut self, elapsed: f64) -> Result<FrameReport, DriverError> {
        if !self.started {
            return Err(DriverError::NotStarted);
        }

        let elapsed = FixedStep::sanitize(elapsed);
        self.timers.advance(elapsed);
        for task in &mut self.housekeeping {
            task.advance(elapsed);
        }

        let frame_time = self.step.begin_frame(elapsed);
        let mut fixed_steps = 0;
        while self.step.consume_step() {
            if let Err(err) = self.events.emit(&GameEvent::FixedUpdate) {
                let dropped = self.step.discard_steps();
                warn!(frame = self.frames + 1, fixed_steps, dropped, error = %err, "fixed step failed, frame aborted");
                return Err(err.into());
            }
            fixed_steps += 1;
            self.fixed_steps += 1;
        }

        self.events.emit(&GameEvent::Update { frame_time })?;
        self.renderer.render(&self.stage)?;

        self.frames += 1;
        debug!(
            frame = self.frames,
            fixed_steps,
            frame_time,
            accumulated = self.step.accumulated(),
            "frame done"
        );
        Ok(FrameReport {
            frame_index: self.frames,
            fixed_steps,
            frame_time,
        })
    }

    /// Run `frames` frames, reading elapsed time from `clock`.
    pub fn run_for(&mut self, clock: &mut dyn Clock, frames: u64) -> Result<RunSummary, DriverError> {
        let mut summary = RunSummary::default();
        for _ in 0..frames {
            let report = self.frame(clock.elapsed())?;
            summary.frames += 1;
            summary.fixed_steps += report.fixed_steps;
            summary.simulated += report.fixed_steps as f64 * self.step.dt();
        }
        Ok(summary)
    }

    pub fn fixed_step(&self) -> &FixedStep {
        &self.step
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn stage(&self) -> &Container {
        &self.stage
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Fixed steps run since creation.
    pub fn total_fixed_steps(&self) -> u64 {
        self.fixed_steps
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use kinloop_events::{EventKind, ListenerError};
    use proptest::collection;
    use proptest::prelude::*;
    use kinloop_render::{DebugTextRenderer, RenderError};

    use super::*;
    use crate::clock::ManualClock;

    type Log = Rc<RefCell<Vec<String>>>;

    struct RecordingRenderer {
        log: Log,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, _stage: &Container) -> Result<(), RenderError> {
            self.log.borrow_mut().push("render".into());
            Ok(())
        }

        fn output_size(&self) -> (u32, u32) {
            (1, 1)
        }
    }

    fn recording(dt: f64) -> (Driver<RecordingRenderer>, Log) {
        let log = Log::default();
        let events = Rc::new(EventBus::new());
        for kind in [EventKind::FixedUpdate, EventKind::Update] {
            let log = log.clone();
            events.on(kind, move |event| {
                log.borrow_mut().push(event.kind().name().to_string());
                Ok(())
            });
        }
        let renderer = RecordingRenderer { log: log.clone() };
        let driver = Driver::new(
            dt,
            &DriverConfig::default(),
            events,
            Container::new("stage"),
            renderer,
        )
        .unwrap();
        (driver, log)
    }

    #[test]
    fn refuses_to_run_before_start() {
        let (mut driver, log) = recording(0.02);
        assert!(matches!(driver.frame(0.1), Err(DriverError::NotStarted)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn ticks_then_update_then_render() {
        let (mut driver, log) = recording(0.02);
        driver.start();
        let report = driver.frame(0.045).unwrap();
        assert_eq!(report.fixed_steps, 2);
        assert_eq!(
            *log.borrow(),
            vec!["fixedUpdate", "fixedUpdate", "update", "render"]
        );
    }

    #[test]
    fn three_sixteen_ms_frames_give_two_ticks() {
        let (mut driver, log) = recording(0.02);
        driver.start();
        let mut clock = ManualClock::from_millis(16.0);
        let summary = driver.run_for(&mut clock, 3).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.fixed_steps, 2);
        let updates = log.borrow().iter().filter(|e| *e == "update").count();
        assert_eq!(updates, 3);
    }

    #[test]
    fn hitch_is_clamped() {
        let (mut driver, _log) = recording(1.0 / 60.0);
        driver.start();
        let report = driver.frame(5.0).unwrap();
        assert_eq!(report.frame_time, 0.25);
        assert!(report.fixed_steps <= driver.fixed_step().max_steps_per_frame());
        assert!(driver.fixed_step().accumulated() < driver.fixed_step().dt());
    }

    #[test]
    fn update_carries_frame_time() {
        let events = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        events.on(EventKind::Update, move |event| {
            if let GameEvent::Update { frame_time } = event {
                sink.borrow_mut().push(*frame_time);
            }
            Ok(())
        });
        let mut driver = Driver::new(
            0.02,
            &DriverConfig::default(),
            events,
            Container::new("stage"),
            DebugTextRenderer::default(),
        )
        .unwrap();
        driver.start();
        driver.frame(0.016).unwrap();
        driver.frame(1.0).unwrap();
        assert_eq!(*seen.borrow(), vec![0.016, 0.25]);
        assert_eq!(driver.renderer().frames(), 2);
    }

    #[test]
    fn failing_tick_aborts_frame() {
        let (mut driver, log) = recording(0.02);
        driver
            .events
            .on(EventKind::FixedUpdate, |_| Err(ListenerError::handler(std::fmt::Error)));
        driver.start();
        assert!(matches!(driver.frame(0.05), Err(DriverError::Emit(_))));
        assert_eq!(*log.borrow(), vec!["fixedUpdate"]);
    }

    fn flaky(dt: f64) -> (Driver<DebugTextRenderer>, Rc<Cell<bool>>, Rc<Cell<u64>>) {
        let events = Rc::new(EventBus::new());
        let failing = Rc::new(Cell::new(false));
        let ticks = Rc::new(Cell::new(0));
        {
            let failing = failing.clone();
            let ticks = ticks.clone();
            events.on(EventKind::FixedUpdate, move |_| {
                ticks.set(ticks.get() + 1);
                if failing.get() {
                    Err(ListenerError::handler(std::fmt::Error))
                } else {
                    Ok(())
                }
            });
        }
        let mut driver = Driver::new(
            dt,
            &DriverConfig::default(),
            events,
            Container::new("stage"),
            DebugTextRenderer::default(),
        )
        .unwrap();
        driver.start();
        (driver, failing, ticks)
    }

    #[test]
    fn aborted_frame_does_not_owe_steps() {
        let (mut driver, failing, ticks) = flaky(1.0 / 60.0);
        failing.set(true);
        assert!(driver.frame(5.0).is_err());
        assert_eq!(ticks.get(), 1);
        assert!(driver.fixed_step().accumulated() < driver.fixed_step().dt());

        failing.set(false);
        let report = driver.frame(5.0).unwrap();
        assert!(report.fixed_steps <= driver.fixed_step().max_steps_per_frame());
        assert!(driver.fixed_step().accumulated() < driver.fixed_step().dt());
    }

    proptest! {
        /// Whether or not tick listeners fail, every frame runs at most the
        /// per-frame bound of ticks and leaves less than one step owed.
        #[test]
        fn step_bound_survives_listener_failures(
            frames in collection::vec((-0.1f64..2.0, any::<bool>()), 1..60),
        ) {
            let (mut driver, failing, ticks) = flaky(1.0 / 60.0);
            let bound = driver.fixed_step().max_steps_per_frame();
            for (elapsed, fail) in frames {
                failing.set(fail);
                let before = ticks.get();
                let result = driver.frame(elapsed);
                let ran = ticks.get() - before;
                prop_assert!(ran <= bound);
                prop_assert_eq!(result.is_err(), fail && ran > 0);
                prop_assert!(driver.fixed_step().accumulated() < driver.fixed_step().dt());
            }
        }
    }

    #[test]
    fn timers_and_housekeeping_see_sanitized_time() {
        struct Total(Rc<RefCell<f64>>);
        impl Housekeeping for Total {
            fn advance(&mut self, elapsed: f64) {
                *self.0.borrow_mut() += elapsed;
            }
        }

        let (mut driver, _log) = recording(0.02);
        let total = Rc::new(RefCell::new(0.0));
        driver.add_housekeeping(Box::new(Total(total.clone())));
        let fired = Rc::new(Cell::new(0));
        let count = fired.clone();
        driver.timers_mut().after(0.0, move || count.set(count.get() + 1));

        driver.start();
        driver.frame(f64::NAN).unwrap();
        driver.frame(-1.0).unwrap();
        assert_eq!(*total.borrow(), 0.0);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn housekeeping_sees_raw_elapsed() {
        struct Total(Rc<RefCell<f64>>);
        impl Housekeeping for Total {
            fn advance(&mut self, elapsed: f64) {
                *self.0.borrow_mut() += elapsed;
            }
        }

        let (mut driver, _log) = recording(0.02);
        let total = Rc::new(RefCell::new(0.0));
        driver.add_housekeeping(Box::new(Total(total.clone())));
        let fired = Rc::new(RefCell::new(false));
        let flag = fired.clone();
        driver.timers_mut().after(0.5, move || *flag.borrow_mut() = true);

        driver.start();
        driver.frame(0.75).unwrap();
        assert_eq!(*total.borrow(), 0.75);
        assert!(*fired.borrow());
    }
}
