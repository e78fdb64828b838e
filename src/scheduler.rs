// Copyright (c) 2026 rezky_nightky

use std::io::Result;
use std::time::Instant;

use log::{debug, trace};

use crate::canvas::Surface;

/// Milliseconds on a monotonic timeline.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameRate {
    Capped(f64),
    /// Step on every repaint the host offers.
    Uncapped,
}

impl FrameRate {
    pub fn fps(self) -> Option<f64> {
        match self {
            FrameRate::Capped(fps) => Some(fps),
            FrameRate::Uncapped => None,
        }
    }

    pub fn interval_ms(self) -> Option<f64> {
        self.fps().map(|fps| 1000.0 / fps)
    }

    pub fn halved(self) -> Self {
        match self {
            FrameRate::Capped(fps) => FrameRate::Capped(fps / 2.0),
            FrameRate::Uncapped => FrameRate::Uncapped,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostSignal {
    Repaint,
    Quit,
}

/// Whatever owns the screen: hands out repaint opportunities and shows the
/// surface after each admitted step.
pub trait FrameHost {
    type Surface: Surface;

    /// Blocks until the next repaint opportunity.
    fn wait_repaint(&mut self) -> Result<HostSignal>;
    fn surface(&mut self) -> &mut Self::Surface;
    fn present(&mut self) -> Result<()>;
}

pub trait Animation {
    fn step(&mut self, surface: &mut dyn Surface);
    fn is_done(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Cancelled,
    TimedOut,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunReport {
    pub ticks: u64,
    pub repaints: u64,
    pub elapsed_ms: f64,
    pub outcome: Outcome,
}

impl RunReport {
    /// Average spacing of admitted ticks over the whole run.
    pub fn avg_tick_ms(&self) -> f64 {
        self.elapsed_ms / (self.ticks.max(1) as f64)
    }
}

pub struct Scheduler<C: Clock> {
    clock: C,
    timeout_ms: Option<f64>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            timeout_ms: None,
        }
    }

    /// Per-run guard; `None` lets a run go on for as long as it takes.
    pub fn with_timeout_ms(mut self, limit: Option<f64>) -> Self {
        self.timeout_ms = limit.filter(|ms| ms.is_finite() && *ms > 0.0);
        self
    }

    pub fn timeout_ms(&self) -> Option<f64> {
        self.timeout_ms
    }

    /// Repaints until `animation.is_done()`; `is_done` is consulted before
    /// every step, so nothing is stepped once it reports true.
    pub fn run<H: FrameHost>(
        &self,
        host: &mut H,
        animation: &mut dyn Animation,
        rate: FrameRate,
    ) -> Result<RunReport> {
        let start = self.clock.now_ms();
        let interval = rate.interval_ms();
        let mut last_tick = start;
        let mut ticks: u64 = 0;
        let mut repaints: u64 = 0;

        let outcome = loop {
            if host.wait_repaint()? == HostSignal::Quit {
                break Outcome::Cancelled;
            }
            repaints += 1;

            let now = self.clock.now_ms();
            if self.timeout_ms.is_some_and(|limit| now - start > limit) {
                break Outcome::TimedOut;
            }

            if let Some(interval) = interval {
                let elapsed = now - last_tick;
                if elapsed <= interval {
                    continue;
                }
                // Keep the phase of the tick lattice so slow repaints don't drift.
                last_tick = now - (elapsed % interval);
            }

            if animation.is_done() {
                break Outcome::Finished;
            }

            animation.step(host.surface());
            host.present()?;
            ticks += 1;
            trace!("tick {} at {:.2} ms", ticks, now - start);
        };

        let report = RunReport {
            ticks,
            repaints,
            elapsed_ms: self.clock.now_ms() - start,
            outcome,
        };
        debug!(
            "run ended {:?} after {} ticks / {} repaints in {:.1} ms",
            report.outcome, report.ticks, report.repaints, report.elapsed_ms
        );
        Ok(report)
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::Cell;
    use std::io::Result;
    use std::rc::Rc;

    use super::{Clock, FrameHost, HostSignal};
    use crate::canvas::Surface;

    #[derive(Clone, Default)]
    pub struct ManualClock(Rc<Cell<f64>>);

    impl ManualClock {
        pub fn advance(&self, ms: f64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> f64 {
            self.0.get()
        }
    }

    /// Host whose display refreshes every `refresh_ms` of simulated time.
    pub struct SimHost<S: Surface> {
        pub clock: ManualClock,
        pub refresh_ms: f64,
        pub surface: S,
        pub presents: u64,
        pub quit_after: Option<u64>,
        repaints: u64,
    }

    impl<S: Surface> SimHost<S> {
        pub fn new(clock: ManualClock, refresh_hz: f64, surface: S) -> Self {
            Self {
                clock,
                refresh_ms: 1000.0 / refresh_hz,
                surface,
                presents: 0,
                quit_after: None,
                repaints: 0,
            }
        }
    }

    impl<S: Surface> FrameHost for SimHost<S> {
        type Surface = S;

        fn wait_repaint(&mut self) -> Result<HostSignal> {
            if self.quit_after.is_some_and(|n| self.repaints >= n) {
                return Ok(HostSignal::Quit);
            }
            self.repaints += 1;
            self.clock.advance(self.refresh_ms);
            Ok(HostSignal::Repaint)
        }

        fn surface(&mut self) -> &mut S {
            &mut self.surface
        }

        fn present(&mut self) -> Result<()> {
            self.presents += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::testing::{ManualClock, SimHost};
    use super::*;
    use crate::canvas::testing::Recorder;

    struct Counter {
        clock: ManualClock,
        stamps: Vec<f64>,
        done_after: Option<usize>,
    }

    impl Counter {
        fn new(clock: &ManualClock, done_after: Option<usize>) -> Self {
            Self {
                clock: clock.clone(),
                stamps: Vec::new(),
                done_after,
            }
        }
    }

    impl Animation for Counter {
        fn step(&mut self, _surface: &mut dyn Surface) {
            self.stamps.push(self.clock.now_ms());
        }

        fn is_done(&self) -> bool {
            self.done_after.is_some_and(|n| self.stamps.len() >= n)
        }
    }

    fn host(clock: &ManualClock, refresh_hz: f64) -> SimHost<Recorder> {
        SimHost::new(clock.clone(), refresh_hz, Recorder::new(10.0, 10.0))
    }

    #[test]
    fn no_step_runs_once_done_reports_true() {
        let clock = ManualClock::default();
        let mut host = host(&clock, 60.0);
        let mut anim = Counter::new(&clock, Some(3));

        let report = Scheduler::new(clock.clone())
            .run(&mut host, &mut anim, FrameRate::Capped(30.0))
            .unwrap();

        assert_eq!(report.outcome, Outcome::Finished);
        assert_eq!(anim.stamps.len(), 3);
        assert_eq!(report.ticks, 3);
        assert_eq!(host.presents, 3);
    }

    #[test]
    fn already_done_animation_never_steps() {
        let clock = ManualClock::default();
        let mut host = host(&clock, 60.0);
        let mut anim = Counter::new(&clock, Some(0));

        let report = Scheduler::new(clock.clone())
            .run(&mut host, &mut anim, FrameRate::Capped(35.0))
            .unwrap();

        assert_eq!(report.ticks, 0);
        assert!(anim.stamps.is_empty());
    }

    #[rstest]
    #[case(35.0, 144.0)]
    #[case(30.0, 144.0)]
    #[case(17.5, 60.0)]
    #[case(60.0, 240.0)]
    fn capped_rate_never_exceeds_fps_and_does_not_drift(#[case] fps: f64, #[case] refresh: f64) {
        let clock = ManualClock::default();
        let mut host = host(&clock, refresh);
        let mut anim = Counter::new(&clock, Some(600));

        Scheduler::new(clock.clone())
            .run(&mut host, &mut anim, FrameRate::Capped(fps))
            .unwrap();

        let interval = 1000.0 / fps;
        for (i, &t) in anim.stamps.iter().enumerate() {
            let admitted = (i + 1) as f64;
            assert!(admitted <= fps * t / 1000.0 + 1.0, "tick {} at {} ms", i, t);
        }

        let first = anim.stamps[0];
        let last = anim.stamps[anim.stamps.len() - 1];
        let avg = (last - first) / (anim.stamps.len() - 1) as f64;
        assert!(
            (avg - interval).abs() < host.refresh_ms,
            "avg {} vs target {}",
            avg,
            interval
        );
    }

    #[test]
    fn ticks_arriving_too_early_are_skipped() {
        let clock = ManualClock::default();
        let mut host = host(&clock, 100.0);
        let mut anim = Counter::new(&clock, Some(5));

        let report = Scheduler::new(clock.clone())
            .run(&mut host, &mut anim, FrameRate::Capped(25.0))
            .unwrap();

        // 40 ms interval on a 10 ms refresh: every fifth repaint is admitted.
        assert_eq!(anim.stamps, vec![50.0, 90.0, 130.0, 170.0, 210.0]);
        assert_eq!(report.repaints, 25);
    }

    #[test]
    fn uncapped_steps_on_every_repaint() {
        let clock = ManualClock::default();
        let mut host = host(&clock, 60.0);
        let mut anim = Counter::new(&clock, Some(10));

        let report = Scheduler::new(clock.clone())
            .run(&mut host, &mut anim, FrameRate::Uncapped)
            .unwrap();

        assert_eq!(report.ticks, 10);
        assert_eq!(report.repaints, 11);
    }

    #[test]
    fn quit_from_host_cancels_the_run() {
        let clock = ManualClock::default();
        let mut host = host(&clock, 60.0);
        host.quit_after = Some(4);
        let mut anim = Counter::new(&clock, None);

        let report = Scheduler::new(clock.clone())
            .run(&mut host, &mut anim, FrameRate::Uncapped)
            .unwrap();

        assert_eq!(report.outcome, Outcome::Cancelled);
        assert_eq!(report.ticks, 4);
    }

    #[test]
    fn endless_animation_hits_the_time_guard() {
        let clock = ManualClock::default();
        let mut host = host(&clock, 60.0);
        let mut anim = Counter::new(&clock, None);

        let report = Scheduler::new(clock.clone())
            .with_timeout_ms(Some(1000.0))
            .run(&mut host, &mut anim, FrameRate::Capped(30.0))
            .unwrap();

        assert_eq!(report.outcome, Outcome::TimedOut);
        assert!(report.elapsed_ms > 1000.0);
        assert!(report.ticks <= 31);
    }

    #[test]
    fn halving_a_capped_rate_keeps_uncapped_uncapped() {
        assert_eq!(FrameRate::Capped(35.0).halved(), FrameRate::Capped(17.5));
        assert_eq!(FrameRate::Uncapped.halved(), FrameRate::Uncapped);
        assert_eq!(FrameRate::Uncapped.interval_ms(), None);
    }
}
