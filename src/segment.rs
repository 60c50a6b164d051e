use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Animation phase of one progress segment, kept per portion by its story
/// player. Rebuilt from `Uninitialized` every time the player is activated;
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    #[default]
    Uninitialized,
    Started,
    Restarted,
    Paused,
    Resumed,
    Finished,
}

impl SegmentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Started => "started",
            Self::Restarted => "restarted",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Finished => "finished",
        }
    }

    /// The segment's fraction is advancing.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Started | Self::Restarted | Self::Resumed)
    }

    #[must_use]
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Anything but `Uninitialized`: the segment has been driven at least
    /// once since the last activation.
    #[must_use]
    pub const fn is_initialized(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

impl std::fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPhase {
    Idle,
    Running,
    Paused,
    Done,
}

/// The leaf of the playback hierarchy: an elapsed fraction advancing
/// linearly from 0 to 1 over the portion duration, driven by
/// animation-frame deltas. Pausing freezes the fraction; resuming continues
/// over the remaining time. Completion is reported exactly once per start
/// cycle, whether reached naturally or via [`SegmentTimer::finish`].
#[derive(Debug, Clone)]
pub struct SegmentTimer {
    duration: Duration,
    fraction: f32,
    phase: TimerPhase,
    fired: bool,
}

impl SegmentTimer {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            fraction: 0.0,
            phase: TimerPhase::Idle,
            fired: false,
        }
    }

    /// Reset to fraction 0 without starting.
    pub fn initialize(&mut self) {
        self.fraction = 0.0;
        self.phase = TimerPhase::Idle;
        self.fired = false;
    }

    /// Begin a new cycle from fraction 0. A timer sitting at fraction 1
    /// from a previous cycle is reset first, so replay always animates from
    /// the left edge.
    pub fn start(&mut self) {
        self.fraction = 0.0;
        self.phase = TimerPhase::Running;
        self.fired = false;
    }

    /// Freeze at the current fraction. No-op unless running.
    pub fn pause(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
        }
    }

    /// Continue from the frozen fraction over the remaining time. No-op
    /// unless paused.
    pub fn resume(&mut self) {
        if self.phase == TimerPhase::Paused {
            self.phase = TimerPhase::Running;
        }
    }

    /// Jump straight to fraction 1. Returns `true` if this call completed
    /// the cycle (the completion had not fired yet).
    pub fn finish(&mut self) -> bool {
        self.fraction = 1.0;
        self.phase = TimerPhase::Done;
        if self.fired {
            return false;
        }
        self.fired = true;
        true
    }

    /// Advance by a wall-clock delta. Returns `true` exactly once per start
    /// cycle, on the advance that reaches fraction 1.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }

        if self.duration.is_zero() {
            self.fraction = 1.0;
        } else {
            let step = dt.as_secs_f32() / self.duration.as_secs_f32();
            self.fraction = (self.fraction + step).min(1.0);
        }

        if self.fraction >= 1.0 {
            self.phase = TimerPhase::Done;
            if !self.fired {
                self.fired = true;
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.fraction.clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.phase == TimerPhase::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-4;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn advances_linearly_to_completion() {
        let mut timer = SegmentTimer::new(secs(4.0));
        timer.start();

        assert!(!timer.advance(secs(1.0)));
        assert!((timer.fraction() - 0.25).abs() < EPS);

        assert!(!timer.advance(secs(2.0)));
        assert!((timer.fraction() - 0.75).abs() < EPS);

        assert!(timer.advance(secs(1.0)));
        assert!((timer.fraction() - 1.0).abs() < EPS);
        assert!(timer.is_done());
    }

    #[test]
    fn completion_fires_exactly_once_per_cycle() {
        let mut timer = SegmentTimer::new(secs(1.0));
        timer.start();

        assert!(timer.advance(secs(2.0)));
        assert!(!timer.advance(secs(2.0)));
        assert!(!timer.finish());

        timer.start();
        assert!(timer.finish());
        assert!(!timer.finish());
    }

    #[test]
    fn start_after_full_cycle_resets_to_zero() {
        let mut timer = SegmentTimer::new(secs(1.0));
        timer.start();
        timer.advance(secs(5.0));
        assert!((timer.fraction() - 1.0).abs() < EPS);

        timer.start();
        assert!(timer.fraction() < EPS);
        assert!(timer.is_running());
    }

    #[test]
    fn pause_freezes_and_resume_continues_over_remaining_time() {
        let mut timer = SegmentTimer::new(secs(10.0));
        timer.start();
        timer.advance(secs(4.0));
        timer.pause();

        timer.advance(secs(100.0));
        assert!((timer.fraction() - 0.4).abs() < EPS);

        timer.resume();
        // Remaining time is duration * (1 - 0.4) = 6s, not the full 10s.
        assert!(!timer.advance(secs(5.9)));
        assert!(timer.advance(secs(0.2)));
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut timer = SegmentTimer::new(secs(2.0));
        timer.start();
        timer.advance(secs(1.0));

        timer.pause();
        timer.pause();
        assert!(timer.is_paused());

        timer.resume();
        timer.resume();
        assert!(timer.is_running());
        assert!((timer.fraction() - 0.5).abs() < EPS);
    }

    #[test]
    fn resume_without_pause_is_a_noop() {
        let mut timer = SegmentTimer::new(secs(2.0));
        timer.resume();
        assert!(!timer.is_running());

        timer.start();
        timer.resume();
        assert!(timer.is_running());
    }

    #[test]
    fn initialize_resets_without_starting() {
        let mut timer = SegmentTimer::new(secs(2.0));
        timer.start();
        timer.advance(secs(1.0));

        timer.initialize();
        assert!(timer.fraction() < EPS);
        assert!(!timer.is_running());
        assert!(!timer.advance(secs(1.0)));
        assert!(timer.fraction() < EPS);
    }

    #[test]
    fn zero_duration_completes_on_first_frame() {
        let mut timer = SegmentTimer::new(Duration::ZERO);
        timer.start();
        assert!(timer.advance(Duration::ZERO));
        assert!((timer.fraction() - 1.0).abs() < EPS);
    }

    #[test]
    fn finish_jumps_to_one() {
        let mut timer = SegmentTimer::new(secs(8.0));
        timer.start();
        timer.advance(secs(1.0));
        assert!(timer.finish());
        assert!((timer.fraction() - 1.0).abs() < EPS);
    }

    proptest! {
        #[test]
        fn fraction_is_monotone_while_running(dts in prop::collection::vec(0u64..400, 1..64)) {
            let mut timer = SegmentTimer::new(secs(5.0));
            timer.start();

            let mut last = timer.fraction();
            for dt in dts {
                timer.advance(Duration::from_millis(dt));
                let f = timer.fraction();
                prop_assert!(f >= last);
                prop_assert!((0.0..=1.0).contains(&f));
                last = f;
            }
        }

        #[test]
        fn fraction_is_frozen_while_paused(
            warmup in 0u64..3000,
            dts in prop::collection::vec(0u64..1000, 1..32),
        ) {
            let mut timer = SegmentTimer::new(secs(5.0));
            timer.start();
            timer.advance(Duration::from_millis(warmup));
            timer.pause();

            let frozen = timer.fraction();
            for dt in dts {
                timer.advance(Duration::from_millis(dt));
                prop_assert!((timer.fraction() - frozen).abs() < EPS);
            }
        }
    }
}
