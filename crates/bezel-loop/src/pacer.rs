use std::time::{Duration, Instant};

/// Above this much remaining time, a short OS sleep is cheaper than burning
/// the core; below it, sleep wakeup jitter would overshoot the tick.
const SLEEP_ABOVE_NS: u64 = 1_500_000;
/// Between this and the guard, cooperatively yield instead of sleeping.
const YIELD_ABOVE_NS: u64 = 1_500;
/// Below this the wait is done; the tick timer restarts.
const GUARD_NS: u64 = 15;

const SLEEP_SLICE: Duration = Duration::from_millis(1);

/// Convert a frame-rate ceiling (Hz) into a tick interval in nanoseconds.
///
/// Returns `None` when pacing is disabled (`None` or `Some(0)`).
pub fn interval_ns_from_fps(fps: Option<u32>) -> Option<u64> {
    fps.and_then(|fps| {
        if fps == 0 {
            return None;
        }
        // Ceil division keeps 60 Hz at 16_666_667 ns rather than truncating.
        Some(1_000_000_000u64.div_ceil(fps as u64))
    })
}

/// Enforces the tick interval with a tiered wait.
///
/// A plain sleep has millisecond-grade wakeup jitter, a plain spin burns a
/// core for the whole interval; the hybrid sleeps while far out, yields when
/// close, and busy-polls only the last microsecond and a half.
pub struct FramePacer {
    interval_ns: Option<u64>,
    tick_start: Instant,
}

impl FramePacer {
    pub fn new() -> Self {
        Self {
            interval_ns: None,
            tick_start: Instant::now(),
        }
    }

    /// Set the ceiling; `None` (or 0) disables pacing entirely.
    pub fn set_rate_ceiling(&mut self, fps: Option<u32>) {
        self.interval_ns = interval_ns_from_fps(fps);
    }

    pub fn interval_ns(&self) -> Option<u64> {
        self.interval_ns
    }

    /// Block until the current tick's interval has elapsed, then restart the
    /// tick timer. No-op while pacing is disabled.
    pub fn pace(&mut self) {
        let Some(interval) = self.interval_ns else {
            return;
        };

        let mut remaining = interval.saturating_sub(elapsed_ns(self.tick_start));
        while remaining > GUARD_NS {
            if remaining > SLEEP_ABOVE_NS {
                std::thread::sleep(SLEEP_SLICE);
            } else if remaining > YIELD_ABOVE_NS {
                std::thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
            remaining = interval.saturating_sub(elapsed_ns(self.tick_start));
        }

        self.tick_start = Instant::now();
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ns(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_nanos()).unwrap_or(u64::MAX)
}
