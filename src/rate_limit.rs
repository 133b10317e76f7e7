use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::error::IngestError;

/// One call ceiling: at most `max_calls` within each `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub max_calls: u32,
    pub period: Duration,
}

impl RateWindow {
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self { max_calls, period }
    }
}

#[derive(Debug)]
struct WindowState {
    window: RateWindow,
    started: Instant,
    count: u32,
}

impl WindowState {
    fn roll(&mut self, now: Instant) {
        if now.duration_since(self.started) >= self.window.period {
            self.started = now;
            self.count = 0;
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        (self.started + self.window.period).saturating_duration_since(now)
    }
}

/// Conjunctive fixed-window limiter: a call is permitted only when every
/// configured window has a free slot. Windows roll independently.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Vec<WindowState>,
}

impl RateLimiter {
    pub fn new(windows: &[RateWindow], now: Instant) -> Self {
        Self {
            windows: windows
                .iter()
                .map(|window| WindowState {
                    window: *window,
                    started: now,
                    count: 0,
                })
                .collect(),
        }
    }

    /// Checks all windows at `now` without recording a call. Returns the
    /// tightest saturated window when one exists; callers must wait out
    /// `retry_after` and check again, since waiting on one window may have
    /// rolled another.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), IngestError> {
        let mut worst: Option<(RateWindow, Duration)> = None;
        for state in &mut self.windows {
            state.roll(now);
            if state.count < state.window.max_calls {
                continue;
            }
            let remaining = state.remaining(now);
            if worst.is_none_or(|(_, wait)| remaining > wait) {
                worst = Some((state.window, remaining));
            }
        }
        match worst {
            Some((window, retry_after)) => Err(IngestError::RateLimitExceeded {
                max_calls: window.max_calls,
                period_secs: window.period.as_secs(),
                retry_after,
            }),
            None => Ok(()),
        }
    }

    /// Counts one call against every window. Call only after `try_acquire`
    /// succeeded for the same instant.
    pub fn record(&mut self, now: Instant) {
        for state in &mut self.windows {
            state.roll(now);
            state.count += 1;
        }
    }

    /// Blocks until every window admits a call, then records it.
    pub fn acquire(&mut self) {
        loop {
            match self.try_acquire(Instant::now()) {
                Ok(()) => break,
                Err(IngestError::RateLimitExceeded {
                    max_calls,
                    period_secs,
                    retry_after,
                }) => {
                    info!(
                        max_calls,
                        period_secs,
                        wait_ms = retry_after.as_millis() as u64,
                        "rate window saturated, waiting"
                    );
                    thread::sleep(retry_after);
                }
                Err(_) => unreachable!("try_acquire only fails with RateLimitExceeded"),
            }
        }
        self.record(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(windows: &[(u32, u64)], now: Instant) -> RateLimiter {
        let windows = windows
            .iter()
            .map(|&(calls, secs)| RateWindow::new(calls, Duration::from_secs(secs)))
            .collect::<Vec<_>>();
        RateLimiter::new(&windows, now)
    }

    #[test]
    fn calls_up_to_ceiling_never_wait() {
        let start = Instant::now();
        let mut limiter = limiter(&[(3, 60)], start);
        for _ in 0..3 {
            limiter.try_acquire(start).expect("slot free");
            limiter.record(start);
        }
        assert!(limiter.try_acquire(start).is_err());
    }

    #[test]
    fn saturated_window_reports_full_remaining_time() {
        let start = Instant::now();
        let mut limiter = limiter(&[(1, 60)], start);
        limiter.record(start);

        let later = start + Duration::from_secs(10);
        let err = limiter.try_acquire(later).expect_err("window saturated");
        let IngestError::RateLimitExceeded { retry_after, .. } = err else {
            panic!("unexpected error kind");
        };
        assert_eq!(retry_after, Duration::from_secs(50));
    }

    #[test]
    fn window_rolls_after_period() {
        let start = Instant::now();
        let mut limiter = limiter(&[(1, 60)], start);
        limiter.record(start);
        assert!(limiter.try_acquire(start).is_err());

        let rolled = start + Duration::from_secs(60);
        limiter.try_acquire(rolled).expect("window rolled over");
    }

    #[test]
    fn wait_reports_the_tightest_offending_window() {
        // Two windows; the longer one is the binding constraint.
        let start = Instant::now();
        let mut limiter = limiter(&[(1, 10), (1, 300)], start);
        limiter.record(start);

        let later = start + Duration::from_secs(10);
        let err = limiter.try_acquire(later).expect_err("hour window still full");
        let IngestError::RateLimitExceeded {
            period_secs,
            retry_after,
            ..
        } = err
        else {
            panic!("unexpected error kind");
        };
        assert_eq!(period_secs, 300);
        assert_eq!(retry_after, Duration::from_secs(290));
    }

    #[test]
    fn record_counts_against_every_window() {
        let start = Instant::now();
        let mut limiter = limiter(&[(2, 60), (3, 600)], start);
        limiter.record(start);
        limiter.record(start);
        // Minute window is full, ten-minute window still has a slot.
        let err = limiter.try_acquire(start).expect_err("minute window full");
        let IngestError::RateLimitExceeded { period_secs, .. } = err else {
            panic!("unexpected error kind");
        };
        assert_eq!(period_secs, 60);
    }
}
