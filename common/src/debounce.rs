//! Redraw gating for float display keys.
//!
//! A display key redraws only when its value has moved by at least `min_step`
//! **and** at least `min_interval` has passed since the last accepted sample.
//! Everything else is dropped on the floor: nothing is queued, so a burst of
//! readings between two accepted samples never reaches the device, and the
//! next accepted sample is simply whatever the bus holds at that moment.
//!
//! Timestamps are [`Duration`] offsets from any fixed epoch chosen by the caller.

use core::time::Duration;

/// Default minimum value change when a key does not set `MinStep`.
pub const DEFAULT_MIN_STEP: f64 = 0.01;

/// Default minimum time between redraws when a key does not set `MinInterval`.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of offering a reading to the scheduler.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Debounce {
    /// First valid reading; establishes the baseline and needs a draw.
    Seeded(f64),
    /// Reading passed both thresholds and becomes the new baseline.
    Accepted(f64),
    /// Reading was dropped; the display keeps the baseline value.
    Discarded,
}

impl Debounce {
    /// Whether the display must be redrawn for this outcome.
    #[inline]
    pub const fn needs_redraw(self) -> bool { !matches!(self, Self::Discarded) }
}

/// Per-key value/time gate.
#[derive(Clone, Debug)]
pub struct DebounceScheduler {
    min_step: f64,
    min_interval: Duration,
    baseline: Option<(f64, Duration)>,
}

impl DebounceScheduler {
    /// Create a scheduler with no baseline.
    pub const fn new(
        min_step: f64,
        min_interval: Duration,
    ) -> Self {
        Self {
            min_step,
            min_interval,
            baseline: None,
        }
    }

    /// Last accepted value, if any.
    #[inline]
    pub fn value(&self) -> Option<f64> { self.baseline.map(|(value, _)| value) }

    /// Offer a new reading taken at `now`.
    pub fn offer(
        &mut self,
        value: f64,
        now: Duration,
    ) -> Debounce {
        if !value.is_finite() {
            return Debounce::Discarded;
        }

        let Some((last_value, last_time)) = self.baseline else {
            self.baseline = Some((value, now));
            return Debounce::Seeded(value);
        };

        let delta = if value >= last_value {
            value - last_value
        } else {
            last_value - value
        };
        let elapsed = now.saturating_sub(last_time);
        if delta >= self.min_step && elapsed >= self.min_interval {
            self.baseline = Some((value, now));
            Debounce::Accepted(value)
        } else {
            Debounce::Discarded
        }
    }

    /// Force a new baseline, e.g. when the key's page becomes visible again.
    pub fn reseed(
        &mut self,
        value: f64,
        now: Duration,
    ) -> Debounce {
        self.baseline = None;
        self.offer(value, now)
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self { Self::new(DEFAULT_MIN_STEP, DEFAULT_MIN_INTERVAL) }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn at(ms: u64) -> Duration { Duration::from_millis(ms) }

    #[test]
    fn test_documented_burst() {
        // minStep 0.01, minInterval 0.1 s
        let mut gate = DebounceScheduler::new(0.01, at(100));
        assert_eq!(gate.offer(0.000, at(0)), Debounce::Seeded(0.0));
        assert_eq!(gate.offer(0.005, at(10)), Debounce::Discarded, "below step");
        assert_eq!(gate.offer(0.020, at(50)), Debounce::Discarded, "inside interval");
        assert_eq!(gate.offer(0.021, at(200)), Debounce::Accepted(0.021));
        assert_eq!(gate.value(), Some(0.021));
    }

    #[test]
    fn test_discard_does_not_move_baseline() {
        let mut gate = DebounceScheduler::new(0.5, at(100));
        gate.offer(1.0, at(0));
        assert_eq!(gate.offer(1.2, at(150)), Debounce::Discarded);
        // Step is still measured from 1.0, interval from t=0.
        assert_eq!(gate.offer(1.5, at(160)), Debounce::Accepted(1.5));
    }

    #[test]
    fn test_non_finite_readings_are_dropped() {
        let mut gate = DebounceScheduler::default();
        assert_eq!(gate.offer(f64::NAN, at(0)), Debounce::Discarded);
        assert_eq!(gate.value(), None);
        gate.offer(1.0, at(0));
        assert_eq!(gate.offer(f64::INFINITY, at(1000)), Debounce::Discarded);
        assert_eq!(gate.value(), Some(1.0));
    }

    #[test]
    fn test_reseed() {
        let mut gate = DebounceScheduler::default();
        gate.offer(1.0, at(0));
        assert_eq!(gate.reseed(1.001, at(1)), Debounce::Seeded(1.001));
        assert!(Debounce::Seeded(0.0).needs_redraw());
        assert!(!Debounce::Discarded.needs_redraw());
    }

    #[test]
    fn test_negative_moves_count() {
        let mut gate = DebounceScheduler::new(0.1, at(0));
        gate.offer(5.0, at(0));
        assert_eq!(gate.offer(4.8, at(1)), Debounce::Accepted(4.8));
    }

    proptest! {
        #[test]
        fn prop_accepted_samples_respect_both_thresholds(
            readings in proptest::collection::vec((-100.0f64..100.0, 0u64..50), 1..64),
        ) {
            let step = 0.5;
            let interval = at(40);
            let mut gate = DebounceScheduler::new(step, interval);
            let mut now = at(0);
            let mut last: Option<(f64, Duration)> = None;
            for (value, advance) in readings {
                now += at(advance);
                match gate.offer(value, now) {
                    Debounce::Seeded(v) => {
                        prop_assert!(last.is_none());
                        last = Some((v, now));
                    }
                    Debounce::Accepted(v) => {
                        let (prev, prev_t) = last.unwrap();
                        prop_assert!((v - prev).abs() >= step);
                        prop_assert!(now - prev_t >= interval);
                        last = Some((v, now));
                    }
                    Debounce::Discarded => {
                        let (prev, prev_t) = last.unwrap();
                        prop_assert!((value - prev).abs() < step || now - prev_t < interval);
                    }
                }
                prop_assert_eq!(gate.value(), last.map(|(v, _)| v));
            }
        }
    }
}
