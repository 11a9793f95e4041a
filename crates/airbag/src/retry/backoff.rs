// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::constants::{DEFAULT_BACKOFF_DELAY, DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKOFF_MAX_DELAY};
use crate::rnd::Rnd;

/// How the delay between retries grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed(Duration),

    /// `delay * factor^n` before retry `n + 1`, capped at `max_delay`.
    Exponential {
        /// Delay before the first retry.
        delay: Duration,
        /// Upper bound for any delay.
        max_delay: Duration,
        /// Growth factor applied per retry.
        factor: f64,
    },
}

impl Backoff {
    /// The same delay before every retry.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed(delay)
    }

    /// Exponentially growing delays.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use airbag::retry::Backoff;
    ///
    /// let backoff = Backoff::exponential(Duration::from_millis(100), Duration::from_secs(1), 3.0);
    /// # let _ = backoff;
    /// ```
    #[must_use]
    pub fn exponential(delay: Duration, max_delay: Duration, factor: f64) -> Self {
        Self::Exponential { delay, max_delay, factor }
    }

    /// The backoff delay after the attempt with the given 0-based index failed.
    pub(crate) fn delay(&self, attempt_index: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { delay, max_delay, factor } => {
                let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
                let secs = delay.as_secs_f64() * factor.powi(exponent);

                if secs.is_finite() {
                    secs_to_duration_saturating(secs).min(max_delay)
                } else {
                    max_delay
                }
            }
        }
    }
}

impl Default for Backoff {
    /// Exponential backoff starting at 50ms, doubling up to 2s.
    fn default() -> Self {
        Self::exponential(DEFAULT_BACKOFF_DELAY, DEFAULT_BACKOFF_MAX_DELAY, DEFAULT_BACKOFF_FACTOR)
    }
}

/// Randomization applied to every retry delay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Jitter {
    /// Delays are used as computed.
    #[default]
    None,

    /// The delay is scaled by a random value in `[1 - factor, 1 + factor]`.
    ///
    /// The factor is clamped to `0.0..=1.0`.
    Factor(f64),

    /// A random value in `[-jitter, +jitter]` is added to the delay.
    Duration(Duration),
}

impl Jitter {
    pub(crate) fn apply(self, delay: Duration, rnd: &Rnd) -> Duration {
        let secs = delay.as_secs_f64();

        let jittered = match self {
            Self::None => return delay,
            Self::Factor(factor) => secs * factor.clamp(0.0, 1.0).mul_add(rnd.next_symmetric(), 1.0),
            Self::Duration(jitter) => jitter.as_secs_f64().mul_add(rnd.next_symmetric(), secs),
        };

        secs_to_duration_saturating(jittered)
    }
}

fn secs_to_duration_saturating(secs: f64) -> Duration {
    if secs <= 0.0 || secs.is_nan() {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_is_exponential() {
        assert_eq!(
            Backoff::default(),
            Backoff::Exponential {
                delay: Duration::from_millis(50),
                max_delay: Duration::from_secs(2),
                factor: 2.0,
            }
        );
    }

    #[test]
    fn fixed_is_constant() {
        let backoff = Backoff::fixed(Duration::from_millis(200));

        assert_eq!(backoff.delay(0), Duration::from_millis(200));
        assert_eq!(backoff.delay(7), Duration::from_millis(200));
    }

    #[test]
    fn exponential_grows_and_caps() {
        let backoff = Backoff::default();
        let delays: Vec<_> = (0..8).map(|index| backoff.delay(index)).collect();

        assert_eq!(
            delays,
            [50, 100, 200, 400, 800, 1600, 2000, 2000].map(Duration::from_millis)
        );
    }

    #[test]
    fn exponential_overflow_saturates_at_max() {
        let backoff = Backoff::exponential(Duration::from_secs(1), Duration::from_secs(60), 10.0);

        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(60));
    }

    #[rstest]
    #[case(Jitter::None, 0.0, 1000)]
    #[case(Jitter::Factor(0.5), 0.0, 500)]
    #[case(Jitter::Factor(0.5), 0.5, 1000)]
    #[case(Jitter::Factor(0.5), 0.75, 1250)]
    #[case(Jitter::Factor(3.0), 0.0, 0)]
    #[case(Jitter::Duration(Duration::from_millis(200)), 0.0, 800)]
    #[case(Jitter::Duration(Duration::from_millis(200)), 0.75, 1100)]
    #[case(Jitter::Duration(Duration::from_secs(5)), 0.0, 0)]
    fn jitter_apply(#[case] jitter: Jitter, #[case] random: f64, #[case] expected_ms: u64) {
        let delay = jitter.apply(Duration::from_secs(1), &Rnd::new_fixed(random));

        assert_eq!(delay.as_millis(), u128::from(expected_ms));
    }

    #[test]
    fn jitter_factor_stays_in_range() {
        let rnd = Rnd::default();

        for _ in 0..100 {
            let delay = Jitter::Factor(0.2).apply(Duration::from_secs(1), &rnd);
            assert!(delay >= Duration::from_millis(800) && delay <= Duration::from_millis(1200), "{delay:?}");
        }
    }
}
