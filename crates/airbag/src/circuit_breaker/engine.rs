// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::Ratio;

/// The observable state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CircuitState {
    /// Calls flow through and their outcomes are recorded.
    Closed,

    /// Calls are rejected with [`FaultKind::CircuitOpen`][crate::FaultKind::CircuitOpen].
    Open,

    /// A limited number of trial calls is admitted to probe the downstream.
    HalfOpen,
}

impl CircuitState {
    /// A short `snake_case` name, also used as telemetry value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds the engine evaluates transitions against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Thresholds {
    pub(crate) failure: Ratio,
    pub(crate) success: Ratio,
    pub(crate) open_delay: Duration,
}

/// Admission to execute one call, stamped with the epoch it was granted in.
///
/// Results reported with a permit from an older epoch are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub(crate) struct Permit {
    epoch: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Admission {
    Admitted(Permit),
    Rejected,
}

/// A state change the caller reports after the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Opened { previous: CircuitState },
    HalfOpened { open_duration: Duration },
    Closed { trial_successes: u32 },
}

/// The state machine of one circuit breaker.
///
/// Every read and transition happens under a single mutex. The lock is never held while time is
/// read, callbacks run or telemetry is reported; callers pass the current instant in and report
/// the returned [`Transition`] themselves.
#[derive(Debug, Default)]
pub(crate) struct Engine {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    mode: Mode,
    epoch: u64,
}

#[derive(Debug)]
enum Mode {
    Closed { window: VecDeque<bool>, failures: u32 },
    Open { since: Instant },
    HalfOpen { admitted: u32, successes: u32 },
}

impl Default for Mode {
    fn default() -> Self {
        Self::Closed {
            window: VecDeque::new(),
            failures: 0,
        }
    }
}

impl State {
    fn permit(&self) -> Permit {
        Permit { epoch: self.epoch }
    }

    /// Moves to `mode` with fresh counters and invalidates outstanding permits.
    fn transition(&mut self, mode: Mode) {
        self.mode = mode;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

impl Engine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> CircuitState {
        match self.lock().mode {
            Mode::Closed { .. } => CircuitState::Closed,
            Mode::Open { .. } => CircuitState::Open,
            Mode::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Decides whether a call may proceed.
    pub(crate) fn enter(&self, thresholds: &Thresholds, now: Instant) -> (Admission, Option<Transition>) {
        let mut state = self.lock();

        match &mut state.mode {
            Mode::Closed { .. } => (Admission::Admitted(state.permit()), None),
            Mode::Open { since } => {
                let open_duration = now.saturating_duration_since(*since);
                if open_duration < thresholds.open_delay {
                    return (Admission::Rejected, None);
                }

                state.transition(Mode::HalfOpen { admitted: 1, successes: 0 });
                (Admission::Admitted(state.permit()), Some(Transition::HalfOpened { open_duration }))
            }
            Mode::HalfOpen { admitted, .. } => {
                if *admitted >= thresholds.success.total() {
                    return (Admission::Rejected, None);
                }

                *admitted = admitted.saturating_add(1);
                (Admission::Admitted(state.permit()), None)
            }
        }
    }

    /// Records the result of an admitted call.
    pub(crate) fn exit(&self, thresholds: &Thresholds, permit: Permit, failed: bool, now: Instant) -> Option<Transition> {
        let mut state = self.lock();

        if permit.epoch != state.epoch {
            return None;
        }

        match &mut state.mode {
            Mode::Closed { window, failures } => {
                window.push_back(failed);
                if failed {
                    *failures = failures.saturating_add(1);
                }

                if window.len() > thresholds.failure.window_len() && window.pop_front() == Some(true) {
                    *failures = failures.saturating_sub(1);
                }

                let tripped = window.len() >= thresholds.failure.window_len() && *failures >= thresholds.failure.count();
                tripped.then(|| {
                    state.transition(Mode::Open { since: now });
                    Transition::Opened {
                        previous: CircuitState::Closed,
                    }
                })
            }
            Mode::HalfOpen { successes, .. } => {
                if failed {
                    state.transition(Mode::Open { since: now });
                    return Some(Transition::Opened {
                        previous: CircuitState::HalfOpen,
                    });
                }

                *successes = successes.saturating_add(1);
                let trial_successes = *successes;
                (trial_successes >= thresholds.success.count()).then(|| {
                    state.transition(Mode::default());
                    Transition::Closed { trial_successes }
                })
            }
            Mode::Open { .. } => None,
        }
    }

    /// Returns the permit of a call that was cancelled before it produced an outcome.
    ///
    /// A cancelled trial call frees its slot so the half-open state cannot starve.
    pub(crate) fn cancel(&self, permit: Permit) {
        let mut state = self.lock();

        if permit.epoch != state.epoch {
            return;
        }

        if let Mode::HalfOpen { admitted, .. } = &mut state.mode {
            *admitted = admitted.saturating_sub(1);
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every transition leaves the state consistent, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(30);

    fn thresholds(failure: &str, success: &str) -> Thresholds {
        Thresholds {
            failure: failure.parse().unwrap(),
            success: success.parse().unwrap(),
            open_delay: DELAY,
        }
    }

    fn admit(engine: &Engine, thresholds: &Thresholds, now: Instant) -> Permit {
        match engine.enter(thresholds, now).0 {
            Admission::Admitted(permit) => permit,
            Admission::Rejected => panic!("call was rejected"),
        }
    }

    fn record(engine: &Engine, thresholds: &Thresholds, failed: bool, now: Instant) -> Option<Transition> {
        let permit = admit(engine, thresholds, now);
        engine.exit(thresholds, permit, failed, now)
    }

    fn open(engine: &Engine, thresholds: &Thresholds, now: Instant) {
        for _ in 0..thresholds.failure.total() {
            record(engine, thresholds, true, now);
        }
        assert_eq!(engine.state(), CircuitState::Open);
    }

    #[test]
    fn starts_closed() {
        assert_eq!(Engine::new().state(), CircuitState::Closed);
    }

    #[test]
    fn opens_when_window_is_full_of_failures() {
        let engine = Engine::new();
        let thresholds = thresholds("5/5", "3/5");
        let now = Instant::now();

        for _ in 0..4 {
            assert_eq!(record(&engine, &thresholds, true, now), None);
        }
        assert_eq!(engine.state(), CircuitState::Closed);

        assert_eq!(
            record(&engine, &thresholds, true, now),
            Some(Transition::Opened {
                previous: CircuitState::Closed
            })
        );
        assert_eq!(engine.state(), CircuitState::Open);
    }

    #[test]
    fn window_is_rolling() {
        let engine = Engine::new();
        let thresholds = thresholds("2/3", "1/1");
        let now = Instant::now();

        record(&engine, &thresholds, true, now);
        record(&engine, &thresholds, false, now);
        record(&engine, &thresholds, false, now);
        record(&engine, &thresholds, true, now);
        assert_eq!(engine.state(), CircuitState::Closed);

        // window is now [false, true, true]
        record(&engine, &thresholds, true, now);
        assert_eq!(engine.state(), CircuitState::Open);
    }

    #[test]
    fn open_rejects_until_delay_elapsed() {
        let engine = Engine::new();
        let thresholds = thresholds("1/1", "1/1");
        let now = Instant::now();
        open(&engine, &thresholds, now);

        assert_eq!(engine.enter(&thresholds, now + DELAY / 2), (Admission::Rejected, None));

        let (admission, transition) = engine.enter(&thresholds, now + DELAY);
        assert!(matches!(admission, Admission::Admitted(_)));
        assert_eq!(transition, Some(Transition::HalfOpened { open_duration: DELAY }));
        assert_eq!(engine.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_admits_limited_trials() {
        let engine = Engine::new();
        let thresholds = thresholds("1/1", "2/3");
        let now = Instant::now();
        open(&engine, &thresholds, now);
        let later = now + DELAY;

        let _first = admit(&engine, &thresholds, later);
        let _second = admit(&engine, &thresholds, later);
        let _third = admit(&engine, &thresholds, later);

        assert_eq!(engine.enter(&thresholds, later), (Admission::Rejected, None));
    }

    #[test]
    fn trial_successes_close() {
        let engine = Engine::new();
        let thresholds = thresholds("1/1", "2/3");
        let now = Instant::now();
        open(&engine, &thresholds, now);
        let later = now + DELAY;

        assert_eq!(record(&engine, &thresholds, false, later), None);
        assert_eq!(
            record(&engine, &thresholds, false, later),
            Some(Transition::Closed { trial_successes: 2 })
        );
        assert_eq!(engine.state(), CircuitState::Closed);
    }

    #[test]
    fn trial_failure_reopens_and_restarts_cooldown() {
        let engine = Engine::new();
        let thresholds = thresholds("1/1", "3/5");
        let now = Instant::now();
        open(&engine, &thresholds, now);
        let later = now + DELAY;

        assert_eq!(
            record(&engine, &thresholds, true, later),
            Some(Transition::Opened {
                previous: CircuitState::HalfOpen
            })
        );
        assert_eq!(engine.state(), CircuitState::Open);

        assert_eq!(engine.enter(&thresholds, later + DELAY / 2), (Admission::Rejected, None));
        assert!(matches!(engine.enter(&thresholds, later + DELAY).0, Admission::Admitted(_)));
    }

    #[test]
    fn results_from_older_epoch_are_ignored() {
        let engine = Engine::new();
        let thresholds = thresholds("1/1", "1/1");
        let now = Instant::now();

        let stale = admit(&engine, &thresholds, now);
        record(&engine, &thresholds, true, now);
        assert_eq!(engine.state(), CircuitState::Open);

        assert_eq!(engine.exit(&thresholds, stale, true, now), None);
        assert_eq!(engine.exit(&thresholds, stale, false, now), None);
        assert_eq!(engine.state(), CircuitState::Open);
    }

    #[test]
    fn concurrent_failures_open_once() {
        const CALLS: usize = 8;

        let engine = Engine::new();
        let thresholds = thresholds("1/1", "1/1");
        let now = Instant::now();
        let barrier = std::sync::Barrier::new(CALLS);

        let transitions: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..CALLS)
                .map(|_| {
                    scope.spawn(|| {
                        let permit = admit(&engine, &thresholds, now);
                        // Every call is in flight before the first one completes.
                        barrier.wait();
                        engine.exit(&thresholds, permit, true, now)
                    })
                })
                .collect();

            handles.into_iter().filter_map(|handle| handle.join().unwrap()).collect()
        });

        assert_eq!(
            transitions,
            [Transition::Opened {
                previous: CircuitState::Closed
            }]
        );
        assert_eq!(engine.state(), CircuitState::Open);
    }

    #[test]
    fn counters_reset_on_close() {
        let engine = Engine::new();
        let thresholds = thresholds("2/2", "1/1");
        let now = Instant::now();
        open(&engine, &thresholds, now);
        record(&engine, &thresholds, false, now + DELAY);
        assert_eq!(engine.state(), CircuitState::Closed);

        assert_eq!(record(&engine, &thresholds, true, now + DELAY), None);
        assert_eq!(engine.state(), CircuitState::Closed);
    }

    #[test]
    fn cancelled_trial_frees_slot() {
        let engine = Engine::new();
        let thresholds = thresholds("1/1", "1/1");
        let now = Instant::now();
        open(&engine, &thresholds, now);
        let later = now + DELAY;

        let trial = admit(&engine, &thresholds, later);
        assert_eq!(engine.enter(&thresholds, later), (Admission::Rejected, None));

        engine.cancel(trial);

        assert!(matches!(engine.enter(&thresholds, later).0, Admission::Admitted(_)));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let engine = std::sync::Arc::new(Engine::new());
        let clone = std::sync::Arc::clone(&engine);

        let _ = std::thread::spawn(move || {
            let _guard = clone.state.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(engine.state.is_poisoned());
        assert_eq!(engine.state(), CircuitState::Closed);
    }

    #[test]
    fn state_names() {
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
        assert_eq!(CircuitState::Open.as_str(), "open");
        assert_eq!(CircuitState::Closed.as_str(), "closed");
    }
}
