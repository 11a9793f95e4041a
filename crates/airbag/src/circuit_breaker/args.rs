// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::CircuitState;

/// Arguments for the [`on_opened`][super::CircuitBreakerLayer::on_opened] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnOpenedArgs {
    pub(super) previous: CircuitState,
    pub(super) open_delay: Duration,
}

impl OnOpenedArgs {
    /// The state the circuit left, [`CircuitState::Closed`] or [`CircuitState::HalfOpen`].
    #[must_use]
    pub fn previous(&self) -> CircuitState {
        self.previous
    }

    /// How long the circuit rejects calls before admitting trial calls.
    #[must_use]
    pub fn open_delay(&self) -> Duration {
        self.open_delay
    }
}

/// Arguments for the [`on_half_opened`][super::CircuitBreakerLayer::on_half_opened] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnHalfOpenedArgs {
    pub(super) open_duration: Duration,
}

impl OnHalfOpenedArgs {
    /// How long the circuit was open.
    #[must_use]
    pub fn open_duration(&self) -> Duration {
        self.open_duration
    }
}

/// Arguments for the [`on_closed`][super::CircuitBreakerLayer::on_closed] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnClosedArgs {
    pub(super) trial_successes: u32,
}

impl OnClosedArgs {
    /// The number of successful trial calls that closed the circuit.
    #[must_use]
    pub fn trial_successes(&self) -> u32 {
        self.trial_successes
    }
}
