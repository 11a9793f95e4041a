// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use tick::Clock;

use crate::{Attempt, RecoveryInfo};

/// Arguments for the [`recovery_with`][super::RetryLayer::recovery_with] callback.
#[derive(Debug)]
pub struct RecoveryArgs<'a> {
    pub(super) attempt: Attempt,
    pub(super) clock: &'a Clock,
}

impl RecoveryArgs<'_> {
    /// The attempt that produced the outcome.
    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// The pipeline clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        self.clock
    }
}

/// Arguments for the [`on_retry`][super::RetryLayer::on_retry] callback.
#[derive(Debug)]
pub struct OnRetryArgs {
    pub(super) attempt: Attempt,
    pub(super) retry_delay: Duration,
    pub(super) recovery: RecoveryInfo,
}

impl OnRetryArgs {
    /// The attempt that failed and is about to be retried.
    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// How long the plugin waits before the next attempt.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// The classification that triggered the retry.
    #[must_use]
    pub fn recovery(&self) -> &RecoveryInfo {
        &self.recovery
    }
}
