// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use layered::DynamicServiceExt;

use super::constants::DEFAULT_MAX_RETRIES;
use super::{Backoff, Jitter, OnRetry, OnRetryArgs, RecoveryArgs, Retry, RetryShared, ShouldRecover};
use crate::rnd::Rnd;
use crate::utils::{EnableIf, TelemetryHelper};
use crate::{DelayParser, Execution, Layer, MaxAttempts, Outcome, PipelineContext, Plugin, Recovery, RecoveryInfo, Request};

/// Builder for the retry plugin.
///
/// Created by [`Retry::layer`]. Every property has a default, so the layer can be used as is.
/// See the [retry module][crate::retry] documentation for the retry algorithm.
#[derive(Debug)]
pub struct RetryLayer {
    context: PipelineContext,
    max_attempts: MaxAttempts,
    max_duration: Option<Duration>,
    backoff: Backoff,
    jitter: Jitter,
    should_recover: ShouldRecover,
    on_retry: Option<OnRetry>,
    enable_if: EnableIf,
    telemetry: TelemetryHelper,
    rnd: Rnd,
}

impl RetryLayer {
    pub(crate) fn new(name: Cow<'static, str>, context: &PipelineContext) -> Self {
        Self {
            context: context.clone(),
            max_attempts: MaxAttempts::from_retries(DEFAULT_MAX_RETRIES),
            max_duration: None,
            backoff: Backoff::default(),
            jitter: Jitter::None,
            should_recover: ShouldRecover::new(|outcome, _args| outcome.recovery()),
            on_retry: None,
            enable_if: EnableIf::always(),
            telemetry: context.create_telemetry(name),
            rnd: Rnd::default(),
        }
    }

    /// Sets the number of retries in addition to the original attempt.
    ///
    /// With `0`, a retryable fault is surfaced as
    /// [`FaultKind::RetryExhausted`][crate::FaultKind::RetryExhausted] right away.
    ///
    /// **Default**: 3
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_attempts = MaxAttempts::from_retries(max_retries);
        self
    }

    /// Retries until the outcome is not retryable or [`max_duration`][Self::max_duration] is hit.
    #[must_use]
    pub fn unlimited_retries(mut self) -> Self {
        self.max_attempts = MaxAttempts::Infinite;
        self
    }

    /// Limits the time spent in the retry loop.
    ///
    /// A retry is not scheduled when the time elapsed since the first attempt plus the next
    /// delay would exceed `max_duration`.
    ///
    /// **Default**: no limit
    #[must_use]
    pub fn max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    /// Sets the backoff used when neither the response nor the classification supplies a delay.
    ///
    /// **Default**: [`Backoff::default`]
    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the jitter applied to every delay.
    ///
    /// **Default**: [`Jitter::None`]
    #[must_use]
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replaces the classification of outcomes.
    ///
    /// Only [`RecoveryKind::Retry`][crate::RecoveryKind::Retry] leads to a retry. A delay attached
    /// to the returned [`RecoveryInfo`] takes precedence over the backoff.
    ///
    /// **Default**: [`Recovery::recovery`] of the outcome
    #[must_use]
    pub fn recovery_with(mut self, recover_fn: impl Fn(&Outcome, RecoveryArgs<'_>) -> RecoveryInfo + Send + Sync + 'static) -> Self {
        self.should_recover = ShouldRecover::new(recover_fn);
        self
    }

    /// Invokes `retry_fn` before each retry with the outcome being discarded.
    #[must_use]
    pub fn on_retry(mut self, retry_fn: impl Fn(&Outcome, OnRetryArgs) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(OnRetry::new(retry_fn));
        self
    }

    /// Retries only requests for which `is_enabled` returns `true`. Others pass through.
    ///
    /// **Default**: every request
    #[must_use]
    pub fn enable_if(mut self, is_enabled: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.enable_if = EnableIf::new(is_enabled);
        self
    }

    #[cfg(test)]
    pub(crate) fn rnd(mut self, rnd: Rnd) -> Self {
        self.rnd = rnd;
        self
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Retry {
            shared: Arc::new(RetryShared {
                clock: self.context.clock().clone(),
                delay_parser: DelayParser::new(self.context.clock()),
                max_attempts: self.max_attempts,
                max_duration: self.max_duration,
                backoff: self.backoff,
                jitter: self.jitter,
                should_recover: self.should_recover.clone(),
                on_retry: self.on_retry.clone(),
                enable_if: self.enable_if.clone(),
                telemetry: self.telemetry.clone(),
                rnd: self.rnd.clone(),
            }),
            inner,
        }
    }
}

impl Plugin for RetryLayer {
    fn apply(&self, execution: Execution) -> Execution {
        self.layer(execution).into_dynamic()
    }
}
