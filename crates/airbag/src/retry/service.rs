// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use layered::Service;
use tick::Clock;

#[cfg(any(feature = "metrics", test))]
use super::telemetry::{RETRY_EVENT, RETRY_EXHAUSTED_EVENT};
use super::{Backoff, Jitter, OnRetry, OnRetryArgs, RecoveryArgs, RetryLayer, ShouldRecover};
use crate::rnd::Rnd;
use crate::utils::{EnableIf, TelemetryHelper};
use crate::{
    Attempt, DelayParser, Fault, MaxAttempts, Outcome, PipelineContext, RecoveryInfo, RecoveryKind, Request, Response, resolve_delay,
};

/// Re-executes requests whose outcome is classified as retryable.
///
/// Built with [`Retry::layer`]; see the [retry module][crate::retry] documentation.
#[derive(Debug)]
pub struct Retry<S> {
    pub(super) shared: Arc<RetryShared>,
    pub(super) inner: S,
}

#[derive(Debug)]
pub(crate) struct RetryShared {
    pub(crate) clock: Clock,
    pub(crate) delay_parser: DelayParser,
    pub(crate) max_attempts: MaxAttempts,
    pub(crate) max_duration: Option<Duration>,
    pub(crate) backoff: Backoff,
    pub(crate) jitter: Jitter,
    pub(crate) should_recover: ShouldRecover,
    pub(crate) on_retry: Option<OnRetry>,
    pub(crate) enable_if: EnableIf,
    pub(crate) telemetry: TelemetryHelper,
    pub(crate) rnd: Rnd,
}

impl<S: Clone> Clone for Retry<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
        }
    }
}

impl Retry<()> {
    /// Creates a [`RetryLayer`] named `name` for telemetry.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use airbag::PipelineContext;
    /// use airbag::retry::{Backoff, Jitter, Retry};
    /// use tick::Clock;
    ///
    /// # fn example(clock: Clock) {
    /// let context = PipelineContext::new(&clock);
    /// let layer = Retry::layer("retry", &context)
    ///     .max_retries(5)
    ///     .max_duration(Duration::from_secs(10))
    ///     .backoff(Backoff::fixed(Duration::from_millis(200)))
    ///     .jitter(Jitter::Factor(0.2));
    /// # let _ = layer;
    /// # }
    /// ```
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &PipelineContext) -> RetryLayer {
        RetryLayer::new(name.into(), context)
    }
}

impl<S> Service<Request> for Retry<S>
where
    S: Service<Request, Out = Outcome>,
{
    type Out = Outcome;

    #[cfg_attr(test, mutants::skip)] // Mutating enable_if check causes infinite loops
    async fn execute(&self, request: Request) -> Self::Out {
        if !self.shared.enable_if.call(&request) {
            return self.inner.execute(request).await;
        }

        let stopwatch = self.shared.clock.stopwatch();
        let mut attempt = Attempt::first(self.shared.max_attempts);

        loop {
            let outcome = self.inner.execute(request.clone()).await;

            match self.shared.evaluate_attempt(outcome, attempt, stopwatch.elapsed()) {
                ControlFlow::Continue(next) => {
                    self.shared.clock.delay(next.delay).await;
                    attempt = next.attempt;
                }
                ControlFlow::Break(outcome) => return outcome,
            }
        }
    }
}

/// State carried to the next iteration of the retry loop.
#[derive(Debug)]
struct ContinueRetry {
    attempt: Attempt,
    delay: Duration,
}

impl RetryShared {
    fn evaluate_attempt(&self, outcome: Outcome, attempt: Attempt, elapsed: Duration) -> ControlFlow<Outcome, ContinueRetry> {
        let recovery = self.should_recover.call(
            &outcome,
            RecoveryArgs {
                attempt,
                clock: &self.clock,
            },
        );

        if !is_retryable(&recovery) {
            return ControlFlow::Break(outcome);
        }

        let Some(next_attempt) = attempt.increment(self.max_attempts) else {
            self.emit_exhausted(attempt);
            return ControlFlow::Break(exhaust(outcome));
        };

        let delay = self.retry_delay(&outcome, &recovery, attempt);

        if let Some(max_duration) = self.max_duration
            && elapsed.saturating_add(delay) > max_duration
        {
            self.emit_exhausted(attempt);
            return ControlFlow::Break(exhaust(outcome));
        }

        self.emit_retry(attempt, delay);

        if let Some(on_retry) = &self.on_retry {
            on_retry.call(
                &outcome,
                OnRetryArgs {
                    attempt,
                    retry_delay: delay,
                    recovery,
                },
            );
        }

        // Dropping a discarded response aborts its connection before the delay starts.
        drop(outcome);

        ControlFlow::Continue(ContinueRetry {
            attempt: next_attempt,
            delay,
        })
    }

    /// Server hint first, then the classification's delay, then backoff. Jitter applies last.
    ///
    /// A hint that already elapsed is ignored.
    fn retry_delay(&self, outcome: &Outcome, recovery: &RecoveryInfo, attempt: Attempt) -> Duration {
        let delay = outcome
            .as_ref()
            .ok()
            .and_then(Response::retry_after)
            .and_then(|value| self.delay_parser.parse_retry_after(value))
            .filter(|hint| !hint.is_negative())
            .map(resolve_delay)
            .or_else(|| recovery.get_delay())
            .unwrap_or_else(|| self.backoff.delay(attempt.index()));

        self.jitter.apply(delay, &self.rnd)
    }

    #[cfg_attr(
        not(any(feature = "logs", test)),
        expect(unused_variables, reason = "the delay is only logged")
    )]
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_retry(&self, attempt: Attempt, delay: Duration) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.retry",
                tracing::Level::WARN,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                resilience.attempt.index = attempt.index(),
                resilience.attempt.is_last = attempt.is_last(),
                resilience.retry.delay = delay.as_secs_f32(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report(RETRY_EVENT, attempt);
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_exhausted(&self, attempt: Attempt) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.retry.exhausted",
                tracing::Level::WARN,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                resilience.attempt.index = attempt.index(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report(RETRY_EXHAUSTED_EVENT, attempt);
    }

    #[cfg(any(feature = "metrics", test))]
    fn report(&self, event: &'static str, attempt: Attempt) {
        use crate::telemetry::{ATTEMPT_INDEX, ATTEMPT_IS_LAST};

        self.telemetry.report_event(
            event,
            &[
                opentelemetry::KeyValue::new(ATTEMPT_INDEX, i64::from(attempt.index())),
                opentelemetry::KeyValue::new(ATTEMPT_IS_LAST, attempt.is_last()),
            ],
        );
    }
}

fn is_retryable(recovery: &RecoveryInfo) -> bool {
    match recovery.kind() {
        RecoveryKind::Retry => true,
        RecoveryKind::Never | RecoveryKind::Unavailable | RecoveryKind::Unknown | _ => false,
    }
}

/// A fault that is still retryable after the last attempt becomes `RetryExhausted`.
fn exhaust(outcome: Outcome) -> Outcome {
    outcome.map_err(Fault::retry_exhausted)
}
