// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use layered::Service;
use tick::{Clock, FutureExt};

use super::{OnTimeout, OnTimeoutArgs, TimeoutLayer};
use crate::utils::{EnableIf, TelemetryHelper};
use crate::{Fault, NotSet, Outcome, PipelineContext, Request};

/// Cancels calls that exceed a deadline.
///
/// Built with [`Timeout::layer`]; see the [timeout module][crate::timeout] documentation.
#[derive(Debug)]
pub struct Timeout<S> {
    pub(super) shared: Arc<TimeoutShared>,
    pub(super) inner: S,
}

#[derive(Debug)]
pub(crate) struct TimeoutShared {
    pub(crate) clock: Clock,
    pub(crate) timeout: Duration,
    pub(crate) on_timeout: Option<OnTimeout>,
    pub(crate) enable_if: EnableIf,
    pub(crate) telemetry: TelemetryHelper,
}

impl<S: Clone> Clone for Timeout<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
        }
    }
}

impl Timeout<()> {
    /// Creates a [`TimeoutLayer`] named `name` for telemetry.
    ///
    /// The returned layer needs a [`timeout`][TimeoutLayer::timeout] before it can be used.
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &PipelineContext) -> TimeoutLayer<NotSet> {
        TimeoutLayer::new(name.into(), context)
    }
}

impl<S> Service<Request> for Timeout<S>
where
    S: Service<Request, Out = Outcome>,
{
    type Out = Outcome;

    #[cfg_attr(test, mutants::skip)] // causes test timeouts
    async fn execute(&self, request: Request) -> Self::Out {
        if !self.shared.enable_if.call(&request) {
            return self.inner.execute(request).await;
        }

        let timeout = self.shared.timeout;

        match self.inner.execute(request).timeout(&self.shared.clock, timeout).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(self.shared.on_elapsed()),
        }
    }
}

impl TimeoutShared {
    fn on_elapsed(&self) -> Fault {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.timeout",
                tracing::Level::WARN,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                timeout.ms = self.timeout.as_millis(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.telemetry.report_event(super::telemetry::TIMEOUT_EVENT, &[]);

        if let Some(on_timeout) = &self.on_timeout {
            on_timeout.call(OnTimeoutArgs { timeout: self.timeout });
        }

        Fault::timeout(self.timeout)
    }
}
