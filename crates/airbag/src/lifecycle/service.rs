// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use layered::Service;

use super::{BodyLifecycleLayer, OnAbort, OnAbortArgs, OnRelease, OnReleaseArgs};
use crate::body::Releasable;
use crate::utils::TelemetryHelper;
use crate::{Outcome, PipelineContext, Request};

/// Observes how the connections behind response bodies end.
///
/// Built with [`BodyLifecycle::layer`]; see the [lifecycle module][crate::lifecycle] documentation.
#[derive(Debug)]
pub struct BodyLifecycle<S> {
    pub(super) shared: Arc<BodyLifecycleShared>,
    pub(super) inner: S,
}

#[derive(Debug)]
pub(crate) struct BodyLifecycleShared {
    pub(crate) on_release: Option<OnRelease>,
    pub(crate) on_abort: Option<OnAbort>,
    pub(crate) telemetry: TelemetryHelper,
}

impl<S: Clone> Clone for BodyLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
        }
    }
}

impl BodyLifecycle<()> {
    /// Creates a [`BodyLifecycleLayer`] named `name` for telemetry.
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &PipelineContext) -> BodyLifecycleLayer {
        BodyLifecycleLayer::new(name.into(), context)
    }
}

impl<S> Service<Request> for BodyLifecycle<S>
where
    S: Service<Request, Out = Outcome>,
{
    type Out = Outcome;

    async fn execute(&self, request: Request) -> Self::Out {
        let mut outcome = self.inner.execute(request).await;

        if let Ok(response) = &mut outcome {
            response.body_mut().map_connection(|connection| {
                Box::new(ObservedConnection {
                    inner: connection,
                    shared: Arc::clone(&self.shared),
                })
            });
        }

        outcome
    }
}

/// Forwards to the transport's connection and reports how it ended.
struct ObservedConnection {
    inner: Box<dyn Releasable>,
    shared: Arc<BodyLifecycleShared>,
}

impl Releasable for ObservedConnection {
    fn release(&mut self) -> io::Result<()> {
        let result = self.inner.release();
        self.shared.on_released(&result);
        result
    }

    fn abort(&mut self) -> io::Result<()> {
        let result = self.inner.abort();
        self.shared.on_aborted(&result);
        result
    }
}

impl BodyLifecycleShared {
    fn on_released(&self, result: &io::Result<()>) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            match result {
                Ok(()) => tracing::event!(
                    name: "airbag.lifecycle.released",
                    tracing::Level::DEBUG,
                    pipeline.name = %self.telemetry.pipeline_name,
                    strategy.name = %self.telemetry.strategy_name,
                ),
                Err(error) => tracing::event!(
                    name: "airbag.lifecycle.release_failed",
                    tracing::Level::WARN,
                    pipeline.name = %self.telemetry.pipeline_name,
                    strategy.name = %self.telemetry.strategy_name,
                    error = %error,
                ),
            }
        }

        #[cfg(any(feature = "metrics", test))]
        self.telemetry.report_event(
            super::telemetry::RELEASED_EVENT,
            &[opentelemetry::KeyValue::new(super::telemetry::SUCCEEDED, result.is_ok())],
        );

        if let Some(on_release) = &self.on_release {
            on_release.call(OnReleaseArgs { result });
        }
    }

    fn on_aborted(&self, result: &io::Result<()>) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            match result {
                Ok(()) => tracing::event!(
                    name: "airbag.lifecycle.aborted",
                    tracing::Level::INFO,
                    pipeline.name = %self.telemetry.pipeline_name,
                    strategy.name = %self.telemetry.strategy_name,
                ),
                Err(error) => tracing::event!(
                    name: "airbag.lifecycle.abort_failed",
                    tracing::Level::WARN,
                    pipeline.name = %self.telemetry.pipeline_name,
                    strategy.name = %self.telemetry.strategy_name,
                    error = %error,
                ),
            }
        }

        #[cfg(any(feature = "metrics", test))]
        self.telemetry.report_event(
            super::telemetry::ABORTED_EVENT,
            &[opentelemetry::KeyValue::new(super::telemetry::SUCCEEDED, result.is_ok())],
        );

        if let Some(on_abort) = &self.on_abort {
            on_abort.call(OnAbortArgs { result });
        }
    }
}
