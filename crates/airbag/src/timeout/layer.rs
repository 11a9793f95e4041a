// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use layered::DynamicServiceExt;

use super::{OnTimeout, OnTimeoutArgs, Timeout, TimeoutShared};
use crate::utils::{EnableIf, TelemetryHelper};
use crate::{Execution, Layer, NotSet, PipelineContext, Plugin, Request, Set};

/// Builder for the timeout plugin.
///
/// Created by [`Timeout::layer`]. The [`timeout`][TimeoutLayer::timeout] must be set before the
/// layer can wrap a service; the `S` type parameter tracks whether it was.
#[derive(Debug)]
pub struct TimeoutLayer<S = Set> {
    context: PipelineContext,
    timeout: Duration,
    on_timeout: Option<OnTimeout>,
    enable_if: EnableIf,
    telemetry: TelemetryHelper,
    _state: PhantomData<fn(S) -> S>,
}

impl TimeoutLayer<NotSet> {
    pub(crate) fn new(name: Cow<'static, str>, context: &PipelineContext) -> Self {
        Self {
            context: context.clone(),
            timeout: Duration::ZERO,
            on_timeout: None,
            enable_if: EnableIf::always(),
            telemetry: context.create_telemetry(name),
            _state: PhantomData,
        }
    }
}

impl<S> TimeoutLayer<S> {
    /// Sets the deadline of each call.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> TimeoutLayer<Set> {
        TimeoutLayer {
            context: self.context,
            timeout,
            on_timeout: self.on_timeout,
            enable_if: self.enable_if,
            telemetry: self.telemetry,
            _state: PhantomData,
        }
    }

    /// Invokes `timeout_fn` each time a call is cancelled because its deadline elapsed.
    #[must_use]
    pub fn on_timeout(mut self, timeout_fn: impl Fn(OnTimeoutArgs) + Send + Sync + 'static) -> Self {
        self.on_timeout = Some(OnTimeout::new(timeout_fn));
        self
    }

    /// Applies the deadline only to requests for which `is_enabled` returns `true`.
    ///
    /// **Default**: every request
    #[must_use]
    pub fn enable_if(mut self, is_enabled: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.enable_if = EnableIf::new(is_enabled);
        self
    }
}

impl<S> Layer<S> for TimeoutLayer<Set> {
    type Service = Timeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Timeout {
            shared: Arc::new(TimeoutShared {
                clock: self.context.clock().clone(),
                timeout: self.timeout,
                on_timeout: self.on_timeout.clone(),
                enable_if: self.enable_if.clone(),
                telemetry: self.telemetry.clone(),
            }),
            inner,
        }
    }
}

impl Plugin for TimeoutLayer<Set> {
    fn apply(&self, execution: Execution) -> Execution {
        self.layer(execution).into_dynamic()
    }
}
