// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use layered::DynamicServiceExt;

use super::constants::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_OPEN_DELAY, DEFAULT_SUCCESS_THRESHOLD};
use super::engine::{Engine, Thresholds};
use super::{
    CircuitBreaker, CircuitBreakerShared, CircuitState, FailureIf, OnClosed, OnClosedArgs, OnHalfOpened, OnHalfOpenedArgs, OnOpened,
    OnOpenedArgs, Ratio,
};
use crate::utils::TelemetryHelper;
use crate::{Execution, Layer, Outcome, PipelineContext, Plugin};

/// Builder for the circuit breaker plugin.
///
/// Created by [`CircuitBreaker::layer`]. The layer owns the breaker state: every service built
/// from the same layer, including clones of the layer, shares one circuit.
#[derive(Debug, Clone)]
pub struct CircuitBreakerLayer {
    context: PipelineContext,
    thresholds: Thresholds,
    failure_if: FailureIf,
    on_opened: Option<OnOpened>,
    on_half_opened: Option<OnHalfOpened>,
    on_closed: Option<OnClosed>,
    telemetry: TelemetryHelper,
    engine: Arc<Engine>,
}

impl CircuitBreakerLayer {
    pub(crate) fn new(name: Cow<'static, str>, context: &PipelineContext) -> Self {
        Self {
            context: context.clone(),
            thresholds: Thresholds {
                failure: DEFAULT_FAILURE_THRESHOLD,
                success: DEFAULT_SUCCESS_THRESHOLD,
                open_delay: DEFAULT_OPEN_DELAY,
            },
            failure_if: FailureIf::new(is_failure),
            on_opened: None,
            on_half_opened: None,
            on_closed: None,
            telemetry: context.create_telemetry(name),
            engine: Arc::new(Engine::new()),
        }
    }

    /// Opens the circuit once `count` of the last `total` calls failed.
    ///
    /// **Default**: 5/5
    #[must_use]
    pub fn failure_threshold(mut self, threshold: Ratio) -> Self {
        self.thresholds.failure = threshold;
        self
    }

    /// How long the circuit stays open before trial calls are admitted.
    ///
    /// **Default**: 30 seconds
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.thresholds.open_delay = delay;
        self
    }

    /// Admits up to `total` trial calls while half-open and closes after `count` of them succeed.
    ///
    /// A single failed trial reopens the circuit.
    ///
    /// **Default**: 3/5
    #[must_use]
    pub fn success_threshold(mut self, threshold: Ratio) -> Self {
        self.thresholds.success = threshold;
        self
    }

    /// Replaces the classification of outcomes as failures.
    ///
    /// **Default**: every fault and every `5xx` response
    #[must_use]
    pub fn failure_if(mut self, is_failure: impl Fn(&Outcome) -> bool + Send + Sync + 'static) -> Self {
        self.failure_if = FailureIf::new(is_failure);
        self
    }

    /// Invokes `opened_fn` when the circuit opens.
    #[must_use]
    pub fn on_opened(mut self, opened_fn: impl Fn(OnOpenedArgs) + Send + Sync + 'static) -> Self {
        self.on_opened = Some(OnOpened::new(opened_fn));
        self
    }

    /// Invokes `half_opened_fn` when the first call after the open delay is admitted as a trial.
    #[must_use]
    pub fn on_half_opened(mut self, half_opened_fn: impl Fn(OnHalfOpenedArgs) + Send + Sync + 'static) -> Self {
        self.on_half_opened = Some(OnHalfOpened::new(half_opened_fn));
        self
    }

    /// Invokes `closed_fn` when enough trial calls succeeded.
    #[must_use]
    pub fn on_closed(mut self, closed_fn: impl Fn(OnClosedArgs) + Send + Sync + 'static) -> Self {
        self.on_closed = Some(OnClosed::new(closed_fn));
        self
    }

    /// The current state of the circuit shared by all services built from this layer.
    ///
    /// An open circuit whose delay elapsed reports [`CircuitState::Open`] until the next call
    /// is admitted as a trial.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.engine.state()
    }
}

fn is_failure(outcome: &Outcome) -> bool {
    match outcome {
        Ok(response) => response.status().is_server_error(),
        Err(_) => true,
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreaker<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreaker {
            shared: Arc::new(CircuitBreakerShared {
                clock: self.context.clock().clone(),
                engine: Arc::clone(&self.engine),
                thresholds: self.thresholds,
                failure_if: self.failure_if.clone(),
                on_opened: self.on_opened.clone(),
                on_half_opened: self.on_half_opened.clone(),
                on_closed: self.on_closed.clone(),
                telemetry: self.telemetry.clone(),
            }),
            inner,
        }
    }
}

impl Plugin for CircuitBreakerLayer {
    fn apply(&self, execution: Execution) -> Execution {
        self.layer(execution).into_dynamic()
    }
}
