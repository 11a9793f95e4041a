// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;

use layered::Service;
use tick::Clock;

use super::engine::{Admission, Engine, Permit, Thresholds, Transition};
#[cfg(any(feature = "metrics", test))]
use super::telemetry::{CLOSED_EVENT, HALF_OPENED_EVENT, OPENED_EVENT, REJECTED_EVENT};
use super::{
    CircuitBreakerLayer, CircuitState, FailureIf, OnClosed, OnClosedArgs, OnHalfOpened, OnHalfOpenedArgs, OnOpened, OnOpenedArgs,
};
use crate::utils::TelemetryHelper;
use crate::{Fault, Outcome, PipelineContext, Request};

/// Rejects calls while the downstream is considered unhealthy.
///
/// Built with [`CircuitBreaker::layer`]; see the [circuit breaker module][crate::circuit_breaker]
/// documentation.
#[derive(Debug)]
pub struct CircuitBreaker<S> {
    pub(super) shared: Arc<CircuitBreakerShared>,
    pub(super) inner: S,
}

#[derive(Debug)]
pub(crate) struct CircuitBreakerShared {
    pub(crate) clock: Clock,
    pub(crate) engine: Arc<Engine>,
    pub(crate) thresholds: Thresholds,
    pub(crate) failure_if: FailureIf,
    pub(crate) on_opened: Option<OnOpened>,
    pub(crate) on_half_opened: Option<OnHalfOpened>,
    pub(crate) on_closed: Option<OnClosed>,
    pub(crate) telemetry: TelemetryHelper,
}

impl<S: Clone> Clone for CircuitBreaker<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
        }
    }
}

impl CircuitBreaker<()> {
    /// Creates a [`CircuitBreakerLayer`] named `name` for telemetry.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use airbag::PipelineContext;
    /// use airbag::circuit_breaker::{CircuitBreaker, CircuitState};
    /// use tick::Clock;
    ///
    /// # fn example(clock: Clock) {
    /// let context = PipelineContext::new(&clock);
    /// let layer = CircuitBreaker::layer("breaker", &context)
    ///     .failure_threshold("3/10".parse().unwrap())
    ///     .delay(Duration::from_secs(10))
    ///     .on_opened(|args| println!("circuit opened for {:?}", args.open_delay()));
    ///
    /// assert_eq!(layer.state(), CircuitState::Closed);
    /// # }
    /// ```
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &PipelineContext) -> CircuitBreakerLayer {
        CircuitBreakerLayer::new(name.into(), context)
    }
}

impl<S> CircuitBreaker<S> {
    /// The current state of the circuit.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.shared.engine.state()
    }
}

impl<S> Service<Request> for CircuitBreaker<S>
where
    S: Service<Request, Out = Outcome>,
{
    type Out = Outcome;

    async fn execute(&self, request: Request) -> Self::Out {
        let shared = &self.shared;

        let (admission, transition) = shared.engine.enter(&shared.thresholds, shared.clock.instant());
        if let Some(transition) = transition {
            shared.notify(transition);
        }

        let Admission::Admitted(permit) = admission else {
            shared.emit_rejected();
            return Err(Fault::circuit_open());
        };

        let guard = PermitGuard {
            engine: &shared.engine,
            permit: Some(permit),
        };

        let outcome = self.inner.execute(request).await;
        let failed = shared.failure_if.call(&outcome);

        if let Some(permit) = guard.disarm()
            && let Some(transition) = shared.engine.exit(&shared.thresholds, permit, failed, shared.clock.instant())
        {
            shared.notify(transition);
        }

        outcome
    }
}

/// Returns the permit to the engine when the call is dropped before completing.
#[derive(Debug)]
struct PermitGuard<'a> {
    engine: &'a Engine,
    permit: Option<Permit>,
}

impl PermitGuard<'_> {
    fn disarm(mut self) -> Option<Permit> {
        self.permit.take()
    }
}

impl Drop for PermitGuard<'_> {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            self.engine.cancel(permit);
        }
    }
}

impl CircuitBreakerShared {
    fn notify(&self, transition: Transition) {
        match transition {
            Transition::Opened { previous } => {
                self.emit_opened(previous);
                if let Some(on_opened) = &self.on_opened {
                    on_opened.call(OnOpenedArgs {
                        previous,
                        open_delay: self.thresholds.open_delay,
                    });
                }
            }
            Transition::HalfOpened { open_duration } => {
                self.emit_half_opened();
                if let Some(on_half_opened) = &self.on_half_opened {
                    on_half_opened.call(OnHalfOpenedArgs { open_duration });
                }
            }
            Transition::Closed { trial_successes } => {
                self.emit_closed();
                if let Some(on_closed) = &self.on_closed {
                    on_closed.call(OnClosedArgs { trial_successes });
                }
            }
        }
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    #[cfg_attr(
        all(feature = "metrics", not(any(feature = "logs", test))),
        expect(unused_variables, reason = "the previous state is only logged")
    )]
    fn emit_opened(&self, previous: CircuitState) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.circuit_breaker.opened",
                tracing::Level::WARN,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                circuit_breaker.state = CircuitState::Open.as_str(),
                circuit_breaker.previous_state = previous.as_str(),
                circuit_breaker.open_delay = self.thresholds.open_delay.as_secs_f32(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report(OPENED_EVENT, CircuitState::Open);
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_half_opened(&self) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.circuit_breaker.half_opened",
                tracing::Level::INFO,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                circuit_breaker.state = CircuitState::HalfOpen.as_str(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report(HALF_OPENED_EVENT, CircuitState::HalfOpen);
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_closed(&self) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.circuit_breaker.closed",
                tracing::Level::INFO,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                circuit_breaker.state = CircuitState::Closed.as_str(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report(CLOSED_EVENT, CircuitState::Closed);
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_rejected(&self) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.circuit_breaker.rejected",
                tracing::Level::WARN,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                circuit_breaker.state = CircuitState::Open.as_str(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report(REJECTED_EVENT, CircuitState::Open);
    }

    #[cfg(any(feature = "metrics", test))]
    fn report(&self, event: &'static str, state: CircuitState) {
        self.telemetry
            .report_event(event, &[opentelemetry::KeyValue::new(crate::telemetry::CIRCUIT_STATE, state.as_str())]);
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures::FutureExt;
    use http::{Method, StatusCode};
    use layered::Execute;
    use opentelemetry::KeyValue;
    use tick::ClockControl;

    use super::*;
    use crate::testing::{LogCapture, MetricTester, request};
    use crate::{FaultKind, Layer, Response};

    const DELAY: Duration = Duration::from_secs(30);

    /// A transport whose status is switched by the test; `None` yields a fault.
    fn switchable(calls: &Arc<AtomicU32>, status: &Arc<Mutex<Option<StatusCode>>>) -> impl Service<Request, Out = Outcome> + use<> {
        let calls = Arc::clone(calls);
        let status = Arc::clone(status);

        Execute::new(move |_request: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            let outcome = match *status.lock().unwrap() {
                Some(status) => Ok(Response::new(status)),
                None => Err(Fault::transport(io::Error::from(io::ErrorKind::ConnectionRefused))),
            };
            async move { outcome }
        })
    }

    struct Fixture {
        control: ClockControl,
        calls: Arc<AtomicU32>,
        status: Arc<Mutex<Option<StatusCode>>>,
        transitions: Arc<Mutex<Vec<String>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                control: ClockControl::new(),
                calls: Arc::new(AtomicU32::new(0)),
                status: Arc::new(Mutex::new(None)),
                transitions: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn context(&self) -> PipelineContext {
            PipelineContext::new(self.control.to_clock()).name("test_pipeline")
        }

        fn layer(&self) -> CircuitBreakerLayer {
            let opened = Arc::clone(&self.transitions);
            let half_opened = Arc::clone(&self.transitions);
            let closed = Arc::clone(&self.transitions);

            CircuitBreaker::layer("breaker", &self.context())
                .delay(DELAY)
                .on_opened(move |args| opened.lock().unwrap().push(format!("opened from {}", args.previous())))
                .on_half_opened(move |args| half_opened.lock().unwrap().push(format!("half_opened after {:?}", args.open_duration())))
                .on_closed(move |args| closed.lock().unwrap().push(format!("closed after {}", args.trial_successes())))
        }

        fn transport(&self) -> impl Service<Request, Out = Outcome> + use<> {
            switchable(&self.calls, &self.status)
        }

        fn respond_with(&self, status: Option<StatusCode>) {
            *self.status.lock().unwrap() = status;
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn transitions(&self) -> Vec<String> {
            self.transitions.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn full_cycle() {
        let fixture = Fixture::new();
        let service = fixture.layer().layer(fixture.transport());

        for _ in 0..5 {
            let fault = service.execute(request(Method::GET)).await.unwrap_err();
            assert_eq!(fault.kind(), FaultKind::NonTransient);
        }
        assert_eq!(service.state(), CircuitState::Open);
        assert_eq!(fixture.transitions(), ["opened from closed"]);

        // Open: rejected without reaching the transport.
        let fault = service.execute(request(Method::GET)).await.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::CircuitOpen);
        assert_eq!(fixture.calls(), 5);

        fixture.control.advance(DELAY);
        fixture.respond_with(Some(StatusCode::OK));

        for _ in 0..3 {
            let response = service.execute(request(Method::GET)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(service.state(), CircuitState::Closed);
        assert_eq!(fixture.calls(), 8);
        assert_eq!(
            fixture.transitions(),
            ["opened from closed", "half_opened after 30s", "closed after 3"]
        );
    }

    #[tokio::test]
    async fn trial_failure_reopens() {
        let fixture = Fixture::new();
        let service = fixture.layer().layer(fixture.transport());

        for _ in 0..5 {
            let _ = service.execute(request(Method::GET)).await;
        }
        fixture.control.advance(DELAY);

        let fault = service.execute(request(Method::GET)).await.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::NonTransient);
        assert_eq!(service.state(), CircuitState::Open);

        // The cooldown restarted with the failed trial.
        fixture.control.advance(DELAY / 2);
        let fault = service.execute(request(Method::GET)).await.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::CircuitOpen);
        assert_eq!(fixture.calls(), 6);
        assert_eq!(
            fixture.transitions(),
            ["opened from closed", "half_opened after 30s", "opened from half_open"]
        );
    }

    #[tokio::test]
    async fn client_errors_do_not_open() {
        let fixture = Fixture::new();
        fixture.respond_with(Some(StatusCode::NOT_FOUND));
        let service = fixture.layer().layer(fixture.transport());

        for _ in 0..10 {
            let _ = service.execute(request(Method::GET)).await;
        }

        assert_eq!(service.state(), CircuitState::Closed);
        assert!(fixture.transitions().is_empty());
    }

    #[tokio::test]
    async fn failure_if_overrides_classification() {
        let fixture = Fixture::new();
        fixture.respond_with(Some(StatusCode::NOT_FOUND));
        let service = fixture
            .layer()
            .failure_threshold("2/2".parse().unwrap())
            .failure_if(|outcome| outcome.as_ref().is_ok_and(|r| r.status() == StatusCode::NOT_FOUND))
            .layer(fixture.transport());

        let _ = service.execute(request(Method::GET)).await;
        let _ = service.execute(request(Method::GET)).await;

        assert_eq!(service.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn cancelled_trial_does_not_block_half_open() {
        let fixture = Fixture::new();
        let layer = fixture.layer().failure_threshold("1/1".parse().unwrap()).success_threshold("1/1".parse().unwrap());
        let service = layer.layer(fixture.transport());
        let _ = service.execute(request(Method::GET)).await;
        fixture.control.advance(DELAY);

        let (sender, receiver) = futures::channel::oneshot::channel::<Outcome>();
        let receiver = Mutex::new(Some(receiver));
        let pending = layer.layer(Execute::new(move |_request: Request| {
            let receiver = receiver.lock().unwrap().take();
            async move {
                match receiver {
                    Some(receiver) => receiver.await.unwrap_or_else(|_| Err(Fault::new(FaultKind::NonTransient))),
                    None => Ok(Response::new(StatusCode::OK)),
                }
            }
        }));

        // The trial is admitted, then dropped while the transport is pending.
        assert!(pending.execute(request(Method::GET)).now_or_never().is_none());
        assert_eq!(pending.state(), CircuitState::HalfOpen);
        drop(sender);

        fixture.respond_with(Some(StatusCode::OK));
        let response = service.execute(request(Method::GET)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(service.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn reports_metrics() {
        let tester = MetricTester::new();
        let fixture = Fixture::new();
        let context = fixture.context().enable_metrics(tester.meter_provider());
        let service = CircuitBreaker::layer("breaker", &context)
            .failure_threshold("1/1".parse().unwrap())
            .layer(fixture.transport());

        let _ = service.execute(request(Method::GET)).await;
        let _ = service.execute(request(Method::GET)).await;

        tester.assert_attributes_contain(&[
            KeyValue::new("resilience.pipeline.name", "test_pipeline"),
            KeyValue::new("resilience.strategy.name", "breaker"),
            KeyValue::new("resilience.event.name", "circuit_opened"),
            KeyValue::new("resilience.event.name", "circuit_rejected"),
            KeyValue::new("resilience.circuit_breaker.state", "open"),
        ]);
    }

    #[tokio::test]
    async fn logs_transitions() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let fixture = Fixture::new();
        let context = fixture.context().enable_logs();
        let service = CircuitBreaker::layer("log_breaker", &context)
            .failure_threshold("1/1".parse().unwrap())
            .success_threshold("1/1".parse().unwrap())
            .layer(fixture.transport());

        let _ = service.execute(request(Method::GET)).await;
        let _ = service.execute(request(Method::GET)).await;
        fixture.control.advance(DELAY);
        fixture.respond_with(Some(StatusCode::OK));
        let _ = service.execute(request(Method::GET)).await;

        capture.assert_contains("airbag::circuit_breaker");
        capture.assert_contains("pipeline.name=test_pipeline");
        capture.assert_contains("strategy.name=log_breaker");
        capture.assert_contains("circuit_breaker.previous_state=\"closed\"");
        capture.assert_contains("circuit_breaker.state=\"half_open\"");
        capture.assert_contains("circuit_breaker.state=\"closed\"");
    }

    #[test]
    fn service_is_send_and_sync() {
        static_assertions::assert_impl_all!(CircuitBreaker<()>: Send, Sync, std::fmt::Debug);
    }
}
