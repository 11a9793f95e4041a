// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the circuit breaker plugin using only the public API.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use airbag::circuit_breaker::{CircuitBreaker, CircuitState, Ratio};
use airbag::{Fault, FaultKind, Outcome, PipelineContext, Request, Response};
use http::{Method, StatusCode, Uri};
use layered::{Execute, Layer, Service};
use tick::ClockControl;

fn request() -> Request {
    Request::new(Method::GET, Uri::from_static("http://localhost/inventory"))
}

/// Responds with `500` while `healthy` is `false`, `200` otherwise.
fn transport(healthy: &Arc<AtomicBool>, calls: &Arc<AtomicU32>) -> impl Service<Request, Out = Outcome> + use<> {
    let healthy = Arc::clone(healthy);
    let calls = Arc::clone(calls);

    Execute::new(move |_request: Request| {
        calls.fetch_add(1, Ordering::SeqCst);
        let status = if healthy.load(Ordering::SeqCst) {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        async move { Ok::<_, Fault>(Response::new(status)) }
    })
}

#[tokio::test]
async fn opens_rejects_and_recovers() {
    let control = ClockControl::new();
    let context = PipelineContext::new(control.to_clock()).name("test_pipeline");
    let healthy = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicU32::new(0));
    let events = Arc::new(Mutex::new(Vec::new()));
    let (opened, half_opened, closed) = (Arc::clone(&events), Arc::clone(&events), Arc::clone(&events));

    let layer = CircuitBreaker::layer("breaker", &context)
        .failure_threshold("2 out of 2".parse().unwrap())
        .delay(Duration::from_secs(5))
        .success_threshold(Ratio::new(1, 1).unwrap())
        .on_opened(move |_| opened.lock().unwrap().push("opened"))
        .on_half_opened(move |_| half_opened.lock().unwrap().push("half_opened"))
        .on_closed(move |_| closed.lock().unwrap().push("closed"));
    let service = layer.layer(transport(&healthy, &calls));

    for _ in 0..2 {
        let response = service.execute(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
    assert_eq!(layer.state(), CircuitState::Open);

    let fault = service.execute(request()).await.unwrap_err();
    assert_eq!(fault.kind(), FaultKind::CircuitOpen);
    assert!(fault.is_circuit_open());
    assert_eq!(calls.load(Ordering::SeqCst), 2, "rejected calls never reach the transport");

    control.advance(Duration::from_secs(5));
    healthy.store(true, Ordering::SeqCst);

    let response = service.execute(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(layer.state(), CircuitState::Closed);
    assert_eq!(*events.lock().unwrap(), ["opened", "half_opened", "closed"]);
}

#[tokio::test]
async fn failed_trial_restarts_the_cooldown() {
    let control = ClockControl::new();
    let context = PipelineContext::new(control.to_clock());
    let healthy = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicU32::new(0));

    let layer = CircuitBreaker::layer("breaker", &context)
        .failure_threshold(Ratio::new(1, 1).unwrap())
        .delay(Duration::from_secs(10));
    let service = layer.layer(transport(&healthy, &calls));

    let _ = service.execute(request()).await;
    assert_eq!(layer.state(), CircuitState::Open);

    control.advance(Duration::from_secs(10));
    let _ = service.execute(request()).await;
    assert_eq!(layer.state(), CircuitState::Open, "the trial failed");

    control.advance(Duration::from_secs(9));
    let fault = service.execute(request()).await.unwrap_err();
    assert_eq!(fault.kind(), FaultKind::CircuitOpen, "the cooldown restarted with the failed trial");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn services_of_one_layer_share_the_circuit() {
    let control = ClockControl::new();
    let context = PipelineContext::new(control.to_clock());
    let healthy = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicU32::new(0));

    let layer = CircuitBreaker::layer("breaker", &context).failure_threshold(Ratio::new(1, 1).unwrap());
    let first = layer.layer(transport(&healthy, &calls));
    let second = layer.layer(transport(&healthy, &calls));

    let _ = first.execute(request()).await;
    let fault = second.execute(request()).await.unwrap_err();

    assert_eq!(fault.kind(), FaultKind::CircuitOpen);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn ratio_parsing() {
    assert_eq!("3/5".parse::<Ratio>().unwrap(), Ratio::new(3, 5).unwrap());
    assert_eq!(" 3 out of 5 ".parse::<Ratio>().unwrap(), Ratio::new(3, 5).unwrap());
    assert!("0/5".parse::<Ratio>().is_err());
    assert!("three/five".parse::<Ratio>().is_err());
}
