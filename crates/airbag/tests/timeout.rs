// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the timeout plugin using only the public API.

use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use airbag::timeout::Timeout;
use airbag::{Fault, FaultKind, PipelineContext, Request, Response};
use http::{Method, StatusCode, Uri};
use layered::{Execute, Layer, Service};
use tick::ClockControl;

fn request() -> Request {
    Request::new(Method::GET, Uri::from_static("http://localhost/payments"))
}

#[tokio::test]
async fn hanging_transport_times_out() {
    let clock = ClockControl::default().auto_advance_timers(true).to_clock();
    let context = PipelineContext::new(&clock);
    let timeouts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&timeouts);

    let service = Timeout::layer("timeout", &context)
        .timeout(Duration::from_secs(2))
        .on_timeout(move |args| {
            assert_eq!(args.timeout(), Duration::from_secs(2));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .layer(Execute::new(|_request: Request| async {
            pending::<()>().await;
            Ok::<_, Fault>(Response::new(StatusCode::OK))
        }));

    let fault = service.execute(request()).await.unwrap_err();

    assert_eq!(fault.kind(), FaultKind::Timeout);
    assert_eq!(timeouts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fast_transport_completes() {
    let clock = ClockControl::default().auto_advance_timers(true).to_clock();
    let context = PipelineContext::new(&clock);

    let service = Timeout::layer("timeout", &context)
        .timeout(Duration::from_secs(2))
        .on_timeout(|_| panic!("no timeout expected"))
        .layer(Execute::new(|_request: Request| async { Ok::<_, Fault>(Response::new(StatusCode::OK)) }));

    let response = service.execute(request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn transport_faults_are_not_rewritten() {
    let clock = ClockControl::default().auto_advance_timers(true).to_clock();
    let context = PipelineContext::new(&clock);

    let service = Timeout::layer("timeout", &context)
        .timeout(Duration::from_secs(2))
        .layer(Execute::new(|_request: Request| async { Err::<Response, _>(Fault::transient("reset")) }));

    let fault = service.execute(request()).await.unwrap_err();

    assert_eq!(fault.kind(), FaultKind::Transient);
}
