// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Stops calling a downstream that keeps failing.
//!
//! A circuit breaker observes the outcome of every call and moves between three states:
//!
//! - **Closed**: calls flow through. Once the rolling window of the last `n` outcomes is full
//!   and at least `k` of them failed ([`failure_threshold`][CircuitBreakerLayer::failure_threshold]
//!   of `k/n`), the circuit opens.
//! - **Open**: calls fail immediately with [`FaultKind::CircuitOpen`][crate::FaultKind::CircuitOpen]
//!   without invoking the downstream. The first call after [`delay`][CircuitBreakerLayer::delay]
//!   moves the circuit to half-open.
//! - **Half-open**: up to `m` trial calls are admitted
//!   ([`success_threshold`][CircuitBreakerLayer::success_threshold] of `j/m`), others are rejected.
//!   `j` successful trials close the circuit; a single failed trial reopens it and restarts the delay.
//!
//! Counters reset on every transition. A call dropped before it completed, for example by the
//! [timeout][crate::timeout] plugin, is not recorded.
//!
//! The breaker state lives in the [`CircuitBreakerLayer`] and is shared by every service built
//! from it, so place one layer per downstream in a pipeline and reuse it.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use airbag::circuit_breaker::{CircuitBreaker, Ratio};
//! use airbag::{Fault, PipelineContext, Request, Response};
//! use http::StatusCode;
//! use layered::{Execute, Layer};
//! use tick::Clock;
//!
//! # fn example(clock: Clock) {
//! let context = PipelineContext::new(&clock);
//!
//! let breaker = CircuitBreaker::layer("breaker", &context)
//!     .failure_threshold(Ratio::new(5, 10).unwrap())
//!     .delay(Duration::from_secs(15))
//!     .success_threshold("2 out of 3".parse().unwrap())
//!     .failure_if(|outcome| match outcome {
//!         Ok(response) => response.status() == StatusCode::TOO_MANY_REQUESTS || response.status().is_server_error(),
//!         Err(_) => true,
//!     });
//!
//! let service = breaker.layer(Execute::new(|_request: Request| async move {
//!     Ok::<_, Fault>(Response::new(StatusCode::OK))
//! }));
//! # let _ = service;
//! # }
//! ```

mod args;
mod callbacks;
mod constants;
mod engine;
mod layer;
mod ratio;
mod service;
mod telemetry;

pub use args::{OnClosedArgs, OnHalfOpenedArgs, OnOpenedArgs};
pub(crate) use callbacks::{FailureIf, OnClosed, OnHalfOpened, OnOpened};
pub use engine::CircuitState;
pub use layer::CircuitBreakerLayer;
pub use ratio::{Ratio, RatioError};
pub(crate) use service::CircuitBreakerShared;
pub use service::CircuitBreaker;
