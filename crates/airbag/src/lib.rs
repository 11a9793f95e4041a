// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Resilience pipeline for HTTP clients.
//!
//! `airbag` wraps a single logical HTTP request execution with composable resilience
//! behaviors: retries with backoff and jitter, circuit breaking, speculative backup requests,
//! deadline enforcement and safe handling of pooled connections once a response body is closed.
//!
//! The pipeline makes no assumption about the transport. Anything that implements
//! [`Service<Request, Out = Outcome>`][Service] can sit at the bottom of the pipeline, typically
//! a small adapter over an actual HTTP client built with [`layered::Execute`].
//!
//! # Core Types
//!
//! - [`Request`]: an immutable, cheaply cloneable request.
//! - [`Response`]: status, headers and a lifecycle-managed [`ResponseBody`].
//! - [`Outcome`]: the unit flowing through the pipeline, `Result<Response, Fault>`.
//! - [`Fault`] and [`FaultKind`]: classified failures that identify which policy produced them.
//! - [`Plugin`]: a middleware that wraps an [`Execution`] into a new one.
//! - [`Pipeline`]: the composition root callers execute requests against.
//!
//! # Quick Start
//!
//! ```rust
//! # use std::time::Duration;
//! # use std::sync::Arc;
//! # use tick::Clock;
//! use airbag::retry::Retry;
//! use airbag::timeout::Timeout;
//! use airbag::{Pipeline, PipelineContext, Plugin, Request, Response, Outcome};
//! use layered::Execute;
//! use http::{Method, StatusCode};
//!
//! # async fn example(clock: Clock) {
//! let context = PipelineContext::new(&clock).name("orders");
//!
//! let plugins: Vec<Arc<dyn Plugin>> = vec![
//!     Arc::new(Timeout::layer("timeout", &context).timeout(Duration::from_secs(3))),
//!     Arc::new(Retry::layer("retry", &context).max_retries(2)),
//! ];
//!
//! let transport = Execute::new(|_request: Request| async move {
//!     Ok::<_, airbag::Fault>(Response::new(StatusCode::OK))
//! });
//!
//! let pipeline = Pipeline::new(transport, plugins);
//! let outcome: Outcome = pipeline
//!     .execute(Request::new(Method::GET, "https://example.com/orders".parse().unwrap()))
//!     .await;
//! # let _ = outcome;
//! # }
//! ```
//!
//! # Built-in Plugins
//!
//! The plugins are listed in the order [`Pipeline::from_settings`] composes them, outermost first:
//!
//! - [`timeout`]: cancels calls that exceed a deadline.
//! - [`backup`]: issues a speculative duplicate of slow idempotent requests.
//! - [`retry`]: re-attempts retryable outcomes with backoff, jitter and budgets.
//! - [`circuit_breaker`]: fails fast while the downstream is unhealthy.
//! - [`transient`]: classifies connection-level transport failures as transient.
//! - [`lifecycle`]: observes release and abort of response connections.
//!
//! # Features
//!
//! - `logs`: emits `tracing` events for resilience events, see [`PipelineContext::enable_logs`].
//! - `metrics`: reports the `resilience.event` OpenTelemetry counter, see
//!   [`PipelineContext::enable_metrics`].
//! - `serde`: enables deserialization of [`config::Settings`].

#[doc(inline)]
pub use recoverable::{Recovery, RecoveryInfo, RecoveryKind};

mod attempt;
pub use attempt::Attempt;
pub(crate) use attempt::MaxAttempts;

mod context;
pub use context::PipelineContext;

mod delay_parser;
pub use delay_parser::{DelayParser, EPOCH_SECONDS_THRESHOLD, parse_delay, resolve_delay};

mod fault;
pub use fault::{Fault, FaultKind, Outcome};

mod request;
pub use request::Request;

mod response;
pub use response::Response;

pub mod body;
pub use body::ResponseBody;

mod plugin;
pub use plugin::{CompositePlugin, Execution, IdentityPlugin, Plugin, compose};

mod pipeline;
pub use pipeline::Pipeline;

pub mod backup;
pub mod circuit_breaker;
pub mod config;
pub mod lifecycle;
pub mod retry;
pub mod telemetry;
pub mod timeout;
pub mod transient;

mod utils;
pub(crate) use utils::define_fn_wrapper;

mod rnd;

#[cfg(any(feature = "metrics", test))]
mod metrics;

/// A flag indicating that the required property is set.
#[non_exhaustive]
#[derive(Debug)]
#[doc(hidden)]
pub struct Set;

/// A flag indicating that the required property has not been set.
#[non_exhaustive]
#[derive(Debug)]
#[doc(hidden)]
pub struct NotSet;

#[doc(inline)]
pub use layered::{Layer, Service};

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
pub(crate) mod testing;
