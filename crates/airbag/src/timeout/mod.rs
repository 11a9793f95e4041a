// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Enforces a deadline on each call.
//!
//! The wrapped execution races a delay on the pipeline clock. When the delay completes first, the
//! execution is dropped, which cancels any in-flight transport operation and aborts the
//! connection of any response it owned, and the call yields a
//! [`FaultKind::Timeout`][crate::FaultKind::Timeout] fault. When the execution completes first,
//! the delay is dropped and its timer unregistered.
//!
//! Timeout faults are retryable by default. Placed outside the [retry][crate::retry] plugin, the
//! deadline bounds the whole call including retries; placed inside, it bounds each attempt.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use airbag::timeout::Timeout;
//! use airbag::{Fault, PipelineContext, Request, Response};
//! use http::StatusCode;
//! use layered::{Execute, Layer};
//! use tick::Clock;
//!
//! # fn example(clock: Clock) {
//! let context = PipelineContext::new(&clock);
//!
//! let timeout = Timeout::layer("timeout", &context)
//!     .timeout(Duration::from_secs(5))
//!     .on_timeout(|args| println!("gave up after {:?}", args.timeout()));
//!
//! let service = timeout.layer(Execute::new(|_request: Request| async move {
//!     Ok::<_, Fault>(Response::new(StatusCode::OK))
//! }));
//! # let _ = service;
//! # }
//! ```

mod args;
mod callbacks;
mod layer;
mod service;
mod telemetry;

pub use args::OnTimeoutArgs;
pub(crate) use callbacks::OnTimeout;
pub use layer::TimeoutLayer;
pub(crate) use service::TimeoutShared;
pub use service::Timeout;
