// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Retries requests whose outcome is classified as retryable.
//!
//! The plugin executes the request, classifies the [`Outcome`][crate::Outcome] and, when the
//! classification is [`RecoveryKind::Retry`][crate::RecoveryKind::Retry], waits and executes the
//! very same request again. By default, transient and timeout faults are retried, as are
//! `429`, `502`, `503` and `504` responses.
//!
//! # Delays
//!
//! The delay before a retry is the first of:
//!
//! 1. the `Retry-After` header of a response outcome, parsed with
//!    [`DelayParser::parse_retry_after`][crate::DelayParser::parse_retry_after]. A hint that
//!    already elapsed is ignored.
//! 2. the delay attached to the [`RecoveryInfo`][crate::RecoveryInfo] returned by the classification.
//! 3. the configured [`Backoff`] for the attempt.
//!
//! The configured [`Jitter`] is then applied. Delays are scheduled on the pipeline clock and never
//! block a thread. Dropping the call cancels a pending delay.
//!
//! # Budgets
//!
//! Retries stop when [`max_retries`][RetryLayer::max_retries] is reached or when the elapsed time
//! plus the next delay would exceed [`max_duration`][RetryLayer::max_duration]. A fault that is
//! still retryable at that point is returned as
//! [`FaultKind::RetryExhausted`][crate::FaultKind::RetryExhausted] caused by the last fault; a
//! retryable response is returned unchanged.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use airbag::retry::{Backoff, Retry};
//! use airbag::{Fault, Outcome, PipelineContext, RecoveryInfo, Request, Response, Service};
//! use http::{Method, StatusCode};
//! use layered::{Execute, Layer};
//! use tick::Clock;
//!
//! # async fn example(clock: Clock) {
//! let context = PipelineContext::new(&clock);
//!
//! let retry = Retry::layer("retry", &context)
//!     .max_retries(2)
//!     .backoff(Backoff::fixed(Duration::from_millis(100)))
//!     .recovery_with(|outcome, _args| match outcome {
//!         Ok(response) if response.status() == StatusCode::CONFLICT => RecoveryInfo::retry(),
//!         other => airbag::Recovery::recovery(other),
//!     })
//!     .on_retry(|_outcome, args| println!("retrying after {:?}", args.retry_delay()));
//!
//! let service = retry.layer(Execute::new(|_request: Request| async move {
//!     Ok::<_, Fault>(Response::new(StatusCode::OK))
//! }));
//!
//! let outcome: Outcome = service
//!     .execute(Request::new(Method::GET, "http://localhost/".parse().unwrap()))
//!     .await;
//! # let _ = outcome;
//! # }
//! ```

mod args;
mod backoff;
mod callbacks;
mod constants;
mod layer;
mod service;
mod telemetry;

pub use args::{OnRetryArgs, RecoveryArgs};
pub(crate) use constants::{DEFAULT_BACKOFF_DELAY, DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKOFF_MAX_DELAY};
pub use backoff::{Backoff, Jitter};
pub(crate) use callbacks::{OnRetry, ShouldRecover};
pub use layer::RetryLayer;
pub(crate) use service::RetryShared;
pub use service::Retry;
