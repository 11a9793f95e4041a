// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Classifies connection-level transport failures as transient.
//!
//! Transports report failures as [`FaultKind::NonTransient`][crate::FaultKind::NonTransient]
//! because they cannot tell which failures are worth retrying. This plugin inspects the cause
//! chain of such faults and reclassifies refused, reset and aborted connections, broken pipes,
//! I/O timeouts and unexpected end of stream as [`FaultKind::Transient`][crate::FaultKind::Transient],
//! so the [retry][crate::retry] plugin retries them and the [circuit breaker][crate::circuit_breaker]
//! counts them.
//!
//! Place it inside the retry and circuit breaker plugins, close to the transport.
//!
//! # Examples
//!
//! ```
//! use airbag::transient::TransientFaults;
//! use airbag::{Fault, PipelineContext, Request, Response};
//! use http::StatusCode;
//! use layered::{Execute, Layer};
//! use tick::Clock;
//!
//! # fn example(clock: Clock) {
//! let context = PipelineContext::new(&clock);
//!
//! let transient = TransientFaults::layer("transient", &context)
//!     .classify_with(|fault| fault.to_string().contains("GOAWAY"));
//!
//! let service = transient.layer(Execute::new(|_request: Request| async move {
//!     Ok::<_, Fault>(Response::new(StatusCode::OK))
//! }));
//! # let _ = service;
//! # }
//! ```

mod callbacks;
mod layer;
mod service;
mod telemetry;

pub(crate) use callbacks::ClassifyFault;
pub use layer::{TransientFaultsLayer, is_transient_io_fault};
pub(crate) use service::TransientFaultsShared;
pub use service::TransientFaults;
