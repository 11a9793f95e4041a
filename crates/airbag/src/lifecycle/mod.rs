// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Observes the end of response connections.
//!
//! Every [`ResponseBody`][crate::ResponseBody] ends its connection exactly once: it is released
//! back to the pool after the body was read to the end, and aborted otherwise. This plugin
//! reports which of the two happened, and whether it succeeded, through telemetry and the
//! [`on_release`][BodyLifecycleLayer::on_release] and [`on_abort`][BodyLifecycleLayer::on_abort]
//! callbacks. A high abort rate usually means callers drop responses without reading them.
//!
//! # Examples
//!
//! ```
//! use airbag::lifecycle::BodyLifecycle;
//! use airbag::PipelineContext;
//! use tick::Clock;
//!
//! # fn example(clock: Clock) {
//! let context = PipelineContext::new(&clock);
//!
//! let lifecycle = BodyLifecycle::layer("lifecycle", &context)
//!     .on_abort(|args| println!("connection aborted: {:?}", args.result()));
//! # let _ = lifecycle;
//! # }
//! ```

mod args;
mod callbacks;
mod layer;
mod service;
mod telemetry;

pub use args::{OnAbortArgs, OnReleaseArgs};
pub(crate) use callbacks::{OnAbort, OnRelease};
pub use layer::BodyLifecycleLayer;
pub(crate) use service::BodyLifecycleShared;
pub use service::BodyLifecycle;
