// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cuts tail latency with a speculative second request.
//!
//! The primary request starts immediately. If it has not completed after the configured
//! [`delay`][BackupRequestLayer::delay], an identical backup request starts and both race.
//! The first to complete wins; the other is dropped, which cancels its transport call and aborts
//! the connection of any response it already owned.
//!
//! Executing a request twice is only safe for idempotent requests, so by default backups are
//! limited to requests for which [`Request::is_idempotent`][crate::Request::is_idempotent] holds.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use airbag::backup::BackupRequest;
//! use airbag::{Fault, PipelineContext, Request, Response};
//! use http::StatusCode;
//! use layered::{Execute, Layer};
//! use tick::Clock;
//!
//! # fn example(clock: Clock) {
//! let context = PipelineContext::new(&clock);
//!
//! let backup = BackupRequest::layer("backup", &context)
//!     .delay(Duration::from_millis(400))
//!     .on_backup(|request, _args| println!("backup for {}", request.uri()));
//!
//! let service = backup.layer(Execute::new(|_request: Request| async move {
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

pub use args::OnBackupArgs;
pub(crate) use callbacks::OnBackup;
pub use layer::BackupRequestLayer;
pub(crate) use service::BackupRequestShared;
pub use service::BackupRequest;
