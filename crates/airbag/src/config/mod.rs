// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Settings records for building pipelines from configuration.
//!
//! [`Settings`] holds the defaults of all clients plus per-client overrides.
//! [`Settings::resolve`] yields the effective [`ClientSettings`] of one client, and
//! [`Pipeline::from_settings`][crate::Pipeline::from_settings] turns them into a pipeline with
//! the plugins in their conventional order.
//!
//! With the `serde` feature, all records deserialize from `snake_case` keys. Durations use the
//! [`jiff::SignedDuration`] format, for example `"PT2S"`, and circuit breaker thresholds are
//! written as `"3/5"` or `"3 out of 5"`.
//!
//! ```json
//! {
//!   "defaults": {
//!     "retry": { "enabled": true, "max_retries": 2, "backoff": { "enabled": true, "delay": "PT0.1S" } },
//!     "timeouts": { "enabled": true, "global": "PT5S" }
//!   },
//!   "clients": {
//!     "inventory": {
//!       "circuit_breaker": { "enabled": true, "failure_threshold": "3 out of 5", "delay": "PT30S" }
//!     }
//!   }
//! }
//! ```

mod backup;
mod circuit_breaker;
mod error;
mod merge;
mod retry;
mod settings;
mod timeout;
mod transient;

pub use backup::BackupRequestSettings;
pub use circuit_breaker::CircuitBreakerSettings;
pub use error::ConfigError;
pub use retry::{BackoffSettings, RetrySettings};
pub use settings::{ClientSettings, Settings};
pub use timeout::TimeoutSettings;
pub use transient::TransientFaultSettings;
