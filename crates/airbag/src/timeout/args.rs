// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Arguments for the [`on_timeout`][super::TimeoutLayer::on_timeout] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnTimeoutArgs {
    pub(super) timeout: Duration,
}

impl OnTimeoutArgs {
    /// The deadline that elapsed.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
