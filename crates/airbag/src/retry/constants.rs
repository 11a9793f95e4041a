// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Retries in addition to the original attempt.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;

/// First delay of the default exponential backoff.
pub(crate) const DEFAULT_BACKOFF_DELAY: Duration = Duration::from_millis(50);

/// Upper bound of the default exponential backoff.
pub(crate) const DEFAULT_BACKOFF_MAX_DELAY: Duration = Duration::from_secs(2);

/// Growth factor of the default exponential backoff.
pub(crate) const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
