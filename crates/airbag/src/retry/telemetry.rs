// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Reported before each retry.
pub(super) const RETRY_EVENT: &str = "retry";

/// Reported when an attempt was retryable but the retry budget was spent.
pub(super) const RETRY_EXHAUSTED_EVENT: &str = "retry_exhausted";
