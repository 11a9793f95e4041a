// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Reported when the deadline elapsed and the execution was cancelled.
pub(super) const TIMEOUT_EVENT: &str = "timeout";
