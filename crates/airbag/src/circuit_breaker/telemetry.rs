// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub(super) const OPENED_EVENT: &str = "circuit_opened";

pub(super) const HALF_OPENED_EVENT: &str = "circuit_half_opened";

pub(super) const CLOSED_EVENT: &str = "circuit_closed";

/// Reported for each call rejected without invoking the downstream.
pub(super) const REJECTED_EVENT: &str = "circuit_rejected";
