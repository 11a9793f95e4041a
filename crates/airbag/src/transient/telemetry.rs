// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Reported when a transport fault is reclassified as transient.
pub(super) const TRANSIENT_FAULT_EVENT: &str = "transient_fault";
