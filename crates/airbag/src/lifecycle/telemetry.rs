// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub(super) const RELEASED_EVENT: &str = "connection_released";

pub(super) const ABORTED_EVENT: &str = "connection_aborted";

/// Whether releasing or aborting the connection succeeded.
pub(super) const SUCCEEDED: &str = "resilience.connection.succeeded";
