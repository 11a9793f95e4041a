// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod define_fn_wrapper;
pub(crate) use define_fn_wrapper::define_fn_wrapper;

mod telemetry_helper;
pub(crate) use telemetry_helper::TelemetryHelper;

use crate::Request;

define_fn_wrapper!(EnableIf(Fn(&Request) -> bool));

impl EnableIf {
    pub(crate) fn always() -> Self {
        Self::new(|_| true)
    }

    pub(crate) fn idempotent() -> Self {
        Self::new(Request::is_idempotent)
    }
}
