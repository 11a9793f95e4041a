// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{OnRetryArgs, RecoveryArgs};
use crate::{Outcome, RecoveryInfo};

crate::define_fn_wrapper!(ShouldRecover(Fn(&Outcome, RecoveryArgs<'_>) -> RecoveryInfo));
crate::define_fn_wrapper!(OnRetry(Fn(&Outcome, OnRetryArgs)));
