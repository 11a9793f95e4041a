// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{OnAbortArgs, OnReleaseArgs};

crate::define_fn_wrapper!(OnRelease(Fn(OnReleaseArgs<'_>)));
crate::define_fn_wrapper!(OnAbort(Fn(OnAbortArgs<'_>)));
