// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::OnTimeoutArgs;

crate::define_fn_wrapper!(OnTimeout(Fn(OnTimeoutArgs)));
