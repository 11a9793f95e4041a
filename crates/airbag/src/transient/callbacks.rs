// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Fault;

crate::define_fn_wrapper!(ClassifyFault(Fn(&Fault) -> bool));
