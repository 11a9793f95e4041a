// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{OnClosedArgs, OnHalfOpenedArgs, OnOpenedArgs};
use crate::Outcome;

crate::define_fn_wrapper!(FailureIf(Fn(&Outcome) -> bool));
crate::define_fn_wrapper!(OnOpened(Fn(OnOpenedArgs)));
crate::define_fn_wrapper!(OnHalfOpened(Fn(OnHalfOpenedArgs)));
crate::define_fn_wrapper!(OnClosed(Fn(OnClosedArgs)));
