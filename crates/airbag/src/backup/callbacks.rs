// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::OnBackupArgs;

crate::define_fn_wrapper!(OnBackup(Fn(&crate::Request, OnBackupArgs)));
