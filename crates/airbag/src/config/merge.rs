// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Field-wise combination of settings where `overrides` wins.
pub(super) trait Merge {
    fn merge(self, overrides: Self) -> Self;
}

impl<T> Merge for Option<T> {
    fn merge(self, overrides: Self) -> Self {
        overrides.or(self)
    }
}
