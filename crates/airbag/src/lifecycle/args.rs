// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;

/// Arguments for the [`on_release`][super::BodyLifecycleLayer::on_release] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnReleaseArgs<'a> {
    pub(super) result: &'a io::Result<()>,
}

impl OnReleaseArgs<'_> {
    /// The result of returning the connection to its pool.
    #[must_use]
    pub fn result(&self) -> &io::Result<()> {
        self.result
    }
}

/// Arguments for the [`on_abort`][super::BodyLifecycleLayer::on_abort] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnAbortArgs<'a> {
    pub(super) result: &'a io::Result<()>,
}

impl OnAbortArgs<'_> {
    /// The result of discarding the connection.
    #[must_use]
    pub fn result(&self) -> &io::Result<()> {
        self.result
    }
}
