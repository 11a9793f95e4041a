// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Arguments for the [`on_backup`][super::BackupRequestLayer::on_backup] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnBackupArgs {
    pub(super) delay: Duration,
}

impl OnBackupArgs {
    /// How long the primary request was outstanding when the backup started.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
