// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;

use super::error::required_duration;
use super::merge::Merge;
use super::ConfigError;
use crate::backup::{BackupRequest, BackupRequestLayer};
use crate::PipelineContext;

/// Settings of the [backup request plugin][crate::backup].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct BackupRequestSettings {
    /// Adds the plugin to the pipeline. **Default**: `false`
    pub enabled: Option<bool>,
    /// Time after which the backup starts. Required when enabled.
    pub delay: Option<SignedDuration>,
}

impl BackupRequestSettings {
    pub(super) fn merge(self, overrides: Self) -> Self {
        Self {
            enabled: self.enabled.merge(overrides.enabled),
            delay: self.delay.merge(overrides.delay),
        }
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    fn delay(&self) -> Result<Duration, ConfigError> {
        required_duration("backup_request", "delay", self.delay)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.delay().map(drop)
    }

    pub(super) fn layer(&self, context: &PipelineContext) -> Result<BackupRequestLayer, ConfigError> {
        let delay = self.delay()?;

        Ok(BackupRequest::layer("backup_request", context).delay(delay))
    }
}
