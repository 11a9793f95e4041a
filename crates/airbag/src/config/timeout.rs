// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;

use super::error::required_duration;
use super::merge::Merge;
use super::ConfigError;
use crate::timeout::{Timeout, TimeoutLayer};
use crate::PipelineContext;

/// Settings of the [timeout plugin][crate::timeout].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct TimeoutSettings {
    /// Adds the plugin to the pipeline. **Default**: `false`
    pub enabled: Option<bool>,
    /// Deadline for the whole call, retries and backups included. Required when enabled.
    pub global: Option<SignedDuration>,
}

impl TimeoutSettings {
    pub(super) fn merge(self, overrides: Self) -> Self {
        Self {
            enabled: self.enabled.merge(overrides.enabled),
            global: self.global.merge(overrides.global),
        }
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    fn global(&self) -> Result<Duration, ConfigError> {
        required_duration("timeouts", "global", self.global)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.global().map(drop)
    }

    pub(super) fn layer(&self, context: &PipelineContext) -> Result<TimeoutLayer, ConfigError> {
        let timeout = self.global()?;

        Ok(Timeout::layer("timeout", context).timeout(timeout))
    }
}
