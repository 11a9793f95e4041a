// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;

use super::error::to_duration;
use super::merge::Merge;
use super::ConfigError;
use crate::retry::{Backoff, DEFAULT_BACKOFF_DELAY, DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKOFF_MAX_DELAY, Jitter, Retry, RetryLayer};
use crate::PipelineContext;

const SECTION: &str = "retry";

/// Settings of the [retry plugin][crate::retry].
///
/// Either `fixed_delay` or an enabled `backoff` may be set, not both. Without either, the
/// default exponential backoff is used. Likewise only one of `jitter_factor` and `jitter` may
/// be set.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct RetrySettings {
    /// Adds the plugin to the pipeline. **Default**: `false`
    pub enabled: Option<bool>,
    /// The same delay before every retry.
    pub fixed_delay: Option<SignedDuration>,
    /// Exponentially growing delays.
    pub backoff: BackoffSettings,
    /// Retries in addition to the original attempt. **Default**: 3
    pub max_retries: Option<u32>,
    /// Upper bound for the time spent retrying. **Default**: no limit
    pub max_duration: Option<SignedDuration>,
    /// Scales every delay by a random value in `[1 - factor, 1 + factor]`, with `factor` in `0..=1`.
    pub jitter_factor: Option<f64>,
    /// Adds a random value in `[-jitter, +jitter]` to every delay.
    pub jitter: Option<SignedDuration>,
}

/// Exponential backoff of [`RetrySettings`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct BackoffSettings {
    /// Uses exponential backoff. **Default**: `false`
    pub enabled: Option<bool>,
    /// Delay before the first retry. **Default**: 50ms
    pub delay: Option<SignedDuration>,
    /// Upper bound for any delay. **Default**: 2s
    pub max_delay: Option<SignedDuration>,
    /// Growth factor per retry, at least 1. **Default**: 2
    pub delay_factor: Option<f64>,
}

impl RetrySettings {
    pub(super) fn merge(self, overrides: Self) -> Self {
        Self {
            enabled: self.enabled.merge(overrides.enabled),
            fixed_delay: self.fixed_delay.merge(overrides.fixed_delay),
            backoff: self.backoff.merge(overrides.backoff),
            max_retries: self.max_retries.merge(overrides.max_retries),
            max_duration: self.max_duration.merge(overrides.max_duration),
            jitter_factor: self.jitter_factor.merge(overrides.jitter_factor),
            jitter: self.jitter.merge(overrides.jitter),
        }
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub(super) fn backoff(&self) -> Result<Backoff, ConfigError> {
        match (self.fixed_delay, self.backoff.is_enabled()) {
            (Some(_), true) => Err(ConfigError::new(SECTION, "fixed_delay and backoff cannot be used together")),
            (Some(delay), false) => Ok(Backoff::fixed(to_duration(SECTION, "fixed_delay", delay)?)),
            (None, true) => self.backoff.to_backoff(),
            (None, false) => Ok(Backoff::default()),
        }
    }

    pub(super) fn jitter(&self) -> Result<Jitter, ConfigError> {
        match (self.jitter_factor, self.jitter) {
            (Some(_), Some(_)) => Err(ConfigError::new(SECTION, "jitter_factor and jitter cannot be used together")),
            (Some(factor), None) if !(0.0..=1.0).contains(&factor) => Err(ConfigError::new(
                SECTION,
                format!("jitter_factor must be between 0 and 1, got {factor}"),
            )),
            (Some(factor), None) => Ok(Jitter::Factor(factor)),
            (None, Some(jitter)) => Ok(Jitter::Duration(to_duration(SECTION, "jitter", jitter)?)),
            (None, None) => Ok(Jitter::None),
        }
    }

    fn max_duration(&self) -> Result<Option<Duration>, ConfigError> {
        self.max_duration.map(|d| to_duration(SECTION, "max_duration", d)).transpose()
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.backoff()?;
        self.jitter()?;
        self.max_duration()?;
        Ok(())
    }

    pub(super) fn layer(&self, context: &PipelineContext) -> Result<RetryLayer, ConfigError> {
        let mut layer = Retry::layer("retry", context).backoff(self.backoff()?).jitter(self.jitter()?);

        if let Some(max_retries) = self.max_retries {
            layer = layer.max_retries(max_retries);
        }

        if let Some(max_duration) = self.max_duration()? {
            layer = layer.max_duration(max_duration);
        }

        Ok(layer)
    }
}

impl BackoffSettings {
    fn merge(self, overrides: Self) -> Self {
        Self {
            enabled: self.enabled.merge(overrides.enabled),
            delay: self.delay.merge(overrides.delay),
            max_delay: self.max_delay.merge(overrides.max_delay),
            delay_factor: self.delay_factor.merge(overrides.delay_factor),
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    fn to_backoff(&self) -> Result<Backoff, ConfigError> {
        let delay = self
            .delay
            .map_or(Ok(DEFAULT_BACKOFF_DELAY), |d| to_duration(SECTION, "backoff.delay", d))?;
        let max_delay = self
            .max_delay
            .map_or(Ok(DEFAULT_BACKOFF_MAX_DELAY), |d| to_duration(SECTION, "backoff.max_delay", d))?;
        let factor = self.delay_factor.unwrap_or(DEFAULT_BACKOFF_FACTOR);

        if !factor.is_finite() || factor < 1.0 {
            return Err(ConfigError::new(
                SECTION,
                format!("backoff.delay_factor must be at least 1, got {factor}"),
            ));
        }

        Ok(Backoff::exponential(delay, max_delay, factor))
    }
}
