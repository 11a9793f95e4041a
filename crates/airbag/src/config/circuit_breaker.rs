// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;

use super::error::required_duration;
use super::merge::Merge;
use super::ConfigError;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerLayer, Ratio};
use crate::PipelineContext;

/// Settings of the [circuit breaker plugin][crate::circuit_breaker].
///
/// Thresholds are written as `"3/5"` or `"3 out of 5"`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct CircuitBreakerSettings {
    /// Adds the plugin to the pipeline. **Default**: `false`
    pub enabled: Option<bool>,
    /// Failures among the most recent calls that open the circuit. **Default**: 5/5
    pub failure_threshold: Option<Ratio>,
    /// Time spent open before trial calls are admitted. Required when enabled.
    pub delay: Option<SignedDuration>,
    /// Successful trial calls that close the circuit. **Default**: 3/5
    pub success_threshold: Option<Ratio>,
}

impl CircuitBreakerSettings {
    pub(super) fn merge(self, overrides: Self) -> Self {
        Self {
            enabled: self.enabled.merge(overrides.enabled),
            failure_threshold: self.failure_threshold.merge(overrides.failure_threshold),
            delay: self.delay.merge(overrides.delay),
            success_threshold: self.success_threshold.merge(overrides.success_threshold),
        }
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    fn delay(&self) -> Result<Duration, ConfigError> {
        required_duration("circuit_breaker", "delay", self.delay)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.delay().map(drop)
    }

    pub(super) fn layer(&self, context: &PipelineContext) -> Result<CircuitBreakerLayer, ConfigError> {
        let mut layer = CircuitBreaker::layer("circuit_breaker", context).delay(self.delay()?);

        if let Some(threshold) = self.failure_threshold {
            layer = layer.failure_threshold(threshold);
        }

        if let Some(threshold) = self.success_threshold {
            layer = layer.success_threshold(threshold);
        }

        Ok(layer)
    }
}
