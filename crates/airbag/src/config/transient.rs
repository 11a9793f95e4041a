// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::merge::Merge;

/// Settings of the [transient fault plugin][crate::transient].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct TransientFaultSettings {
    /// Adds the plugin to the pipeline. **Default**: `false`
    pub enabled: Option<bool>,
}

impl TransientFaultSettings {
    pub(super) fn merge(self, overrides: Self) -> Self {
        Self {
            enabled: self.enabled.merge(overrides.enabled),
        }
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}
