// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{BackupRequestSettings, CircuitBreakerSettings, ConfigError, RetrySettings, TimeoutSettings, TransientFaultSettings};
use crate::lifecycle::BodyLifecycle;
use crate::transient::TransientFaults;
use crate::{PipelineContext, Plugin};

/// Resilience settings of every client of an application.
///
/// `defaults` apply to all clients. An entry in `clients` overrides them field by field, so a
/// client only lists what differs.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct Settings {
    /// Settings shared by all clients.
    pub defaults: ClientSettings,
    /// Per-client overrides, by client name.
    pub clients: BTreeMap<String, ClientSettings>,
}

impl Settings {
    /// The effective settings of the client called `name`.
    ///
    /// Unknown clients get the defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use airbag::config::{ClientSettings, Settings};
    ///
    /// let mut settings = Settings::default();
    /// settings.defaults.retry.enabled = Some(true);
    /// settings.defaults.retry.max_retries = Some(3);
    ///
    /// let mut orders = ClientSettings::default();
    /// orders.retry.max_retries = Some(1);
    /// settings.clients.insert("orders".to_string(), orders);
    ///
    /// let resolved = settings.resolve("orders");
    /// assert_eq!(resolved.retry.enabled, Some(true));
    /// assert_eq!(resolved.retry.max_retries, Some(1));
    /// ```
    #[must_use]
    pub fn resolve(&self, name: &str) -> ClientSettings {
        match self.clients.get(name) {
            Some(client) => self.defaults.clone().merge(client.clone()),
            None => self.defaults.clone(),
        }
    }
}

/// Resilience settings of one client.
///
/// Every plugin is disabled unless its `enabled` flag is `true`.
/// [`Pipeline::from_settings`][crate::Pipeline::from_settings] turns the settings into plugins.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[non_exhaustive]
pub struct ClientSettings {
    /// Retry settings.
    pub retry: RetrySettings,
    /// Circuit breaker settings.
    pub circuit_breaker: CircuitBreakerSettings,
    /// Backup request settings.
    pub backup_request: BackupRequestSettings,
    /// Timeout settings.
    pub timeouts: TimeoutSettings,
    /// Transient fault detection settings.
    pub transient_fault_detection: TransientFaultSettings,
}

impl ClientSettings {
    /// Combines `self` with `overrides`. Fields set in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            retry: self.retry.merge(overrides.retry),
            circuit_breaker: self.circuit_breaker.merge(overrides.circuit_breaker),
            backup_request: self.backup_request.merge(overrides.backup_request),
            timeouts: self.timeouts.merge(overrides.timeouts),
            transient_fault_detection: self.transient_fault_detection.merge(overrides.transient_fault_detection),
        }
    }

    /// Checks the enabled sections for contradictions and missing values.
    ///
    /// # Errors
    ///
    /// Returns an error when an enabled section is invalid, for example when both a fixed retry
    /// delay and exponential backoff are configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeouts.is_enabled() {
            self.timeouts.validate()?;
        }

        if self.backup_request.is_enabled() {
            self.backup_request.validate()?;
        }

        if self.retry.is_enabled() {
            self.retry.validate()?;
        }

        if self.circuit_breaker.is_enabled() {
            self.circuit_breaker.validate()?;
        }

        Ok(())
    }

    /// Creates the enabled plugins, outermost first.
    pub(crate) fn plugins(&self, context: &PipelineContext) -> Result<Vec<Arc<dyn Plugin>>, ConfigError> {
        let mut plugins: Vec<Arc<dyn Plugin>> = Vec::new();

        if self.timeouts.is_enabled() {
            plugins.push(Arc::new(self.timeouts.layer(context)?));
        }

        if self.backup_request.is_enabled() {
            plugins.push(Arc::new(self.backup_request.layer(context)?));
        }

        if self.retry.is_enabled() {
            plugins.push(Arc::new(self.retry.layer(context)?));
        }

        if self.circuit_breaker.is_enabled() {
            plugins.push(Arc::new(self.circuit_breaker.layer(context)?));
        }

        if self.transient_fault_detection.is_enabled() {
            plugins.push(Arc::new(TransientFaults::layer("transient_fault_detection", context)));
        }

        plugins.push(Arc::new(BodyLifecycle::layer("lifecycle", context)));

        Ok(plugins)
    }
}
