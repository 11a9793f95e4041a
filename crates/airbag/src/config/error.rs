// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;

/// Settings that are contradictory or out of range.
///
/// # Examples
///
/// ```
/// use airbag::config::ClientSettings;
///
/// let mut settings = ClientSettings::default();
/// settings.retry.enabled = Some(true);
/// settings.retry.jitter_factor = Some(1.5);
///
/// let error = settings.validate().unwrap_err();
/// assert!(error.to_string().contains("jitter_factor"));
/// ```
#[ohno::error]
#[display("invalid {section} settings: {reason}")]
pub struct ConfigError {
    section: String,
    reason: String,
}

/// Converts a configured duration, rejecting negative values.
pub(super) fn to_duration(section: &str, field: &str, value: SignedDuration) -> Result<Duration, ConfigError> {
    Duration::try_from(value)
        .map_err(|error| ConfigError::caused_by(section, format!("{field} must not be negative, got {value}"), error))
}

/// Like [`to_duration`], for a duration an enabled section cannot do without.
pub(super) fn required_duration(section: &str, field: &str, value: Option<SignedDuration>) -> Result<Duration, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::new(section, format!("{field} is required when {section} is enabled")))?;
    to_duration(section, field, value)
}
