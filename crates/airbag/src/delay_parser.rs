// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

use jiff::SignedDuration;
use tick::Clock;
use tick::fmt::{Rfc2822, UnixSeconds};

/// Integers up to and including this value are never read as epoch seconds.
///
/// Small integers in a retry hint are ambiguous: they are far more likely to be a relative
/// number of seconds than an instant in January 1970. The threshold is a compatibility
/// heuristic, not a protocol rule.
pub const EPOCH_SECONDS_THRESHOLD: i64 = 1000;

/// Parses a server retry hint holding an absolute instant in whole seconds since the Unix epoch.
///
/// Returns the signed duration from the clock's current time until that instant, or `None`
/// when the value is empty, contains anything but ASCII digits, is not greater than
/// [`EPOCH_SECONDS_THRESHOLD`] or cannot be represented. A negative duration means the instant
/// already passed and the caller should retry immediately.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use airbag::parse_delay;
/// use jiff::SignedDuration;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen_at(SystemTime::UNIX_EPOCH + Duration::from_secs(1_529_803_177));
///
/// assert_eq!(parse_delay("1529803194", &clock), Some(SignedDuration::from_secs(17)));
/// assert_eq!(parse_delay("17", &clock), None);
/// assert_eq!(parse_delay("2018-04-11T22:34:28Z", &clock), None);
/// ```
#[must_use]
pub fn parse_delay(value: &str, clock: &Clock) -> Option<SignedDuration> {
    let seconds = parse_digits(value)?;

    if seconds <= EPOCH_SECONDS_THRESHOLD {
        return None;
    }

    let instant = UnixSeconds::from_secs(u64::try_from(seconds).ok()?).ok()?;
    until(clock.system_time(), instant.into())
}

/// Converts a parsed delay into a wait duration. Negative delays resolve to zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use airbag::resolve_delay;
/// use jiff::SignedDuration;
///
/// assert_eq!(resolve_delay(SignedDuration::from_secs(-3)), Duration::ZERO);
/// assert_eq!(resolve_delay(SignedDuration::from_millis(1500)), Duration::from_millis(1500));
/// ```
#[must_use]
pub fn resolve_delay(delay: SignedDuration) -> Duration {
    Duration::try_from(delay).unwrap_or(Duration::ZERO)
}

/// Reusable parser of `Retry-After` style hints bound to a clock.
///
/// [`DelayParser::parse`] only understands absolute epoch seconds, see [`parse_delay`].
/// [`DelayParser::parse_retry_after`] additionally accepts the two forms of the HTTP
/// `Retry-After` header: a relative number of seconds and an HTTP date.
#[derive(Debug, Clone)]
pub struct DelayParser {
    clock: Clock,
}

impl DelayParser {
    /// Creates a parser that measures delays against `clock`.
    pub fn new(clock: impl AsRef<Clock>) -> Self {
        Self {
            clock: clock.as_ref().clone(),
        }
    }

    /// See [`parse_delay`].
    #[must_use]
    pub fn parse(&self, value: &str) -> Option<SignedDuration> {
        parse_delay(value, &self.clock)
    }

    /// Parses any supported hint: epoch seconds first, then relative seconds, then an HTTP date.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::{Duration, SystemTime};
    ///
    /// use airbag::DelayParser;
    /// use jiff::SignedDuration;
    /// use tick::Clock;
    ///
    /// let clock = Clock::new_frozen_at(SystemTime::UNIX_EPOCH + Duration::from_secs(1_529_803_177));
    /// let parser = DelayParser::new(&clock);
    ///
    /// assert_eq!(parser.parse_retry_after("17"), Some(SignedDuration::from_secs(17)));
    /// assert_eq!(
    ///     parser.parse_retry_after("Sun, 24 Jun 2018 01:19:40 GMT"),
    ///     Some(SignedDuration::from_secs(3))
    /// );
    /// ```
    #[must_use]
    pub fn parse_retry_after(&self, value: &str) -> Option<SignedDuration> {
        let value = value.trim();

        if let Some(delay) = self.parse(value) {
            return Some(delay);
        }

        if let Some(seconds) = parse_digits(value) {
            return Some(SignedDuration::from_secs(seconds));
        }

        let date = value.parse::<Rfc2822>().ok()?;
        until(self.clock.system_time(), date.into())
    }
}

fn parse_digits(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    value.parse().ok()
}

fn until(now: SystemTime, instant: SystemTime) -> Option<SignedDuration> {
    match instant.duration_since(now) {
        Ok(ahead) => SignedDuration::try_from(ahead).ok(),
        Err(behind) => SignedDuration::try_from(behind.duration()).ok().map(|d| -d),
    }
}
