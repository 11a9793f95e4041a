// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

/// A single execution attempt of a request within one call.
///
/// The index is 0-based: the original execution is attempt `0`, the first retry is attempt `1`.
/// The index only grows after a completed attempt failed and the retry plugin decided to
/// re-attempt, so it never counts in-flight work.
///
/// # Examples
///
/// ```
/// use airbag::Attempt;
///
/// let attempt = Attempt::new(0, false);
/// assert!(attempt.is_first());
/// assert_eq!(attempt.number(), 1);
///
/// let last = Attempt::new(3, true);
/// assert!(last.is_last());
/// assert_eq!(last.index(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    index: u32,
    is_last: bool,
}

impl Default for Attempt {
    fn default() -> Self {
        Self::new(0, true)
    }
}

impl Attempt {
    /// Creates an attempt with the given 0-based index.
    #[must_use]
    pub fn new(index: u32, is_last: bool) -> Self {
        Self { index, is_last }
    }

    /// Returns `true` for the original execution.
    #[must_use]
    pub fn is_first(self) -> bool {
        self.index == 0
    }

    /// Returns `true` if no further retry is allowed after this attempt.
    #[must_use]
    pub fn is_last(self) -> bool {
        self.is_last
    }

    /// The 0-based attempt index.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// The 1-based attempt number, `index + 1`.
    #[must_use]
    pub fn number(self) -> u32 {
        self.index.saturating_add(1)
    }

    pub(crate) fn first(max_attempts: MaxAttempts) -> Self {
        Self::new(0, max_attempts == MaxAttempts::Finite(1))
    }

    #[cfg_attr(test, mutants::skip)] // causes test timeouts
    pub(crate) fn increment(self, max_attempts: MaxAttempts) -> Option<Self> {
        let next = self.index.saturating_add(1);

        match max_attempts {
            MaxAttempts::Finite(total) => {
                if next >= total {
                    return None;
                }

                Some(Self::new(next, next == total.saturating_sub(1)))
            }
            MaxAttempts::Infinite => Some(Self::new(next, false)),
        }
    }
}

impl Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.index.fmt(f)
    }
}

/// Total number of executions allowed for one call, the original one included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MaxAttempts {
    Finite(u32),
    Infinite,
}

impl MaxAttempts {
    pub(crate) fn from_retries(max_retries: u32) -> Self {
        Self::Finite(max_retries.saturating_add(1))
    }
}
