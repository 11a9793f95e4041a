// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::str::FromStr;

/// A threshold of `count` out of `total` outcomes, for example `3/5`.
///
/// Ratios are written as `"k/n"` or `"k out of n"` and always satisfy `0 < k <= n`.
///
/// # Examples
///
/// ```
/// use airbag::circuit_breaker::Ratio;
///
/// let ratio: Ratio = "3 out of 5".parse().unwrap();
/// assert_eq!(ratio, Ratio::new(3, 5).unwrap());
/// assert_eq!(ratio.to_string(), "3/5");
///
/// assert!("6/5".parse::<Ratio>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Ratio {
    count: u32,
    total: u32,
}

impl Ratio {
    /// Creates a ratio of `count` out of `total`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < count <= total`.
    pub fn new(count: u32, total: u32) -> Result<Self, RatioError> {
        if count == 0 || count > total {
            return Err(RatioError::new(format!("{count}/{total}")));
        }

        Ok(Self { count, total })
    }

    pub(super) const fn new_unchecked(count: u32, total: u32) -> Self {
        Self { count, total }
    }

    /// The `k` in `k/n`.
    #[must_use]
    pub fn count(self) -> u32 {
        self.count
    }

    /// The `n` in `k/n`.
    #[must_use]
    pub fn total(self) -> u32 {
        self.total
    }

    /// `total` as a window length.
    pub(super) fn window_len(self) -> usize {
        usize::try_from(self.total).unwrap_or(usize::MAX)
    }
}

impl Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.count, self.total)
    }
}

impl FromStr for Ratio {
    type Err = RatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (count, total) = trimmed
            .split_once('/')
            .or_else(|| trimmed.split_once(" out of "))
            .ok_or_else(|| RatioError::new(s))?;

        match (count.trim().parse(), total.trim().parse()) {
            (Ok(count), Ok(total)) => Self::new(count, total).map_err(|_| RatioError::new(s)),
            _ => Err(RatioError::new(s)),
        }
    }
}

impl TryFrom<String> for Ratio {
    type Error = RatioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ratio> for String {
    fn from(value: Ratio) -> Self {
        value.to_string()
    }
}

/// A ratio that is malformed or outside `0 < k <= n`.
#[ohno::error]
#[display("invalid ratio '{input}', expected 'k/n' or 'k out of n' with 0 < k <= n")]
pub struct RatioError {
    input: String,
}
