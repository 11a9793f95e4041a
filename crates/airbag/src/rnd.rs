// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

/// Source of randomness for jitter. Not cryptographically secure.
#[derive(Clone, Default)]
pub(crate) enum Rnd {
    #[default]
    Real,

    #[cfg(test)]
    Test(std::sync::Arc<dyn Fn() -> f64 + Send + Sync>),
}

impl Debug for Rnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => f.write_str("Real"),
            #[cfg(test)]
            Self::Test(_) => f.write_str("Test"),
        }
    }
}

impl Rnd {
    #[cfg(test)]
    pub(crate) fn new_fixed(value: f64) -> Self {
        Self::Test(std::sync::Arc::new(move || value))
    }

    /// A value in `[0, 1)`.
    pub(crate) fn next_f64(&self) -> f64 {
        match self {
            Self::Real => fastrand::f64(),
            #[cfg(test)]
            Self::Test(generator) => generator(),
        }
    }

    /// A value in `[-1, 1)`.
    pub(crate) fn next_symmetric(&self) -> f64 {
        self.next_f64().mul_add(2.0, -1.0)
    }
}
