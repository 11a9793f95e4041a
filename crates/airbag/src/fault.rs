// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::time::Duration;

use crate::{Recovery, RecoveryInfo, Response};

/// The result of executing a request: a [`Response`] or a classified [`Fault`].
pub type Outcome = Result<Response, Fault>;

/// Classification of a [`Fault`].
///
/// The kind identifies which part of the pipeline produced the failure, so callers, listeners
/// and metrics can tell an exhausted retry budget from an open circuit, a deadline or a plain
/// transport failure without inspecting any internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FaultKind {
    /// A failure that is likely to succeed when retried, such as a reset connection.
    Transient,

    /// A failure that is not retried unless a custom classification says otherwise.
    NonTransient,

    /// Retries were exhausted. The cause of the fault is the last underlying fault.
    RetryExhausted,

    /// The circuit breaker rejected the call without invoking the downstream.
    CircuitOpen,

    /// The call exceeded its deadline and the downstream execution was cancelled.
    Timeout,

    /// Releasing or aborting a response connection failed.
    Lifecycle,
}

impl FaultKind {
    /// A short `snake_case` name, also used as telemetry value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::NonTransient => "non_transient",
            Self::RetryExhausted => "retry_exhausted",
            Self::CircuitOpen => "circuit_open",
            Self::Timeout => "timeout",
            Self::Lifecycle => "lifecycle",
        }
    }
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed execution of a request.
///
/// Faults are returned by value inside an [`Outcome`]; nothing in the pipeline panics or
/// unwinds to signal a failure. The optional cause keeps the underlying error, for example the
/// transport's [`std::io::Error`] or, for [`FaultKind::RetryExhausted`], the last fault
/// observed by the retry plugin.
///
/// # Examples
///
/// ```
/// use airbag::{Fault, FaultKind, Recovery, RecoveryKind};
///
/// let fault = Fault::transient(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
/// assert_eq!(fault.kind(), FaultKind::Transient);
/// assert_eq!(fault.recovery().kind(), RecoveryKind::Retry);
/// ```
#[ohno::error]
#[display("{kind}")]
pub struct Fault {
    kind: FaultKind,
}

impl Fault {
    /// A retryable fault caused by `cause`.
    pub fn transient(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(FaultKind::Transient, cause)
    }

    /// A fault that is not retried by default, caused by `cause`.
    ///
    /// Transports report their failures this way. The [`transient`][crate::transient] plugin
    /// reclassifies connection-level failures as [`FaultKind::Transient`].
    pub fn transport(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(FaultKind::NonTransient, cause)
    }

    pub(crate) fn retry_exhausted(last: Self) -> Self {
        Self::caused_by(FaultKind::RetryExhausted, last)
    }

    pub(crate) fn circuit_open() -> Self {
        Self::new(FaultKind::CircuitOpen)
    }

    pub(crate) fn timeout(timeout: Duration) -> Self {
        Self::caused_by(FaultKind::Timeout, format!("no outcome within {}ms", timeout.as_millis()))
    }

    pub(crate) fn lifecycle(cause: std::io::Error) -> Self {
        Self::caused_by(FaultKind::Lifecycle, cause)
    }

    /// The fault classification.
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Returns `true` for faults a retry may recover from.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == FaultKind::Transient
    }

    /// Returns `true` when an open circuit rejected the call.
    #[must_use]
    pub fn is_circuit_open(&self) -> bool {
        self.kind == FaultKind::CircuitOpen
    }

    pub(crate) fn reclassify(&mut self, kind: FaultKind) {
        self.kind = kind;
    }
}

impl Recovery for Fault {
    fn recovery(&self) -> RecoveryInfo {
        match self.kind {
            FaultKind::Transient | FaultKind::Timeout => RecoveryInfo::retry(),
            FaultKind::CircuitOpen => RecoveryInfo::unavailable(),
            FaultKind::NonTransient | FaultKind::RetryExhausted | FaultKind::Lifecycle => RecoveryInfo::never(),
        }
    }
}
