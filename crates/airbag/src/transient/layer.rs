// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::error::Error;
use std::io;
use std::sync::Arc;

use layered::DynamicServiceExt;

use super::{ClassifyFault, TransientFaults, TransientFaultsShared};
use crate::utils::TelemetryHelper;
use crate::{Execution, Fault, Layer, PipelineContext, Plugin};

/// Builder for the transient fault plugin.
///
/// Created by [`TransientFaults::layer`].
#[derive(Debug, Clone)]
pub struct TransientFaultsLayer {
    classify: ClassifyFault,
    telemetry: TelemetryHelper,
}

impl TransientFaultsLayer {
    pub(crate) fn new(name: Cow<'static, str>, context: &PipelineContext) -> Self {
        Self {
            classify: ClassifyFault::new(is_transient_io_fault),
            telemetry: context.create_telemetry(name),
        }
    }

    /// Replaces the classification. Faults for which `is_transient` returns `true` become
    /// [`FaultKind::Transient`][crate::FaultKind::Transient].
    ///
    /// Only faults of kind [`FaultKind::NonTransient`][crate::FaultKind::NonTransient] are
    /// passed to the classification.
    ///
    /// **Default**: [`is_transient_io_fault`]
    #[must_use]
    pub fn classify_with(mut self, is_transient: impl Fn(&Fault) -> bool + Send + Sync + 'static) -> Self {
        self.classify = ClassifyFault::new(is_transient);
        self
    }
}

/// Returns `true` when the cause chain of `fault` contains a connection-level [`io::Error`].
///
/// The recognized kinds are `ConnectionRefused`, `ConnectionReset`, `ConnectionAborted`,
/// `NotConnected`, `BrokenPipe`, `TimedOut` and `UnexpectedEof`.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use airbag::Fault;
/// use airbag::transient::is_transient_io_fault;
///
/// assert!(is_transient_io_fault(&Fault::transport(io::Error::from(io::ErrorKind::ConnectionReset))));
/// assert!(!is_transient_io_fault(&Fault::transport(io::Error::from(io::ErrorKind::PermissionDenied))));
/// ```
#[must_use]
pub fn is_transient_io_fault(fault: &Fault) -> bool {
    let mut source = fault.source();

    while let Some(error) = source {
        if let Some(io_error) = error.downcast_ref::<io::Error>()
            && is_transient_io_kind(io_error.kind())
        {
            return true;
        }

        source = error.source();
    }

    false
}

fn is_transient_io_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut
            | io::ErrorKind::UnexpectedEof
    )
}

impl<S> Layer<S> for TransientFaultsLayer {
    type Service = TransientFaults<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TransientFaults {
            shared: Arc::new(TransientFaultsShared {
                classify: self.classify.clone(),
                telemetry: self.telemetry.clone(),
            }),
            inner,
        }
    }
}

impl Plugin for TransientFaultsLayer {
    fn apply(&self, execution: Execution) -> Execution {
        self.layer(execution).into_dynamic()
    }
}
