// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;

use layered::Service;

use super::{ClassifyFault, TransientFaultsLayer};
use crate::utils::TelemetryHelper;
use crate::{FaultKind, Outcome, PipelineContext, Request};

/// Reclassifies connection-level transport faults as transient.
///
/// Built with [`TransientFaults::layer`]; see the [transient module][crate::transient] documentation.
#[derive(Debug)]
pub struct TransientFaults<S> {
    pub(super) shared: Arc<TransientFaultsShared>,
    pub(super) inner: S,
}

#[derive(Debug)]
pub(crate) struct TransientFaultsShared {
    pub(crate) classify: ClassifyFault,
    pub(crate) telemetry: TelemetryHelper,
}

impl<S: Clone> Clone for TransientFaults<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
        }
    }
}

impl TransientFaults<()> {
    /// Creates a [`TransientFaultsLayer`] named `name` for telemetry.
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &PipelineContext) -> TransientFaultsLayer {
        TransientFaultsLayer::new(name.into(), context)
    }
}

impl<S> Service<Request> for TransientFaults<S>
where
    S: Service<Request, Out = Outcome>,
{
    type Out = Outcome;

    async fn execute(&self, request: Request) -> Self::Out {
        self.inner.execute(request).await.map_err(|mut fault| {
            if fault.kind() == FaultKind::NonTransient && self.shared.classify.call(&fault) {
                fault.reclassify(FaultKind::Transient);
                self.shared.emit_reclassified();
            }
            fault
        })
    }
}

impl TransientFaultsShared {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_reclassified(&self) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.transient_fault",
                tracing::Level::DEBUG,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.telemetry.report_event(
            super::telemetry::TRANSIENT_FAULT_EVENT,
            &[opentelemetry::KeyValue::new(crate::telemetry::FAULT_KIND, FaultKind::Transient.as_str())],
        );
    }
}
