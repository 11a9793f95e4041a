// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;

use layered::DynamicServiceExt;

use super::{BodyLifecycle, BodyLifecycleShared, OnAbort, OnAbortArgs, OnRelease, OnReleaseArgs};
use crate::utils::TelemetryHelper;
use crate::{Execution, Layer, PipelineContext, Plugin};

/// Builder for the body lifecycle plugin.
///
/// Created by [`BodyLifecycle::layer`].
#[derive(Debug, Clone)]
pub struct BodyLifecycleLayer {
    on_release: Option<OnRelease>,
    on_abort: Option<OnAbort>,
    telemetry: TelemetryHelper,
}

impl BodyLifecycleLayer {
    pub(crate) fn new(name: Cow<'static, str>, context: &PipelineContext) -> Self {
        Self {
            on_release: None,
            on_abort: None,
            telemetry: context.create_telemetry(name),
        }
    }

    /// Invokes `release_fn` after a connection was returned to its pool.
    #[must_use]
    pub fn on_release(mut self, release_fn: impl Fn(OnReleaseArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_release = Some(OnRelease::new(release_fn));
        self
    }

    /// Invokes `abort_fn` after a connection was discarded because its body was not fully read.
    #[must_use]
    pub fn on_abort(mut self, abort_fn: impl Fn(OnAbortArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_abort = Some(OnAbort::new(abort_fn));
        self
    }
}

impl<S> Layer<S> for BodyLifecycleLayer {
    type Service = BodyLifecycle<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BodyLifecycle {
            shared: Arc::new(BodyLifecycleShared {
                on_release: self.on_release.clone(),
                on_abort: self.on_abort.clone(),
                telemetry: self.telemetry.clone(),
            }),
            inner,
        }
    }
}

impl Plugin for BodyLifecycleLayer {
    fn apply(&self, execution: Execution) -> Execution {
        self.layer(execution).into_dynamic()
    }
}
