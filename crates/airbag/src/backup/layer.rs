// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use layered::DynamicServiceExt;

use super::{BackupRequest, BackupRequestShared, OnBackup, OnBackupArgs};
use crate::utils::{EnableIf, TelemetryHelper};
use crate::{Execution, Layer, NotSet, PipelineContext, Plugin, Request, Set};

/// Builder for the backup request plugin.
///
/// Created by [`BackupRequest::layer`]. The [`delay`][BackupRequestLayer::delay] must be set
/// before the layer can wrap a service.
#[derive(Debug)]
pub struct BackupRequestLayer<S = Set> {
    context: PipelineContext,
    delay: Duration,
    on_backup: Option<OnBackup>,
    enable_if: EnableIf,
    telemetry: TelemetryHelper,
    _state: PhantomData<fn(S) -> S>,
}

impl BackupRequestLayer<NotSet> {
    pub(crate) fn new(name: Cow<'static, str>, context: &PipelineContext) -> Self {
        Self {
            context: context.clone(),
            delay: Duration::ZERO,
            on_backup: None,
            enable_if: EnableIf::idempotent(),
            telemetry: context.create_telemetry(name),
            _state: PhantomData,
        }
    }
}

impl<S> BackupRequestLayer<S> {
    /// Starts the backup once the primary request has been outstanding for `delay`.
    ///
    /// Pick a delay around a high percentile of the downstream latency, such as p95.
    #[must_use]
    pub fn delay(self, delay: Duration) -> BackupRequestLayer<Set> {
        BackupRequestLayer {
            context: self.context,
            delay,
            on_backup: self.on_backup,
            enable_if: self.enable_if,
            telemetry: self.telemetry,
            _state: PhantomData,
        }
    }

    /// Invokes `backup_fn` with the request when its backup starts.
    #[must_use]
    pub fn on_backup(mut self, backup_fn: impl Fn(&Request, OnBackupArgs) + Send + Sync + 'static) -> Self {
        self.on_backup = Some(OnBackup::new(backup_fn));
        self
    }

    /// Sends backups only for requests for which `is_enabled` returns `true`.
    ///
    /// A backup executes the request a second time, so only requests that are safe to repeat
    /// should be enabled.
    ///
    /// **Default**: [`Request::is_idempotent`]
    #[must_use]
    pub fn enable_if(mut self, is_enabled: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.enable_if = EnableIf::new(is_enabled);
        self
    }
}

impl<S> Layer<S> for BackupRequestLayer<Set> {
    type Service = BackupRequest<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BackupRequest {
            shared: Arc::new(BackupRequestShared {
                clock: self.context.clock().clone(),
                delay: self.delay,
                on_backup: self.on_backup.clone(),
                enable_if: self.enable_if.clone(),
                telemetry: self.telemetry.clone(),
            }),
            inner,
        }
    }
}

impl Plugin for BackupRequestLayer<Set> {
    fn apply(&self, execution: Execution) -> Execution {
        self.layer(execution).into_dynamic()
    }
}
