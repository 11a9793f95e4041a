// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{Either, select};
use layered::Service;
use tick::Clock;

use super::{BackupRequestLayer, OnBackup, OnBackupArgs};
use crate::utils::{EnableIf, TelemetryHelper};
use crate::{NotSet, Outcome, PipelineContext, Request};

/// Sends a second copy of a slow request and returns whichever completes first.
///
/// Built with [`BackupRequest::layer`]; see the [backup module][crate::backup] documentation.
#[derive(Debug)]
pub struct BackupRequest<S> {
    pub(super) shared: Arc<BackupRequestShared>,
    pub(super) inner: S,
}

#[derive(Debug)]
pub(crate) struct BackupRequestShared {
    pub(crate) clock: Clock,
    pub(crate) delay: Duration,
    pub(crate) on_backup: Option<OnBackup>,
    pub(crate) enable_if: EnableIf,
    pub(crate) telemetry: TelemetryHelper,
}

impl<S: Clone> Clone for BackupRequest<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
        }
    }
}

impl BackupRequest<()> {
    /// Creates a [`BackupRequestLayer`] named `name` for telemetry.
    ///
    /// The returned layer needs a [`delay`][BackupRequestLayer::delay] before it can be used.
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &PipelineContext) -> BackupRequestLayer<NotSet> {
        BackupRequestLayer::new(name.into(), context)
    }
}

impl<S> Service<Request> for BackupRequest<S>
where
    S: Service<Request, Out = Outcome>,
{
    type Out = Outcome;

    #[cfg_attr(test, mutants::skip)] // causes test timeouts
    async fn execute(&self, request: Request) -> Self::Out {
        if !self.shared.enable_if.call(&request) {
            return self.inner.execute(request).await;
        }

        let primary = pin!(self.inner.execute(request.clone()));
        let delay = pin!(self.shared.clock.delay(self.shared.delay));

        let primary = match select(primary, delay).await {
            Either::Left((outcome, _delay)) => return outcome,
            Either::Right(((), primary)) => primary,
        };

        self.shared.on_backup_started(&request);
        let backup = pin!(self.inner.execute(request));

        // The loser is dropped here, cancelling its transport call.
        match select(primary, backup).await {
            Either::Left((outcome, _backup)) => outcome,
            Either::Right((outcome, _primary)) => {
                self.shared.emit_backup_won();
                outcome
            }
        }
    }
}

impl BackupRequestShared {
    fn on_backup_started(&self, request: &Request) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.backup_request",
                tracing::Level::INFO,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
                backup_request.delay = self.delay.as_secs_f32(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.telemetry.report_event(super::telemetry::BACKUP_EVENT, &[]);

        if let Some(on_backup) = &self.on_backup {
            on_backup.call(request, OnBackupArgs { delay: self.delay });
        }
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(clippy::unused_self, reason = "unused when neither logs nor metrics are enabled")
    )]
    fn emit_backup_won(&self) {
        #[cfg(any(feature = "logs", test))]
        if self.telemetry.logs_enabled {
            tracing::event!(
                name: "airbag.backup_request.won",
                tracing::Level::INFO,
                pipeline.name = %self.telemetry.pipeline_name,
                strategy.name = %self.telemetry.strategy_name,
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.telemetry.report_event(super::telemetry::BACKUP_WON_EVENT, &[]);
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::channel::oneshot;
    use http::{Method, StatusCode};
    use layered::Execute;
    use opentelemetry::KeyValue;
    use tick::ClockControl;

    use super::*;
    use crate::testing::{LogCapture, MetricTester, TrackedConnection, request};
    use crate::{Fault, Layer, Response, ResponseBody};

    fn auto_clock() -> Clock {
        ClockControl::default().auto_advance_timers(true).to_clock()
    }

    fn context(clock: &Clock) -> PipelineContext {
        PipelineContext::new(clock).name("test_pipeline")
    }

    /// The first call never completes and keeps a response with an unread body alive.
    fn slow_primary(connection: &TrackedConnection, calls: &Arc<AtomicU32>) -> impl Service<Request, Out = Outcome> + use<> {
        let connection = connection.clone();
        let calls = Arc::clone(calls);

        Execute::new(move |_request: Request| {
            let is_primary = calls.fetch_add(1, Ordering::SeqCst) == 0;
            let body = is_primary.then(|| ResponseBody::new(futures_util::stream::pending(), connection.clone()));
            async move {
                if let Some(body) = body {
                    let _response = Response::new(StatusCode::OK).body(body);
                    pending::<()>().await;
                }
                Ok::<_, Fault>(Response::new(StatusCode::CREATED))
            }
        })
    }

    #[tokio::test]
    async fn slow_primary_triggers_backup() {
        let clock = auto_clock();
        let connection = TrackedConnection::new();
        let calls = Arc::new(AtomicU32::new(0));
        let backups = Arc::new(Mutex::new(Vec::new()));
        let backups_clone = Arc::clone(&backups);
        let service = BackupRequest::layer("backup", &context(&clock))
            .delay(Duration::from_millis(200))
            .on_backup(move |request, args| backups_clone.lock().unwrap().push((request.method().clone(), args.delay())))
            .layer(slow_primary(&connection, &calls));

        let response = service.execute(request(Method::GET)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*backups.lock().unwrap(), [(Method::GET, Duration::from_millis(200))]);
        // The losing primary was dropped together with its response.
        assert_eq!(connection.aborted(), 1);
        assert_eq!(connection.released(), 0);
    }

    #[tokio::test]
    async fn fast_primary_skips_backup() {
        let clock = auto_clock();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let service = BackupRequest::layer("backup", &context(&clock))
            .delay(Duration::from_millis(200))
            .on_backup(|_, _| panic!("no backup expected"))
            .layer(Execute::new(move |_request: Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, Fault>(Response::new(StatusCode::OK)) }
            }));

        let response = service.execute(request(Method::GET)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn primary_can_win_after_backup_started() {
        let clock = auto_clock();
        let connection = TrackedConnection::new();
        let tracked = connection.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let (release_primary, primary_released) = oneshot::channel::<()>();
        let primary_released = Mutex::new(Some(primary_released));
        let release_primary = Mutex::new(Some(release_primary));

        let service = BackupRequest::layer("backup", &context(&clock))
            .delay(Duration::from_millis(50))
            .on_backup(move |_, _| {
                if let Some(sender) = release_primary.lock().unwrap().take() {
                    sender.send(()).unwrap();
                }
            })
            .layer(Execute::new(move |_request: Request| {
                let is_primary = counter.fetch_add(1, Ordering::SeqCst) == 0;
                let receiver = primary_released.lock().unwrap().take();
                let body = (!is_primary).then(|| ResponseBody::new(futures_util::stream::pending(), tracked.clone()));
                async move {
                    if let Some(receiver) = receiver {
                        receiver.await.unwrap();
                    }
                    if let Some(body) = body {
                        let _response = Response::new(StatusCode::ACCEPTED).body(body);
                        pending::<()>().await;
                    }
                    Ok::<_, Fault>(Response::new(StatusCode::OK))
                }
            }));

        let response = service.execute(request(Method::GET)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // The backup lost and was dropped together with its response.
        assert_eq!(connection.aborted(), 1);
    }

    #[tokio::test]
    async fn non_idempotent_requests_are_not_duplicated() {
        let clock = auto_clock();
        let calls = Arc::new(AtomicU32::new(0));
        let transport_clock = clock.clone();
        let counter = Arc::clone(&calls);
        let service = BackupRequest::layer("backup", &context(&clock))
            .delay(Duration::from_millis(10))
            .layer(Execute::new(move |_request: Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                let clock = transport_clock.clone();
                async move {
                    clock.delay(Duration::from_secs(1)).await;
                    Ok::<_, Fault>(Response::new(StatusCode::OK))
                }
            }));

        let response = service.execute(request(Method::POST)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reports_telemetry() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let tester = MetricTester::new();
        let clock = auto_clock();
        let context = context(&clock).enable_logs().enable_metrics(tester.meter_provider());
        let service = BackupRequest::layer("log_backup", &context)
            .delay(Duration::from_millis(200))
            .layer(slow_primary(&TrackedConnection::new(), &Arc::new(AtomicU32::new(0))));

        let _ = service.execute(request(Method::GET)).await;

        capture.assert_contains("airbag::backup");
        capture.assert_contains("strategy.name=log_backup");
        capture.assert_contains("backup_request.delay=0.2");
        tester.assert_attributes_contain(&[
            KeyValue::new("resilience.pipeline.name", "test_pipeline"),
            KeyValue::new("resilience.event.name", "backup_request"),
            KeyValue::new("resilience.event.name", "backup_request_won"),
        ]);
    }
}
