// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use tick::Clock;

pub(crate) const DEFAULT_PIPELINE_NAME: &str = "default";

/// Dependencies shared by the plugins of one pipeline.
///
/// A context carries the [`Clock`] used for every delay and deadline, the pipeline name used to
/// correlate telemetry, and the telemetry sinks that are enabled. Create one context per logical
/// client and pass it to each plugin's `layer` function.
///
/// # Examples
///
/// ```
/// use airbag::PipelineContext;
/// use tick::Clock;
///
/// # fn example(clock: Clock) {
/// let context = PipelineContext::new(&clock).name("inventory");
/// # let _ = context;
/// # }
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PipelineContext {
    clock: Clock,
    name: Cow<'static, str>,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<opentelemetry::metrics::Meter>,
    logs_enabled: bool,
}

impl PipelineContext {
    /// Creates a context named `"default"` that uses the given clock.
    pub fn new(clock: impl AsRef<Clock>) -> Self {
        Self {
            clock: clock.as_ref().clone(),
            name: Cow::Borrowed(DEFAULT_PIPELINE_NAME),
            #[cfg(any(feature = "metrics", test))]
            meter: None,
            logs_enabled: false,
        }
    }

    /// Sets the pipeline name reported with every resilience event. Prefer `snake_case`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Reports resilience events to the `resilience.event` counter of the given meter provider.
    #[must_use]
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    pub fn enable_metrics(self, provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        Self {
            meter: Some(crate::metrics::create_meter(provider)),
            ..self
        }
    }

    /// Emits a `tracing` event for each resilience event.
    #[must_use]
    #[cfg(any(feature = "logs", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
    pub fn enable_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    #[cfg_attr(
        not(any(feature = "metrics", feature = "logs", test)),
        expect(unused_variables, reason = "unused when neither logs nor metrics are enabled")
    )]
    pub(crate) fn create_telemetry(&self, strategy_name: Cow<'static, str>) -> crate::utils::TelemetryHelper {
        crate::utils::TelemetryHelper {
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            pipeline_name: self.name.clone(),
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            strategy_name,
            #[cfg(any(feature = "metrics", test))]
            event_reporter: self.meter.as_ref().map(crate::metrics::create_resilience_event_counter),
            #[cfg(any(feature = "logs", test))]
            logs_enabled: self.logs_enabled,
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_name() {
        let context = PipelineContext::new(Clock::new_frozen());
        let telemetry = context.create_telemetry("retry".into());

        assert_eq!(context.name, DEFAULT_PIPELINE_NAME);
        assert_eq!(telemetry.pipeline_name.as_ref(), DEFAULT_PIPELINE_NAME);
        assert!(!telemetry.logs_enabled);
        assert!(telemetry.event_reporter.is_none());
    }

    #[test]
    fn name_is_propagated_to_telemetry() {
        let context = PipelineContext::new(Clock::new_frozen()).name(String::from("payments"));
        let telemetry = context.create_telemetry("timeout".into());

        assert_eq!(telemetry.pipeline_name.as_ref(), "payments");
        assert_eq!(telemetry.strategy_name.as_ref(), "timeout");
        assert!(matches!(telemetry.pipeline_name, Cow::Owned(_)));
    }

    #[test]
    fn enable_logs_sets_flag() {
        let telemetry = PipelineContext::new(Clock::new_frozen())
            .enable_logs()
            .create_telemetry("retry".into());

        assert!(telemetry.logs_enabled);
    }

    #[cfg(not(miri))]
    #[test]
    fn enable_metrics_creates_reporter() {
        let tester = crate::testing::MetricTester::new();
        let context = PipelineContext::new(Clock::new_frozen()).enable_metrics(tester.meter_provider());

        assert!(context.create_telemetry("a".into()).metrics_enabled());
        assert!(context.clone().create_telemetry("b".into()).metrics_enabled());
    }

    #[test]
    fn clock_is_shared() {
        let control = tick::ClockControl::new();
        let clock = control.to_clock();
        let context = PipelineContext::new(&clock);

        let before = context.clock().system_time();
        control.advance(std::time::Duration::from_secs(5));

        assert_eq!(
            context.clock().system_time().duration_since(before).unwrap(),
            std::time::Duration::from_secs(5)
        );
    }
}
