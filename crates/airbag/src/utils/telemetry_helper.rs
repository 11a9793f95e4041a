// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Telemetry settings captured by a plugin when its layer is created.
#[derive(Debug, Clone)]
pub(crate) struct TelemetryHelper {
    #[cfg(any(feature = "metrics", feature = "logs", test))]
    pub(crate) pipeline_name: std::borrow::Cow<'static, str>,
    #[cfg(any(feature = "metrics", feature = "logs", test))]
    pub(crate) strategy_name: std::borrow::Cow<'static, str>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) event_reporter: Option<opentelemetry::metrics::Counter<u64>>,
    #[cfg(any(feature = "logs", test))]
    pub(crate) logs_enabled: bool,
}

#[cfg(any(feature = "metrics", test))]
impl TelemetryHelper {
    #[cfg(test)]
    pub(crate) fn metrics_enabled(&self) -> bool {
        self.event_reporter.is_some()
    }

    /// Reports one resilience event, tagged with the pipeline and strategy names.
    pub(crate) fn report_event(&self, event_name: &'static str, extra: &[opentelemetry::KeyValue]) {
        use crate::telemetry::{EVENT_NAME, PIPELINE_NAME, STRATEGY_NAME};

        let Some(reporter) = &self.event_reporter else {
            return;
        };

        let mut attributes = Vec::with_capacity(extra.len().saturating_add(3));
        attributes.push(opentelemetry::KeyValue::new(PIPELINE_NAME, self.pipeline_name.clone()));
        attributes.push(opentelemetry::KeyValue::new(STRATEGY_NAME, self.strategy_name.clone()));
        attributes.push(opentelemetry::KeyValue::new(EVENT_NAME, event_name));
        attributes.extend_from_slice(extra);

        reporter.add(1, &attributes);
    }
}
