// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry keys used by the built-in plugins.
//!
//! When metrics are enabled through [`PipelineContext::enable_metrics`][crate::PipelineContext::enable_metrics],
//! every resilience event increments the `resilience.event` counter. Each data point carries
//! [`PIPELINE_NAME`], [`STRATEGY_NAME`] and [`EVENT_NAME`], plus event-specific attributes
//! such as [`ATTEMPT_INDEX`].
//!
//! Log events emitted with the `logs` feature use the `airbag.<event>` naming scheme and carry
//! the same names as `pipeline.name` and `strategy.name` fields.
//!
//! Names follow the [OpenTelemetry naming guidelines](https://opentelemetry.io/docs/specs/semconv/general/naming/#general-naming-considerations).

/// The name of the pipeline, see [`PipelineContext::name`][crate::PipelineContext::name].
pub const PIPELINE_NAME: &str = "resilience.pipeline.name";

/// The name given to a plugin when its layer was created, for example `retry`.
pub const STRATEGY_NAME: &str = "resilience.strategy.name";

/// The resilience event, for example `retry`, `circuit_opened` or `timeout`.
pub const EVENT_NAME: &str = "resilience.event.name";

/// The 0-based index of the attempt that produced the event.
pub const ATTEMPT_INDEX: &str = "resilience.attempt.index";

/// Whether the attempt that produced the event was the last one allowed.
pub const ATTEMPT_IS_LAST: &str = "resilience.attempt.is_last";

/// The fault kind, see [`FaultKind::as_str`][crate::FaultKind::as_str].
pub const FAULT_KIND: &str = "resilience.fault.kind";

/// The circuit state after the event, see [`CircuitState::as_str`][crate::circuit_breaker::CircuitState::as_str].
pub const CIRCUIT_STATE: &str = "resilience.circuit_breaker.state";
