// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use layered::{DynamicServiceExt, Service};

use crate::config::{ClientSettings, ConfigError};
use crate::{Execution, Outcome, PipelineContext, Plugin, Request, compose};

/// A transport wrapped in an ordered list of plugins.
///
/// The first plugin is the outermost: it sees the request first and the outcome last. Plugins
/// are applied once, when the pipeline is created. Cloning is cheap and clones share state
/// such as circuit breakers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use airbag::config::ClientSettings;
/// use airbag::{Fault, Pipeline, PipelineContext, Request, Response};
/// use http::{Method, StatusCode};
/// use layered::Execute;
/// use tick::Clock;
///
/// # async fn example(clock: Clock) -> Result<(), Box<dyn std::error::Error>> {
/// let context = PipelineContext::new(&clock).name("orders");
///
/// let mut settings = ClientSettings::default();
/// settings.retry.enabled = Some(true);
/// settings.transient_fault_detection.enabled = Some(true);
///
/// let transport = Execute::new(|_request: Request| async move {
///     Ok::<_, Fault>(Response::new(StatusCode::OK))
/// });
///
/// let pipeline = Pipeline::from_settings(transport, &settings, &context, Vec::new())?;
/// let response = pipeline
///     .execute(Request::new(Method::GET, "https://example.com/orders".parse()?))
///     .await?;
/// # let _ = response;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    execution: Execution,
}

impl Pipeline {
    /// Wraps `transport` in `plugins`, the first plugin being the outermost.
    pub fn new<T>(transport: T, plugins: impl IntoIterator<Item = Arc<dyn Plugin>>) -> Self
    where
        T: Service<Request, Out = Outcome> + 'static,
    {
        Self {
            execution: compose(plugins).apply(transport.into_dynamic()),
        }
    }

    /// Builds a pipeline from settings.
    ///
    /// The enabled plugins are composed in this order, outermost first: timeout, backup request,
    /// retry, circuit breaker, transient fault detection, body lifecycle. `user_plugins` come
    /// next, directly around the transport.
    ///
    /// # Errors
    ///
    /// Returns an error when an enabled section of `settings` is invalid.
    pub fn from_settings<T>(
        transport: T,
        settings: &ClientSettings,
        context: &PipelineContext,
        user_plugins: impl IntoIterator<Item = Arc<dyn Plugin>>,
    ) -> Result<Self, ConfigError>
    where
        T: Service<Request, Out = Outcome> + 'static,
    {
        let mut plugins = settings.plugins(context)?;
        plugins.extend(user_plugins);

        Ok(Self::new(transport, plugins))
    }

    /// Executes `request` through all plugins and the transport.
    pub async fn execute(&self, request: Request) -> Outcome {
        self.execution.execute(request).await
    }
}

impl Service<Request> for Pipeline {
    type Out = Outcome;

    async fn execute(&self, request: Request) -> Self::Out {
        self.execution.execute(request).await
    }
}
