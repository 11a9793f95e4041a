// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::sync::Arc;

use layered::DynamicService;

use crate::{Outcome, Request};

/// A type-erased asynchronous execution of a request.
///
/// The transport at the bottom of a pipeline and every plugin-wrapped stage above it are
/// executions. Cloning is cheap.
pub type Execution = DynamicService<Request, Outcome>;

/// A middleware that wraps an [`Execution`] into a new one.
///
/// Plugins are applied once, when a [`Pipeline`][crate::Pipeline] is built. The returned
/// execution is invoked for every call. All built-in layers, such as
/// [`RetryLayer`][crate::retry::RetryLayer], implement this trait as well as
/// [`Layer`][crate::Layer].
///
/// # Examples
///
/// ```
/// use airbag::{Execution, Outcome, Plugin, Request, Service};
/// use layered::{DynamicServiceExt, Execute};
///
/// /// Adds a `user-agent` header to every request.
/// #[derive(Debug)]
/// struct UserAgent;
///
/// impl Plugin for UserAgent {
///     fn apply(&self, execution: Execution) -> Execution {
///         Execute::new(move |request: Request| {
///             let execution = execution.clone();
///             async move {
///                 let request = request.header(
///                     http::header::USER_AGENT,
///                     http::HeaderValue::from_static("airbag"),
///                 );
///                 execution.execute(request).await
///             }
///         })
///         .into_dynamic()
///     }
/// }
/// ```
pub trait Plugin: Debug + Send + Sync {
    /// Wraps `execution`.
    fn apply(&self, execution: Execution) -> Execution;
}

impl<P: Plugin + ?Sized> Plugin for Arc<P> {
    fn apply(&self, execution: Execution) -> Execution {
        (**self).apply(execution)
    }
}

impl<P: Plugin + ?Sized> Plugin for Box<P> {
    fn apply(&self, execution: Execution) -> Execution {
        (**self).apply(execution)
    }
}

/// A plugin that returns the execution unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPlugin;

impl Plugin for IdentityPlugin {
    fn apply(&self, execution: Execution) -> Execution {
        execution
    }
}

/// Two plugins applied as one, `outer` around `inner`.
#[derive(Debug, Clone)]
pub struct CompositePlugin {
    outer: Arc<dyn Plugin>,
    inner: Arc<dyn Plugin>,
}

impl CompositePlugin {
    /// Creates a plugin that applies `outer` around `inner`.
    pub fn new(outer: impl Plugin + 'static, inner: impl Plugin + 'static) -> Self {
        Self {
            outer: Arc::new(outer),
            inner: Arc::new(inner),
        }
    }
}

impl Plugin for CompositePlugin {
    fn apply(&self, execution: Execution) -> Execution {
        self.outer.apply(self.inner.apply(execution))
    }
}

/// Folds an ordered list of plugins into one. The first plugin is the outermost.
///
/// An empty list yields [`IdentityPlugin`]. Composition is associative:
/// `compose([compose([a, b]), c])` behaves like `compose([a, compose([b, c])])`.
pub fn compose<I>(plugins: I) -> Arc<dyn Plugin>
where
    I: IntoIterator<Item = Arc<dyn Plugin>>,
{
    plugins
        .into_iter()
        .reduce(|outer, inner| Arc::new(CompositePlugin { outer, inner }))
        .unwrap_or_else(|| Arc::new(IdentityPlugin))
}
