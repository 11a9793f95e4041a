// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};

/// Header marking a non-idempotent request as safe to repeat.
const IDEMPOTENCY_KEY: &str = "idempotency-key";

/// An HTTP request submitted to a [`Pipeline`][crate::Pipeline].
///
/// Requests are immutable once built. Cloning shares the underlying parts, so retries and
/// backup requests replay the very same method, target, headers and body without copying.
///
/// # Examples
///
/// ```
/// use airbag::Request;
/// use http::Method;
/// use http::header::{ACCEPT, HeaderValue};
///
/// let request = Request::new(Method::PUT, "https://example.com/orders/7".parse().unwrap())
///     .header(ACCEPT, HeaderValue::from_static("application/json"))
///     .body("{\"state\":\"paid\"}");
///
/// assert!(request.is_idempotent());
/// assert_eq!(request.body_bytes().len(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    parts: Arc<Parts>,
}

#[derive(Debug, Clone)]
struct Parts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Creates a request without headers and with an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            parts: Arc::new(Parts {
                method,
                uri,
                headers: HeaderMap::new(),
                body: Bytes::new(),
            }),
        }
    }

    /// Appends a header value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        Arc::make_mut(&mut self.parts).headers.append(name, value);
        self
    }

    /// Replaces the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        Arc::make_mut(&mut self.parts).body = body.into();
        self
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// The request target.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// The request body. Cloning the returned bytes is cheap.
    #[must_use]
    pub fn body_bytes(&self) -> &Bytes {
        &self.parts.body
    }

    /// Returns `true` when executing this request more than once has the same effect as
    /// executing it once.
    ///
    /// `GET`, `HEAD`, `OPTIONS`, `TRACE`, `PUT` and `DELETE` are idempotent. Any other method is
    /// considered idempotent only when the request carries an `Idempotency-Key` header.
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        self.parts.method.is_idempotent() || self.parts.headers.contains_key(IDEMPOTENCY_KEY)
    }
}
