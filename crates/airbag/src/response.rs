// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use http::StatusCode;
use http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};

use crate::{Recovery, RecoveryInfo, ResponseBody};

/// An HTTP response produced by the transport.
///
/// The response owns its [`ResponseBody`] and therefore the connection the body is read from.
/// Dropping a response without reading its body aborts that connection.
///
/// # Examples
///
/// ```
/// use airbag::{Recovery, RecoveryKind, Response, ResponseBody};
/// use http::StatusCode;
/// use http::header::{HeaderValue, RETRY_AFTER};
///
/// let response = Response::new(StatusCode::SERVICE_UNAVAILABLE)
///     .header(RETRY_AFTER, HeaderValue::from_static("5"))
///     .body(ResponseBody::from_bytes("try later"));
///
/// assert_eq!(response.retry_after(), Some("5"));
/// assert_eq!(response.recovery().kind(), RecoveryKind::Retry);
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Response {
    /// Creates a response with the given status, no headers and an empty body.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::empty(),
        }
    }

    /// Appends a header value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    /// The response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Mutable access to the body, for example to read it as a stream.
    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    /// Takes the body out of the response.
    #[must_use]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// The raw value of the `Retry-After` header, if present and valid ASCII.
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get(RETRY_AFTER)?.to_str().ok()
    }
}

impl Recovery for Response {
    /// `429 Too Many Requests`, `502 Bad Gateway`, `503 Service Unavailable` and
    /// `504 Gateway Timeout` are retryable. Every other status is final.
    fn recovery(&self) -> RecoveryInfo {
        match self.status {
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => RecoveryInfo::retry(),
            _ => RecoveryInfo::never(),
        }
    }
}
