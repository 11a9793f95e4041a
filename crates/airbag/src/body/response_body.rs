// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use super::{Consumption, Releasable};
use crate::Fault;

/// The payload of a [`Response`][crate::Response].
///
/// The body is a [`Stream`] of byte chunks. It tracks how far it was read and decides on
/// [`close`][Self::close] whether its connection is released or aborted, see the
/// [module documentation][crate::body].
pub struct ResponseBody {
    stream: Option<BoxStream<'static, io::Result<Bytes>>>,
    connection: Option<Box<dyn Releasable>>,
    consumption: Consumption,
    closed: bool,
    read_failed: bool,
}

impl ResponseBody {
    /// Creates a body read from `stream` over `connection`.
    pub fn new<S, R>(stream: S, connection: R) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
        R: Releasable + 'static,
    {
        let mut body = Self::from_stream(stream);
        body.connection = Some(Box::new(connection));
        body
    }

    /// Creates a body that is not backed by a connection.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: Some(stream.boxed()),
            connection: None,
            consumption: Consumption::Unread,
            closed: false,
            read_failed: false,
        }
    }

    /// Creates an in-memory body holding `bytes`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::from_stream(stream::iter([Ok(bytes.into())]))
    }

    /// Creates a body without content.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }

    /// How much of the body was read so far.
    #[must_use]
    pub fn consumption(&self) -> Consumption {
        self.consumption
    }

    /// Returns `true` once [`close`][Self::close] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads the rest of the body and closes it.
    ///
    /// # Errors
    ///
    /// Returns a [`FaultKind::NonTransient`][crate::FaultKind::NonTransient] fault when reading
    /// fails, in which case the connection is aborted. Returns a
    /// [`FaultKind::Lifecycle`][crate::FaultKind::Lifecycle] fault when the connection cannot be
    /// released after a successful read.
    pub async fn collect(mut self) -> Result<Bytes, Fault> {
        let mut buffer = BytesMut::new();

        while let Some(chunk) = self.next().await {
            match chunk {
                Ok(chunk) => buffer.extend_from_slice(&chunk),
                Err(error) => {
                    self.close()?;
                    return Err(Fault::transport(error));
                }
            }
        }

        self.close()?;
        Ok(buffer.freeze())
    }

    /// Closes the body: releases the connection if the body was fully read, aborts it otherwise.
    ///
    /// The underlying stream is dropped in every case. Calling `close` again does nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`FaultKind::Lifecycle`][crate::FaultKind::Lifecycle] fault when releasing or
    /// aborting the connection fails. If reading the body already failed, the lifecycle failure
    /// is logged and `Ok(())` is returned so the read error stays the one the caller sees.
    pub fn close(&mut self) -> Result<(), Fault> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        let _stream = self.stream.take();

        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        let result = if self.consumption == Consumption::Consumed {
            connection.release()
        } else {
            connection.abort()
        };

        match result {
            Ok(()) => Ok(()),
            Err(error) if self.read_failed => {
                log_suppressed(&error, self.consumption);
                Ok(())
            }
            Err(error) => Err(Fault::lifecycle(error)),
        }
    }

    pub(crate) fn map_connection(&mut self, map: impl FnOnce(Box<dyn Releasable>) -> Box<dyn Releasable>) {
        if let Some(connection) = self.connection.take() {
            self.connection = Some(map(connection));
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Stream for ResponseBody {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let Some(stream) = this.stream.as_mut() else {
            return Poll::Ready(None);
        };

        match stream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.consumption = Consumption::Partial;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(error))) => {
                this.consumption = Consumption::Partial;
                this.read_failed = true;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                if !this.read_failed {
                    this.consumption = Consumption::Consumed;
                }
                this.stream = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        if let Err(fault) = self.close() {
            log_dropped(&fault);
        }
    }
}

impl Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody")
            .field("consumption", &self.consumption)
            .field("closed", &self.closed)
            .field("connection", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg_attr(
    not(any(feature = "logs", test)),
    expect(unused_variables, reason = "unused when logs feature not used")
)]
fn log_suppressed(error: &io::Error, consumption: Consumption) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: "airbag.body.suppressed",
        tracing::Level::WARN,
        body.consumption = consumption.as_str(),
        error = %error,
        "connection cleanup failed after a read error"
    );
}

#[cfg_attr(
    not(any(feature = "logs", test)),
    expect(unused_variables, reason = "unused when logs feature not used")
)]
fn log_dropped(fault: &Fault) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: "airbag.body.dropped",
        tracing::Level::WARN,
        error = %fault,
        "connection cleanup failed while dropping an unclosed body"
    );
}
