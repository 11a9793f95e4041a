// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::io;

/// The connection a response body is read from.
///
/// Implemented by transports. [`ResponseBody`][super::ResponseBody] calls exactly one of the two
/// methods, once.
pub trait Releasable: Send {
    /// Returns the connection to its pool. Called after the body was fully read.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be returned.
    fn release(&mut self) -> io::Result<()>;

    /// Discards the connection without reading the rest of the body.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be shut down cleanly.
    fn abort(&mut self) -> io::Result<()>;
}

impl<R: Releasable + ?Sized> Releasable for Box<R> {
    fn release(&mut self) -> io::Result<()> {
        (**self).release()
    }

    fn abort(&mut self) -> io::Result<()> {
        (**self).abort()
    }
}

/// How much of a response body was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Consumption {
    /// Nothing was read yet.
    #[default]
    Unread,

    /// Some data was read, or reading failed.
    Partial,

    /// The body was read to its natural end.
    Consumed,
}

impl Consumption {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Partial => "partial",
            Self::Consumed => "consumed",
        }
    }
}

impl Display for Consumption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
