// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Response bodies and the lifecycle of the connections behind them.
//!
//! A [`ResponseBody`] streams the payload of a response and owns the [`Releasable`] handle of the
//! connection it was read from. Closing the body ends the connection in one of two ways:
//!
//! - **release**: the body was read to its natural end, the connection is clean and can be
//!   returned to the pool.
//! - **abort**: the body was not read, or only partially. The remaining bytes are never drained;
//!   the connection is discarded instead.
//!
//! Exactly one of the two happens per body, no matter how often [`ResponseBody::close`] is
//! called. Dropping an unclosed body closes it.
//!
//! # Examples
//!
//! ```
//! # async fn example() -> Result<(), airbag::Fault> {
//! use airbag::ResponseBody;
//!
//! let body = ResponseBody::from_bytes("hello");
//! assert_eq!(body.collect().await?, "hello");
//! # Ok(())
//! # }
//! ```

mod releasable;
mod response_body;

pub use releasable::{Consumption, Releasable};
pub use response_body::ResponseBody;
