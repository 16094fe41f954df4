//   Copyright (c) 2024-2026 The Vessel Authors
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Error kinds shared across the store, wire, and handler layers.

use thiserror::Error;

/// The error kinds of the core, matching the classification a handler
/// maps onto a response: most are per-command error responses, protocol
/// errors are terminal for the connection.
#[derive(Debug, Error)]
pub enum VesselError {
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("no entity matched the requested scope")]
    NotFound,

    #[error("optimistic concurrency conflict: expected revision {expected}, found {actual}")]
    Conflict { expected: i64, actual: i64 },

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("store operation failed after {retries} retries: {source}")]
    RetryExhausted {
        retries: u32,
        #[source]
        source: Box<VesselError>,
    },

    #[error("transient store error: {0}")]
    Retryable(String),

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("handler error: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, VesselError>;

impl VesselError {
    /// Whether the underlying store signaled a condition that is worth
    /// retrying (deadlock, serialization failure).
    pub fn is_retryable(&self) -> bool {
        matches!(self, VesselError::Retryable(_))
    }

    /// Whether this error must terminate the connection rather than just
    /// fail the current command (§7).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VesselError::Protocol(_))
    }
}
