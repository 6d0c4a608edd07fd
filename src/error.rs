// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Error types and the host-visible error message slot.

use std::collections::TryReserveError;
use std::fmt;

use crate::types::{DecodeStatus, EncodeStatus};

/// Maximum UTF-8 byte length of a host-visible error message.
pub const MAX_ERROR_MESSAGE_LEN: usize = 255;

/// Fixed-capacity slot the host reads detail messages from.
///
/// Messages longer than [`MAX_ERROR_MESSAGE_LEN`] bytes are dropped
/// rather than truncated, so the slot never holds a partial sentence
/// or a torn UTF-8 sequence.
pub struct ErrorMessage {
    buf: [u8; MAX_ERROR_MESSAGE_LEN],
    len: usize,
}

impl ErrorMessage {
    /// Creates an empty message slot.
    pub fn new() -> Self {
        Self {
            buf: [0; MAX_ERROR_MESSAGE_LEN],
            len: 0,
        }
    }

    /// Stores `msg`, silently dropping it if it does not fit.
    pub fn set(&mut self, msg: &str) {
        let bytes = msg.as_bytes();
        if bytes.len() > MAX_ERROR_MESSAGE_LEN {
            self.len = 0;
            return;
        }
        self.buf[..bytes.len()].copy_from_slice(bytes);
        self.len = bytes.len();
    }

    /// The stored message, if any.
    pub fn message(&self) -> Option<&str> {
        if self.len == 0 {
            None
        } else {
            // set() only ever stores whole &str contents.
            std::str::from_utf8(&self.buf[..self.len]).ok()
        }
    }

    /// Empties the slot.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for ErrorMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMessage")
            .field("message", &self.message())
            .finish()
    }
}

/// Failure raised while decoding, carrying the host status code and an
/// optional human-readable detail.
#[derive(Debug, thiserror::Error)]
#[error("{}", .detail.as_deref().unwrap_or("decode failed"))]
pub struct DecodeError {
    status: DecodeStatus,
    detail: Option<String>,
}

impl DecodeError {
    /// A bare error with no detail message.
    pub fn new(status: DecodeStatus) -> Self {
        Self {
            status,
            detail: None,
        }
    }

    /// An error with a detail message for the host's error slot.
    pub fn with_detail(status: DecodeStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail.into()),
        }
    }

    /// The host status code.
    pub fn status(&self) -> DecodeStatus {
        self.status
    }

    /// The detail message, if one was attached.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl From<TryReserveError> for DecodeError {
    fn from(_: TryReserveError) -> Self {
        Self::new(DecodeStatus::OutOfMemory)
    }
}

/// Failure raised while encoding, carrying the host status code and an
/// optional human-readable detail.
#[derive(Debug, thiserror::Error)]
#[error("{}", .detail.as_deref().unwrap_or("encode failed"))]
pub struct EncodeError {
    status: EncodeStatus,
    detail: Option<String>,
}

impl EncodeError {
    /// A bare error with no detail message.
    pub fn new(status: EncodeStatus) -> Self {
        Self {
            status,
            detail: None,
        }
    }

    /// An error with a detail message for the host's error slot.
    pub fn with_detail(status: EncodeStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail.into()),
        }
    }

    /// The host status code.
    pub fn status(&self) -> EncodeStatus {
        self.status
    }

    /// The detail message, if one was attached.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl From<TryReserveError> for EncodeError {
    fn from(_: TryReserveError) -> Self {
        Self::new(EncodeStatus::OutOfMemory)
    }
}

/// Allocates a zeroed byte vector, reporting failure instead of
/// aborting. Pixel and metadata buffers are sized by untrusted input,
/// so allocation failure must surface as a status code.
pub(crate) fn try_vec(len: usize) -> Result<Vec<u8>, TryReserveError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
