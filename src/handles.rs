// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! RAII wrappers for the libjxl decoder, encoder, and thread runner.

use std::ffi::c_void;

use jpegxl_sys::decode::{JxlDecoder, JxlDecoderCreate, JxlDecoderDestroy, JxlDecoderStatus};
use jpegxl_sys::encoder::encode::{
    JxlEncoder, JxlEncoderCreate, JxlEncoderDestroy, JxlEncoderStatus,
};
use jpegxl_sys::threads::resizable_parallel_runner::{
    JxlResizableParallelRunnerCreate, JxlResizableParallelRunnerDestroy,
    JxlResizableParallelRunnerSetThreads, JxlResizableParallelRunnerSuggestThreads,
};

use crate::error::{DecodeError, EncodeError};
use crate::types::{DecodeStatus, EncodeStatus};

/// Owned `JxlDecoder`, destroyed on drop.
pub(crate) struct DecoderHandle(*mut JxlDecoder);

impl DecoderHandle {
    pub(crate) fn new() -> Result<Self, DecodeError> {
        let ptr = unsafe { JxlDecoderCreate(std::ptr::null()) };
        if ptr.is_null() {
            return Err(DecodeError::new(DecodeStatus::OutOfMemory));
        }
        Ok(Self(ptr))
    }

    pub(crate) fn as_ptr(&self) -> *mut JxlDecoder {
        self.0
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        unsafe { JxlDecoderDestroy(self.0) };
    }
}

/// Owned `JxlEncoder`, destroyed on drop.
pub(crate) struct EncoderHandle(*mut JxlEncoder);

impl EncoderHandle {
    pub(crate) fn new() -> Result<Self, EncodeError> {
        let ptr = unsafe { JxlEncoderCreate(std::ptr::null()) };
        if ptr.is_null() {
            return Err(EncodeError::new(EncodeStatus::OutOfMemory));
        }
        Ok(Self(ptr))
    }

    pub(crate) fn as_ptr(&self) -> *mut JxlEncoder {
        self.0
    }
}

impl Drop for EncoderHandle {
    fn drop(&mut self) {
        unsafe { JxlEncoderDestroy(self.0) };
    }
}

/// Owned resizable parallel runner, sized for one image and destroyed
/// on drop.
pub(crate) struct RunnerHandle(*mut c_void);

impl RunnerHandle {
    /// Creates a runner with the thread count libjxl suggests for an
    /// image of the given dimensions. Returns `None` if creation
    /// fails; callers fall back to single-threaded operation.
    pub(crate) fn new(width: u64, height: u64) -> Option<Self> {
        let ptr = unsafe { JxlResizableParallelRunnerCreate(std::ptr::null()) };
        if ptr.is_null() {
            return None;
        }
        unsafe {
            let threads = JxlResizableParallelRunnerSuggestThreads(width, height);
            JxlResizableParallelRunnerSetThreads(ptr, threads as usize);
        }
        Some(Self(ptr))
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.0
    }
}

impl Drop for RunnerHandle {
    fn drop(&mut self) {
        unsafe { JxlResizableParallelRunnerDestroy(self.0) };
    }
}

/// Converts a decoder FFI status into a `DecodeError` naming the call
/// that failed.
pub(crate) fn dec_ok(status: JxlDecoderStatus, what: &str) -> Result<(), DecodeError> {
    if matches!(status, JxlDecoderStatus::Success) {
        Ok(())
    } else {
        Err(DecodeError::with_detail(
            DecodeStatus::DecodeError,
            format!("{what} failed."),
        ))
    }
}

/// Converts an encoder FFI status into an `EncodeError` naming the
/// call that failed.
pub(crate) fn enc_ok(status: JxlEncoderStatus, what: &str) -> Result<(), EncodeError> {
    if matches!(status, JxlEncoderStatus::Success) {
        Ok(())
    } else {
        Err(EncodeError::with_detail(
            EncodeStatus::EncodeError,
            format!("{what} failed."),
        ))
    }
}
