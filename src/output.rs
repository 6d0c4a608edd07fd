// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Streaming output sink for the encoder.
//!
//! The encoder drains its output through fixed-size scratch buffers
//! handed out by [`OutputSink`]. The sink forwards completed chunks to
//! the host writer, latches the first failure, and ticks the encode
//! progress band. Once a failure or cancellation is latched, no
//! further buffers are granted and the drain loop winds down.

use std::io::{ErrorKind, Seek, SeekFrom, Write};

use crate::encoder::ProgressFn;
use crate::types::EncodeStatus;

/// Upper bound on a single scratch buffer grant.
pub(crate) const MAX_BUFFER_SIZE: usize = 65536;

pub(crate) struct OutputSink<'a, 'p, W: Write + Seek> {
    writer: &'a mut W,
    scratch: Vec<u8>,
    status: EncodeStatus,
    progress: Option<&'a mut ProgressFn<'p>>,
    percent: u32,
    max_percent: u32,
    step: u32,
}

impl<'a, 'p, W: Write + Seek> OutputSink<'a, 'p, W> {
    /// Creates a sink that reports progress from `initial` up to (and
    /// capped at) `max_percent`, advancing by `step` per buffer grant.
    pub(crate) fn new(
        writer: &'a mut W,
        progress: Option<&'a mut ProgressFn<'p>>,
        initial: u32,
        max_percent: u32,
        step: u32,
    ) -> Self {
        Self {
            writer,
            scratch: Vec::new(),
            status: EncodeStatus::Ok,
            progress,
            percent: initial,
            max_percent,
            step,
        }
    }

    /// Hands out a scratch buffer of up to `suggested` bytes, or
    /// `None` once a failure is latched or the host cancels.
    pub(crate) fn get_buffer(&mut self, suggested: usize) -> Option<&mut [u8]> {
        if self.status != EncodeStatus::Ok {
            return None;
        }
        if let Some(progress) = self.progress.as_deref_mut() {
            if self.percent < self.max_percent {
                self.percent += self.step;
            }
            if !progress(self.percent) {
                self.status = EncodeStatus::UserCanceled;
                return None;
            }
        }
        let len = suggested.min(MAX_BUFFER_SIZE);
        if self.scratch.len() < len {
            let grow = len - self.scratch.len();
            if self.scratch.try_reserve_exact(grow).is_err() {
                self.status = EncodeStatus::OutOfMemory;
                return None;
            }
            self.scratch.resize(len, 0);
        }
        Some(&mut self.scratch[..len])
    }

    /// Flushes the first `written` bytes of the scratch buffer to the
    /// host writer.
    pub(crate) fn release_buffer(&mut self, written: usize) {
        if self.status != EncodeStatus::Ok || written == 0 {
            return;
        }
        if let Err(err) = self.writer.write_all(&self.scratch[..written]) {
            self.status = map_io_error(&err);
        }
    }

    /// Repositions the host writer. Kept for codec output contracts
    /// that reorder the container; unused by the linear drain loop.
    #[allow(dead_code)]
    pub(crate) fn seek(&mut self, position: u64) {
        if self.status != EncodeStatus::Ok {
            return;
        }
        if let Err(err) = self.writer.seek(SeekFrom::Start(position)) {
            self.status = map_io_error(&err);
        }
    }

    /// Notes that everything before `position` is final. Informational
    /// in the codec's output protocol; nothing to do for a linear
    /// writer.
    #[allow(dead_code)]
    pub(crate) fn set_finalized_position(&mut self, _position: u64) {}

    /// Latches cancellation, denying all further buffers.
    #[allow(dead_code)]
    pub(crate) fn cancel(&mut self) {
        if self.status == EncodeStatus::Ok {
            self.status = EncodeStatus::UserCanceled;
        }
    }

    /// The first failure observed, or `Ok`.
    pub(crate) fn status(&self) -> EncodeStatus {
        self.status
    }
}

pub(crate) fn map_io_error(err: &std::io::Error) -> EncodeStatus {
    if err.kind() == ErrorKind::OutOfMemory {
        EncodeStatus::OutOfMemory
    } else {
        EncodeStatus::WriteError
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
