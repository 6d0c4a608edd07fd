// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Encode driver.
//!
//! Owns the encode session end to end: classifies the host bitmap's
//! effective channel layout, configures the codec, attaches metadata
//! boxes, submits the converted pixel buffer as a single still frame,
//! and drains compressed output through the streaming sink. Progress
//! checkpoints run on the driving thread and any of them can cancel
//! the whole operation.

use std::ffi::c_char;
use std::io::{Seek, Write};
use std::mem::MaybeUninit;

use jpegxl_sys::common::types::{JxlBool, JxlBoxType, JxlDataType, JxlEndianness, JxlPixelFormat};
use jpegxl_sys::encoder::encode::{
    JxlEncoderAddBox, JxlEncoderAddImageFrame, JxlEncoderCloseBoxes, JxlEncoderCloseInput,
    JxlEncoderFrameSettingId, JxlEncoderFrameSettingsCreate, JxlEncoderFrameSettingsSetOption,
    JxlEncoderInitBasicInfo, JxlEncoderProcessOutput, JxlEncoderSetBasicInfo,
    JxlEncoderSetColorEncoding, JxlEncoderSetFrameDistance, JxlEncoderSetFrameLossless,
    JxlEncoderSetICCProfile, JxlEncoderSetParallelRunner, JxlEncoderStatus, JxlEncoderUseBoxes,
    JxlEncoderUseContainer,
};
use jpegxl_sys::metadata::codestream_header::JxlBasicInfo;
use jpegxl_sys::threads::resizable_parallel_runner::JxlResizableParallelRunner;

use crate::color::srgb_encoding;
use crate::conversions::{
    bgra_to_gray, bgra_to_gray_alpha, bgra_to_rgb, bgra_to_rgba, packed_buffer_len,
};
use crate::error::{try_vec, EncodeError, ErrorMessage};
use crate::handles::{enc_ok, EncoderHandle, RunnerHandle};
use crate::output::{map_io_error, OutputSink};
use crate::types::{BitmapView, EncodeMetadata, EncodeOptions, EncodeStatus, SampleFormat};

/// Progress callback. Receives a percentage and returns `true` to
/// continue or `false` to cancel.
pub type ProgressFn<'a> = dyn FnMut(u32) -> bool + 'a;

// ============================================================================
// Bitmap classification
// ============================================================================

/// Channel layout the codec input will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputPixelFormat {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl OutputPixelFormat {
    pub(crate) fn channels(self) -> u32 {
        match self {
            OutputPixelFormat::Gray => 1,
            OutputPixelFormat::GrayAlpha => 2,
            OutputPixelFormat::Rgb => 3,
            OutputPixelFormat::Rgba => 4,
        }
    }

    pub(crate) fn is_gray(self) -> bool {
        matches!(self, OutputPixelFormat::Gray | OutputPixelFormat::GrayAlpha)
    }

    pub(crate) fn has_alpha(self) -> bool {
        matches!(self, OutputPixelFormat::GrayAlpha | OutputPixelFormat::Rgba)
    }
}

/// Scans the bitmap and picks the narrowest codec layout that holds it
/// without loss.
///
/// A surface whose red, green, and blue channels agree everywhere is
/// encoded as gray, except when an ICC profile is attached; the
/// profile describes three-channel color, so collapsing the data would
/// change its meaning. Alpha is kept only if some pixel is not opaque.
pub(crate) fn classify_bitmap(bitmap: &BitmapView<'_>, has_icc: bool) -> OutputPixelFormat {
    let mut gray = !has_icc;
    let mut alpha = false;
    for y in 0..bitmap.height() as usize {
        for pixel in bitmap.row(y) {
            gray = gray && pixel.r == pixel.g && pixel.g == pixel.b;
            alpha = alpha || pixel.a < 255;
            if !gray && alpha {
                return OutputPixelFormat::Rgba;
            }
        }
    }
    match (gray, alpha) {
        (true, true) => OutputPixelFormat::GrayAlpha,
        (true, false) => OutputPixelFormat::Gray,
        (false, true) => OutputPixelFormat::Rgba,
        (false, false) => OutputPixelFormat::Rgb,
    }
}

// ============================================================================
// Encode driver
// ============================================================================

/// Encodes a BGRA8 surface as a JPEG XL still image, writing the
/// compressed stream to `output`.
///
/// Progress is reported as a non-decreasing percentage at fixed
/// checkpoints; returning `false` from any checkpoint aborts with
/// [`EncodeStatus::UserCanceled`] and stops all further writes. Detail
/// for failures is left in `error`.
pub fn encode_image<W: Write + Seek>(
    bitmap: &BitmapView<'_>,
    options: &EncodeOptions,
    metadata: &EncodeMetadata<'_>,
    output: &mut W,
    mut progress: Option<&mut ProgressFn<'_>>,
    error: &mut ErrorMessage,
) -> EncodeStatus {
    error.clear();
    match encode_inner(bitmap, options, metadata, output, &mut progress) {
        Ok(()) => EncodeStatus::Ok,
        Err(err) => {
            if let Some(detail) = err.detail() {
                error.set(detail);
            }
            err.status()
        }
    }
}

fn encode_inner<W: Write + Seek>(
    bitmap: &BitmapView<'_>,
    options: &EncodeOptions,
    metadata: &EncodeMetadata<'_>,
    output: &mut W,
    progress: &mut Option<&mut ProgressFn<'_>>,
) -> Result<(), EncodeError> {
    checkpoint(progress, 0)?;

    let exif = metadata.exif.filter(|b| !b.is_empty());
    let xmp = metadata.xmp.filter(|b| !b.is_empty());
    let icc = metadata.icc_profile.filter(|b| !b.is_empty());
    let format = classify_bitmap(bitmap, icc.is_some());
    tracing::debug!(
        width = bitmap.width(),
        height = bitmap.height(),
        ?format,
        distance = options.distance,
        effort = options.effort,
        lossless = options.lossless,
        "starting encode"
    );

    checkpoint(progress, 5)?;

    let encoder = EncoderHandle::new()?;
    let runner = RunnerHandle::new(bitmap.width() as u64, bitmap.height() as u64);
    if let Some(runner) = &runner {
        enc_ok(
            unsafe {
                JxlEncoderSetParallelRunner(
                    encoder.as_ptr(),
                    JxlResizableParallelRunner,
                    runner.as_ptr(),
                )
            },
            "JxlEncoderSetParallelRunner",
        )?;
    }

    // Metadata boxes force the container format; a bare codestream is
    // smaller when there are none.
    let use_container = exif.is_some() || xmp.is_some();
    tracing::debug!(use_container, "selected output format");
    enc_ok(
        unsafe { JxlEncoderUseContainer(encoder.as_ptr(), use_container.into()) },
        "JxlEncoderUseContainer",
    )?;
    if use_container {
        enc_ok(
            unsafe { JxlEncoderUseBoxes(encoder.as_ptr()) },
            "JxlEncoderUseBoxes",
        )?;
    }

    let mut basic_info = unsafe {
        let mut info = MaybeUninit::<JxlBasicInfo>::uninit();
        JxlEncoderInitBasicInfo(info.as_mut_ptr());
        info.assume_init()
    };
    basic_info.xsize = bitmap.width();
    basic_info.ysize = bitmap.height();
    basic_info.bits_per_sample = 8;
    basic_info.exponent_bits_per_sample = 0;
    basic_info.num_color_channels = if format.is_gray() { 1 } else { 3 };
    if format.has_alpha() {
        basic_info.num_extra_channels = 1;
        basic_info.alpha_bits = 8;
    }
    // Lossless must reproduce the input samples exactly, and ICC-tagged
    // data must not be re-expressed in another space.
    basic_info.uses_original_profile = if options.lossless || icc.is_some() {
        JxlBool::True
    } else {
        JxlBool::False
    };

    checkpoint(progress, 15)?;
    enc_ok(
        unsafe { JxlEncoderSetBasicInfo(encoder.as_ptr(), &basic_info) },
        "JxlEncoderSetBasicInfo",
    )?;

    checkpoint(progress, 20)?;
    if let Some(icc) = icc {
        enc_ok(
            unsafe { JxlEncoderSetICCProfile(encoder.as_ptr(), icc.as_ptr(), icc.len()) },
            "JxlEncoderSetICCProfile",
        )?;
    } else {
        let encoding = srgb_encoding(format.is_gray());
        enc_ok(
            unsafe { JxlEncoderSetColorEncoding(encoder.as_ptr(), &encoding) },
            "JxlEncoderSetColorEncoding",
        )?;
    }

    if let Some(exif) = exif {
        add_box(&encoder, *b"Exif", exif)?;
    }
    if let Some(xmp) = xmp {
        add_box(&encoder, *b"xml ", xmp)?;
    }
    if use_container {
        unsafe { JxlEncoderCloseBoxes(encoder.as_ptr()) };
    }

    checkpoint(progress, 25)?;
    let settings = unsafe { JxlEncoderFrameSettingsCreate(encoder.as_ptr(), std::ptr::null()) };
    if settings.is_null() {
        return Err(EncodeError::with_detail(
            EncodeStatus::EncodeError,
            "JxlEncoderFrameSettingsCreate failed.",
        ));
    }
    let distance = if options.lossless {
        0.0
    } else {
        options.distance
    };
    enc_ok(
        unsafe { JxlEncoderSetFrameDistance(settings, distance) },
        "JxlEncoderSetFrameDistance",
    )?;
    enc_ok(
        unsafe { JxlEncoderSetFrameLossless(settings, options.lossless.into()) },
        "JxlEncoderSetFrameLossless",
    )?;
    enc_ok(
        unsafe {
            JxlEncoderFrameSettingsSetOption(
                settings,
                JxlEncoderFrameSettingId::Effort,
                i64::from(options.effort),
            )
        },
        "JxlEncoderFrameSettingsSetOption",
    )?;

    checkpoint(progress, 30)?;
    let len = packed_buffer_len(
        bitmap.width(),
        bitmap.height(),
        format.channels(),
        SampleFormat::Uint8,
    )
    .ok_or_else(|| EncodeError::new(EncodeStatus::OutOfMemory))?;
    let mut pixels = try_vec(len)?;
    match format {
        OutputPixelFormat::Gray => bgra_to_gray(bitmap, &mut pixels),
        OutputPixelFormat::GrayAlpha => bgra_to_gray_alpha(bitmap, &mut pixels),
        OutputPixelFormat::Rgb => bgra_to_rgb(bitmap, &mut pixels),
        OutputPixelFormat::Rgba => bgra_to_rgba(bitmap, &mut pixels),
    }

    let pixel_format = JxlPixelFormat {
        num_channels: format.channels(),
        data_type: JxlDataType::Uint8,
        endianness: JxlEndianness::Native,
        align: 0,
    };
    enc_ok(
        unsafe {
            JxlEncoderAddImageFrame(
                settings,
                &pixel_format,
                pixels.as_ptr().cast(),
                pixels.len(),
            )
        },
        "JxlEncoderAddImageFrame",
    )?;
    unsafe { JxlEncoderCloseInput(encoder.as_ptr()) };

    let status = {
        let mut sink = OutputSink::new(output, progress.as_deref_mut(), 40, 90, 5);
        drain_output(&encoder, &mut sink)?;
        sink.status()
    };
    if status != EncodeStatus::Ok {
        return Err(EncodeError::new(status));
    }

    checkpoint(progress, 95)?;
    output
        .flush()
        .map_err(|err| EncodeError::new(map_io_error(&err)))?;
    tracing::debug!("encode complete");
    Ok(())
}

/// Pulls compressed output from the codec through the sink until the
/// codec reports completion or the sink stops granting buffers.
fn drain_output<W: Write + Seek>(
    encoder: &EncoderHandle,
    sink: &mut OutputSink<'_, '_, W>,
) -> Result<(), EncodeError> {
    let mut total = 0usize;
    loop {
        let Some(buf) = sink.get_buffer(crate::output::MAX_BUFFER_SIZE) else {
            // Latched failure or cancellation; the caller reads it off
            // the sink.
            return Ok(());
        };
        let granted = buf.len();
        let mut next_out = buf.as_mut_ptr();
        let mut avail_out = granted;
        let status =
            unsafe { JxlEncoderProcessOutput(encoder.as_ptr(), &mut next_out, &mut avail_out) };
        total += granted - avail_out;
        sink.release_buffer(granted - avail_out);
        match status {
            JxlEncoderStatus::Success => {
                tracing::debug!(bytes = total, "drained compressed output");
                return Ok(());
            }
            JxlEncoderStatus::NeedMoreOutput => {}
            _ => {
                return Err(EncodeError::with_detail(
                    EncodeStatus::EncodeError,
                    "JxlEncoderProcessOutput failed.",
                ));
            }
        }
    }
}

fn add_box(encoder: &EncoderHandle, kind: [u8; 4], contents: &[u8]) -> Result<(), EncodeError> {
    let box_type = JxlBoxType(kind.map(|b| b as c_char));
    enc_ok(
        unsafe {
            JxlEncoderAddBox(
                encoder.as_ptr(),
                &box_type,
                contents.as_ptr(),
                contents.len(),
                false.into(),
            )
        },
        "JxlEncoderAddBox",
    )?;
    Ok(())
}

/// Reports a progress checkpoint, translating a `false` return into
/// cancellation.
fn checkpoint(
    progress: &mut Option<&mut ProgressFn<'_>>,
    percent: u32,
) -> Result<(), EncodeError> {
    if let Some(progress) = progress.as_deref_mut() {
        tracing::trace!(percent, "progress checkpoint");
        if !progress(percent) {
            tracing::debug!(percent, "encode canceled");
            return Err(EncodeError::new(EncodeStatus::UserCanceled));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "encoder_tests.rs"]
mod tests;
