// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Decode driver.
//!
//! Drives the codec's event-driven decode state machine over a fully
//! buffered input and delivers results to the host through the
//! [`DecodeHost`] callbacks. The driver makes two passes: the first
//! resolves geometry, color profile, and metadata boxes; the second
//! resets the session and extracts pixel data. Interleaving box and
//! image events in a single pass would need extra buffering, so one
//! more linear scan of the input buys simpler state.

use std::ffi::{c_char, c_void};
use std::mem::MaybeUninit;

use jpegxl_sys::color::color_encoding::{JxlColorEncoding, JxlColorSpace};
use jpegxl_sys::common::types::{JxlBool, JxlBoxType, JxlDataType, JxlEndianness, JxlPixelFormat};
use jpegxl_sys::decode::{
    JxlColorProfileTarget, JxlDecoder, JxlDecoderCloseInput, JxlDecoderExtraChannelBufferSize,
    JxlDecoderGetBasicInfo, JxlDecoderGetBoxType, JxlDecoderGetColorAsEncodedProfile,
    JxlDecoderGetColorAsICCProfile, JxlDecoderGetExtraChannelInfo, JxlDecoderGetFrameHeader,
    JxlDecoderGetFrameName, JxlDecoderGetICCProfileSize, JxlDecoderImageOutBufferSize,
    JxlDecoderProcessInput, JxlDecoderReleaseBoxBuffer, JxlDecoderReset, JxlDecoderSetBoxBuffer,
    JxlDecoderSetCms, JxlDecoderSetDecompressBoxes, JxlDecoderSetExtraChannelBuffer,
    JxlDecoderSetImageOutBuffer, JxlDecoderSetInput, JxlDecoderSetOutputColorProfile,
    JxlDecoderSetParallelRunner, JxlDecoderSetPreferredColorProfile, JxlDecoderStatus,
    JxlDecoderSubscribeEvents, JxlSignature, JxlSignatureCheck,
};
use jpegxl_sys::metadata::codestream_header::{
    JxlBasicInfo, JxlExtraChannelInfo, JxlExtraChannelType, JxlFrameHeader,
};
use jpegxl_sys::threads::resizable_parallel_runner::JxlResizableParallelRunner;

use crate::color::{classify_color_encoding, srgb_encoding};
use crate::conversions::{assemble_cmyk, assemble_cmyk16, packed_buffer_len};
use crate::error::{try_vec, DecodeError, ErrorMessage};
use crate::handles::{dec_ok, DecoderHandle, RunnerHandle};
use crate::types::{
    DecodeStatus, ImageInfo, ImageLayout, KnownColorProfile, SampleFormat, SignatureKind,
};

/// Growth increment for metadata box accumulation.
const BOX_CHUNK: usize = 65536;

/// Callbacks through which decode results reach the host.
///
/// The boolean-returning callbacks report whether the host accepted
/// the data; a `false` return aborts the decode with a metadata or
/// layer creation error.
pub trait DecodeHost {
    /// Receives the resolved image descriptor before any pixel data.
    fn set_basic_info(&mut self, info: &ImageInfo);

    /// Receives a standard profile tag the host can synthesize itself.
    fn set_known_color_profile(&mut self, profile: KnownColorProfile) -> bool;

    /// Receives an ICC profile as opaque bytes.
    fn set_icc_profile(&mut self, icc: &[u8]) -> bool;

    /// Receives the contents of an `Exif` box.
    fn set_exif(&mut self, exif: &[u8]) -> bool;

    /// Receives the contents of an `xml ` box.
    fn set_xmp(&mut self, xmp: &[u8]) -> bool;

    /// Receives the decoded pixels, packed per the reported descriptor,
    /// together with the frame name if the codestream carries one.
    fn set_layer_data(&mut self, pixels: &[u8], name: Option<&str>) -> bool;
}

/// Sniffs the leading bytes for the JPEG XL signatures.
pub fn check_signature(data: &[u8]) -> SignatureKind {
    match unsafe { JxlSignatureCheck(data.as_ptr(), data.len()) } {
        JxlSignature::NotEnoughBytes => SignatureKind::NotEnoughBytes,
        JxlSignature::Invalid => SignatureKind::Invalid,
        JxlSignature::Codestream => SignatureKind::Codestream,
        JxlSignature::Container => SignatureKind::Container,
    }
}

/// Decodes a JPEG XL still image, delivering results through `host`.
///
/// The input must be the complete file contents. Detail for failures
/// is left in `error`.
pub fn decode_image<H: DecodeHost>(
    data: &[u8],
    host: &mut H,
    error: &mut ErrorMessage,
) -> DecodeStatus {
    error.clear();
    let container = match check_signature(data) {
        SignatureKind::Codestream => false,
        SignatureKind::Container => true,
        SignatureKind::Invalid | SignatureKind::NotEnoughBytes => {
            return DecodeStatus::InvalidFileSignature;
        }
    };
    match decode_inner(data, container, host) {
        Ok(()) => DecodeStatus::Ok,
        Err(err) => {
            if let Some(detail) = err.detail() {
                error.set(detail);
            }
            err.status()
        }
    }
}

fn decode_inner<H: DecodeHost>(
    data: &[u8],
    container: bool,
    host: &mut H,
) -> Result<(), DecodeError> {
    tracing::debug!(len = data.len(), container, "starting decode");
    let mut session = DecodeSession::new(data)?;
    let (resolved, output_space) = metadata_pass(&mut session, container, host)?;
    pixel_pass(&mut session, &resolved, &output_space, host)?;
    tracing::debug!("decode complete");
    Ok(())
}

// ============================================================================
// Session
// ============================================================================

/// One decode session: the codec handle, its optional worker pool, and
/// the input it reads from.
struct DecodeSession<'a> {
    decoder: DecoderHandle,
    runner: Option<RunnerHandle>,
    input: &'a [u8],
}

impl<'a> DecodeSession<'a> {
    fn new(input: &'a [u8]) -> Result<Self, DecodeError> {
        let decoder = DecoderHandle::new()?;
        let session = Self {
            decoder,
            runner: None,
            input,
        };
        session.set_input()?;
        Ok(session)
    }

    fn set_input(&self) -> Result<(), DecodeError> {
        dec_ok(
            unsafe {
                JxlDecoderSetInput(
                    self.decoder.as_ptr(),
                    self.input.as_ptr(),
                    self.input.len(),
                )
            },
            "JxlDecoderSetInput",
        )?;
        // The whole file is buffered; no more input will follow.
        unsafe { JxlDecoderCloseInput(self.decoder.as_ptr()) };
        Ok(())
    }

    /// Rewinds the session for the pixel pass.
    fn reset(&mut self) -> Result<(), DecodeError> {
        unsafe { JxlDecoderReset(self.decoder.as_ptr()) };
        self.runner = None;
        self.set_input()
    }

    fn subscribe(&self, events: i32) -> Result<(), DecodeError> {
        dec_ok(
            unsafe { JxlDecoderSubscribeEvents(self.decoder.as_ptr(), events) },
            "JxlDecoderSubscribeEvents",
        )
    }

    /// Attaches a worker pool sized for the image area. Runner
    /// creation failure degrades to single-threaded decoding.
    fn attach_runner(&mut self, width: u64, height: u64) -> Result<(), DecodeError> {
        let Some(runner) = RunnerHandle::new(width, height) else {
            return Ok(());
        };
        dec_ok(
            unsafe {
                JxlDecoderSetParallelRunner(
                    self.decoder.as_ptr(),
                    JxlResizableParallelRunner,
                    runner.as_ptr(),
                )
            },
            "JxlDecoderSetParallelRunner",
        )?;
        self.runner = Some(runner);
        Ok(())
    }
}

// ============================================================================
// Image info resolution
// ============================================================================

/// Image descriptor plus the codec-side layout decisions derived from
/// basic info.
#[derive(Debug)]
struct ResolvedImage {
    info: ImageInfo,
    /// Interleaved channel count of the color buffer (color + alpha).
    channel_count: u32,
    /// Extra channel index of the CMYK black channel.
    black_channel_index: Option<u32>,
}

/// Validates basic info against what the host can represent and
/// derives the channel layout and sample format.
fn resolve_image_info(
    basic: &JxlBasicInfo,
    extra: &[JxlExtraChannelInfo],
) -> Result<ResolvedImage, DecodeError> {
    if basic.xsize > i32::MAX as u32 || basic.ysize > i32::MAX as u32 {
        return Err(DecodeError::new(DecodeStatus::ImageDimensionExceedsInt32));
    }
    if matches!(basic.have_animation, JxlBool::True) {
        return Err(DecodeError::new(DecodeStatus::HasAnimation));
    }
    if basic.num_color_channels != 1 && basic.num_color_channels != 3 {
        return Err(DecodeError::new(DecodeStatus::UnsupportedChannelFormat));
    }

    let mut alpha_count = 0u32;
    let mut black_channel_index = None;
    for (index, channel) in extra.iter().enumerate() {
        match channel.r#type {
            JxlExtraChannelType::Alpha => alpha_count += 1,
            JxlExtraChannelType::Black => {
                if black_channel_index.is_some() {
                    return Err(DecodeError::new(DecodeStatus::UnsupportedChannelFormat));
                }
                black_channel_index = Some(index as u32);
            }
            _ => {}
        }
    }
    if alpha_count > 1 {
        return Err(DecodeError::new(DecodeStatus::UnsupportedChannelFormat));
    }

    let layout = if basic.num_color_channels == 1 {
        ImageLayout::Gray
    } else if black_channel_index.is_some() {
        ImageLayout::Cmyk
    } else {
        ImageLayout::Rgb
    };

    let is_float = basic.exponent_bits_per_sample > 0;
    let sample_format = if is_float {
        if layout == ImageLayout::Cmyk {
            return Err(DecodeError::new(DecodeStatus::UnsupportedChannelFormat));
        }
        match basic.bits_per_sample {
            1..=16 => SampleFormat::Float16,
            17..=32 => SampleFormat::Float32,
            _ => {
                return Err(DecodeError::with_detail(
                    DecodeStatus::DecodeError,
                    "Unsupported floating point bit depth.",
                ));
            }
        }
    } else {
        match basic.bits_per_sample {
            1..=8 => SampleFormat::Uint8,
            9..=16 => {
                if layout == ImageLayout::Cmyk {
                    return Err(DecodeError::new(DecodeStatus::UnsupportedChannelFormat));
                }
                SampleFormat::Uint16
            }
            _ => {
                return Err(DecodeError::with_detail(
                    DecodeStatus::DecodeError,
                    "Unsupported integer bit depth.",
                ));
            }
        }
    };

    let has_transparency = alpha_count > 0;
    Ok(ResolvedImage {
        info: ImageInfo {
            width: basic.xsize as i32,
            height: basic.ysize as i32,
            layout,
            sample_format,
            has_transparency,
        },
        channel_count: basic.num_color_channels + u32::from(has_transparency),
        black_channel_index,
    })
}

// ============================================================================
// Metadata pass
// ============================================================================

/// How the pixel pass should re-target the codec's decoded output.
enum OutputColorSpace {
    /// Prefer a structured encoding.
    Encoded(JxlColorEncoding),
    /// Let the codec convert into an ICC-described space.
    Icc(Vec<u8>),
}

/// Which accumulating metadata box is currently bound to the decoder.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CurrentBox {
    None,
    Exif,
    Xmp,
}

/// Growable accumulator for a metadata box of unknown length.
///
/// The decoder writes into `buf[offset..]`; on each grow the consumed
/// prefix advances by however much of the previous grant was used.
struct BoxAccumulator {
    buf: Vec<u8>,
    offset: usize,
}

impl BoxAccumulator {
    fn new() -> Result<Self, DecodeError> {
        Ok(Self {
            buf: try_vec(BOX_CHUNK)?,
            offset: 0,
        })
    }

    /// The writable tail handed to the decoder.
    fn chunk(&mut self) -> &mut [u8] {
        &mut self.buf[self.offset..]
    }

    /// Accounts for a filled grant (`remaining` bytes of it unused)
    /// and makes room for the next chunk.
    fn grow(&mut self, remaining: usize) -> Result<(), DecodeError> {
        let granted = self.buf.len() - self.offset;
        self.offset += granted - remaining;
        let needed = self.offset + BOX_CHUNK;
        if self.buf.len() < needed {
            self.buf.try_reserve_exact(needed - self.buf.len())?;
            self.buf.resize(needed, 0);
        }
        Ok(())
    }

    /// Finalizes the box, trimming the unused tail of the last grant.
    fn finish(mut self, remaining: usize) -> Vec<u8> {
        let total = self.buf.len() - remaining;
        self.buf.truncate(total);
        self.buf
    }
}

/// First pass: resolves the image descriptor, negotiates the output
/// color profile, and collects metadata boxes.
fn metadata_pass<H: DecodeHost>(
    session: &mut DecodeSession<'_>,
    container: bool,
    host: &mut H,
) -> Result<(ResolvedImage, OutputColorSpace), DecodeError> {
    let mut events =
        JxlDecoderStatus::BasicInfo as i32 | JxlDecoderStatus::ColorEncoding as i32;
    // Brotli-wrapped brob boxes are unwrapped when the codec supports
    // it; if not, their raw types simply never match Exif or xml.
    let mut decompress = JxlBool::False;
    if container {
        events |= JxlDecoderStatus::Box as i32 | JxlDecoderStatus::BoxComplete as i32;
        if matches!(
            unsafe { JxlDecoderSetDecompressBoxes(session.decoder.as_ptr(), JxlBool::True) },
            JxlDecoderStatus::Success
        ) {
            decompress = JxlBool::True;
        }
    }
    session.subscribe(events)?;

    let dec = session.decoder.as_ptr();
    let mut resolved: Option<ResolvedImage> = None;
    let mut output_space: Option<OutputColorSpace> = None;
    let mut exif_taken = false;
    let mut current_box = CurrentBox::None;
    let mut accumulator: Option<BoxAccumulator> = None;

    loop {
        match unsafe { JxlDecoderProcessInput(dec) } {
            JxlDecoderStatus::BasicInfo => {
                let (basic, extra) = read_basic_info(dec)?;
                let image = resolve_image_info(&basic, &extra)?;
                tracing::debug!(
                    width = image.info.width,
                    height = image.info.height,
                    layout = ?image.info.layout,
                    sample_format = ?image.info.sample_format,
                    "resolved image info"
                );
                host.set_basic_info(&image.info);
                resolved = Some(image);
            }
            JxlDecoderStatus::ColorEncoding => {
                let space = negotiate_output_space(dec)?;
                report_color_profile(dec, host)?;
                output_space = Some(space);
            }
            JxlDecoderStatus::Box => {
                // Finish never overlaps a new box; the decoder emits
                // BoxComplete for buffered boxes before the next Box.
                let kind = read_box_type(dec, decompress)?;
                current_box = match &kind {
                    b"Exif" if !exif_taken => CurrentBox::Exif,
                    b"xml " => CurrentBox::Xmp,
                    _ => CurrentBox::None,
                };
                if current_box != CurrentBox::None {
                    tracing::debug!(
                        kind = %String::from_utf8_lossy(&kind),
                        "accumulating metadata box"
                    );
                    let mut acc = BoxAccumulator::new()?;
                    set_box_buffer(dec, acc.chunk())?;
                    accumulator = Some(acc);
                }
            }
            JxlDecoderStatus::BoxNeedMoreOutput => {
                let Some(acc) = accumulator.as_mut() else {
                    return Err(DecodeError::with_detail(
                        DecodeStatus::DecodeError,
                        "Box output requested with no box buffer bound.",
                    ));
                };
                let remaining = unsafe { JxlDecoderReleaseBoxBuffer(dec) };
                acc.grow(remaining)?;
                set_box_buffer(dec, acc.chunk())?;
            }
            JxlDecoderStatus::BoxComplete => {
                let Some(acc) = accumulator.take() else {
                    continue;
                };
                let remaining = unsafe { JxlDecoderReleaseBoxBuffer(dec) };
                let bytes = acc.finish(remaining);
                let accepted = match current_box {
                    CurrentBox::Exif => {
                        exif_taken = true;
                        tracing::debug!(len = bytes.len(), "collected Exif box");
                        host.set_exif(&bytes)
                    }
                    CurrentBox::Xmp => {
                        tracing::debug!(len = bytes.len(), "collected xml box");
                        host.set_xmp(&bytes)
                    }
                    CurrentBox::None => true,
                };
                current_box = CurrentBox::None;
                if !accepted {
                    return Err(DecodeError::new(DecodeStatus::CreateMetadataError));
                }
            }
            JxlDecoderStatus::Success => break,
            JxlDecoderStatus::NeedMoreInput => {
                return Err(DecodeError::with_detail(
                    DecodeStatus::DecodeError,
                    "Input is truncated.",
                ));
            }
            _ => {
                return Err(DecodeError::with_detail(
                    DecodeStatus::DecodeError,
                    "JxlDecoderProcessInput failed.",
                ));
            }
        }
    }

    let resolved = resolved.ok_or_else(|| {
        DecodeError::with_detail(DecodeStatus::DecodeError, "No basic info in codestream.")
    })?;
    let output_space = output_space.ok_or_else(|| {
        DecodeError::with_detail(DecodeStatus::DecodeError, "No color encoding in codestream.")
    })?;
    Ok((resolved, output_space))
}

fn read_basic_info(
    dec: *mut JxlDecoder,
) -> Result<(JxlBasicInfo, Vec<JxlExtraChannelInfo>), DecodeError> {
    let basic = unsafe {
        let mut info = MaybeUninit::<JxlBasicInfo>::uninit();
        dec_ok(
            JxlDecoderGetBasicInfo(dec, info.as_mut_ptr()),
            "JxlDecoderGetBasicInfo",
        )?;
        info.assume_init()
    };
    let mut extra = Vec::new();
    for index in 0..basic.num_extra_channels as usize {
        let channel = unsafe {
            let mut info = MaybeUninit::<JxlExtraChannelInfo>::uninit();
            dec_ok(
                JxlDecoderGetExtraChannelInfo(dec, index, info.as_mut_ptr()),
                "JxlDecoderGetExtraChannelInfo",
            )?;
            info.assume_init()
        };
        extra.push(channel);
    }
    Ok((basic, extra))
}

fn read_box_type(dec: *mut JxlDecoder, decompressed: JxlBool) -> Result<[u8; 4], DecodeError> {
    let mut box_type = JxlBoxType([0; 4]);
    dec_ok(
        unsafe { JxlDecoderGetBoxType(dec, &mut box_type, decompressed) },
        "JxlDecoderGetBoxType",
    )?;
    Ok(box_type.0.map(|c| c as u8))
}

fn set_box_buffer(
    dec: *mut JxlDecoder,
    chunk: &mut [u8],
) -> Result<(), DecodeError> {
    dec_ok(
        unsafe { JxlDecoderSetBoxBuffer(dec, chunk.as_mut_ptr(), chunk.len()) },
        "JxlDecoderSetBoxBuffer",
    )
}

// ============================================================================
// Color profile negotiation
// ============================================================================

/// Decides the color space the codec should decode into.
///
/// If the original data carries a structured encoding, output is
/// re-targeted to it; should the resulting output profile not be
/// readable back, plain sRGB (or sGray) is requested instead. An
/// ICC-only original is handed to the codec's color management so the
/// conversion happens internally.
fn negotiate_output_space(
    dec: *mut JxlDecoder,
) -> Result<OutputColorSpace, DecodeError> {
    if let Some(original) = encoded_profile(dec, JxlColorProfileTarget::Original) {
        let mut chosen = original;
        if apply_preferred(dec, &chosen).is_err()
            || encoded_profile(dec, JxlColorProfileTarget::Data).is_none()
        {
            tracing::warn!("original color profile not usable for output, falling back to sRGB");
            chosen = srgb_encoding(matches!(chosen.color_space, JxlColorSpace::Gray));
            apply_preferred(dec, &chosen)?;
        }
        return Ok(OutputColorSpace::Encoded(chosen));
    }

    let icc = read_icc(dec, JxlColorProfileTarget::Original)?;
    apply_output_icc(dec, &icc)?;
    Ok(OutputColorSpace::Icc(icc))
}

/// Reads the output-target profile and reports it to the host, as a
/// well-known tag when it classifies, else as ICC bytes. A zero-length
/// ICC profile is not reported at all.
fn report_color_profile<H: DecodeHost>(
    dec: *mut JxlDecoder,
    host: &mut H,
) -> Result<(), DecodeError> {
    if let Some(encoding) = encoded_profile(dec, JxlColorProfileTarget::Data) {
        if let Some(profile) = classify_color_encoding(&encoding) {
            tracing::debug!(?profile, "reporting well-known color profile");
            if !host.set_known_color_profile(profile) {
                return Err(DecodeError::new(DecodeStatus::CreateMetadataError));
            }
            return Ok(());
        }
        tracing::warn!("output color encoding has no well-known match, reporting ICC");
    }
    let icc = read_icc(dec, JxlColorProfileTarget::Data)?;
    if icc.is_empty() {
        return Ok(());
    }
    tracing::debug!(len = icc.len(), "reporting ICC color profile");
    if !host.set_icc_profile(&icc) {
        return Err(DecodeError::new(DecodeStatus::CreateMetadataError));
    }
    Ok(())
}

fn encoded_profile(
    dec: *mut JxlDecoder,
    target: JxlColorProfileTarget,
) -> Option<JxlColorEncoding> {
    let mut encoding = MaybeUninit::<JxlColorEncoding>::uninit();
    let status = unsafe { JxlDecoderGetColorAsEncodedProfile(dec, target, encoding.as_mut_ptr()) };
    if matches!(status, JxlDecoderStatus::Success) {
        Some(unsafe { encoding.assume_init() })
    } else {
        None
    }
}

fn apply_preferred(
    dec: *mut JxlDecoder,
    encoding: &JxlColorEncoding,
) -> Result<(), DecodeError> {
    dec_ok(
        unsafe { JxlDecoderSetPreferredColorProfile(dec, encoding) },
        "JxlDecoderSetPreferredColorProfile",
    )
}

fn apply_output_icc(
    dec: *mut JxlDecoder,
    icc: &[u8],
) -> Result<(), DecodeError> {
    unsafe {
        JxlDecoderSetCms(dec, (*jpegxl_sys::color::cms::JxlGetDefaultCms()).clone());
    }
    dec_ok(
        unsafe {
            JxlDecoderSetOutputColorProfile(dec, std::ptr::null(), icc.as_ptr(), icc.len())
        },
        "JxlDecoderSetOutputColorProfile",
    )
}

fn read_icc(
    dec: *mut JxlDecoder,
    target: JxlColorProfileTarget,
) -> Result<Vec<u8>, DecodeError> {
    let mut size = 0usize;
    let status = unsafe { JxlDecoderGetICCProfileSize(dec, target, &mut size) };
    if !matches!(status, JxlDecoderStatus::Success) {
        return Err(DecodeError::with_detail(
            DecodeStatus::MetadataError,
            "JxlDecoderGetICCProfileSize failed.",
        ));
    }
    if size == 0 {
        return Ok(Vec::new());
    }
    let mut icc = try_vec(size)?;
    let status = unsafe { JxlDecoderGetColorAsICCProfile(dec, target, icc.as_mut_ptr(), size) };
    if !matches!(status, JxlDecoderStatus::Success) {
        return Err(DecodeError::with_detail(
            DecodeStatus::MetadataError,
            "JxlDecoderGetColorAsICCProfile failed.",
        ));
    }
    Ok(icc)
}

// ============================================================================
// Pixel pass
// ============================================================================

/// Frame delivery bookkeeping for the pixel pass.
///
/// The host contract is a single still frame; the stream is rejected
/// as soon as the codec announces a second frame or a second composed
/// image.
#[derive(Default)]
struct FrameTally {
    frame_seen: bool,
    image_delivered: bool,
}

impl FrameTally {
    fn note_frame(&mut self) -> Result<(), DecodeError> {
        if self.frame_seen {
            return Err(DecodeError::new(DecodeStatus::HasMultipleFrames));
        }
        self.frame_seen = true;
        Ok(())
    }

    fn note_image(&mut self) -> Result<(), DecodeError> {
        if self.image_delivered {
            return Err(DecodeError::new(DecodeStatus::HasMultipleFrames));
        }
        self.image_delivered = true;
        Ok(())
    }
}

/// Second pass: resets the session and extracts the single still frame.
fn pixel_pass<H: DecodeHost>(
    session: &mut DecodeSession<'_>,
    resolved: &ResolvedImage,
    output_space: &OutputColorSpace,
    host: &mut H,
) -> Result<(), DecodeError> {
    tracing::debug!("starting pixel pass");
    session.reset()?;
    // ColorEncoding is subscribed again so the pass-one output profile
    // decision can be re-applied; the reset discarded it.
    session.subscribe(
        JxlDecoderStatus::ColorEncoding as i32
            | JxlDecoderStatus::Frame as i32
            | JxlDecoderStatus::FullImage as i32,
    )?;
    session.attach_runner(resolved.info.width as u64, resolved.info.height as u64)?;

    let dec = session.decoder.as_ptr();
    let format = JxlPixelFormat {
        num_channels: resolved.channel_count,
        data_type: match resolved.info.sample_format {
            SampleFormat::Uint8 => JxlDataType::Uint8,
            SampleFormat::Uint16 => JxlDataType::Uint16,
            SampleFormat::Float16 => JxlDataType::Float16,
            SampleFormat::Float32 => JxlDataType::Float,
        },
        endianness: JxlEndianness::Native,
        align: 0,
    };

    let mut color_buffer: Vec<u8> = Vec::new();
    let mut black_buffer: Vec<u8> = Vec::new();
    let mut frame_name: Option<String> = None;
    let mut tally = FrameTally::default();

    loop {
        match unsafe { JxlDecoderProcessInput(dec) } {
            JxlDecoderStatus::ColorEncoding => match output_space {
                OutputColorSpace::Encoded(encoding) => apply_preferred(dec, encoding)?,
                OutputColorSpace::Icc(icc) => apply_output_icc(dec, icc)?,
            },
            JxlDecoderStatus::Frame => {
                tally.note_frame()?;
                frame_name = read_frame_name(dec)?;
                if let Some(name) = &frame_name {
                    tracing::debug!(name, "captured frame name");
                }
            }
            JxlDecoderStatus::NeedImageOutBuffer => {
                let mut size = 0usize;
                dec_ok(
                    unsafe { JxlDecoderImageOutBufferSize(dec, &format, &mut size) },
                    "JxlDecoderImageOutBufferSize",
                )?;
                color_buffer = try_vec(size)?;
                dec_ok(
                    unsafe {
                        JxlDecoderSetImageOutBuffer(
                            dec,
                            &format,
                            color_buffer.as_mut_ptr() as *mut c_void,
                            size,
                        )
                    },
                    "JxlDecoderSetImageOutBuffer",
                )?;
                if let Some(index) = resolved.black_channel_index {
                    if !matches!(
                        resolved.info.sample_format,
                        SampleFormat::Uint8 | SampleFormat::Uint16
                    ) {
                        return Err(DecodeError::with_detail(
                            DecodeStatus::DecodeError,
                            "Floating point black channel is unsupported.",
                        ));
                    }
                    let black_format = JxlPixelFormat {
                        num_channels: 1,
                        ..format
                    };
                    let mut black_size = 0usize;
                    dec_ok(
                        unsafe {
                            JxlDecoderExtraChannelBufferSize(
                                dec,
                                &black_format,
                                &mut black_size,
                                index,
                            )
                        },
                        "JxlDecoderExtraChannelBufferSize",
                    )?;
                    black_buffer = try_vec(black_size)?;
                    dec_ok(
                        unsafe {
                            JxlDecoderSetExtraChannelBuffer(
                                dec,
                                &black_format,
                                black_buffer.as_mut_ptr() as *mut c_void,
                                black_size,
                                index,
                            )
                        },
                        "JxlDecoderSetExtraChannelBuffer",
                    )?;
                }
            }
            JxlDecoderStatus::FullImage => {
                tally.note_image()?;
                deliver_image(resolved, &color_buffer, &black_buffer, frame_name.as_deref(), host)?;
            }
            JxlDecoderStatus::Success => break,
            JxlDecoderStatus::NeedMoreInput => {
                return Err(DecodeError::with_detail(
                    DecodeStatus::DecodeError,
                    "Input is truncated.",
                ));
            }
            _ => {
                return Err(DecodeError::with_detail(
                    DecodeStatus::DecodeError,
                    "JxlDecoderProcessInput failed.",
                ));
            }
        }
    }

    if !tally.image_delivered {
        return Err(DecodeError::with_detail(
            DecodeStatus::DecodeError,
            "Codestream contains no image.",
        ));
    }
    Ok(())
}

fn read_frame_name(
    dec: *mut JxlDecoder,
) -> Result<Option<String>, DecodeError> {
    let header = unsafe {
        let mut header = MaybeUninit::<JxlFrameHeader>::uninit();
        dec_ok(
            JxlDecoderGetFrameHeader(dec, header.as_mut_ptr()),
            "JxlDecoderGetFrameHeader",
        )?;
        header.assume_init()
    };
    if header.name_length == 0 {
        return Ok(None);
    }
    // The codec writes name_length bytes plus a null terminator.
    let mut buf = try_vec(header.name_length as usize + 1)?;
    dec_ok(
        unsafe { JxlDecoderGetFrameName(dec, buf.as_mut_ptr() as *mut c_char, buf.len()) },
        "JxlDecoderGetFrameName",
    )?;
    buf.truncate(header.name_length as usize);
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Hands the decoded frame to the host, interleaving the black channel
/// for CMYK layouts.
fn deliver_image<H: DecodeHost>(
    resolved: &ResolvedImage,
    color_buffer: &[u8],
    black_buffer: &[u8],
    frame_name: Option<&str>,
    host: &mut H,
) -> Result<(), DecodeError> {
    let accepted = if resolved.info.layout == ImageLayout::Cmyk {
        let has_alpha = resolved.info.has_transparency;
        let len = packed_buffer_len(
            resolved.info.width as u32,
            resolved.info.height as u32,
            resolved.channel_count + 1,
            resolved.info.sample_format,
        )
        .ok_or_else(|| DecodeError::new(DecodeStatus::OutOfMemory))?;
        let mut interleaved = try_vec(len)?;
        match resolved.info.sample_format {
            SampleFormat::Uint8 => {
                assemble_cmyk(color_buffer, black_buffer, has_alpha, &mut interleaved);
            }
            SampleFormat::Uint16 => {
                assemble_cmyk16(color_buffer, black_buffer, has_alpha, &mut interleaved);
            }
            _ => {
                return Err(DecodeError::with_detail(
                    DecodeStatus::DecodeError,
                    "Floating point black channel is unsupported.",
                ));
            }
        }
        host.set_layer_data(&interleaved, frame_name)
    } else {
        host.set_layer_data(color_buffer, frame_name)
    };
    if !accepted {
        return Err(DecodeError::new(DecodeStatus::CreateLayerError));
    }
    Ok(())
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;
