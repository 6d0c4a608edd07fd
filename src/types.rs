// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Host-facing type definitions.

use bytemuck::{Pod, Zeroable};

/// Status codes returned by [`decode_image`](crate::decode_image).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// The image was decoded successfully.
    Ok = 0,
    /// A required argument was null. Part of the host plugin contract;
    /// not producible through the safe Rust surface.
    NullParameter = 1,
    /// An argument was invalid. Part of the host plugin contract;
    /// not producible through the safe Rust surface.
    InvalidParameter = 2,
    /// A buffer allocation failed.
    OutOfMemory = 3,
    /// The image is animated. Only still images are supported.
    HasAnimation = 4,
    /// The image has more than one frame. Only single-frame still
    /// images are supported.
    HasMultipleFrames = 5,
    /// The image width or height exceeds the signed 32-bit range.
    ImageDimensionExceedsInt32 = 6,
    /// The channel layout or bit depth cannot be represented by the host.
    UnsupportedChannelFormat = 7,
    /// The host layer callback reported failure.
    CreateLayerError = 8,
    /// A host metadata callback (profile, EXIF, or XMP) reported failure.
    CreateMetadataError = 9,
    /// The codec reported an error while decoding.
    DecodeError = 10,
    /// The codec failed to hand back requested metadata.
    MetadataError = 11,
    /// The input does not start with a JPEG XL signature.
    InvalidFileSignature = 12,
}

/// Status codes returned by [`encode_image`](crate::encode_image).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStatus {
    /// The image was encoded successfully.
    Ok = 0,
    /// A required argument was null. Part of the host plugin contract;
    /// not producible through the safe Rust surface.
    NullParameter = 1,
    /// A buffer allocation failed.
    OutOfMemory = 2,
    /// A progress callback requested cancellation.
    UserCanceled = 3,
    /// The codec reported an error while encoding.
    EncodeError = 4,
    /// The host write or seek callback failed.
    WriteError = 5,
}

/// Color channel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Single gray channel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Cyan, magenta, yellow plus a black extra channel.
    Cmyk,
}

/// Per-channel sample representation of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit unsigned integer.
    Uint8,
    /// 16-bit unsigned integer.
    Uint16,
    /// 16-bit float.
    Float16,
    /// 32-bit float.
    Float32,
}

impl SampleFormat {
    /// Width of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::Uint8 => 1,
            SampleFormat::Uint16 | SampleFormat::Float16 => 2,
            SampleFormat::Float32 => 4,
        }
    }
}

/// Standard color profiles the host can synthesize without ICC bytes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownColorProfile {
    /// sRGB.
    Srgb = 0,
    /// sRGB primaries with a linear transfer function.
    LinearSrgb = 1,
    /// Gray with a linear transfer function.
    LinearGray = 2,
    /// Gray with the sRGB transfer curve.
    GraySrgbTRC = 3,
    /// Display P3.
    DisplayP3 = 4,
    /// Rec. 709.
    Rec709 = 5,
    /// Rec. 2020 primaries with a linear transfer function.
    Rec2020Linear = 6,
    /// Rec. 2020 primaries with the PQ transfer function.
    Rec2020Pq = 7,
}

/// Color profile attached to a decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorProfile {
    /// One of the fixed set of standard profiles.
    WellKnown(KnownColorProfile),
    /// An opaque ICC profile.
    Icc(Vec<u8>),
}

/// Basic image information reported before any pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Image width in pixels.
    pub width: i32,
    /// Image height in pixels.
    pub height: i32,
    /// Color channel layout.
    pub layout: ImageLayout,
    /// Per-channel sample representation.
    pub sample_format: SampleFormat,
    /// Whether the image carries an alpha channel.
    pub has_transparency: bool,
}

/// Result of sniffing a buffer for the JPEG XL file signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// Not enough bytes to determine.
    NotEnoughBytes,
    /// Not a JPEG XL file.
    Invalid,
    /// A bare JPEG XL codestream.
    Codestream,
    /// A boxed JPEG XL container, possibly carrying metadata boxes.
    Container,
}

/// One interleaved BGRA pixel of the host surface.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Bgra8 {
    /// Blue.
    pub b: u8,
    /// Green.
    pub g: u8,
    /// Red.
    pub r: u8,
    /// Alpha.
    pub a: u8,
}

/// Borrowed view of the host's interleaved BGRA8 surface.
///
/// Rows are `stride` bytes apart; only the leading `width * 4` bytes of
/// each row hold pixel data.
#[derive(Debug, Clone, Copy)]
pub struct BitmapView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> BitmapView<'a> {
    /// Wraps a host surface. `stride` must be at least `width * 4` and
    /// `data` must cover `height` rows.
    pub fn new(data: &'a [u8], width: u32, height: u32, stride: usize) -> Self {
        debug_assert!(stride >= width as usize * 4);
        debug_assert!(
            height == 0 || data.len() >= (height as usize - 1) * stride + width as usize * 4
        );
        Self {
            data,
            width,
            height,
            stride,
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixels of row `y`, without the stride padding.
    pub fn row(&self, y: usize) -> &'a [Bgra8] {
        let start = y * self.stride;
        bytemuck::cast_slice(&self.data[start..start + self.width as usize * 4])
    }
}

/// Encoder tuning options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// Butteraugli distance. 0.0 is mathematically lossless, 1.0 is
    /// visually lossless, 15.0 is the worst supported quality.
    pub distance: f32,
    /// Encode effort, 1 (fastest) through 9 (slowest).
    pub effort: i32,
    /// Whether to encode losslessly. Forces a distance of 0.0.
    pub lossless: bool,
}

impl EncodeOptions {
    /// Builds options from the host's quality and speed scales.
    ///
    /// Quality runs 0 (worst) to 100 (best) and is mapped onto the
    /// codec's distance range; speed runs 1 (slowest) to 9 (fastest)
    /// and is inverted to the codec's effort scale.
    pub fn from_quality(quality: i32, lossless: bool, speed: i32) -> Self {
        let distance = if lossless {
            0.0
        } else {
            quality_to_distance(quality.clamp(0, 100))
        };
        Self {
            distance,
            effort: 10 - speed.clamp(1, 9),
            lossless,
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            distance: 1.0,
            effort: 7,
            lossless: false,
        }
    }
}

/// Maps a 0..=100 quality value to the codec's distance scale.
fn quality_to_distance(quality: i32) -> f32 {
    if quality >= 30 {
        0.1 + (100 - quality) as f32 * 0.09
    } else if quality <= 8 {
        // The curve below exceeds the maximum distance from here down.
        15.0
    } else {
        6.4 + 2.5f32.powf((30 - quality) as f32 / 5.0) / 6.25
    }
}

/// Metadata attached to an encoded image.
///
/// Zero-length entries are treated as absent and are not encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeMetadata<'a> {
    /// EXIF payload for an `Exif` box.
    pub exif: Option<&'a [u8]>,
    /// ICC profile bytes, passed to the codec verbatim.
    pub icc_profile: Option<&'a [u8]>,
    /// XMP payload for an `xml ` box.
    pub xmp: Option<&'a [u8]>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
