// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Bridge between a BGRA8 raster host and the libjxl streaming
//! decode/encode state machines.
//!
//! The host hands over a fully buffered JPEG XL file and a set of
//! callbacks; [`decode_image`] drives the codec's event loop and
//! delivers the image descriptor, color profile, metadata boxes, and
//! pixel data through them. In the other direction, [`encode_image`]
//! takes a BGRA8 surface, classifies its effective channel layout, and
//! streams the compressed result to a writer with incremental progress
//! and cooperative cancellation.
//!
//! Each call owns its codec handle, worker pool, and buffers; nothing
//! is shared across calls, so concurrent decodes and encodes of
//! different files are safe.

mod color;
mod conversions;
mod decoder;
mod encoder;
mod error;
mod handles;
mod output;
mod types;

pub use conversions::planar_to_bgra;
pub use decoder::{check_signature, decode_image, DecodeHost};
pub use encoder::{encode_image, ProgressFn};
pub use error::{DecodeError, EncodeError, ErrorMessage, MAX_ERROR_MESSAGE_LEN};
pub use types::{
    Bgra8, BitmapView, ColorProfile, DecodeStatus, EncodeMetadata, EncodeOptions, EncodeStatus,
    ImageInfo, ImageLayout, KnownColorProfile, SampleFormat, SignatureKind,
};

/// The linked libjxl version, packed as `major * 1_000_000 +
/// minor * 1_000 + patch`.
pub fn codec_version() -> u32 {
    unsafe { jpegxl_sys::decode::JxlDecoderVersion() }
}
