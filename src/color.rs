// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Color profile classification.
//!
//! The host can synthesize a small set of standard profiles on its
//! own; everything else travels as ICC bytes. This module maps the
//! codec's structured color encoding onto that set.

use std::mem::MaybeUninit;

use jpegxl_sys::color::color_encoding::{
    JxlColorEncoding, JxlColorSpace, JxlPrimaries, JxlRenderingIntent, JxlTransferFunction,
    JxlWhitePoint,
};
use jpegxl_sys::encoder::encode::JxlColorEncodingSetToSRGB;

use crate::types::KnownColorProfile;

/// Maps a structured color encoding to a standard profile the host
/// knows how to synthesize, or `None` if it has no exact match.
///
/// Only D65-white encodings qualify; custom white points, custom
/// primaries, and parametric gamma curves all fall through to ICC.
pub(crate) fn classify_color_encoding(encoding: &JxlColorEncoding) -> Option<KnownColorProfile> {
    if !matches!(encoding.white_point, JxlWhitePoint::D65) {
        return None;
    }
    match (
        encoding.color_space,
        encoding.transfer_function,
        encoding.primaries,
    ) {
        (JxlColorSpace::Rgb, JxlTransferFunction::SRGB, JxlPrimaries::SRgb) => {
            Some(KnownColorProfile::Srgb)
        }
        (JxlColorSpace::Rgb, JxlTransferFunction::Linear, JxlPrimaries::SRgb) => {
            Some(KnownColorProfile::LinearSrgb)
        }
        (JxlColorSpace::Rgb, JxlTransferFunction::SRGB, JxlPrimaries::P3) => {
            Some(KnownColorProfile::DisplayP3)
        }
        (JxlColorSpace::Rgb, JxlTransferFunction::BT709, JxlPrimaries::SRgb) => {
            Some(KnownColorProfile::Rec709)
        }
        (JxlColorSpace::Rgb, JxlTransferFunction::Linear, JxlPrimaries::Rec2100) => {
            Some(KnownColorProfile::Rec2020Linear)
        }
        (JxlColorSpace::Rgb, JxlTransferFunction::PQ, JxlPrimaries::Rec2100) => {
            Some(KnownColorProfile::Rec2020Pq)
        }
        // Gray encodings carry no meaningful primaries.
        (JxlColorSpace::Gray, JxlTransferFunction::Linear, _) => {
            Some(KnownColorProfile::LinearGray)
        }
        (JxlColorSpace::Gray, JxlTransferFunction::SRGB, _) => {
            Some(KnownColorProfile::GraySrgbTRC)
        }
        _ => None,
    }
}

/// Builds an sRGB (or gray-with-sRGB-curve) encoding with perceptual
/// rendering intent.
pub(crate) fn srgb_encoding(is_gray: bool) -> JxlColorEncoding {
    let mut encoding = unsafe {
        let mut encoding = MaybeUninit::uninit();
        JxlColorEncodingSetToSRGB(encoding.as_mut_ptr(), is_gray.into());
        encoding.assume_init()
    };
    encoding.rendering_intent = JxlRenderingIntent::Perceptual;
    encoding
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
