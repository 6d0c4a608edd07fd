// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Unit tests for the decode driver.

use std::mem::MaybeUninit;

use jpegxl_sys::encoder::encode::{JxlEncoderInitBasicInfo, JxlEncoderInitExtraChannelInfo};

use super::*;

fn basic_info(width: u32, height: u32, color_channels: u32, bits: u32) -> JxlBasicInfo {
    let mut info = unsafe {
        let mut info = MaybeUninit::<JxlBasicInfo>::uninit();
        JxlEncoderInitBasicInfo(info.as_mut_ptr());
        info.assume_init()
    };
    info.xsize = width;
    info.ysize = height;
    info.num_color_channels = color_channels;
    info.bits_per_sample = bits;
    info.exponent_bits_per_sample = 0;
    info
}

fn extra_channel(channel_type: JxlExtraChannelType) -> JxlExtraChannelInfo {
    let mut info = unsafe {
        let mut info = MaybeUninit::<JxlExtraChannelInfo>::uninit();
        JxlEncoderInitExtraChannelInfo(channel_type, info.as_mut_ptr());
        info.assume_init()
    };
    info.bits_per_sample = 8;
    info
}

#[test]
fn test_resolve_rgb8() {
    let resolved = resolve_image_info(&basic_info(640, 480, 3, 8), &[]).unwrap();
    assert_eq!(resolved.info.width, 640);
    assert_eq!(resolved.info.height, 480);
    assert_eq!(resolved.info.layout, ImageLayout::Rgb);
    assert_eq!(resolved.info.sample_format, SampleFormat::Uint8);
    assert!(!resolved.info.has_transparency);
    assert_eq!(resolved.channel_count, 3);
    assert!(resolved.black_channel_index.is_none());
}

#[test]
fn test_resolve_rgba16() {
    let extra = [extra_channel(JxlExtraChannelType::Alpha)];
    let mut info = basic_info(10, 10, 3, 16);
    info.num_extra_channels = 1;
    info.alpha_bits = 16;
    let resolved = resolve_image_info(&info, &extra).unwrap();
    assert_eq!(resolved.info.layout, ImageLayout::Rgb);
    assert_eq!(resolved.info.sample_format, SampleFormat::Uint16);
    assert!(resolved.info.has_transparency);
    assert_eq!(resolved.channel_count, 4);
}

#[test]
fn test_resolve_gray() {
    let resolved = resolve_image_info(&basic_info(5, 5, 1, 8), &[]).unwrap();
    assert_eq!(resolved.info.layout, ImageLayout::Gray);
    assert_eq!(resolved.channel_count, 1);
}

#[test]
fn test_resolve_cmyk() {
    let extra = [extra_channel(JxlExtraChannelType::Black)];
    let mut info = basic_info(5, 5, 3, 8);
    info.num_extra_channels = 1;
    let resolved = resolve_image_info(&info, &extra).unwrap();
    assert_eq!(resolved.info.layout, ImageLayout::Cmyk);
    assert_eq!(resolved.channel_count, 3);
    assert_eq!(resolved.black_channel_index, Some(0));
}

#[test]
fn test_resolve_cmyk_alpha_black_indices() {
    let extra = [
        extra_channel(JxlExtraChannelType::Alpha),
        extra_channel(JxlExtraChannelType::Black),
    ];
    let mut info = basic_info(5, 5, 3, 8);
    info.num_extra_channels = 2;
    info.alpha_bits = 8;
    let resolved = resolve_image_info(&info, &extra).unwrap();
    assert_eq!(resolved.info.layout, ImageLayout::Cmyk);
    assert!(resolved.info.has_transparency);
    assert_eq!(resolved.channel_count, 4);
    assert_eq!(resolved.black_channel_index, Some(1));
}

#[test]
fn test_resolve_rejects_oversized_dimensions() {
    let err = resolve_image_info(&basic_info(1 << 31, 5, 3, 8), &[]).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::ImageDimensionExceedsInt32);
    let err = resolve_image_info(&basic_info(5, u32::MAX, 3, 8), &[]).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::ImageDimensionExceedsInt32);
}

#[test]
fn test_resolve_rejects_animation() {
    let mut info = basic_info(5, 5, 3, 8);
    info.have_animation = JxlBool::True;
    let err = resolve_image_info(&info, &[]).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::HasAnimation);
}

#[test]
fn test_resolve_rejects_two_color_channels() {
    let err = resolve_image_info(&basic_info(5, 5, 2, 8), &[]).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::UnsupportedChannelFormat);
}

#[test]
fn test_resolve_rejects_duplicate_black_channels() {
    let extra = [
        extra_channel(JxlExtraChannelType::Black),
        extra_channel(JxlExtraChannelType::Black),
    ];
    let mut info = basic_info(5, 5, 3, 8);
    info.num_extra_channels = 2;
    let err = resolve_image_info(&info, &extra).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::UnsupportedChannelFormat);
}

#[test]
fn test_resolve_rejects_duplicate_alpha_channels() {
    let extra = [
        extra_channel(JxlExtraChannelType::Alpha),
        extra_channel(JxlExtraChannelType::Alpha),
    ];
    let mut info = basic_info(5, 5, 3, 8);
    info.num_extra_channels = 2;
    let err = resolve_image_info(&info, &extra).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::UnsupportedChannelFormat);
}

#[test]
fn test_resolve_float_formats() {
    let mut info = basic_info(5, 5, 3, 16);
    info.exponent_bits_per_sample = 5;
    let resolved = resolve_image_info(&info, &[]).unwrap();
    assert_eq!(resolved.info.sample_format, SampleFormat::Float16);

    let mut info = basic_info(5, 5, 3, 32);
    info.exponent_bits_per_sample = 8;
    let resolved = resolve_image_info(&info, &[]).unwrap();
    assert_eq!(resolved.info.sample_format, SampleFormat::Float32);
}

#[test]
fn test_resolve_rejects_deep_cmyk() {
    // The host cannot attach a CMYK profile to 16-bit or float data.
    let extra = [extra_channel(JxlExtraChannelType::Black)];
    let mut info = basic_info(5, 5, 3, 16);
    info.num_extra_channels = 1;
    let err = resolve_image_info(&info, &extra).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::UnsupportedChannelFormat);

    let mut info = basic_info(5, 5, 3, 16);
    info.num_extra_channels = 1;
    info.exponent_bits_per_sample = 5;
    let err = resolve_image_info(&info, &extra).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::UnsupportedChannelFormat);
}

#[test]
fn test_resolve_rejects_odd_bit_depths() {
    let err = resolve_image_info(&basic_info(5, 5, 3, 24), &[]).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::DecodeError);

    let mut info = basic_info(5, 5, 3, 64);
    info.exponent_bits_per_sample = 11;
    let err = resolve_image_info(&info, &[]).unwrap_err();
    assert_eq!(err.status(), DecodeStatus::DecodeError);
}

#[test]
fn test_box_accumulator_single_chunk() {
    let mut acc = BoxAccumulator::new().unwrap();
    let chunk = acc.chunk();
    assert_eq!(chunk.len(), BOX_CHUNK);
    chunk[..4].copy_from_slice(b"exif");
    // Decoder wrote 4 bytes and finished; the rest of the grant is
    // unconsumed.
    let bytes = acc.finish(BOX_CHUNK - 4);
    assert_eq!(bytes, b"exif");
}

#[test]
fn test_box_accumulator_grows_across_chunks() {
    let mut acc = BoxAccumulator::new().unwrap();
    acc.chunk().fill(1);
    // First grant fully consumed.
    acc.grow(0).unwrap();
    assert_eq!(acc.chunk().len(), BOX_CHUNK);
    acc.chunk()[..10].fill(2);
    let bytes = acc.finish(BOX_CHUNK - 10);
    assert_eq!(bytes.len(), BOX_CHUNK + 10);
    assert!(bytes[..BOX_CHUNK].iter().all(|&b| b == 1));
    assert!(bytes[BOX_CHUNK..].iter().all(|&b| b == 2));
}

#[test]
fn test_box_accumulator_partial_grant() {
    let mut acc = BoxAccumulator::new().unwrap();
    acc.chunk()[..100].fill(7);
    // 100 of the grant used before the decoder asked for more room.
    acc.grow(BOX_CHUNK - 100).unwrap();
    assert_eq!(acc.chunk().len(), BOX_CHUNK);
    let bytes = acc.finish(BOX_CHUNK);
    assert_eq!(bytes.len(), 100);
    assert!(bytes.iter().all(|&b| b == 7));
}

#[test]
fn test_check_signature() {
    assert_eq!(check_signature(&[0xFF, 0x0A]), SignatureKind::Codestream);
    let container = [
        0x00, 0x00, 0x00, 0x0C, b'J', b'X', b'L', b' ', 0x0D, 0x0A, 0x87, 0x0A,
    ];
    assert_eq!(check_signature(&container), SignatureKind::Container);
    assert_eq!(
        check_signature(b"not an image at all"),
        SignatureKind::Invalid
    );
    assert_eq!(check_signature(&[0xFF]), SignatureKind::NotEnoughBytes);
}

/// Host that accepts everything and records nothing.
struct NullHost;

impl DecodeHost for NullHost {
    fn set_basic_info(&mut self, _info: &ImageInfo) {}
    fn set_known_color_profile(&mut self, _profile: KnownColorProfile) -> bool {
        true
    }
    fn set_icc_profile(&mut self, _icc: &[u8]) -> bool {
        true
    }
    fn set_exif(&mut self, _exif: &[u8]) -> bool {
        true
    }
    fn set_xmp(&mut self, _xmp: &[u8]) -> bool {
        true
    }
    fn set_layer_data(&mut self, _pixels: &[u8], _name: Option<&str>) -> bool {
        true
    }
}

#[test]
fn test_decode_rejects_garbage_signature() {
    let mut error = ErrorMessage::new();
    let status = decode_image(b"garbage input", &mut NullHost, &mut error);
    assert_eq!(status, DecodeStatus::InvalidFileSignature);
}

#[test]
fn test_decode_rejects_truncated_codestream() {
    // A valid signature followed by nothing decodable.
    let mut error = ErrorMessage::new();
    let status = decode_image(&[0xFF, 0x0A], &mut NullHost, &mut error);
    assert_ne!(status, DecodeStatus::Ok);
}

#[test]
fn test_frame_tally_accepts_one_frame_and_image() {
    let mut tally = FrameTally::default();
    assert!(tally.note_frame().is_ok());
    assert!(tally.note_image().is_ok());
    assert!(tally.image_delivered);
}

#[test]
fn test_frame_tally_rejects_second_frame() {
    let mut tally = FrameTally::default();
    tally.note_frame().unwrap();
    let err = tally.note_frame().unwrap_err();
    assert_eq!(err.status(), DecodeStatus::HasMultipleFrames);
}

#[test]
fn test_frame_tally_rejects_second_image() {
    let mut tally = FrameTally::default();
    tally.note_frame().unwrap();
    tally.note_image().unwrap();
    let err = tally.note_image().unwrap_err();
    assert_eq!(err.status(), DecodeStatus::HasMultipleFrames);
}
