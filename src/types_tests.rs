// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Unit tests for the host-facing types.

use super::*;

#[test]
fn test_sample_format_widths() {
    assert_eq!(SampleFormat::Uint8.bytes_per_sample(), 1);
    assert_eq!(SampleFormat::Uint16.bytes_per_sample(), 2);
    assert_eq!(SampleFormat::Float16.bytes_per_sample(), 2);
    assert_eq!(SampleFormat::Float32.bytes_per_sample(), 4);
}

#[test]
fn test_bitmap_view_row_skips_stride_padding() {
    // 2x2 image with 3 bytes of padding per row.
    let mut data = vec![0u8; 2 * 11];
    data[0..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    data[11..19].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
    let bitmap = BitmapView::new(&data, 2, 2, 11);

    let row0 = bitmap.row(0);
    assert_eq!(row0.len(), 2);
    assert_eq!(row0[0], Bgra8 { b: 1, g: 2, r: 3, a: 4 });
    assert_eq!(row0[1], Bgra8 { b: 5, g: 6, r: 7, a: 8 });

    let row1 = bitmap.row(1);
    assert_eq!(row1[0], Bgra8 { b: 9, g: 10, r: 11, a: 12 });
    assert_eq!(row1[1], Bgra8 { b: 13, g: 14, r: 15, a: 16 });
}

#[test]
fn test_quality_100_is_near_lossless() {
    let options = EncodeOptions::from_quality(100, false, 3);
    assert!((options.distance - 0.1).abs() < 1e-6);
    assert!(!options.lossless);
}

#[test]
fn test_quality_90_is_visually_lossless() {
    let options = EncodeOptions::from_quality(90, false, 3);
    assert!((options.distance - 1.0).abs() < 1e-6);
}

#[test]
fn test_quality_curve_is_continuous_at_30() {
    let above = EncodeOptions::from_quality(30, false, 3).distance;
    let below = EncodeOptions::from_quality(29, false, 3).distance;
    assert!(below > above);
    assert!(below < 15.0);
}

#[test]
fn test_quality_floor_pins_to_maximum_distance() {
    for quality in [-50, 0, 5, 8] {
        let options = EncodeOptions::from_quality(quality, false, 3);
        assert_eq!(options.distance, 15.0, "quality {quality}");
    }
    // Just above the floor the curve takes over.
    let options = EncodeOptions::from_quality(9, false, 3);
    assert!(options.distance < 15.0);
    assert!(options.distance > 6.4);
}

#[test]
fn test_lossless_forces_zero_distance() {
    let options = EncodeOptions::from_quality(50, true, 3);
    assert!(options.lossless);
    assert_eq!(options.distance, 0.0);
}

#[test]
fn test_speed_inverts_to_effort() {
    assert_eq!(EncodeOptions::from_quality(90, false, 1).effort, 9);
    assert_eq!(EncodeOptions::from_quality(90, false, 9).effort, 1);
    assert_eq!(EncodeOptions::from_quality(90, false, 3).effort, 7);
    // Out-of-range speeds clamp before inversion.
    assert_eq!(EncodeOptions::from_quality(90, false, 0).effort, 9);
    assert_eq!(EncodeOptions::from_quality(90, false, 42).effort, 1);
}

#[test]
fn test_default_options() {
    let options = EncodeOptions::default();
    assert_eq!(options.distance, 1.0);
    assert_eq!(options.effort, 7);
    assert!(!options.lossless);
}
