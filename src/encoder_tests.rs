// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Unit tests for the encode driver.

use std::io::Cursor;

use super::*;
use crate::types::Bgra8;

fn make_bitmap(width: u32, height: u32, mut pixel: impl FnMut(u32, u32) -> Bgra8) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let p = pixel(x, y);
            data.extend_from_slice(&[p.b, p.g, p.r, p.a]);
        }
    }
    data
}

#[test]
fn test_classify_opaque_color() {
    let data = make_bitmap(2, 2, |x, y| Bgra8 {
        b: x as u8,
        g: y as u8,
        r: 200,
        a: 255,
    });
    let bitmap = BitmapView::new(&data, 2, 2, 8);
    assert_eq!(classify_bitmap(&bitmap, false), OutputPixelFormat::Rgb);
}

#[test]
fn test_classify_color_with_transparency() {
    let data = make_bitmap(2, 2, |x, _| Bgra8 {
        b: 0,
        g: 100,
        r: 200,
        a: if x == 0 { 254 } else { 255 },
    });
    let bitmap = BitmapView::new(&data, 2, 2, 8);
    assert_eq!(classify_bitmap(&bitmap, false), OutputPixelFormat::Rgba);
}

#[test]
fn test_classify_gray() {
    let data = make_bitmap(3, 1, |x, _| {
        let v = x as u8 * 80;
        Bgra8 { b: v, g: v, r: v, a: 255 }
    });
    let bitmap = BitmapView::new(&data, 3, 1, 12);
    assert_eq!(classify_bitmap(&bitmap, false), OutputPixelFormat::Gray);
}

#[test]
fn test_classify_gray_with_transparency() {
    let data = make_bitmap(2, 1, |x, _| Bgra8 {
        b: 9,
        g: 9,
        r: 9,
        a: if x == 0 { 0 } else { 255 },
    });
    let bitmap = BitmapView::new(&data, 2, 1, 8);
    assert_eq!(classify_bitmap(&bitmap, false), OutputPixelFormat::GrayAlpha);
}

#[test]
fn test_classify_icc_suppresses_gray() {
    // Gray pixel data, but an attached ICC profile means the samples
    // are only meaningful in the profile's three-channel space.
    let data = make_bitmap(2, 1, |_, _| Bgra8 { b: 5, g: 5, r: 5, a: 255 });
    let bitmap = BitmapView::new(&data, 2, 1, 8);
    assert_eq!(classify_bitmap(&bitmap, true), OutputPixelFormat::Rgb);
}

#[test]
fn test_classify_single_off_gray_pixel() {
    let data = make_bitmap(2, 2, |x, y| {
        if x == 1 && y == 1 {
            Bgra8 { b: 10, g: 10, r: 11, a: 255 }
        } else {
            Bgra8 { b: 10, g: 10, r: 10, a: 255 }
        }
    });
    let bitmap = BitmapView::new(&data, 2, 2, 8);
    assert_eq!(classify_bitmap(&bitmap, false), OutputPixelFormat::Rgb);
}

#[test]
fn test_output_pixel_format_properties() {
    assert_eq!(OutputPixelFormat::Gray.channels(), 1);
    assert_eq!(OutputPixelFormat::GrayAlpha.channels(), 2);
    assert_eq!(OutputPixelFormat::Rgb.channels(), 3);
    assert_eq!(OutputPixelFormat::Rgba.channels(), 4);
    assert!(OutputPixelFormat::Gray.is_gray());
    assert!(OutputPixelFormat::GrayAlpha.has_alpha());
    assert!(!OutputPixelFormat::Rgb.has_alpha());
    assert!(!OutputPixelFormat::Rgba.is_gray());
}

#[test]
fn test_cancellation_at_first_checkpoint() {
    let data = make_bitmap(2, 2, |_, _| Bgra8 { b: 1, g: 2, r: 3, a: 255 });
    let bitmap = BitmapView::new(&data, 2, 2, 8);
    let mut output = Cursor::new(Vec::new());
    let mut error = ErrorMessage::new();
    let mut reported = Vec::new();
    let mut progress = |percent: u32| {
        reported.push(percent);
        false
    };

    let status = encode_image(
        &bitmap,
        &EncodeOptions::default(),
        &EncodeMetadata::default(),
        &mut output,
        Some(&mut progress),
        &mut error,
    );

    assert_eq!(status, EncodeStatus::UserCanceled);
    assert_eq!(reported, vec![0]);
    // Nothing may reach the writer after cancellation.
    assert!(output.into_inner().is_empty());
}

#[test]
fn test_cancellation_at_second_checkpoint() {
    let data = make_bitmap(2, 2, |_, _| Bgra8 { b: 1, g: 2, r: 3, a: 255 });
    let bitmap = BitmapView::new(&data, 2, 2, 8);
    let mut output = Cursor::new(Vec::new());
    let mut error = ErrorMessage::new();
    let mut calls = 0;
    let mut progress = |_percent: u32| {
        calls += 1;
        calls < 2
    };

    let status = encode_image(
        &bitmap,
        &EncodeOptions::default(),
        &EncodeMetadata::default(),
        &mut output,
        Some(&mut progress),
        &mut error,
    );

    assert_eq!(status, EncodeStatus::UserCanceled);
    assert_eq!(calls, 2);
    assert!(output.into_inner().is_empty());
}
