// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Pixel format conversions between the host's interleaved BGRA8
//! surface and the codec's packed channel layouts.

use crate::types::{BitmapView, Bgra8, SampleFormat};

// ============================================================================
// BGRA8 -> packed codec input
// ============================================================================

/// Packs a BGRA8 surface into single-channel gray.
///
/// The surface must already be gray (equal channels); the red channel
/// is taken as the gray value.
pub(crate) fn bgra_to_gray(bitmap: &BitmapView<'_>, dest: &mut [u8]) {
    let width = bitmap.width() as usize;
    for y in 0..bitmap.height() as usize {
        let row = bitmap.row(y);
        let out = &mut dest[y * width..(y + 1) * width];
        for (pixel, gray) in row.iter().zip(out.iter_mut()) {
            *gray = pixel.r;
        }
    }
}

/// Packs a BGRA8 surface into interleaved gray + alpha.
pub(crate) fn bgra_to_gray_alpha(bitmap: &BitmapView<'_>, dest: &mut [u8]) {
    let width = bitmap.width() as usize;
    for y in 0..bitmap.height() as usize {
        let row = bitmap.row(y);
        let out = &mut dest[y * width * 2..(y + 1) * width * 2];
        for (pixel, chunk) in row.iter().zip(out.chunks_exact_mut(2)) {
            chunk[0] = pixel.r;
            chunk[1] = pixel.a;
        }
    }
}

/// Packs a BGRA8 surface into interleaved RGB, dropping alpha.
pub(crate) fn bgra_to_rgb(bitmap: &BitmapView<'_>, dest: &mut [u8]) {
    let width = bitmap.width() as usize;
    for y in 0..bitmap.height() as usize {
        let row = bitmap.row(y);
        let out = &mut dest[y * width * 3..(y + 1) * width * 3];
        for (pixel, chunk) in row.iter().zip(out.chunks_exact_mut(3)) {
            chunk[0] = pixel.r;
            chunk[1] = pixel.g;
            chunk[2] = pixel.b;
        }
    }
}

/// Packs a BGRA8 surface into interleaved RGBA.
pub(crate) fn bgra_to_rgba(bitmap: &BitmapView<'_>, dest: &mut [u8]) {
    let width = bitmap.width() as usize;
    for y in 0..bitmap.height() as usize {
        let row = bitmap.row(y);
        let out = &mut dest[y * width * 4..(y + 1) * width * 4];
        for (pixel, chunk) in row.iter().zip(out.chunks_exact_mut(4)) {
            chunk[0] = pixel.r;
            chunk[1] = pixel.g;
            chunk[2] = pixel.b;
            chunk[3] = pixel.a;
        }
    }
}

// ============================================================================
// Packed codec output -> BGRA8
// ============================================================================

/// Expands packed 8-bit samples into BGRA8 pixels, for hosts that
/// materialize decoded layers onto an interleaved surface.
///
/// `channel_count` is the interleaved channel count of `src`: 1 (gray),
/// 2 (gray + alpha), 3 (RGB), or 4 (RGBA). Missing alpha becomes
/// opaque. Panics on any other channel count.
pub fn planar_to_bgra(src: &[u8], channel_count: u32, dest: &mut [Bgra8]) {
    match channel_count {
        1 => {
            for (gray, pixel) in src.iter().zip(dest.iter_mut()) {
                *pixel = Bgra8 {
                    b: *gray,
                    g: *gray,
                    r: *gray,
                    a: 255,
                };
            }
        }
        2 => {
            for (chunk, pixel) in src.chunks_exact(2).zip(dest.iter_mut()) {
                *pixel = Bgra8 {
                    b: chunk[0],
                    g: chunk[0],
                    r: chunk[0],
                    a: chunk[1],
                };
            }
        }
        3 => {
            for (chunk, pixel) in src.chunks_exact(3).zip(dest.iter_mut()) {
                *pixel = Bgra8 {
                    b: chunk[2],
                    g: chunk[1],
                    r: chunk[0],
                    a: 255,
                };
            }
        }
        4 => {
            for (chunk, pixel) in src.chunks_exact(4).zip(dest.iter_mut()) {
                *pixel = Bgra8 {
                    b: chunk[2],
                    g: chunk[1],
                    r: chunk[0],
                    a: chunk[3],
                };
            }
        }
        other => panic!("unsupported interleaved channel count: {other}"),
    }
}

// ============================================================================
// CMYK assembly
// ============================================================================

/// Interleaves 8-bit CMY(A) color samples with a separate black
/// channel into packed CMYK(A), inverting ink polarity.
///
/// The codec hands CMYK back with additive polarity (255 = no ink);
/// the host expects subtractive (255 = full ink), so every color
/// sample is flipped. Alpha, when present, passes through unchanged.
pub(crate) fn assemble_cmyk(color: &[u8], black: &[u8], has_alpha: bool, dest: &mut [u8]) {
    let color_channels = if has_alpha { 4 } else { 3 };
    let out_channels = color_channels + 1;
    for ((chunk, k), out) in color
        .chunks_exact(color_channels)
        .zip(black.iter())
        .zip(dest.chunks_exact_mut(out_channels))
    {
        out[0] = 255 - chunk[0];
        out[1] = 255 - chunk[1];
        out[2] = 255 - chunk[2];
        out[3] = 255 - *k;
        if has_alpha {
            out[4] = chunk[3];
        }
    }
}

/// 16-bit variant of [`assemble_cmyk`], operating on native-endian
/// byte slices. The buffers come straight from the codec and carry no
/// alignment guarantee, so samples are read and written bytewise.
pub(crate) fn assemble_cmyk16(color: &[u8], black: &[u8], has_alpha: bool, dest: &mut [u8]) {
    let color_channels = if has_alpha { 4 } else { 3 };
    let out_channels = color_channels + 1;
    let read = |bytes: &[u8], i: usize| u16::from_ne_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
    let write = |bytes: &mut [u8], i: usize, v: u16| {
        bytes[i * 2..i * 2 + 2].copy_from_slice(&v.to_ne_bytes());
    };
    for ((chunk, k), out) in color
        .chunks_exact(color_channels * 2)
        .zip(black.chunks_exact(2))
        .zip(dest.chunks_exact_mut(out_channels * 2))
    {
        write(out, 0, 65535 - read(chunk, 0));
        write(out, 1, 65535 - read(chunk, 1));
        write(out, 2, 65535 - read(chunk, 2));
        write(out, 3, 65535 - u16::from_ne_bytes([k[0], k[1]]));
        if has_alpha {
            write(out, 4, read(chunk, 3));
        }
    }
}

/// Byte length of a packed interleaved buffer, or `None` on overflow.
pub(crate) fn packed_buffer_len(
    width: u32,
    height: u32,
    channels: u32,
    format: SampleFormat,
) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels as usize)?
        .checked_mul(format.bytes_per_sample())
}

#[cfg(test)]
#[path = "conversions_tests.rs"]
mod tests;
