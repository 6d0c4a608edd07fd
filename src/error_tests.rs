// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Unit tests for the error module.

use super::*;

#[test]
fn test_error_message_roundtrip() {
    let mut slot = ErrorMessage::new();
    assert_eq!(slot.message(), None);

    slot.set("JxlDecoderSetInput failed.");
    assert_eq!(slot.message(), Some("JxlDecoderSetInput failed."));

    slot.clear();
    assert_eq!(slot.message(), None);
}

#[test]
fn test_error_message_drops_overlong() {
    let mut slot = ErrorMessage::new();
    slot.set("short");

    let long = "x".repeat(MAX_ERROR_MESSAGE_LEN + 1);
    slot.set(&long);
    // Too-long messages empty the slot instead of truncating.
    assert_eq!(slot.message(), None);
}

#[test]
fn test_error_message_accepts_exact_capacity() {
    let mut slot = ErrorMessage::new();
    let exact = "y".repeat(MAX_ERROR_MESSAGE_LEN);
    slot.set(&exact);
    assert_eq!(slot.message(), Some(exact.as_str()));
}

#[test]
fn test_decode_error_display_uses_detail() {
    let err = DecodeError::with_detail(DecodeStatus::DecodeError, "bad codestream");
    assert_eq!(err.to_string(), "bad codestream");
    assert_eq!(err.status(), DecodeStatus::DecodeError);

    let bare = DecodeError::new(DecodeStatus::HasAnimation);
    assert_eq!(bare.to_string(), "decode failed");
    assert_eq!(bare.detail(), None);
}

#[test]
fn test_encode_error_display_uses_detail() {
    let err = EncodeError::with_detail(EncodeStatus::WriteError, "host write failed");
    assert_eq!(err.to_string(), "host write failed");
    assert_eq!(err.status(), EncodeStatus::WriteError);
}

#[test]
fn test_try_vec_zeroes() {
    let buf = try_vec(16).unwrap();
    assert_eq!(buf.len(), 16);
    assert!(buf.iter().all(|&b| b == 0));
}
