//! Fuzz target for Frame::decode
//!
//! This fuzzer tests STOMP frame decoding with arbitrary byte sequences to
//! find:
//! - Parser crashes or panics
//! - Offsets past the end of the input
//! - Malformed headers or escapes that bypass validation
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stompchat_proto::Frame;

fuzz_target!(|data: &[u8]| {
    if let Ok(Some((_frame, consumed))) = Frame::decode(data) {
        assert!(consumed > 0 && consumed <= data.len());
    }

    let _ = Frame::decode_all(data);
});
