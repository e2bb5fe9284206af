//! Property-based tests for STOMP frame encoding/decoding
//!
//! These tests verify the codec for ALL generated inputs, not just specific
//! examples: frames survive the wire, decoding consumes exactly one frame, and
//! arbitrary bytes never panic the decoder.

use bytes::Bytes;
use proptest::prelude::*;
use stompchat_proto::{ChatMessage, Command, Frame};

/// Commands whose headers are escaped on the wire
fn escaped_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Send),
        Just(Command::Subscribe),
        Just(Command::Unsubscribe),
        Just(Command::Disconnect),
        Just(Command::Message),
        Just(Command::Receipt),
        Just(Command::Error),
    ]
}

/// Header text including every character that needs escaping
fn header_text() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-zA-Z0-9 /.:\\\r\n]{0,16}").expect("valid regex")
}

/// Header names never collide with `content-length` (no hyphen)
fn header_name() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-z:\\]{1,8}").expect("valid regex")
}

fn arbitrary_frame() -> impl Strategy<Value = Frame> {
    (
        escaped_command(),
        prop::collection::vec((header_name(), header_text()), 0..6),
        prop::collection::vec(any::<u8>(), 0..512),
    )
        .prop_map(|(command, headers, body)| Frame { command, headers, body: Bytes::from(body) })
}

proptest! {
    #[test]
    fn prop_frame_survives_the_wire(frame in arbitrary_frame()) {
        let wire = frame.to_vec().expect("encode should succeed");
        let (decoded, consumed) = Frame::decode(&wire)
            .expect("decode should succeed")
            .expect("frame should be complete");

        // PROPERTY: exactly one frame consumed
        prop_assert_eq!(consumed, wire.len());

        prop_assert_eq!(decoded.command, frame.command);
        prop_assert_eq!(&decoded.body, &frame.body);

        // PROPERTY: caller headers come back first and in order; the codec
        // only appends content-length
        prop_assert!(decoded.headers.len() >= frame.headers.len());
        prop_assert_eq!(&decoded.headers[..frame.headers.len()], &frame.headers[..]);
    }

    #[test]
    fn prop_batched_frames_decode_in_order(
        frames in prop::collection::vec(arbitrary_frame(), 1..5),
        heartbeats in 0usize..3,
    ) {
        let mut wire = Vec::new();
        for frame in &frames {
            wire.extend(std::iter::repeat_n(b'\n', heartbeats));
            frame.encode(&mut wire).expect("encode should succeed");
        }

        let decoded = Frame::decode_all(&wire).expect("decode should succeed");

        prop_assert_eq!(decoded.len(), frames.len());
        for (decoded, original) in decoded.iter().zip(&frames) {
            prop_assert_eq!(decoded.command, original.command);
            prop_assert_eq!(&decoded.body, &original.body);
        }
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Frame::decode(&bytes);
        let _ = Frame::decode_all(&bytes);
    }

    #[test]
    fn prop_truncated_frame_is_never_complete(frame in arbitrary_frame(), cut in any::<prop::sample::Index>()) {
        let wire = frame.to_vec().expect("encode should succeed");
        let cut = cut.index(wire.len());

        // PROPERTY: any strict prefix is pending, never a (wrong) frame
        let result = Frame::decode(&wire[..cut]);
        prop_assert!(matches!(result, Ok(None)), "prefix of {} bytes decoded as {:?}", cut, result);
    }

    #[test]
    fn prop_chat_record_survives_json(sender in "\\PC{0,20}", content in "\\PC{1,40}") {
        let message = ChatMessage::chat(sender, content);
        let json = message.to_json().expect("serialize should succeed");
        let parsed = ChatMessage::from_json(json.as_bytes()).expect("parse should succeed");

        prop_assert_eq!(parsed, message);
    }
}
