//! Fuzz target for ChatMessage JSON parsing
//!
//! Any record that parses must serialize and parse back to itself.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stompchat_proto::ChatMessage;

fuzz_target!(|data: &[u8]| {
    let Ok(message) = ChatMessage::from_json(data) else {
        return;
    };

    let json = message.to_json().expect("parsed record must serialize");
    let reparsed = ChatMessage::from_json(json.as_bytes()).expect("serialized record must parse");
    assert_eq!(message, reparsed);
});
