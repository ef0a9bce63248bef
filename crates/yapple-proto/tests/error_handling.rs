//! Integration tests for decode failure reporting.
//!
//! Every rejected frame must say which field was wrong and why, so the relay
//! can log a useful reason while keeping the connection open.

use yapple_proto::{ErrorKind, Frame};

#[test]
fn test_rejections_carry_path_and_reason() {
    let cases = [
        ("not json", "$", "malformed JSON"),
        ("", "$", "malformed JSON"),
        ("42", "$", "frame must be a JSON object"),
        (r#"{"type":"text","from":"a"}"#, "to", "field is required"),
        (r#"{"type":"connect"}"#, "clientId", "field is required"),
        (r#"{"type":"connect","clientId":""}"#, "clientId", "must not be empty"),
        (r#"{"type":"ack","for":true}"#, "for", "must be a string"),
        (r#"{"type":"subscribe"}"#, "type", "unknown frame type"),
        (r#"{"from":"a"}"#, "type", "field is required"),
    ];

    for (raw, path, reason) in cases {
        let err = Frame::decode(raw).expect_err(raw);
        assert_eq!(err.path, path, "wrong path for {raw:?}");
        let message = err.to_string();
        assert!(
            message.contains(reason),
            "message {message:?} for {raw:?} should mention {reason:?}"
        );
    }
}

#[test]
fn test_text_without_recipient_is_missing_field() {
    let err = Frame::decode(r#"{"type":"text","from":"a"}"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingField);
}

#[test]
fn test_error_codes_are_stable_labels() {
    let codes: Vec<&str> = ["x", "[]", r#"{"type":"nope"}"#, r#"{"type":"error"}"#]
        .iter()
        .map(|raw| Frame::decode(raw).unwrap_err().code())
        .collect();
    assert_eq!(codes, ["syntax", "not_an_object", "unknown_type", "missing_field"]);
}
