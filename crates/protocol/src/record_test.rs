//! Tests for log records and delivery messages

use crate::{Frame, LogRecord, Message, ProtocolError, Topic, now_nanos};

fn sample() -> Message {
    Message::new(
        Topic::new("web", "api", "host1").unwrap(),
        LogRecord::new(1000, "hello"),
    )
}

#[test]
fn test_record_now_is_recent() {
    let before = now_nanos();
    let record = LogRecord::now("line");
    let after = now_nanos();

    assert!(record.timestamp >= before && record.timestamp <= after);
    assert_eq!(record.raw, "line");
}

#[test]
fn test_message_to_frame_layout() {
    let frame = sample().to_frame();
    assert_eq!(
        frame,
        Frame::Array(vec![
            Frame::Integer(1000),
            Frame::Simple("web".into()),
            Frame::Simple("api".into()),
            Frame::Simple("host1".into()),
            Frame::bulk("hello"),
        ])
    );
}

#[test]
fn test_message_to_frame_wire_bytes() {
    let bytes = sample().to_frame().to_bytes();
    assert_eq!(
        &bytes[..],
        b"*5\r\n:1000\r\n+web\r\n+api\r\n+host1\r\n$5\r\nhello\r\n"
    );
}

#[test]
fn test_message_from_frame() {
    let decoded = Message::from_frame(sample().to_frame()).unwrap();
    assert_eq!(decoded, sample());
}

#[test]
fn test_message_from_frame_keeps_line_breaks_in_payload() {
    let msg = Message::new(
        Topic::unchecked("a", "b", "c"),
        LogRecord::new(-1, "multi\r\nline"),
    );
    let decoded = Message::from_frame(msg.to_frame()).unwrap();
    assert_eq!(decoded.record.raw, "multi\r\nline");
    assert_eq!(decoded.record.timestamp, -1);
}

#[test]
fn test_message_from_frame_rejects_wrong_length() {
    let frame = Frame::Array(vec![Frame::Integer(1), Frame::bulk("x")]);
    assert!(matches!(
        Message::from_frame(frame),
        Err(ProtocolError::UnexpectedFrame(_))
    ));
}

#[test]
fn test_message_from_frame_rejects_non_array() {
    assert!(matches!(
        Message::from_frame(Frame::error("ERR nope")),
        Err(ProtocolError::UnexpectedFrame(_))
    ));
}

#[test]
fn test_message_from_frame_rejects_text_timestamp() {
    let frame = Frame::Array(vec![
        Frame::bulk("1000"),
        Frame::Simple("web".into()),
        Frame::Simple("api".into()),
        Frame::Simple("h".into()),
        Frame::bulk("x"),
    ]);
    assert!(Message::from_frame(frame).is_err());
}
