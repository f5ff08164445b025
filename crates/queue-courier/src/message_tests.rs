//! Tests for message attributes, options, and typed accessors.

use super::*;

fn message_with(
    attributes: Vec<(&str, MessageAttribute)>,
    metadata: Vec<(&str, &str)>,
) -> Message {
    Message {
        id: "m-1".to_string(),
        receipt_token: "r-1".to_string(),
        body: Bytes::from_static(b"body"),
        attributes: attributes
            .into_iter()
            .map(|(name, attr)| (name.to_string(), attr))
            .collect(),
        queue_metadata: metadata
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        attached_blob: None,
    }
}

// ============================================================================
// Attribute Tests
// ============================================================================

#[test]
fn test_attribute_kinds_have_wire_names() {
    assert_eq!(AttributeKind::String.as_str(), "String");
    assert_eq!(AttributeKind::Number.as_str(), "Number");
    assert_eq!(AttributeKind::Number.to_string(), "Number");
}

#[test]
fn test_attribute_constructors() {
    let text = MessageAttribute::string("hello");
    assert_eq!(text.kind, AttributeKind::String);
    assert_eq!(text.value, "hello");

    let count = MessageAttribute::number(42u32);
    assert_eq!(count.kind, AttributeKind::Number);
    assert_eq!(count.value, "42");
}

#[test]
fn test_reserved_attribute_name() {
    assert_eq!(BLOB_LOCATION_ATTRIBUTE, "HA.BLOB_LOCATION");
}

// ============================================================================
// Typed Accessor Tests
// ============================================================================

#[test]
fn test_attribute_str_reads_both_kinds() {
    let message = message_with(
        vec![
            ("label", MessageAttribute::string("blue")),
            ("count", MessageAttribute::number(7)),
        ],
        vec![],
    );
    assert_eq!(message.attribute_str("label"), Some("blue"));
    assert_eq!(message.attribute_str("count"), Some("7"));
    assert_eq!(message.attribute_str("missing"), None);
}

#[test]
fn test_attribute_u64_accepts_digit_values_of_either_kind() {
    // A digit-only value reads as an integer even when it was declared as
    // a string.
    let message = message_with(
        vec![
            ("as-number", MessageAttribute::number(1234u32)),
            ("as-string", MessageAttribute::string("1234")),
        ],
        vec![],
    );
    assert_eq!(message.attribute_u64("as-number").unwrap(), Some(1234));
    assert_eq!(message.attribute_u64("as-string").unwrap(), Some(1234));
}

#[test]
fn test_attribute_u64_missing_is_none() {
    let message = message_with(vec![], vec![]);
    assert_eq!(message.attribute_u64("absent").unwrap(), None);
}

#[test]
fn test_attribute_u64_rejects_non_digit_values() {
    let message = message_with(
        vec![
            ("word", MessageAttribute::string("fast")),
            ("signed", MessageAttribute::string("-5")),
            ("decimal", MessageAttribute::number("3.5")),
            ("empty", MessageAttribute::string("")),
        ],
        vec![],
    );
    for name in ["word", "signed", "decimal", "empty"] {
        let error = message.attribute_u64(name).unwrap_err();
        assert_eq!(error.name, name);
    }
}

// ============================================================================
// Queue Metadata Tests
// ============================================================================

#[test]
fn test_metadata_timestamps_floor_to_seconds() {
    let message = message_with(
        vec![],
        vec![
            ("SentTimestamp", "1704133701867"),
            ("ApproximateReceiveCount", "3"),
            ("ApproximateFirstReceiveTimestamp", "1704133702999"),
        ],
    );
    assert_eq!(message.sent_at_millis(), Some(1_704_133_701_867));
    assert_eq!(message.sent_at_secs(), Some(1_704_133_701));
    assert_eq!(message.receive_count(), Some(3));
    assert_eq!(message.first_received_at_millis(), Some(1_704_133_702_999));
    assert_eq!(message.first_received_at_secs(), Some(1_704_133_702));
}

#[test]
fn test_metadata_absent_or_garbled_is_none() {
    let message = message_with(vec![], vec![("ApproximateReceiveCount", "many")]);
    assert_eq!(message.sent_at_millis(), None);
    assert_eq!(message.sent_at_secs(), None);
    assert_eq!(message.receive_count(), None);
    assert_eq!(message.first_received_at_millis(), None);
}

#[test]
fn test_from_raw_has_no_attached_blob() {
    let raw = RawQueueMessage {
        id: "m-9".to_string(),
        receipt_token: "r-9".to_string(),
        body: Bytes::from_static(b"payload"),
        attributes: HashMap::new(),
        queue_metadata: HashMap::new(),
    };

    let message = Message::from(raw);
    assert_eq!(message.id, "m-9");
    assert_eq!(message.receipt_token, "r-9");
    assert_eq!(message.body, Bytes::from_static(b"payload"));
    assert!(message.attached_blob.is_none());
}

// ============================================================================
// Options Tests
// ============================================================================

#[test]
fn test_send_options_builder() {
    let options = SendOptions::new()
        .with_attribute("priority", MessageAttribute::string("high"))
        .with_delay_seconds(30);

    assert_eq!(
        options.attributes.get("priority"),
        Some(&MessageAttribute::string("high"))
    );
    assert_eq!(options.delay_seconds, Some(30));
    assert!(SendOptions::default().attributes.is_empty());
}

#[test]
fn test_receive_options_defaults_and_builder() {
    let defaults = ReceiveOptions::default();
    assert_eq!(defaults.max_messages, 10);
    assert!(defaults.visibility_timeout.is_none());
    assert!(defaults.wait_time_seconds.is_none());

    let options = ReceiveOptions::new()
        .with_max_messages(2)
        .with_visibility_timeout(60)
        .with_wait_time_seconds(5);
    assert_eq!(options.max_messages, 2);
    assert_eq!(options.visibility_timeout, Some(60));
    assert_eq!(options.wait_time_seconds, Some(5));
}
