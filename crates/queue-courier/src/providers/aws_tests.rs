//! Tests for the AWS adapters that run without a live service.

use super::*;

fn empty_config() -> SdkConfig {
    SdkConfig::builder().build()
}

// ============================================================================
// SQS Mapping Tests
// ============================================================================

#[test]
fn test_attribute_mapping_from_sqs() {
    let string_attr = MessageAttributeValue::builder()
        .data_type("String")
        .string_value("blue")
        .build()
        .unwrap();
    let number_attr = MessageAttributeValue::builder()
        .data_type("Number")
        .string_value("42")
        .build()
        .unwrap();
    let binary_attr = MessageAttributeValue::builder()
        .data_type("Binary")
        .string_value("ignored")
        .build()
        .unwrap();

    assert_eq!(
        attribute_from_sqs(&string_attr),
        Some(MessageAttribute::string("blue"))
    );
    assert_eq!(
        attribute_from_sqs(&number_attr),
        Some(MessageAttribute::number(42))
    );
    assert_eq!(attribute_from_sqs(&binary_attr), None);
}

#[test]
fn test_raw_from_sqs_maps_all_parts() {
    let value = MessageAttributeValue::builder()
        .data_type("String")
        .string_value("api")
        .build()
        .unwrap();
    let message = aws_sdk_sqs::types::Message::builder()
        .message_id("m-1")
        .receipt_handle("r-1")
        .body("payload")
        .message_attributes("origin", value)
        .attributes(MessageSystemAttributeName::SentTimestamp, "1704133701867")
        .build();

    let raw = raw_from_sqs(message).unwrap();
    assert_eq!(raw.id, "m-1");
    assert_eq!(raw.receipt_token, "r-1");
    assert_eq!(raw.body, Bytes::from_static(b"payload"));
    assert_eq!(raw.attributes["origin"], MessageAttribute::string("api"));
    assert_eq!(raw.queue_metadata["SentTimestamp"], "1704133701867");
}

#[test]
fn test_raw_from_sqs_drops_unsupported_attribute_types() {
    let binary = MessageAttributeValue::builder()
        .data_type("Binary")
        .string_value("zz")
        .build()
        .unwrap();
    let message = aws_sdk_sqs::types::Message::builder()
        .message_id("m-1")
        .receipt_handle("r-1")
        .body("payload")
        .message_attributes("blob", binary)
        .build();

    let raw = raw_from_sqs(message).unwrap();
    assert!(raw.attributes.is_empty());
}

#[test]
fn test_raw_from_sqs_requires_id_and_receipt() {
    let no_id = aws_sdk_sqs::types::Message::builder()
        .receipt_handle("r-1")
        .build();
    assert!(raw_from_sqs(no_id).is_err());

    let no_receipt = aws_sdk_sqs::types::Message::builder()
        .message_id("m-1")
        .build();
    assert!(raw_from_sqs(no_receipt).is_err());
}

// ============================================================================
// Adapter Behavior Tests
// ============================================================================

#[tokio::test]
async fn test_send_rejects_non_utf8_bodies() {
    let transport = SqsQueueTransport::new(&empty_config());
    let outbound = OutboundMessage {
        body: Bytes::from_static(&[0xff, 0xfe]),
        attributes: HashMap::new(),
        delay_seconds: None,
    };

    let error = transport
        .send_message(&QueueTarget::new("eu-west-1", "https://q/x"), &outbound)
        .await
        .unwrap_err();
    assert!(error.context().contains("UTF-8"));
}

#[tokio::test]
async fn test_sqs_clients_are_cached_per_region() {
    let transport = SqsQueueTransport::new(&empty_config());
    let _ = transport.client_for("eu-west-1").await;
    let _ = transport.client_for("eu-west-1").await;
    let _ = transport.client_for("us-east-1").await;

    let clients = transport.clients.read().await;
    assert_eq!(clients.len(), 2);
}

#[tokio::test]
async fn test_s3_clients_are_cached_per_region() {
    let gateway = S3BlobGateway::new(&empty_config()).with_path_style();
    let _ = gateway.client_for("eu-west-1").await;
    let _ = gateway.client_for("eu-central-1").await;
    let _ = gateway.client_for("eu-central-1").await;

    let clients = gateway.clients.read().await;
    assert_eq!(clients.len(), 2);
}
