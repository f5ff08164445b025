//! Tests for the error types.

use super::*;
use std::error::Error;

#[test]
fn test_transport_error_display_and_context() {
    let error = TransportError::new("Queue at https://example/q is offline");
    assert_eq!(error.to_string(), "Queue at https://example/q is offline");
    assert_eq!(error.context(), "Queue at https://example/q is offline");
    assert!(error.source().is_none());
}

#[test]
fn test_transport_error_keeps_the_source_chain() {
    let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    let error = TransportError::with_source("Send to https://example/q failed", inner);

    assert_eq!(error.to_string(), "Send to https://example/q failed");
    let source = error.source().expect("source should be preserved");
    assert_eq!(source.to_string(), "connection refused");
}

#[test]
fn test_send_error_reports_attempt_counts() {
    let upload = SendError::UploadFailed {
        attempts: 2,
        cause: TransportError::new("offline"),
    };
    let targets = SendError::AllTargetsFailed {
        attempts: 3,
        cause: TransportError::new("offline"),
    };

    assert_eq!(upload.attempts(), 2);
    assert_eq!(targets.attempts(), 3);
    assert_eq!(
        upload.to_string(),
        "Failed to store oversized message body, attempted 2 blob location(s)"
    );
    assert_eq!(
        targets.to_string(),
        "Failed to send message, attempted 3 queue target(s)"
    );
}

#[test]
fn test_send_error_source_is_the_first_cause() {
    let error = SendError::AllTargetsFailed {
        attempts: 2,
        cause: TransportError::new("primary down"),
    };
    let source = error.source().expect("cause should be on the chain");
    assert_eq!(source.to_string(), "primary down");
}

#[test]
fn test_receive_error_display() {
    let poll = ReceiveError::PollFailed {
        endpoint: "https://example/q".to_string(),
        cause: TransportError::new("offline"),
    };
    assert_eq!(
        poll.to_string(),
        "Failed to receive messages from queue at https://example/q"
    );

    let rehydrate = ReceiveError::RehydrateFailed {
        message_id: "m-1".to_string(),
        location: BlobLocation::new("eu-west-1", "overflow", "20240101/abc"),
        cause: TransportError::new("no object"),
    };
    assert_eq!(
        rehydrate.to_string(),
        "Failed to fetch offloaded body for message 'm-1' from eu-west-1:overflow:20240101/abc"
    );

    let malformed = ReceiveError::MalformedPointer {
        message_id: "m-2".to_string(),
        cause: MalformedPointerError {
            value: "junk".to_string(),
        },
    };
    assert_eq!(
        malformed.to_string(),
        "Message 'm-2' carries a malformed blob pointer"
    );
}

#[test]
fn test_malformed_pointer_is_on_the_source_chain() {
    let error = ReceiveError::MalformedPointer {
        message_id: "m-2".to_string(),
        cause: MalformedPointerError {
            value: "junk".to_string(),
        },
    };
    let source = error.source().expect("pointer error should be the source");
    assert_eq!(
        source.to_string(),
        "Blob pointer 'junk' is not in region:container:key format"
    );
}

#[test]
fn test_delete_error_identifies_the_failed_phase() {
    let entry = DeleteError::QueueEntry {
        message_id: "m-1".to_string(),
        cause: TransportError::new("offline"),
    };
    let cleanup = DeleteError::BlobCleanup {
        message_id: "m-1".to_string(),
        location: BlobLocation::new("eu-west-1", "overflow", "20240101/abc"),
        cause: TransportError::new("offline"),
    };

    assert!(!entry.is_blob_cleanup());
    assert!(cleanup.is_blob_cleanup());
    assert_eq!(
        cleanup.to_string(),
        "Deleted queue entry for message 'm-1' but failed to remove blob at eu-west-1:overflow:20240101/abc"
    );
}

#[test]
fn test_attribute_type_mismatch_display() {
    let error = AttributeTypeMismatch {
        name: "retries".to_string(),
        value: "many".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Attribute 'retries' value 'many' is not an unsigned decimal integer"
    );
}
