//! Message attributes, send and receive options, and the received message
//! type with its typed accessors.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AttributeTypeMismatch;
use crate::location::BlobLocation;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

// ============================================================================
// Reserved Attribute and Metadata Keys
// ============================================================================

/// Reserved attribute carrying the `region:container:key` pointer to an
/// offloaded body. The sender overwrites any caller-supplied value under
/// this name whenever it offloads.
pub const BLOB_LOCATION_ATTRIBUTE: &str = "HA.BLOB_LOCATION";

/// Queue metadata key for the enqueue timestamp, in epoch milliseconds
pub const META_SENT_TIMESTAMP: &str = "SentTimestamp";

/// Queue metadata key for the approximate delivery count
pub const META_RECEIVE_COUNT: &str = "ApproximateReceiveCount";

/// Queue metadata key for the first delivery timestamp, in epoch
/// milliseconds
pub const META_FIRST_RECEIVE_TIMESTAMP: &str = "ApproximateFirstReceiveTimestamp";

// ============================================================================
// Message Attributes
// ============================================================================

/// Declared type of a message attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    String,
    Number,
}

impl AttributeKind {
    /// Get the wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One typed metadata field attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttribute {
    pub kind: AttributeKind,
    pub value: String,
}

impl MessageAttribute {
    /// Create a string-typed attribute
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: AttributeKind::String,
            value: value.into(),
        }
    }

    /// Create a number-typed attribute; the value travels in its decimal
    /// string form
    pub fn number(value: impl ToString) -> Self {
        Self {
            kind: AttributeKind::Number,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Wire Messages
// ============================================================================

/// Payload handed to a queue transport for one send attempt
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub body: Bytes,
    pub attributes: HashMap<String, MessageAttribute>,
    pub delay_seconds: Option<u32>,
}

/// One item returned by a queue transport poll, before any offloaded body
/// has been fetched back
#[derive(Debug, Clone)]
pub struct RawQueueMessage {
    pub id: String,
    pub receipt_token: String,
    pub body: Bytes,
    pub attributes: HashMap<String, MessageAttribute>,
    pub queue_metadata: HashMap<String, String>,
}

// ============================================================================
// Received Messages
// ============================================================================

/// A received message, ready for processing.
///
/// When the body was offloaded at send time, `body` holds the fetched
/// original content (never the placeholder) and `attached_blob` records the
/// storage location so the blob can be deleted along with the queue entry.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub receipt_token: String,
    pub body: Bytes,
    pub attributes: HashMap<String, MessageAttribute>,
    pub queue_metadata: HashMap<String, String>,
    pub attached_blob: Option<BlobLocation>,
}

impl From<RawQueueMessage> for Message {
    fn from(raw: RawQueueMessage) -> Self {
        Self {
            id: raw.id,
            receipt_token: raw.receipt_token,
            body: raw.body,
            attributes: raw.attributes,
            queue_metadata: raw.queue_metadata,
            attached_blob: None,
        }
    }
}

impl Message {
    /// Read an attribute as a string. Number-typed attributes are readable
    /// too, in their wire form. Returns `None` when the attribute is absent.
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|attr| attr.value.as_str())
    }

    /// Read an attribute as an unsigned integer.
    ///
    /// The stored value must consist entirely of decimal digits, whatever
    /// kind it was declared with; anything else is a type mismatch. Returns
    /// `Ok(None)` when the attribute is absent.
    pub fn attribute_u64(&self, name: &str) -> Result<Option<u64>, AttributeTypeMismatch> {
        let attr = match self.attributes.get(name) {
            Some(attr) => attr,
            None => return Ok(None),
        };
        let mismatch = || AttributeTypeMismatch {
            name: name.to_string(),
            value: attr.value.clone(),
        };
        if attr.value.is_empty() || !attr.value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(mismatch());
        }
        let parsed = attr.value.parse::<u64>().map_err(|_| mismatch())?;
        Ok(Some(parsed))
    }

    fn metadata_u64(&self, key: &str) -> Option<u64> {
        self.queue_metadata.get(key).and_then(|value| value.parse().ok())
    }

    /// Get the enqueue time in epoch milliseconds
    pub fn sent_at_millis(&self) -> Option<u64> {
        self.metadata_u64(META_SENT_TIMESTAMP)
    }

    /// Get the enqueue time in whole epoch seconds
    pub fn sent_at_secs(&self) -> Option<u64> {
        self.sent_at_millis().map(|millis| millis / 1000)
    }

    /// Get the approximate number of times this message has been delivered
    pub fn receive_count(&self) -> Option<u64> {
        self.metadata_u64(META_RECEIVE_COUNT)
    }

    /// Get the first delivery time in epoch milliseconds
    pub fn first_received_at_millis(&self) -> Option<u64> {
        self.metadata_u64(META_FIRST_RECEIVE_TIMESTAMP)
    }

    /// Get the first delivery time in whole epoch seconds
    pub fn first_received_at_secs(&self) -> Option<u64> {
        self.first_received_at_millis().map(|millis| millis / 1000)
    }
}

// ============================================================================
// Send and Receive Options
// ============================================================================

/// Options applied to one send
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Caller attributes to attach to the message
    pub attributes: HashMap<String, MessageAttribute>,
    /// Delay, in seconds, before the message becomes visible to consumers
    pub delay_seconds: Option<u32>,
}

impl SendOptions {
    /// Create empty send options
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a message attribute
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: MessageAttribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Delay delivery by the given number of seconds
    pub fn with_delay_seconds(mut self, delay: u32) -> Self {
        self.delay_seconds = Some(delay);
        self
    }
}

/// Options applied to one receive poll
#[derive(Debug, Clone, Copy)]
pub struct ReceiveOptions {
    /// Maximum number of messages to return from the poll
    pub max_messages: u32,
    /// Seconds received messages stay hidden from other consumers
    pub visibility_timeout: Option<u32>,
    /// Seconds to wait for messages before returning an empty poll
    pub wait_time_seconds: Option<u32>,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            visibility_timeout: None,
            wait_time_seconds: None,
        }
    }
}

impl ReceiveOptions {
    /// Create receive options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of messages for the poll
    pub fn with_max_messages(mut self, max: u32) -> Self {
        self.max_messages = max;
        self
    }

    /// Set the visibility timeout in seconds
    pub fn with_visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    /// Set the long-poll wait time in seconds
    pub fn with_wait_time_seconds(mut self, seconds: u32) -> Self {
        self.wait_time_seconds = Some(seconds);
        self
    }
}
