//! Error types for send, receive, and delete operations.

use thiserror::Error;

use crate::location::BlobLocation;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Failure reported by a queue transport or blob gateway implementation.
///
/// The delivery logic treats collaborator failures as opaque: a readable
/// context line plus the underlying error kept on the source chain.
#[derive(Debug, Error)]
#[error("{context}")]
pub struct TransportError {
    context: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    /// Create a transport error from a context message alone
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: None,
        }
    }

    /// Create a transport error wrapping an underlying cause
    pub fn with_source(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// Get the context message
    pub fn context(&self) -> &str {
        &self.context
    }
}

// ============================================================================
// Send Errors
// ============================================================================

/// Errors raised when a send has exhausted its fallback candidates
#[derive(Debug, Error)]
pub enum SendError {
    /// Every candidate blob location refused the oversized body. The queue
    /// send was never attempted.
    #[error("Failed to store oversized message body, attempted {attempts} blob location(s)")]
    UploadFailed {
        attempts: usize,
        #[source]
        cause: TransportError,
    },

    /// Every queue target refused the message. The cause is the error from
    /// the first target tried, not the last. If the body was offloaded
    /// before the sends failed, the uploaded blob stays in place.
    #[error("Failed to send message, attempted {attempts} queue target(s)")]
    AllTargetsFailed {
        attempts: usize,
        #[source]
        cause: TransportError,
    },
}

impl SendError {
    /// Number of fallback candidates attempted before giving up
    pub fn attempts(&self) -> usize {
        match self {
            Self::UploadFailed { attempts, .. } => *attempts,
            Self::AllTargetsFailed { attempts, .. } => *attempts,
        }
    }
}

// ============================================================================
// Receive Errors
// ============================================================================

/// Errors raised while polling a queue and rehydrating offloaded bodies
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The poll against the queue service failed, no messages were returned
    #[error("Failed to receive messages from queue at {endpoint}")]
    PollFailed {
        endpoint: String,
        #[source]
        cause: TransportError,
    },

    /// A message carried a blob pointer but the download failed. The whole
    /// receive call is aborted rather than returning a partial batch.
    #[error("Failed to fetch offloaded body for message '{message_id}' from {location}")]
    RehydrateFailed {
        message_id: String,
        location: BlobLocation,
        #[source]
        cause: TransportError,
    },

    /// The reserved blob location attribute was present but not parseable
    #[error("Message '{message_id}' carries a malformed blob pointer")]
    MalformedPointer {
        message_id: String,
        #[source]
        cause: MalformedPointerError,
    },
}

// ============================================================================
// Delete Errors
// ============================================================================

/// Errors raised by the two-phase delete of a processed message.
///
/// The variants describe different partial states and are never merged:
/// `QueueEntry` means nothing was deleted, `BlobCleanup` means the queue
/// entry is gone but the blob is now orphaned.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Phase one failed: the queue entry is still queued and will be
    /// redelivered. The blob, if any, was not touched.
    #[error("Failed to delete message '{message_id}' from the queue")]
    QueueEntry {
        message_id: String,
        #[source]
        cause: TransportError,
    },

    /// Phase two failed: the queue entry was removed but the blob at
    /// `location` was not, and needs out-of-band cleanup.
    #[error("Deleted queue entry for message '{message_id}' but failed to remove blob at {location}")]
    BlobCleanup {
        message_id: String,
        location: BlobLocation,
        #[source]
        cause: TransportError,
    },
}

impl DeleteError {
    /// Check if the queue entry was removed and only the blob was left behind
    pub fn is_blob_cleanup(&self) -> bool {
        matches!(self, Self::BlobCleanup { .. })
    }
}

// ============================================================================
// Value Errors
// ============================================================================

/// Raised when a pointer attribute value does not match the
/// `region:container:key` format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Blob pointer '{value}' is not in region:container:key format")]
pub struct MalformedPointerError {
    pub value: String,
}

/// Raised when an attribute value cannot be read through the requested
/// typed accessor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Attribute '{name}' value '{value}' is not an unsigned decimal integer")]
pub struct AttributeTypeMismatch {
    pub name: String,
    pub value: String,
}
