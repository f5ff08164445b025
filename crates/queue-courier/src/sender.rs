//! Send path: the offload decision, blob upload fallback, and ordered queue
//! fallback.

use aws_config::SdkConfig;
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::SendError;
use crate::failover;
use crate::location::{offload_sub_path, BlobLocationSet};
use crate::message::{MessageAttribute, OutboundMessage, SendOptions, BLOB_LOCATION_ATTRIBUTE};
use crate::providers::{S3BlobGateway, SqsQueueTransport};
use crate::target::{QueueTarget, QueueTargetSet};
use crate::transport::{BlobTransferGateway, QueueTransport, MAX_MESSAGE_SIZE};

#[cfg(test)]
#[path = "sender_tests.rs"]
mod tests;

/// Content type recorded on offloaded bodies
const OFFLOAD_CONTENT_TYPE: &str = "text/plain";

/// Body stored in the queue entry when the real body lives in a blob
const PLACEHOLDER_BODY: &[u8] = b" ";

// ============================================================================
// SendOutcome
// ============================================================================

/// Result of a successful send: the target that accepted the message and
/// the id the service assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOutcome {
    pub accepted_by: QueueTarget,
    pub message_id: String,
}

// ============================================================================
// Sender
// ============================================================================

/// Sends messages through an ordered set of queue targets, offloading
/// oversized bodies to blob storage first.
#[derive(Clone)]
pub struct Sender {
    transport: Arc<dyn QueueTransport>,
    blob_gateway: Arc<dyn BlobTransferGateway>,
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

impl Sender {
    /// Create a sender backed by the AWS SDK, with the queue transport and
    /// blob gateway sharing the given config
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            transport: Arc::new(SqsQueueTransport::new(config)),
            blob_gateway: Arc::new(S3BlobGateway::new(config)),
        }
    }

    /// Create a sender from explicit collaborator implementations
    pub fn from_parts(
        transport: Arc<dyn QueueTransport>,
        blob_gateway: Arc<dyn BlobTransferGateway>,
    ) -> Self {
        Self {
            transport,
            blob_gateway,
        }
    }

    /// Replace the blob gateway, keeping the queue transport
    pub fn with_blob_gateway(mut self, blob_gateway: Arc<dyn BlobTransferGateway>) -> Self {
        self.blob_gateway = blob_gateway;
        self
    }

    /// Send one message through the first target in `queues` that accepts
    /// it.
    ///
    /// Bodies larger than [`MAX_MESSAGE_SIZE`] are first uploaded to the
    /// first writable location in `blob_locations`; the queue entry then
    /// carries a one-space placeholder body and a reserved attribute
    /// pointing at the location actually used. Bodies at or under the limit
    /// travel inline and `blob_locations` is not touched.
    ///
    /// # Errors
    ///
    /// [`SendError::UploadFailed`] when every blob location refuses the
    /// oversized body; no queue send is attempted in that case.
    /// [`SendError::AllTargetsFailed`] when every queue target refuses the
    /// message. Both carry the error from the first candidate tried. A
    /// successful upload followed by total send failure leaves the blob in
    /// place.
    pub async fn send(
        &self,
        queues: &QueueTargetSet,
        blob_locations: &BlobLocationSet,
        body: Bytes,
        options: SendOptions,
    ) -> Result<SendOutcome, SendError> {
        let mut attributes = options.attributes;
        let mut outbound_body = body;

        if outbound_body.len() > MAX_MESSAGE_SIZE {
            debug!(
                size = outbound_body.len(),
                limit = MAX_MESSAGE_SIZE,
                "body exceeds the inline limit, offloading to blob storage"
            );
            let sub_path = offload_sub_path(Utc::now().date_naive(), &outbound_body);
            let candidates = blob_locations.resolve(&sub_path);

            let gateway = &self.blob_gateway;
            let payload = &outbound_body;
            let upload = failover::first_success(
                candidates.primary(),
                candidates.backups(),
                move |location| async move {
                    gateway
                        .upload(location, payload, OFFLOAD_CONTENT_TYPE)
                        .await
                        .map(|()| location)
                },
            )
            .await;

            let stored = match upload {
                Ok((_, location)) => location,
                Err(exhausted) => {
                    return Err(SendError::UploadFailed {
                        attempts: exhausted.attempts,
                        cause: exhausted.first_error,
                    });
                }
            };

            info!(location = %stored, size = outbound_body.len(), "offloaded oversized body");
            attributes.insert(
                BLOB_LOCATION_ATTRIBUTE.to_string(),
                MessageAttribute::string(stored.to_pointer()),
            );
            outbound_body = Bytes::from_static(PLACEHOLDER_BODY);
        }

        let outbound = OutboundMessage {
            body: outbound_body,
            attributes,
            delay_seconds: options.delay_seconds,
        };

        let transport = &self.transport;
        let message = &outbound;
        let sent = failover::first_success(queues.primary(), queues.backups(), move |target| {
            async move { transport.send_message(target, message).await }
        })
        .await;

        match sent {
            Ok((index, message_id)) => {
                let accepted_by = queues.targets()[index].clone();
                info!(target = %accepted_by, message_id = %message_id, "message accepted");
                Ok(SendOutcome {
                    accepted_by,
                    message_id,
                })
            }
            Err(exhausted) => Err(SendError::AllTargetsFailed {
                attempts: exhausted.attempts,
                cause: exhausted.first_error,
            }),
        }
    }
}
