//! Receive path: polling one queue, rehydrating offloaded bodies, and the
//! two-phase delete of processed messages.

use aws_config::SdkConfig;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DeleteError, ReceiveError};
use crate::location::BlobLocation;
use crate::message::{Message, ReceiveOptions, BLOB_LOCATION_ATTRIBUTE};
use crate::providers::{S3BlobGateway, SqsQueueTransport};
use crate::target::QueueTarget;
use crate::transport::{BlobTransferGateway, QueueTransport};

#[cfg(test)]
#[path = "receiver_tests.rs"]
mod tests;

// ============================================================================
// Receiver
// ============================================================================

/// Receives messages from one queue, fetching offloaded bodies back from
/// blob storage, and deletes processed messages together with their blobs.
#[derive(Clone)]
pub struct Receiver {
    transport: Arc<dyn QueueTransport>,
    blob_gateway: Arc<dyn BlobTransferGateway>,
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}

impl Receiver {
    /// Create a receiver backed by the AWS SDK, with the queue transport
    /// and blob gateway sharing the given config
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            transport: Arc::new(SqsQueueTransport::new(config)),
            blob_gateway: Arc::new(S3BlobGateway::new(config)),
        }
    }

    /// Create a receiver from explicit collaborator implementations
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

    /// Poll `queue` once for up to `options.max_messages` messages.
    ///
    /// Messages carrying the reserved blob pointer attribute have their
    /// bodies fetched from blob storage; the returned [`Message`] holds the
    /// original content and records the parsed location in
    /// `attached_blob`. Receiving is a single-queue operation; there is no
    /// fallback across queues on the consume side.
    ///
    /// # Errors
    ///
    /// [`ReceiveError::PollFailed`] when the poll itself fails,
    /// [`ReceiveError::MalformedPointer`] when a pointer attribute cannot
    /// be parsed, and [`ReceiveError::RehydrateFailed`] when a blob
    /// download fails. Any of these aborts the whole call; no partial batch
    /// is returned.
    pub async fn receive(
        &self,
        queue: &QueueTarget,
        options: ReceiveOptions,
    ) -> Result<Vec<Message>, ReceiveError> {
        let raw = self
            .transport
            .receive_messages(queue, options)
            .await
            .map_err(|cause| ReceiveError::PollFailed {
                endpoint: queue.endpoint.clone(),
                cause,
            })?;

        debug!(queue = %queue, count = raw.len(), "poll returned");

        let mut messages = Vec::with_capacity(raw.len());
        for item in raw {
            let mut message = Message::from(item);
            if let Some(pointer) = message.attribute_str(BLOB_LOCATION_ATTRIBUTE) {
                let location = BlobLocation::parse_pointer(pointer).map_err(|cause| {
                    ReceiveError::MalformedPointer {
                        message_id: message.id.clone(),
                        cause,
                    }
                })?;
                let body = self.blob_gateway.download(&location).await.map_err(|cause| {
                    ReceiveError::RehydrateFailed {
                        message_id: message.id.clone(),
                        location: location.clone(),
                        cause,
                    }
                })?;
                debug!(
                    message_id = %message.id,
                    location = %location,
                    size = body.len(),
                    "fetched offloaded body"
                );
                message.body = body;
                message.attached_blob = Some(location);
            }
            messages.push(message);
        }

        Ok(messages)
    }

    /// Delete one processed message: first the queue entry, then the
    /// attached blob if there is one. There is no rollback in either
    /// direction.
    ///
    /// # Errors
    ///
    /// [`DeleteError::QueueEntry`] when the queue delete fails; the entry
    /// stays queued and the blob is not touched.
    /// [`DeleteError::BlobCleanup`] when the entry was removed but the blob
    /// was not; the blob is orphaned and needs out-of-band cleanup.
    pub async fn delete(&self, queue: &QueueTarget, message: &Message) -> Result<(), DeleteError> {
        self.transport
            .delete_message(queue, &message.receipt_token)
            .await
            .map_err(|cause| DeleteError::QueueEntry {
                message_id: message.id.clone(),
                cause,
            })?;
        debug!(message_id = %message.id, queue = %queue, "queue entry deleted");

        if let Some(location) = &message.attached_blob {
            self.blob_gateway
                .delete(location)
                .await
                .map_err(|cause| DeleteError::BlobCleanup {
                    message_id: message.id.clone(),
                    location: location.clone(),
                    cause,
                })?;
            info!(message_id = %message.id, location = %location, "offloaded blob deleted");
        }

        Ok(())
    }
}
