//! Collaborator interfaces implemented by queue and blob store providers.

use crate::error::TransportError;
use crate::location::BlobLocation;
use crate::message::{OutboundMessage, RawQueueMessage, ReceiveOptions};
use crate::target::QueueTarget;
use async_trait::async_trait;
use bytes::Bytes;

/// Largest message body, in bytes, a queue accepts inline. Bodies above
/// this limit are offloaded to blob storage before the send.
pub const MAX_MESSAGE_SIZE: usize = 262_144;

/// Queue service operations against a single target.
///
/// Implementations talk to exactly the target they are given; trying the
/// targets of a fallback set in order is the caller's concern.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Send one message to the target, returning the service-assigned
    /// message id
    async fn send_message(
        &self,
        target: &QueueTarget,
        outbound: &OutboundMessage,
    ) -> Result<String, TransportError>;

    /// Poll the target once for up to `options.max_messages` messages
    async fn receive_messages(
        &self,
        target: &QueueTarget,
        options: ReceiveOptions,
    ) -> Result<Vec<RawQueueMessage>, TransportError>;

    /// Delete one message from the target by its receipt token
    async fn delete_message(
        &self,
        target: &QueueTarget,
        receipt_token: &str,
    ) -> Result<(), TransportError>;
}

/// Blob store operations against a single exact location.
///
/// Like [`QueueTransport`], implementations know nothing about fallback
/// sets; they act on the one location they are handed.
#[async_trait]
pub trait BlobTransferGateway: Send + Sync {
    /// Store a body at the given location
    async fn upload(
        &self,
        location: &BlobLocation,
        body: &Bytes,
        content_type: &str,
    ) -> Result<(), TransportError>;

    /// Fetch the object at the given location
    async fn download(&self, location: &BlobLocation) -> Result<Bytes, TransportError>;

    /// Remove the object at the given location
    async fn delete(&self, location: &BlobLocation) -> Result<(), TransportError>;
}
