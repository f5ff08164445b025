//! AWS-backed collaborator implementations.
//!
//! [`SqsQueueTransport`] and [`S3BlobGateway`] adapt the official AWS SDK
//! crates to the transport traits. Both keep one client per region, built
//! on demand from a shared [`SdkConfig`], so a fallback set spanning
//! regions works from a single handle.

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_sqs::types::{MessageAttributeValue, MessageSystemAttributeName};
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::TransportError;
use crate::location::BlobLocation;
use crate::message::{
    AttributeKind, MessageAttribute, OutboundMessage, RawQueueMessage, ReceiveOptions,
};
use crate::target::QueueTarget;
use crate::transport::{BlobTransferGateway, QueueTransport};

#[cfg(test)]
#[path = "aws_tests.rs"]
mod tests;

/// Largest batch one SQS poll can return
const SQS_MAX_BATCH: u32 = 10;

// ============================================================================
// SqsQueueTransport
// ============================================================================

/// Queue transport over AWS SQS
pub struct SqsQueueTransport {
    config: SdkConfig,
    clients: RwLock<HashMap<String, aws_sdk_sqs::Client>>,
}

impl std::fmt::Debug for SqsQueueTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsQueueTransport").finish_non_exhaustive()
    }
}

impl SqsQueueTransport {
    /// Create a transport from a loaded SDK config
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            config: config.clone(),
            clients: RwLock::new(HashMap::new()),
        }
    }

    async fn client_for(&self, region: &str) -> aws_sdk_sqs::Client {
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(region) {
                return client.clone();
            }
        }

        let config = aws_sdk_sqs::config::Builder::from(&self.config)
            .region(Region::new(region.to_string()))
            .build();
        let client = aws_sdk_sqs::Client::from_conf(config);

        let mut clients = self.clients.write().await;
        clients.entry(region.to_string()).or_insert(client).clone()
    }
}

#[async_trait]
impl QueueTransport for SqsQueueTransport {
    async fn send_message(
        &self,
        target: &QueueTarget,
        outbound: &OutboundMessage,
    ) -> Result<String, TransportError> {
        // SQS bodies are text; binary payloads travel through blob offload.
        let body = String::from_utf8(outbound.body.to_vec()).map_err(|_| {
            TransportError::new("Message body is not valid UTF-8 and cannot be queued inline")
        })?;

        let client = self.client_for(&target.region).await;
        let mut request = client
            .send_message()
            .queue_url(&target.endpoint)
            .message_body(body);
        if let Some(delay) = outbound.delay_seconds {
            request = request.delay_seconds(delay as i32);
        }
        for (name, attribute) in &outbound.attributes {
            let value = MessageAttributeValue::builder()
                .data_type(attribute.kind.as_str())
                .string_value(&attribute.value)
                .build()
                .map_err(|error| {
                    TransportError::with_source(
                        format!("Message attribute '{name}' could not be encoded"),
                        error,
                    )
                })?;
            request = request.message_attributes(name, value);
        }

        let output = request.send().await.map_err(|error| {
            TransportError::with_source(format!("Send to {} failed", target.endpoint), error)
        })?;
        output
            .message_id()
            .map(str::to_string)
            .ok_or_else(|| TransportError::new("Queue service returned no message id"))
    }

    async fn receive_messages(
        &self,
        target: &QueueTarget,
        options: ReceiveOptions,
    ) -> Result<Vec<RawQueueMessage>, TransportError> {
        let client = self.client_for(&target.region).await;
        let mut request = client
            .receive_message()
            .queue_url(&target.endpoint)
            .max_number_of_messages(options.max_messages.min(SQS_MAX_BATCH) as i32)
            .message_attribute_names("All")
            .message_system_attribute_names(MessageSystemAttributeName::All);
        if let Some(seconds) = options.visibility_timeout {
            request = request.visibility_timeout(seconds as i32);
        }
        if let Some(seconds) = options.wait_time_seconds {
            request = request.wait_time_seconds(seconds as i32);
        }

        let output = request.send().await.map_err(|error| {
            TransportError::with_source(format!("Receive from {} failed", target.endpoint), error)
        })?;

        output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(raw_from_sqs)
            .collect()
    }

    async fn delete_message(
        &self,
        target: &QueueTarget,
        receipt_token: &str,
    ) -> Result<(), TransportError> {
        let client = self.client_for(&target.region).await;
        client
            .delete_message()
            .queue_url(&target.endpoint)
            .receipt_handle(receipt_token)
            .send()
            .await
            .map_err(|error| {
                TransportError::with_source(format!("Delete from {} failed", target.endpoint), error)
            })?;
        Ok(())
    }
}

/// Convert one SQS message into the provider-neutral form
fn raw_from_sqs(message: aws_sdk_sqs::types::Message) -> Result<RawQueueMessage, TransportError> {
    let id = message
        .message_id
        .ok_or_else(|| TransportError::new("Queue service returned a message without an id"))?;
    let receipt_token = message.receipt_handle.ok_or_else(|| {
        TransportError::new(format!("Message '{id}' arrived without a receipt handle"))
    })?;
    let body = Bytes::from(message.body.unwrap_or_default());

    let mut attributes = HashMap::new();
    for (name, value) in message.message_attributes.unwrap_or_default() {
        match attribute_from_sqs(&value) {
            Some(attribute) => {
                attributes.insert(name, attribute);
            }
            None => {
                warn!(
                    attribute = %name,
                    data_type = %value.data_type(),
                    "dropping message attribute with unsupported data type"
                );
            }
        }
    }

    let mut queue_metadata = HashMap::new();
    for (name, value) in message.attributes.unwrap_or_default() {
        queue_metadata.insert(name.as_str().to_string(), value);
    }

    Ok(RawQueueMessage {
        id,
        receipt_token,
        body,
        attributes,
        queue_metadata,
    })
}

/// Map an SQS attribute value onto the closed String/Number kinds; other
/// data types (Binary, custom labels) have no equivalent and are dropped
fn attribute_from_sqs(value: &MessageAttributeValue) -> Option<MessageAttribute> {
    let kind = match value.data_type() {
        "String" => AttributeKind::String,
        "Number" => AttributeKind::Number,
        _ => return None,
    };
    let text = value.string_value()?;
    Some(MessageAttribute {
        kind,
        value: text.to_string(),
    })
}

// ============================================================================
// S3BlobGateway
// ============================================================================

/// Blob gateway over AWS S3
pub struct S3BlobGateway {
    config: SdkConfig,
    path_style: bool,
    clients: RwLock<HashMap<String, aws_sdk_s3::Client>>,
}

impl std::fmt::Debug for S3BlobGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobGateway")
            .field("path_style", &self.path_style)
            .finish_non_exhaustive()
    }
}

impl S3BlobGateway {
    /// Create a gateway from a loaded SDK config
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            config: config.clone(),
            path_style: false,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Use path-style addressing, required by most S3-compatible local
    /// endpoints
    pub fn with_path_style(mut self) -> Self {
        self.path_style = true;
        self
    }

    async fn client_for(&self, region: &str) -> aws_sdk_s3::Client {
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(region) {
                return client.clone();
            }
        }

        let config = aws_sdk_s3::config::Builder::from(&self.config)
            .region(Region::new(region.to_string()))
            .force_path_style(self.path_style)
            .build();
        let client = aws_sdk_s3::Client::from_conf(config);

        let mut clients = self.clients.write().await;
        clients.entry(region.to_string()).or_insert(client).clone()
    }
}

#[async_trait]
impl BlobTransferGateway for S3BlobGateway {
    async fn upload(
        &self,
        location: &BlobLocation,
        body: &Bytes,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let client = self.client_for(&location.region).await;
        client
            .put_object()
            .bucket(&location.container)
            .key(&location.key)
            .body(ByteStream::from(body.clone()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|error| {
                TransportError::with_source(format!("Upload to {location} failed"), error)
            })?;
        Ok(())
    }

    async fn download(&self, location: &BlobLocation) -> Result<Bytes, TransportError> {
        let client = self.client_for(&location.region).await;
        let output = client
            .get_object()
            .bucket(&location.container)
            .key(&location.key)
            .send()
            .await
            .map_err(|error| {
                TransportError::with_source(format!("Download of {location} failed"), error)
            })?;
        let collected = output.body.collect().await.map_err(|error| {
            TransportError::with_source(format!("Reading the body of {location} failed"), error)
        })?;
        Ok(collected.into_bytes())
    }

    async fn delete(&self, location: &BlobLocation) -> Result<(), TransportError> {
        let client = self.client_for(&location.region).await;
        client
            .delete_object()
            .bucket(&location.container)
            .key(&location.key)
            .send()
            .await
            .map_err(|error| {
                TransportError::with_source(format!("Delete of {location} failed"), error)
            })?;
        Ok(())
    }
}
