//! In-memory collaborator implementations for testing and development.
//!
//! This module provides functional stand-ins for a queue service and a
//! blob store:
//! - FIFO queues keyed by endpoint, with delivery delay, visibility
//!   timeouts, and receive counting
//! - an object map keyed by region, container, and key
//!
//! Both record every attempt and support taking individual endpoints or
//! containers offline, so fallback behavior can be asserted exactly.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::TransportError;
use crate::location::BlobLocation;
use crate::message::{
    MessageAttribute, OutboundMessage, RawQueueMessage, ReceiveOptions, META_FIRST_RECEIVE_TIMESTAMP,
    META_RECEIVE_COUNT, META_SENT_TIMESTAMP,
};
use crate::target::QueueTarget;
use crate::transport::{BlobTransferGateway, QueueTransport};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Visibility timeout applied when a receive does not specify one
const DEFAULT_VISIBILITY_SECS: u64 = 30;

// ============================================================================
// Internal Queue Storage
// ============================================================================

/// State shared by all queues of one transport instance
#[derive(Debug, Default)]
struct QueueServiceState {
    /// Entries per endpoint, in arrival order
    queues: HashMap<String, Vec<StoredEntry>>,
    /// Endpoints currently refusing every operation
    offline: HashSet<String>,
    /// Endpoints attempted by send calls, in order, including failures
    send_attempts: Vec<String>,
}

/// One entry held in a queue
#[derive(Debug, Clone)]
struct StoredEntry {
    id: String,
    receipt_token: String,
    body: Bytes,
    attributes: HashMap<String, MessageAttribute>,
    sent_at_ms: u64,
    receive_count: u64,
    first_received_at_ms: Option<u64>,
    /// Hidden from receives until this instant passes
    invisible_until: Option<Instant>,
}

impl StoredEntry {
    fn is_visible(&self, now: Instant) -> bool {
        match self.invisible_until {
            Some(until) => until <= now,
            None => true,
        }
    }

    fn snapshot(&self) -> RawQueueMessage {
        let mut queue_metadata = HashMap::new();
        queue_metadata.insert(META_SENT_TIMESTAMP.to_string(), self.sent_at_ms.to_string());
        queue_metadata.insert(META_RECEIVE_COUNT.to_string(), self.receive_count.to_string());
        if let Some(first) = self.first_received_at_ms {
            queue_metadata.insert(META_FIRST_RECEIVE_TIMESTAMP.to_string(), first.to_string());
        }

        RawQueueMessage {
            id: self.id.clone(),
            receipt_token: self.receipt_token.clone(),
            body: self.body.clone(),
            attributes: self.attributes.clone(),
            queue_metadata,
        }
    }
}

// ============================================================================
// InMemoryQueueTransport
// ============================================================================

/// In-memory queue transport.
///
/// Delivery delays and visibility timeouts behave like the real service:
/// a delayed entry is hidden from receives until the delay passes, and a
/// received entry is hidden for the visibility timeout.
#[derive(Debug, Default)]
pub struct InMemoryQueueTransport {
    state: Mutex<QueueServiceState>,
}

impl InMemoryQueueTransport {
    /// Create an empty queue service
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an endpoint as unreachable, or reachable again
    pub fn set_offline(&self, endpoint: &str, offline: bool) {
        let mut state = self.lock();
        if offline {
            state.offline.insert(endpoint.to_string());
        } else {
            state.offline.remove(endpoint);
        }
    }

    /// Get the endpoints attempted by send calls, in order, including
    /// attempts that failed
    pub fn send_attempts(&self) -> Vec<String> {
        self.lock().send_attempts.clone()
    }

    /// Snapshot the entries currently held at an endpoint, including ones
    /// hidden by a delay or visibility timeout
    pub fn stored(&self, endpoint: &str) -> Vec<RawQueueMessage> {
        let state = self.lock();
        state
            .queues
            .get(endpoint)
            .map(|entries| entries.iter().map(StoredEntry::snapshot).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueueTransport {
    async fn send_message(
        &self,
        target: &QueueTarget,
        outbound: &OutboundMessage,
    ) -> Result<String, TransportError> {
        let mut state = self.lock();
        state.send_attempts.push(target.endpoint.clone());
        if state.offline.contains(&target.endpoint) {
            return Err(TransportError::new(format!(
                "Queue at {} is offline",
                target.endpoint
            )));
        }

        let id = Uuid::new_v4().to_string();
        let entry = StoredEntry {
            id: id.clone(),
            receipt_token: Uuid::new_v4().to_string(),
            body: outbound.body.clone(),
            attributes: outbound.attributes.clone(),
            sent_at_ms: Utc::now().timestamp_millis() as u64,
            receive_count: 0,
            first_received_at_ms: None,
            invisible_until: outbound
                .delay_seconds
                .map(|delay| Instant::now() + Duration::from_secs(u64::from(delay))),
        };
        state
            .queues
            .entry(target.endpoint.clone())
            .or_default()
            .push(entry);
        Ok(id)
    }

    async fn receive_messages(
        &self,
        target: &QueueTarget,
        options: ReceiveOptions,
    ) -> Result<Vec<RawQueueMessage>, TransportError> {
        let mut state = self.lock();
        if state.offline.contains(&target.endpoint) {
            return Err(TransportError::new(format!(
                "Queue at {} is offline",
                target.endpoint
            )));
        }

        let visibility = Duration::from_secs(
            options
                .visibility_timeout
                .map(u64::from)
                .unwrap_or(DEFAULT_VISIBILITY_SECS),
        );
        let now = Instant::now();
        let now_ms = Utc::now().timestamp_millis() as u64;

        let mut received = Vec::new();
        let entries = match state.queues.get_mut(&target.endpoint) {
            Some(entries) => entries,
            None => return Ok(received),
        };
        for entry in entries.iter_mut() {
            if received.len() as u32 >= options.max_messages {
                break;
            }
            if !entry.is_visible(now) {
                continue;
            }
            entry.receive_count += 1;
            entry.first_received_at_ms.get_or_insert(now_ms);
            entry.invisible_until = Some(now + visibility);
            received.push(entry.snapshot());
        }
        Ok(received)
    }

    async fn delete_message(
        &self,
        target: &QueueTarget,
        receipt_token: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        if state.offline.contains(&target.endpoint) {
            return Err(TransportError::new(format!(
                "Queue at {} is offline",
                target.endpoint
            )));
        }

        let entries = state.queues.get_mut(&target.endpoint).ok_or_else(|| {
            TransportError::new(format!("No queue at {}", target.endpoint))
        })?;
        let index = entries
            .iter()
            .position(|entry| entry.receipt_token == receipt_token)
            .ok_or_else(|| {
                TransportError::new(format!("Unknown receipt token at {}", target.endpoint))
            })?;
        entries.remove(index);
        Ok(())
    }
}

// ============================================================================
// Internal Blob Storage
// ============================================================================

/// State shared by all containers of one gateway instance
#[derive(Debug, Default)]
struct BlobStoreState {
    /// Objects keyed by region, container, and key
    objects: HashMap<(String, String, String), Bytes>,
    /// Containers currently refusing every operation
    offline_containers: HashSet<String>,
    /// Uploads attempted, in order, including failures
    upload_attempts: Vec<UploadAttempt>,
}

fn object_key(location: &BlobLocation) -> (String, String, String) {
    (
        location.region.clone(),
        location.container.clone(),
        location.key.clone(),
    )
}

/// One upload attempt recorded by [`InMemoryBlobGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAttempt {
    pub location: BlobLocation,
    pub content_type: String,
}

// ============================================================================
// InMemoryBlobGateway
// ============================================================================

/// In-memory blob gateway.
///
/// Deleting an object that does not exist succeeds, matching the
/// idempotent delete of real object stores. Downloading one fails.
#[derive(Debug, Default)]
pub struct InMemoryBlobGateway {
    state: Mutex<BlobStoreState>,
}

impl InMemoryBlobGateway {
    /// Create an empty blob store
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a container as unreachable, or reachable again
    pub fn set_container_offline(&self, container: &str, offline: bool) {
        let mut state = self.lock();
        if offline {
            state.offline_containers.insert(container.to_string());
        } else {
            state.offline_containers.remove(container);
        }
    }

    /// Get the uploads attempted, in order, including attempts that failed
    pub fn upload_attempts(&self) -> Vec<UploadAttempt> {
        self.lock().upload_attempts.clone()
    }

    /// Fetch a stored object directly, bypassing the gateway interface
    pub fn object(&self, location: &BlobLocation) -> Option<Bytes> {
        self.lock().objects.get(&object_key(location)).cloned()
    }

    /// Number of objects currently stored
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    fn lock(&self) -> MutexGuard<'_, BlobStoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlobTransferGateway for InMemoryBlobGateway {
    async fn upload(
        &self,
        location: &BlobLocation,
        body: &Bytes,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.upload_attempts.push(UploadAttempt {
            location: location.clone(),
            content_type: content_type.to_string(),
        });
        if state.offline_containers.contains(&location.container) {
            return Err(TransportError::new(format!(
                "Container '{}' is offline",
                location.container
            )));
        }
        state.objects.insert(object_key(location), body.clone());
        Ok(())
    }

    async fn download(&self, location: &BlobLocation) -> Result<Bytes, TransportError> {
        let state = self.lock();
        if state.offline_containers.contains(&location.container) {
            return Err(TransportError::new(format!(
                "Container '{}' is offline",
                location.container
            )));
        }
        state
            .objects
            .get(&object_key(location))
            .cloned()
            .ok_or_else(|| TransportError::new(format!("No object at {location}")))
    }

    async fn delete(&self, location: &BlobLocation) -> Result<(), TransportError> {
        let mut state = self.lock();
        if state.offline_containers.contains(&location.container) {
            return Err(TransportError::new(format!(
                "Container '{}' is offline",
                location.container
            )));
        }
        state.objects.remove(&object_key(location));
        Ok(())
    }
}
