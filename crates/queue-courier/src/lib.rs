//! High-availability queue delivery with blob offload for oversized
//! messages.
//!
//! `queue-courier` sends messages through an ordered set of queue targets:
//! the primary is tried first, then each backup in turn, and the first
//! target to accept the message wins. When every target fails, the error
//! reported is the one from the primary, so operators see why the
//! preferred path is down rather than why the last resort is.
//!
//! Queue services cap the size of an inline body. Bodies over that limit
//! are transparently relocated: the sender uploads the body to the first
//! writable location in an ordered set of blob stores, queues a one-space
//! placeholder carrying a pointer attribute, and the receiver fetches the
//! original back before handing the message to the application. Deleting a
//! processed message removes the queue entry first and then the blob, and
//! reports which of the two phases failed.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use queue_courier::{
//!     BlobLocation, BlobLocationSet, QueueTarget, QueueTargetSet, ReceiveOptions, Receiver,
//!     SendOptions, Sender,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
//!
//! let queues = QueueTargetSet::new(QueueTarget::new(
//!     "eu-west-1",
//!     "https://sqs.eu-west-1.amazonaws.com/123456789012/orders",
//! ))
//! .with_backup(QueueTarget::new(
//!     "eu-central-1",
//!     "https://sqs.eu-central-1.amazonaws.com/123456789012/orders",
//! ));
//! let blobs = BlobLocationSet::new(BlobLocation::new("eu-west-1", "orders-overflow", "bodies/"))
//!     .with_backup(BlobLocation::new("eu-central-1", "orders-overflow-dr", "bodies/"));
//!
//! let sender = Sender::new(&config);
//! let outcome = sender
//!     .send(&queues, &blobs, Bytes::from("hello"), SendOptions::new())
//!     .await?;
//! println!("accepted by {}", outcome.accepted_by);
//!
//! let receiver = Receiver::new(&config);
//! for message in receiver.receive(queues.primary(), ReceiveOptions::new()).await? {
//!     receiver.delete(queues.primary(), &message).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
mod failover;
pub mod location;
pub mod message;
pub mod providers;
pub mod receiver;
pub mod sender;
pub mod target;
pub mod transport;

// Error types
pub use error::{
    AttributeTypeMismatch, DeleteError, MalformedPointerError, ReceiveError, SendError,
    TransportError,
};

// Targets and locations
pub use location::{offload_sub_path, BlobLocation, BlobLocationSet};
pub use target::{QueueTarget, QueueTargetSet};

// Messages and options
pub use message::{
    AttributeKind, Message, MessageAttribute, OutboundMessage, RawQueueMessage, ReceiveOptions,
    SendOptions, BLOB_LOCATION_ATTRIBUTE, META_FIRST_RECEIVE_TIMESTAMP, META_RECEIVE_COUNT,
    META_SENT_TIMESTAMP,
};

// Delivery surface
pub use receiver::Receiver;
pub use sender::{SendOutcome, Sender};
pub use transport::{BlobTransferGateway, QueueTransport, MAX_MESSAGE_SIZE};
