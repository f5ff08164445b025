//! Collaborator implementations shipped with the crate.

pub mod aws;
pub mod memory;

pub use aws::{S3BlobGateway, SqsQueueTransport};
pub use memory::{InMemoryBlobGateway, InMemoryQueueTransport};
