//! # Queue-Courier CLI
//!
//! Command-line interface for the queue-courier delivery library.
//!
//! This module provides CLI commands for:
//! - Sending a message through an ordered set of queue targets, with
//!   oversized bodies offloaded to blob storage
//! - Receiving messages from a queue, fetching offloaded bodies back
//! - Deleting processed messages together with their blobs
//!
//! The binary talks to real AWS endpoints by default; `--endpoint-url`
//! points every service call at a LocalStack-style stack instead.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::Credentials;
use bytes::Bytes;
use clap::{CommandFactory, Parser, Subcommand};
use queue_courier::providers::S3BlobGateway;
use queue_courier::{
    BlobLocation, BlobLocationSet, DeleteError, Message, MessageAttribute, QueueTarget,
    QueueTargetSet, ReceiveError, ReceiveOptions, Receiver, SendError, SendOptions, Sender,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Structure
// ============================================================================

/// Queue-Courier CLI - high-availability queue delivery
#[derive(Parser)]
#[command(name = "queue-courier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Send and receive queue messages with ordered fallback and blob offload")]
#[command(
    long_about = "Queue-Courier sends messages through an ordered set of queue targets, \
                  relocating oversized bodies to blob storage and fetching them back on receive"
)]
pub struct Cli {
    /// Connection settings shared by all commands
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Logging level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Service connection overrides, mainly for LocalStack-style local stacks
#[derive(clap::Args)]
pub struct ConnectionArgs {
    /// Endpoint override applied to queue and blob calls
    #[arg(long, env = "QUEUE_COURIER_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Static access key id
    #[arg(long, env = "QUEUE_COURIER_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,

    /// Static secret access key
    #[arg(long, env = "QUEUE_COURIER_SECRET_ACCESS_KEY")]
    pub secret_access_key: Option<String>,
}

impl ConnectionArgs {
    /// Check if blob calls must use path-style addressing. Single-endpoint
    /// stacks do not resolve virtual-host bucket names.
    fn path_style(&self) -> bool {
        self.endpoint_url.is_some()
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Send a message through an ordered set of queue targets
    Send(SendArgs),

    /// Receive messages from a queue, fetching offloaded bodies back
    Receive(ReceiveArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for the send command
#[derive(clap::Args)]
pub struct SendArgs {
    /// Queue target as region=endpoint; the first is the primary, repeats
    /// are backups in priority order
    #[arg(short, long = "queue", required = true)]
    pub queues: Vec<String>,

    /// Blob location as region:container:prefix for oversized bodies; the
    /// first is the primary, repeats are backups in priority order
    #[arg(short, long = "blob-location", required = true)]
    pub blob_locations: Vec<String>,

    /// Message body passed inline
    #[arg(long)]
    pub body: Option<String>,

    /// File to read the message body from
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Delivery delay in seconds
    #[arg(short, long)]
    pub delay: Option<u32>,

    /// String-kind message attribute as name=value
    #[arg(short, long = "attribute")]
    pub attributes: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the receive command
#[derive(clap::Args)]
pub struct ReceiveArgs {
    /// Queue to poll, as region=endpoint
    #[arg(short, long)]
    pub queue: String,

    /// Maximum number of messages to return from the poll
    #[arg(short, long, default_value = "10")]
    pub max_messages: u32,

    /// Seconds received messages stay hidden from other consumers
    #[arg(long)]
    pub visibility_timeout: Option<u32>,

    /// Seconds to wait for messages before returning an empty poll
    #[arg(short, long)]
    pub wait_time: Option<u32>,

    /// Delete each received message, and its blob, after printing
    #[arg(short, long)]
    pub delete: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Send failed: {0}")]
    Send(#[from] SendError),

    #[error("Receive failed: {0}")]
    Receive(#[from] ReceiveError),

    #[error("Delete failed: {0}")]
    Delete(#[from] DeleteError),

    #[error("Output encoding failed: {0}")]
    Output(#[from] serde_json::Error),
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    // Initialize logging
    initialize_logging(&cli)?;

    // Execute command
    match cli.command {
        Commands::Send(args) => {
            let config = load_service_config(&cli.connection).await?;
            execute_send_command(args, &config, cli.connection.path_style()).await
        }
        Commands::Receive(args) => {
            let config = load_service_config(&cli.connection).await?;
            execute_receive_command(args, &config, cli.connection.path_style()).await
        }
        Commands::Completions { shell } => execute_completions_command(shell),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Initialize logging based on CLI arguments
fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = EnvFilter::try_new(&cli.log_level).map_err(|e| CliError::InvalidArgument {
        arg: "--log-level".to_string(),
        message: e.to_string(),
    })?;

    // Logs go to stderr; stdout carries command output
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Resolve the shared service configuration from connection flags and the
/// ambient environment
async fn load_service_config(connection: &ConnectionArgs) -> Result<SdkConfig, CliError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(endpoint) = &connection.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    match (&connection.access_key_id, &connection.secret_access_key) {
        (Some(key), Some(secret)) => {
            loader = loader.credentials_provider(Credentials::new(
                key,
                secret,
                None,
                None,
                "queue-courier-cli",
            ));
        }
        (None, None) => {}
        _ => {
            return Err(CliError::InvalidArgument {
                arg: "--access-key-id".to_string(),
                message: "--access-key-id and --secret-access-key must be given together"
                    .to_string(),
            });
        }
    }

    Ok(loader.load().await)
}

/// Build a sender wired for the resolved configuration
fn build_sender(config: &SdkConfig, path_style: bool) -> Sender {
    let sender = Sender::new(config);
    if path_style {
        sender.with_blob_gateway(Arc::new(S3BlobGateway::new(config).with_path_style()))
    } else {
        sender
    }
}

/// Build a receiver wired for the resolved configuration
fn build_receiver(config: &SdkConfig, path_style: bool) -> Receiver {
    let receiver = Receiver::new(config);
    if path_style {
        receiver.with_blob_gateway(Arc::new(S3BlobGateway::new(config).with_path_style()))
    } else {
        receiver
    }
}

/// Execute send command
async fn execute_send_command(
    args: SendArgs,
    config: &SdkConfig,
    path_style: bool,
) -> Result<(), CliError> {
    let queues = parse_queue_set(&args.queues)?;
    let blob_locations = parse_blob_location_set(&args.blob_locations)?;
    let body = read_body(args.body, args.body_file).await?;

    let mut options = SendOptions::new();
    if let Some(delay) = args.delay {
        options = options.with_delay_seconds(delay);
    }
    for spec in &args.attributes {
        let (name, attribute) = parse_attribute(spec)?;
        options = options.with_attribute(name, attribute);
    }

    info!(
        targets = queues.targets().len(),
        size = body.len(),
        "Sending message"
    );

    let sender = build_sender(config, path_style);
    let outcome = sender.send(&queues, &blob_locations, body, options).await?;

    match args.format {
        OutputFormat::Text => {
            println!("Accepted by: {}", outcome.accepted_by);
            println!("Message ID: {}", outcome.message_id);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }

    Ok(())
}

/// Execute receive command
async fn execute_receive_command(
    args: ReceiveArgs,
    config: &SdkConfig,
    path_style: bool,
) -> Result<(), CliError> {
    let queue = parse_queue_target(&args.queue)?;

    let mut options = ReceiveOptions::new().with_max_messages(args.max_messages);
    if let Some(seconds) = args.visibility_timeout {
        options = options.with_visibility_timeout(seconds);
    }
    if let Some(seconds) = args.wait_time {
        options = options.with_wait_time_seconds(seconds);
    }

    let receiver = build_receiver(config, path_style);
    let messages = receiver.receive(&queue, options).await?;

    info!(queue = %queue, count = messages.len(), "Received messages");

    match args.format {
        OutputFormat::Text => {
            println!("Number of messages: {}", messages.len());
            for message in &messages {
                println!("Message ID: {}", message.id);
                println!("Receipt token: {}", message.receipt_token);
                println!("Body length: {}", message.body.len());
                if let Some(location) = &message.attached_blob {
                    println!("Offloaded from: {location}");
                }
            }
        }
        OutputFormat::Json => {
            let views: Vec<MessageView> = messages.iter().map(MessageView::from).collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
    }

    if args.delete {
        delete_messages(&receiver, &queue, &messages).await?;
    }

    Ok(())
}

/// Delete received messages, keeping going when only the blob cleanup fails.
/// The queue entry is already gone in that case, so the orphaned blob is
/// reported and the remaining messages still get deleted.
async fn delete_messages(
    receiver: &Receiver,
    queue: &QueueTarget,
    messages: &[Message],
) -> Result<(), CliError> {
    for message in messages {
        match receiver.delete(queue, message).await {
            Ok(()) => {}
            Err(error) if error.is_blob_cleanup() => {
                warn!(message_id = %message.id, error = %error, "Blob cleanup failed");
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(())
}

/// Execute completions command
fn execute_completions_command(shell: clap_complete::Shell) -> Result<(), CliError> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());

    Ok(())
}

// ============================================================================
// Argument Parsing
// ============================================================================

/// Parse repeated region=endpoint specs into an ordered queue target set
fn parse_queue_set(specs: &[String]) -> Result<QueueTargetSet, CliError> {
    let mut iter = specs.iter();
    let primary = iter.next().ok_or_else(|| CliError::InvalidArgument {
        arg: "--queue".to_string(),
        message: "at least one queue target is required".to_string(),
    })?;

    let mut set = QueueTargetSet::new(parse_queue_target(primary)?);
    for spec in iter {
        set = set.with_backup(parse_queue_target(spec)?);
    }

    Ok(set)
}

/// Parse one region=endpoint queue spec
fn parse_queue_target(spec: &str) -> Result<QueueTarget, CliError> {
    match spec.split_once('=') {
        Some((region, endpoint)) if !region.is_empty() && !endpoint.is_empty() => {
            Ok(QueueTarget::new(region, endpoint))
        }
        _ => Err(CliError::InvalidArgument {
            arg: "--queue".to_string(),
            message: format!("'{spec}' is not in region=endpoint format"),
        }),
    }
}

/// Parse repeated region:container:prefix specs into an ordered blob
/// location set
fn parse_blob_location_set(specs: &[String]) -> Result<BlobLocationSet, CliError> {
    let mut iter = specs.iter();
    let primary = iter.next().ok_or_else(|| CliError::InvalidArgument {
        arg: "--blob-location".to_string(),
        message: "at least one blob location is required".to_string(),
    })?;

    let mut set = BlobLocationSet::new(parse_blob_location(primary)?);
    for spec in iter {
        set = set.with_backup(parse_blob_location(spec)?);
    }

    Ok(set)
}

/// Parse one region:container:prefix blob location spec
fn parse_blob_location(spec: &str) -> Result<BlobLocation, CliError> {
    BlobLocation::parse_pointer(spec).map_err(|e| CliError::InvalidArgument {
        arg: "--blob-location".to_string(),
        message: e.to_string(),
    })
}

/// Parse one name=value attribute spec into a string-kind attribute
fn parse_attribute(spec: &str) -> Result<(&str, MessageAttribute), CliError> {
    match spec.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, MessageAttribute::string(value))),
        _ => Err(CliError::InvalidArgument {
            arg: "--attribute".to_string(),
            message: format!("'{spec}' is not in name=value format"),
        }),
    }
}

/// Read the outbound body from the inline flag or a file
async fn read_body(body: Option<String>, body_file: Option<PathBuf>) -> Result<Bytes, CliError> {
    match (body, body_file) {
        (Some(inline), None) => Ok(Bytes::from(inline)),
        (None, Some(path)) => Ok(Bytes::from(tokio::fs::read(&path).await?)),
        (None, None) => Err(CliError::InvalidArgument {
            arg: "--body".to_string(),
            message: "either --body or --body-file is required".to_string(),
        }),
        (Some(_), Some(_)) => Err(CliError::InvalidArgument {
            arg: "--body".to_string(),
            message: "--body and --body-file are mutually exclusive".to_string(),
        }),
    }
}

// ============================================================================
// Output Projection
// ============================================================================

/// JSON projection of one received message. Maps are rendered sorted so the
/// output is stable, and the body is rendered as text.
#[derive(serde::Serialize)]
struct MessageView {
    id: String,
    body: String,
    attributes: BTreeMap<String, MessageAttribute>,
    queue_metadata: BTreeMap<String, String>,
    attached_blob: Option<String>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            body: String::from_utf8_lossy(&message.body).into_owned(),
            attributes: message
                .attributes
                .iter()
                .map(|(name, attribute)| (name.clone(), attribute.clone()))
                .collect(),
            queue_metadata: message
                .queue_metadata
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            attached_blob: message.attached_blob.as_ref().map(BlobLocation::to_pointer),
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
