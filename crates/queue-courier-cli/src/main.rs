use queue_courier_cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    // Run CLI and handle errors
    if let Err(e) = run_cli().await {
        error!("CLI error: {}", e);

        // Exit with appropriate code based on error type
        let exit_code = match e {
            queue_courier_cli::CliError::InvalidArgument { .. } => 1,
            queue_courier_cli::CliError::Io(_) => 2,
            queue_courier_cli::CliError::Send(_) => 3,
            queue_courier_cli::CliError::Receive(_) => 4,
            queue_courier_cli::CliError::Delete(_) => 5,
            queue_courier_cli::CliError::Output(_) => 6,
        };

        std::process::exit(exit_code);
    }
}
