//! Parlor console client entry point.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on the default origin
//! parlor --name Ana
//!
//! # Point at a remote backend
//! PARLOR_BACKEND_URL=https://chat.example.com parlor
//! ```

use clap::Parser;
use parlor_app::{Runtime, Session};
use parlor_cli::{Args, ConsoleDriver};
use parlor_client::{Network, SystemEnv};
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout is the chat surface; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("TLS crypto provider already installed");
    }

    let config = args.config();
    let network = Network::new(&config)?;
    tracing::info!(
        origin = %config.origin,
        backend = config.backend_url.as_deref(),
        sender = %config.sender,
        "parlor starting"
    );

    let input = BufReader::new(tokio::io::stdin());
    let driver = ConsoleDriver::new(network, input, std::io::stdout());
    let session = Session::new(SystemEnv::new(), &config.sender, config.reconnect);

    let mut runtime = Runtime::new(driver, session);
    runtime.run().await?;
    Ok(())
}
