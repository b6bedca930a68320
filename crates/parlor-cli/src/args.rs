//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use parlor_client::{ClientConfig, config::DEFAULT_ORIGIN};
use parlor_core::ReconnectPolicy;

/// Console client for Parlor chat rooms
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Browse chat rooms and talk in them from the terminal")]
#[command(version)]
pub struct Args {
    /// Backend base URL. Overrides --origin for both HTTP and the live
    /// channel.
    #[arg(long, env = "PARLOR_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Origin the client runs under, used when no backend URL is set
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Display name attached to your messages
    #[arg(short, long, default_value = "Guest")]
    pub name: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "10")]
    pub timeout: u64,

    /// Do not reconnect dropped live channels
    #[arg(long)]
    pub no_reconnect: bool,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes
    /// precedence.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Client configuration these arguments describe.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            origin: self.origin.clone(),
            backend_url: self.backend_url.clone(),
            sender: self.name.clone(),
            request_timeout: Duration::from_secs(self.timeout),
            reconnect: if self.no_reconnect {
                ReconnectPolicy::disabled()
            } else {
                ReconnectPolicy::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["parlor"]).unwrap();
        let config = args.config();

        assert_eq!(config.origin, "http://127.0.0.1:8000");
        assert_eq!(config.sender, "Guest");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.reconnect.max_attempts > 0);
    }

    #[test]
    fn flags_map_onto_config() {
        let args = Args::try_parse_from([
            "parlor",
            "--backend-url",
            "https://chat.example.com",
            "-n",
            "Ana",
            "--timeout",
            "3",
            "--no-reconnect",
        ])
        .unwrap();
        let config = args.config();

        assert_eq!(config.backend_url.as_deref(), Some("https://chat.example.com"));
        assert_eq!(config.sender, "Ana");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.reconnect.max_attempts, 0);
    }
}
