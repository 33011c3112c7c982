use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Live dashboard for a meshsim network simulator.
#[derive(Parser, Debug)]
#[command(name = "meshsim-dashboard")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Base URL of the simulator's HTTP API
    #[arg(long, default_value = "http://localhost:3000")]
    pub server: String,

    /// Timeout for each HTTP request (e.g. "500ms", "5s")
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub request_timeout: Duration,

    /// Delay before reconnecting to the event stream after it drops
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    pub reconnect_delay: Duration,

    /// Drop in-flight message markers whose receipt has not arrived after this long.
    /// When omitted, markers wait for their receipt indefinitely.
    #[arg(long, value_parser = humantime::parse_duration)]
    pub message_ttl: Option<Duration>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unsupported server URL {0:?}: expected http:// or https://")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub server: String,
    pub events_url: String,
    pub request_timeout: Duration,
    pub reconnect_delay: Duration,
    pub message_ttl: Option<Duration>,
}

impl DashboardConfig {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let server = args.server.trim_end_matches('/').to_string();
        let events_url = if let Some(rest) = server.strip_prefix("https://") {
            format!("wss://{rest}/event_notifs")
        } else if let Some(rest) = server.strip_prefix("http://") {
            format!("ws://{rest}/event_notifs")
        } else {
            return Err(ConfigError::UnsupportedScheme(args.server));
        };

        Ok(Self {
            server,
            events_url,
            request_timeout: args.request_timeout,
            reconnect_delay: args.reconnect_delay,
            message_ttl: args.message_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(argv: &[&str]) -> Result<DashboardConfig, ConfigError> {
        let args = Args::try_parse_from(std::iter::once("meshsim-dashboard").chain(argv.iter().copied())).unwrap();
        DashboardConfig::from_args(args)
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.server, "http://localhost:3000");
        assert_eq!(config.events_url, "ws://localhost:3000/event_notifs");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.reconnect_delay, Duration::from_secs(2));
        assert_eq!(config.message_ttl, None);
    }

    #[test]
    fn https_server_uses_secure_socket() {
        let config = config(&["--server", "https://sim.example.org/", "--message-ttl", "30s"]).unwrap();
        assert_eq!(config.server, "https://sim.example.org");
        assert_eq!(config.events_url, "wss://sim.example.org/event_notifs");
        assert_eq!(config.message_ttl, Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            config(&["--server", "ftp://sim"]),
            Err(ConfigError::UnsupportedScheme("ftp://sim".to_string()))
        );
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(Args::try_parse_from(["meshsim-dashboard", "--request-timeout", "soon"]).is_err());
    }
}
