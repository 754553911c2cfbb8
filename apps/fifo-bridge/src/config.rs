use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8420;
const DEFAULT_FIFO_PATH: &str = "/tmp/foos-debug.in";
const DEFAULT_FIFO_RETRY_SECS: u64 = 5;

/// Bridge configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the WebSocket server binds to.
    pub port: u16,
    /// Location of the named pipe external processes write lines into.
    pub fifo_path: PathBuf,
    /// Delay before retrying a failed FIFO open.
    pub fifo_retry: Duration,
    /// When set, text sent by a client is rebroadcast to every client.
    pub relay_client_messages: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unparsable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parsed_var(&lookup, "PORT").unwrap_or(DEFAULT_PORT),
            fifo_path: lookup("FIFO_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FIFO_PATH)),
            fifo_retry: Duration::from_secs(
                parsed_var(&lookup, "FIFO_RETRY_SECS").unwrap_or(DEFAULT_FIFO_RETRY_SECS),
            ),
            relay_client_messages: lookup("RELAY_CLIENT_MESSAGES")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parsed_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}
