//! Relay configuration
//!
//! Read from the environment with fallbacks; the bind address can also be
//! given as the first command line argument.

use std::env;
use std::num::NonZeroUsize;

use tracing::warn;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default buffer for relay commands
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Default per-connection outbound buffer
pub const DEFAULT_CONNECTION_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Listen address (`RELAY_ADDR`)
    pub bind_addr: String,
    /// Relay command channel capacity (`RELAY_COMMAND_BUFFER`)
    pub command_buffer: usize,
    /// Outbound events queued per connection before pushes drop (`RELAY_CONNECTION_BUFFER`)
    pub connection_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
            connection_buffer: DEFAULT_CONNECTION_BUFFER,
        }
    }
}

impl RelayConfig {
    /// Load from process environment and arguments
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|key| env::var(key).ok());
        if let Some(addr) = env::args().nth(1) {
            config.bind_addr = addr;
        }
        config
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("RELAY_ADDR").unwrap_or(defaults.bind_addr),
            command_buffer: buffer_or("RELAY_COMMAND_BUFFER", &lookup, defaults.command_buffer),
            connection_buffer: buffer_or(
                "RELAY_CONNECTION_BUFFER",
                &lookup,
                defaults.connection_buffer,
            ),
        }
    }
}

/// Channel capacity from `key`; mpsc channels need at least 1
fn buffer_or(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: usize) -> usize {
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<NonZeroUsize>() {
            Ok(value) => value.get(),
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, need a positive integer", key, raw);
                default
            }
        },
        None => default,
    }
}
