//! Client configuration from the environment and command line.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_SERVER_ADDR: &str = "localhost:25001";
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const MIN_TICK_MS: u64 = 50;
pub const MAX_TICK_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No identity given: pass a UUID as first argument or set BOMBER_UUID")]
    MissingIdentity,

    #[error("Invalid identity {value:?}: {source}")]
    InvalidIdentity {
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("Invalid BOMBER_TICK_MS {0:?}: expected milliseconds")]
    InvalidTick(String),
}

/// Everything the client needs to connect and play.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `host:port` of the game server
    pub server_addr: String,
    /// Token sent in reply to the server's login request
    pub identity: Uuid,
    /// Bot controller tick period
    pub tick: Duration,
}

impl ClientConfig {
    /// Read the configuration from the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_sources(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// Build the configuration from an optional positional identity and an
    /// environment lookup. The positional identity wins over `BOMBER_UUID`.
    pub fn from_sources<F>(identity_arg: Option<String>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr = env("BOMBER_SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.into());

        let raw_identity = identity_arg
            .or_else(|| env("BOMBER_UUID"))
            .ok_or(ConfigError::MissingIdentity)?;
        let identity =
            Uuid::parse_str(raw_identity.trim()).map_err(|source| ConfigError::InvalidIdentity {
                value: raw_identity.clone(),
                source,
            })?;

        let tick_ms = match env("BOMBER_TICK_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTick(raw.clone()))?,
            None => DEFAULT_TICK_MS,
        };

        Ok(Self {
            server_addr,
            identity,
            tick: Duration::from_millis(tick_ms.clamp(MIN_TICK_MS, MAX_TICK_MS)),
        })
    }
}
