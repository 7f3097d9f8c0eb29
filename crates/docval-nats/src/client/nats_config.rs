//! NATS connection settings.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const DEFAULT_NAME: &str = "docval-worker";
const DEFAULT_MAX_RECONNECTS: usize = 10;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(2);
const PING_INTERVAL: Duration = Duration::from_secs(30);

const ACCEPTED_SCHEMES: [&str; 2] = ["nats://", "tls://"];

/// Where and how the worker connects to NATS.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// Server URLs, comma separated for a cluster
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-url", env = "NATS_URL", default_value = "nats://127.0.0.1:4222")
    )]
    pub nats_url: String,

    /// Token for token authentication (optional)
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    pub nats_token: Option<String>,

    /// Connection name reported to the server (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-client-name", env = "NATS_CLIENT_NAME")
    )]
    pub nats_client_name: Option<String>,

    /// Seconds to wait for the initial connection (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT_SECS")
    )]
    pub nats_connect_timeout: Option<u64>,

    /// Reconnect attempts before giving up, 0 retries forever (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-max-reconnects", env = "NATS_MAX_RECONNECTS")
    )]
    pub nats_max_reconnects: Option<usize>,
}

impl NatsConfig {
    /// Creates a configuration for `nats_url` with every optional setting unset.
    pub fn new(nats_url: impl Into<String>) -> Self {
        Self {
            nats_url: nats_url.into(),
            nats_token: None,
            nats_client_name: None,
            nats_connect_timeout: None,
            nats_max_reconnects: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.nats_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.nats_client_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_connect_timeout = Some(secs);
        self
    }

    /// Sets the reconnect limit; 0 retries forever.
    #[must_use]
    pub fn with_max_reconnects(mut self, max_reconnects: usize) -> Self {
        self.nats_max_reconnects = Some(max_reconnects);
        self
    }

    /// Individual server URLs.
    pub fn servers(&self) -> Vec<&str> {
        self.nats_url.split(',').map(str::trim).collect()
    }

    /// Connection name, `docval-worker` unless overridden.
    #[inline]
    pub fn name(&self) -> &str {
        self.nats_client_name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    /// Token, with an empty string treated as absent.
    #[inline]
    pub fn token(&self) -> Option<&str> {
        self.nats_token.as_deref().filter(|token| !token.is_empty())
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        self.nats_connect_timeout
            .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs)
    }

    /// First reconnect delay; later attempts back off from here.
    #[inline]
    pub fn reconnect_delay(&self) -> Duration {
        RECONNECT_BASE_DELAY
    }

    #[inline]
    pub fn ping_interval(&self) -> Duration {
        PING_INTERVAL
    }

    /// Reconnect limit, `None` for unlimited.
    #[inline]
    pub fn max_reconnects(&self) -> Option<usize> {
        match self.nats_max_reconnects.unwrap_or(DEFAULT_MAX_RECONNECTS) {
            0 => None,
            max => Some(max),
        }
    }

    /// Rejects empty server entries, unknown schemes and a zero timeout.
    pub fn validate(&self) -> Result<()> {
        for server in self.servers() {
            if server.is_empty() {
                return Err(Error::invalid_config("server URL cannot be empty"));
            }
            if !ACCEPTED_SCHEMES.iter().any(|scheme| server.starts_with(scheme)) {
                return Err(Error::invalid_config(format!(
                    "server URL must start with nats:// or tls://, got {server}"
                )));
            }
        }

        if self.nats_connect_timeout == Some(0) {
            return Err(Error::invalid_config("connect timeout must be positive"));
        }
        Ok(())
    }
}

impl fmt::Debug for NatsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsConfig")
            .field("servers", &self.servers())
            .field("token", &self.token().map(|_| "****"))
            .field("name", &self.name())
            .field("connect_timeout", &self.connect_timeout())
            .field("max_reconnects", &self.max_reconnects())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NatsConfig::new("nats://localhost:4222");
        assert_eq!(config.servers(), vec!["nats://localhost:4222"]);
        assert_eq!(config.token(), None);
        assert_eq!(config.name(), "docval-worker");
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_reconnects(), Some(10));
    }

    #[test]
    fn test_overrides() {
        let config = NatsConfig::new("nats://localhost:4222")
            .with_token("secret")
            .with_name("validator-7")
            .with_connect_timeout_secs(5)
            .with_max_reconnects(0);

        assert_eq!(config.token(), Some("secret"));
        assert_eq!(config.name(), "validator-7");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_reconnects(), None);
    }

    #[test]
    fn test_empty_token_is_absent() {
        let config = NatsConfig::new("nats://localhost:4222").with_token("");
        assert_eq!(config.token(), None);
    }

    #[test]
    fn test_validation() {
        assert!(NatsConfig::new("nats://localhost:4222").validate().is_ok());
        assert!(NatsConfig::new("tls://nats.internal:4222").validate().is_ok());
        assert!(NatsConfig::new("").validate().is_err());
        assert!(NatsConfig::new("http://localhost:4222").validate().is_err());
        assert!(NatsConfig::new("nats://a:4222, ").validate().is_err());
        assert!(
            NatsConfig::new("nats://localhost:4222")
                .with_connect_timeout_secs(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_cluster_urls() {
        let config = NatsConfig::new("nats://a:4222, nats://b:4222");
        assert_eq!(config.servers(), vec!["nats://a:4222", "nats://b:4222"]);
    }

    #[test]
    fn test_debug_masks_token() {
        let config = NatsConfig::new("nats://localhost:4222").with_token("secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("****"));
    }
}
