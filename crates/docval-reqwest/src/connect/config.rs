//! Configuration for the object store client.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default timeout for object requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Object store location and credentials.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ObjectStoreConfig {
    /// Object store base URL, e.g. `http://minio:9000`
    #[cfg_attr(
        feature = "config",
        arg(long = "object-store-endpoint", env = "MINIO_ENDPOINT")
    )]
    pub endpoint: String,

    /// Bucket documents are read from
    #[cfg_attr(
        feature = "config",
        arg(long = "object-store-bucket", env = "MINIO_BUCKET")
    )]
    pub bucket: String,

    /// Basic auth user name (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "object-store-access-key", env = "MINIO_ACCESS_KEY")
    )]
    pub access_key: Option<String>,

    /// Basic auth password (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "object-store-secret-key", env = "MINIO_SECRET_KEY")
    )]
    pub secret_key: Option<String>,

    /// Request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "object-store-timeout-secs",
            env = "MINIO_TIMEOUT_SECS",
            default_value_t = DEFAULT_TIMEOUT_SECS
        )
    )]
    pub timeout_secs: u64,
}

impl ObjectStoreConfig {
    /// Creates a configuration without credentials.
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key: None,
            secret_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets basic auth credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    /// Returns the credentials when an access key is set.
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        let access_key = self.access_key.as_deref().filter(|key| !key.is_empty())?;
        Some((access_key, self.secret_key.as_deref()))
    }

    /// Parses the endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(self.endpoint.trim())
            .map_err(|e| Error::InvalidConfig(format!("endpoint: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "endpoint scheme must be http or https, got {}",
                url.scheme()
            )));
        }
        if url.cannot_be_a_base() {
            return Err(Error::InvalidConfig("endpoint cannot be a base URL".to_owned()));
        }

        Ok(url)
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;

        let bucket = self.bucket.trim();
        if bucket.is_empty() {
            return Err(Error::InvalidConfig("bucket cannot be empty".to_owned()));
        }
        if bucket.contains('/') || bucket == "." || bucket == ".." {
            return Err(Error::InvalidConfig(format!("invalid bucket name: {bucket}")));
        }

        Ok(())
    }
}

impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "****"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ObjectStoreConfig::new("http://localhost:9000", "documents");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = ObjectStoreConfig::new("http://localhost:9000", "documents").with_timeout_secs(0);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_credentials() {
        let config = ObjectStoreConfig::new("http://localhost:9000", "documents")
            .with_credentials("minio", "secret");
        assert_eq!(config.credentials(), Some(("minio", Some("secret"))));
    }

    #[test]
    fn test_validation() {
        assert!(ObjectStoreConfig::new("localhost:9000", "documents").validate().is_err());
        assert!(ObjectStoreConfig::new("ftp://host", "documents").validate().is_err());
        assert!(ObjectStoreConfig::new("http://host", " ").validate().is_err());
        assert!(ObjectStoreConfig::new("http://host", "a/b").validate().is_err());
    }

    #[test]
    fn test_debug_masks_secret() {
        let config = ObjectStoreConfig::new("http://localhost:9000", "documents")
            .with_credentials("minio", "secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("****"));
    }
}
