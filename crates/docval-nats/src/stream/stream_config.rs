//! Stream, consumer and bucket names.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const DEFAULT_INBOUND_STREAM: &str = "DOCUMENT_EVENTS";
const DEFAULT_INBOUND_SUBJECT: &str = "documents.validate";
const DEFAULT_CONSUMER_NAME: &str = "docval-validator";
const DEFAULT_RESPONSE_STREAM: &str = "DOCUMENT_RESPONSES";
const DEFAULT_RESPONSE_SUBJECT: &str = "documents.validated";
const DEFAULT_CACHE_BUCKET: &str = "validated_documents";
const DEFAULT_STREAM_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 60 * 60;

/// Names of the JetStream resources the worker reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StreamConfig {
    /// Stream holding inbound validation requests
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-inbound-stream", env = "NATS_INBOUND_STREAM", default_value = DEFAULT_INBOUND_STREAM)
    )]
    pub inbound_stream: String,

    /// Subject inbound validation requests are published on
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-inbound-subject", env = "NATS_INBOUND_SUBJECT", default_value = DEFAULT_INBOUND_SUBJECT)
    )]
    pub inbound_subject: String,

    /// Durable consumer name (the consumer group)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-consumer-name", env = "NATS_CONSUMER_NAME", default_value = DEFAULT_CONSUMER_NAME)
    )]
    pub consumer_name: String,

    /// Stream holding outbound responses
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-response-stream", env = "NATS_RESPONSE_STREAM", default_value = DEFAULT_RESPONSE_STREAM)
    )]
    pub response_stream: String,

    /// Subject outbound responses are published on
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-response-subject", env = "NATS_RESPONSE_SUBJECT", default_value = DEFAULT_RESPONSE_SUBJECT)
    )]
    pub response_subject: String,

    /// Key-value bucket for validation markers
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-cache-bucket", env = "NATS_CACHE_BUCKET", default_value = DEFAULT_CACHE_BUCKET)
    )]
    pub cache_bucket: String,

    /// Retention of stream messages in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-stream-max-age-secs", env = "NATS_STREAM_MAX_AGE_SECS", default_value_t = DEFAULT_STREAM_MAX_AGE_SECS)
    )]
    pub stream_max_age_secs: u64,

    /// Physical retention of cache entries in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-cache-max-age-secs", env = "NATS_CACHE_MAX_AGE_SECS", default_value_t = DEFAULT_CACHE_MAX_AGE_SECS)
    )]
    pub cache_max_age_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            inbound_stream: DEFAULT_INBOUND_STREAM.to_owned(),
            inbound_subject: DEFAULT_INBOUND_SUBJECT.to_owned(),
            consumer_name: DEFAULT_CONSUMER_NAME.to_owned(),
            response_stream: DEFAULT_RESPONSE_STREAM.to_owned(),
            response_subject: DEFAULT_RESPONSE_SUBJECT.to_owned(),
            cache_bucket: DEFAULT_CACHE_BUCKET.to_owned(),
            stream_max_age_secs: DEFAULT_STREAM_MAX_AGE_SECS,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
        }
    }
}

impl StreamConfig {
    /// Returns the stream retention as a Duration.
    #[inline]
    pub fn stream_max_age(&self) -> Duration {
        Duration::from_secs(self.stream_max_age_secs)
    }

    /// Returns the cache bucket retention as a Duration.
    #[inline]
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("inbound stream", &self.inbound_stream),
            ("inbound subject", &self.inbound_subject),
            ("consumer name", &self.consumer_name),
            ("response stream", &self.response_stream),
            ("response subject", &self.response_subject),
            ("cache bucket", &self.cache_bucket),
        ];

        for (label, value) in names {
            if value.trim().is_empty() {
                return Err(Error::invalid_config(format!("{label} cannot be empty")));
            }
        }

        if self.inbound_subject == self.response_subject {
            return Err(Error::invalid_config(
                "inbound and response subjects must differ",
            ));
        }

        if self.cache_max_age_secs == 0 {
            return Err(Error::invalid_config("cache max age must be positive"));
        }

        Ok(())
    }
}
