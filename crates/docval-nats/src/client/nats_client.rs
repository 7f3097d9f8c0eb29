//! Shared NATS connection.
//!
//! The subscriber, the response publisher and the KV cache all ride on one
//! `async-nats` connection; clones of [`NatsClient`] share it.

use std::sync::Arc;
use std::time::Duration;

use async_nats::{Client, ConnectOptions, jetstream};

use super::nats_config::NatsConfig;
use crate::kv::KvCache;
use crate::stream::{EventSubscriber, ResponsePublisher, StreamConfig};
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

/// Upper bound for the delay between reconnect attempts.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Connected NATS client with its JetStream context.
#[derive(Debug, Clone)]
pub struct NatsClient {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    client: Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsClient {
    /// Connects to the configured servers.
    ///
    /// Fails with [`Error::Timeout`] when no server answers within the
    /// configured connect timeout.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CONNECTION)]
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate()?;

        let connect_timeout = config.connect_timeout();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            servers = ?config.servers(),
            client_name = config.name(),
            timeout_secs = connect_timeout.as_secs(),
            "Connecting to NATS"
        );

        let connecting = async_nats::connect_with_options(&config.nats_url, connect_options(&config));
        let client = match tokio::time::timeout(connect_timeout, connecting).await {
            Ok(connected) => connected.map_err(|e| Error::Connection(Box::new(e)))?,
            Err(_) => {
                return Err(Error::Timeout {
                    timeout: connect_timeout,
                });
            }
        };

        let info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            server_id = %info.server_id,
            server_version = %info.version,
            max_payload = info.max_payload,
            "Connected to NATS"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                jetstream: jetstream::new(client.clone()),
                client,
                config,
            }),
        })
    }

    #[inline]
    pub fn config(&self) -> &NatsConfig {
        &self.shared.config
    }

    #[inline]
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.shared.jetstream
    }

    /// Waits until every buffered publish reached the server.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn flush(&self) -> Result<()> {
        self.shared
            .client
            .flush()
            .await
            .map_err(|e| Error::Connection(Box::new(e)))
    }

    /// Binds the durable pull consumer for inbound validation requests.
    #[tracing::instrument(skip(self, streams), target = TRACING_TARGET_CLIENT)]
    pub async fn event_subscriber(&self, streams: &StreamConfig) -> Result<EventSubscriber> {
        EventSubscriber::new(&self.shared.jetstream, streams).await
    }

    /// Prepares the publisher for outbound responses.
    #[tracing::instrument(skip(self, streams), target = TRACING_TARGET_CLIENT)]
    pub async fn response_publisher(&self, streams: &StreamConfig) -> Result<ResponsePublisher> {
        ResponsePublisher::new(self.clone(), streams).await
    }

    /// Opens the validated-document marker bucket.
    #[tracing::instrument(skip(self, streams), target = TRACING_TARGET_CLIENT)]
    pub async fn kv_cache(&self, streams: &StreamConfig) -> Result<KvCache> {
        KvCache::new(&self.shared.jetstream, streams).await
    }
}

fn connect_options(config: &NatsConfig) -> ConnectOptions {
    let base_delay = config.reconnect_delay();
    let mut options = ConnectOptions::new()
        .name(config.name())
        .ping_interval(config.ping_interval())
        .connection_timeout(config.connect_timeout())
        .reconnect_delay_callback(move |attempts| reconnect_delay(base_delay, attempts));

    if let Some(token) = config.token() {
        options = options.token(token.to_owned());
    }
    if let Some(max_reconnects) = config.max_reconnects() {
        options = options.max_reconnects(max_reconnects);
    }
    options
}

/// Doubles `base` per attempt, capped at [`MAX_RECONNECT_DELAY`].
fn reconnect_delay(base: Duration, attempts: usize) -> Duration {
    let factor = 1_u32.checked_shl(attempts.min(16) as u32).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RECONNECT_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_delay_backs_off() {
        let base = Duration::from_secs(2);
        assert_eq!(reconnect_delay(base, 0), Duration::from_secs(2));
        assert_eq!(reconnect_delay(base, 1), Duration::from_secs(4));
        assert_eq!(reconnect_delay(base, 3), Duration::from_secs(16));
        assert_eq!(reconnect_delay(base, 4), MAX_RECONNECT_DELAY);
        assert_eq!(reconnect_delay(base, usize::MAX), MAX_RECONNECT_DELAY);
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let error = NatsClient::connect(NatsConfig::new("http://localhost:4222"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidConfig { .. }));
    }
}
