//! JetStream subscription and publishing for validation traffic.

mod publisher;
mod routing;
mod stream_config;
mod subscriber;

use async_nats::jetstream::{self, stream};
pub use publisher::ResponsePublisher;
pub use routing::{ROUTING_KEY_HEADER, routing_key};
pub use stream_config::StreamConfig;
pub use subscriber::EventSubscriber;

use crate::{Error, Result, TRACING_TARGET_STREAM};

/// Looks up a stream by name, creating it with the given subject if missing.
async fn ensure_stream(
    jetstream: &jetstream::Context,
    name: &str,
    subject: &str,
    max_age: std::time::Duration,
) -> Result<stream::Stream> {
    if let Ok(stream) = jetstream.get_stream(name).await {
        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            stream = %name,
            "Using existing stream"
        );
        return Ok(stream);
    }

    tracing::debug!(
        target: TRACING_TARGET_STREAM,
        stream = %name,
        subject = %subject,
        max_age_secs = max_age.as_secs(),
        "Creating new stream"
    );

    let config = stream::Config {
        name: name.to_owned(),
        description: Some(format!("docval stream for {subject}")),
        subjects: vec![subject.to_owned()],
        max_age,
        ..Default::default()
    };

    jetstream
        .create_stream(config)
        .await
        .map_err(|e| Error::stream_error(name, e.to_string()))
}
