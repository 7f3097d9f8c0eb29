//! Reqwest-based HTTP client for object downloads.

use std::sync::Arc;

use bytes::Bytes;
use docval_core::provider::ObjectService;
use reqwest::{Client, StatusCode};
use url::Url;

use super::ObjectStoreConfig;
use crate::{Error, Result};

/// Tracing target for object store client operations.
pub const TRACING_TARGET: &str = "docval_reqwest::client";

/// Inner client that holds the HTTP client and configuration.
struct ObjectClientInner {
    http: Client,
    endpoint: Url,
    config: ObjectStoreConfig,
}

/// Reqwest-based client for downloading objects from an S3-style store.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ObjectClient {
    inner: Arc<ObjectClientInner>,
}

impl std::fmt::Debug for ObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ObjectClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;
        let timeout = config.timeout();

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            bucket = %config.bucket,
            timeout_ms = timeout.as_millis(),
            "Creating object store client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .user_agent(format!("docval/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::info!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            bucket = %config.bucket,
            authenticated = config.credentials().is_some(),
            "Object store client created"
        );

        Ok(Self {
            inner: Arc::new(ObjectClientInner {
                http,
                endpoint,
                config,
            }),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ObjectStoreConfig {
        &self.inner.config
    }

    /// Converts this client into an [`ObjectService`] for use with dependency injection.
    pub fn into_service(self) -> ObjectService {
        ObjectService::new(self)
    }

    /// Builds `{endpoint}/{bucket}/{objectName}` with percent-encoded segments.
    pub fn object_url(&self, object_name: &str) -> Result<Url> {
        object_url(&self.inner.endpoint, self.inner.config.bucket.trim(), object_name)
    }

    /// Downloads the full body of an object.
    #[tracing::instrument(skip(self), target = TRACING_TARGET)]
    pub async fn get_object(&self, object_name: &str) -> Result<Bytes> {
        let url = self.object_url(object_name)?;

        let mut request = self.inner.http.get(url);
        if let Some((user, password)) = self.inner.config.credentials() {
            request = request.basic_auth(user, password);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(
                target: TRACING_TARGET,
                object_name,
                status = status.as_u16(),
                "Object store returned non-success status"
            );
            return Err(Error::Status {
                status,
                object_name: object_name.to_owned(),
            });
        }

        let body = response.bytes().await.map_err(Error::Body)?;
        tracing::debug!(
            target: TRACING_TARGET,
            object_name,
            size = body.len(),
            "Object downloaded"
        );
        Ok(body)
    }
}

fn object_url(endpoint: &Url, bucket: &str, object_name: &str) -> Result<Url> {
    let segments: Vec<&str> = object_name.split('/').collect();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
    {
        return Err(Error::InvalidObjectName(object_name.to_owned()));
    }

    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidConfig("endpoint cannot be a base URL".to_owned()))?
        .pop_if_empty()
        .push(bucket)
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_object_url() {
        let url = object_url(&endpoint("http://minio:9000"), "documents", "inbox/a.docx").unwrap();
        assert_eq!(url.as_str(), "http://minio:9000/documents/inbox/a.docx");
    }

    #[test]
    fn test_object_url_keeps_endpoint_prefix() {
        let url = object_url(&endpoint("http://proxy/s3/"), "documents", "a.docx").unwrap();
        assert_eq!(url.as_str(), "http://proxy/s3/documents/a.docx");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let url = object_url(&endpoint("http://minio:9000"), "documents", "my docs/q?#1.docx").unwrap();
        assert_eq!(
            url.as_str(),
            "http://minio:9000/documents/my%20docs/q%3F%231.docx"
        );
    }

    #[test]
    fn test_dot_segments_rejected() {
        let base = endpoint("http://minio:9000");
        for name in ["../secret", "a/./b", "a/..", "", "a//b", "/a"] {
            assert!(
                matches!(object_url(&base, "documents", name), Err(Error::InvalidObjectName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_dots_inside_names_allowed() {
        let url = object_url(&endpoint("http://minio:9000"), "documents", "v1..2/report.docx").unwrap();
        assert_eq!(url.as_str(), "http://minio:9000/documents/v1..2/report.docx");
    }

    #[test]
    fn test_client_creation() {
        let client = ObjectClient::new(ObjectStoreConfig::new("http://localhost:9000", "documents"));
        assert!(client.is_ok());

        let client = ObjectClient::new(ObjectStoreConfig::new("not a url", "documents"));
        assert!(matches!(client, Err(Error::InvalidConfig(_))));
    }
}
